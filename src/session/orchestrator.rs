//! Drives a session through capture, recognition, verification and persistence

use chrono_tz::Tz;

use super::state::{PersistStatus, Phase, Session};
use super::WorkflowError;
use crate::capture::{CaptureSource, CapturedImage};
use crate::domain::{ComparisonSet, RawObservation, SourceKind, StepPlan, VerificationResult};
use crate::recognition::{BarcodeReader, TextRecognizer};
use crate::sink::{PersistedRow, RecordStore, ResultSink};
use crate::verify::{Normalizer, verify};

/// What one call to [`Orchestrator::advance`] achieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// No image yet for this step; ask again later
    Waiting { step: usize },
    /// Image captured but nothing usable recognized; capture the step again
    Retry { step: usize },
    /// Observation stored for this step
    Recorded { step: usize, degraded: bool },
    /// Session verified (freshly or from cache)
    Verified {
        result: VerificationResult,
        persist: PersistStatus,
    },
}

/// Recognition and result adapters a session runs against. Holds no
/// per-session state; the capture source is passed in per call because it is
/// driven by the operator.
pub struct Orchestrator {
    barcodes: Box<dyn BarcodeReader>,
    text: Box<dyn TextRecognizer>,
    sink: Box<dyn ResultSink>,
    store: Option<Box<dyn RecordStore>>,
    normalizer: Normalizer,
    zone: Tz,
}

impl Orchestrator {
    pub fn new(
        barcodes: Box<dyn BarcodeReader>,
        text: Box<dyn TextRecognizer>,
        sink: Box<dyn ResultSink>,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            barcodes,
            text,
            sink,
            store: None,
            normalizer,
            zone: chrono_tz::Asia::Tokyo,
        }
    }

    pub fn with_store(mut self, store: Box<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_zone(mut self, zone: Tz) -> Self {
        self.zone = zone;
        self
    }

    /// Perform the next transition of `session`.
    ///
    /// Capture failures leave the session where it was and are returned as
    /// errors. Recognition failures never are: they become absent
    /// observations, or a retry when the variant does not allow degraded steps.
    pub fn advance(
        &mut self,
        session: &mut Session,
        capture: &mut dyn CaptureSource,
    ) -> Result<Progress, WorkflowError> {
        match session.phase() {
            Phase::AwaitingSource(step) => self.capture_step(session, capture, step),
            Phase::Ready => self.verify_session(session),
            Phase::Verified => match session.result().cloned() {
                Some(result) => Ok(verified_progress(result, session)),
                None => self.verify_session(session),
            },
        }
    }

    /// Advance until verified, or until the operator has to act (waiting or retry)
    pub fn run(
        &mut self,
        session: &mut Session,
        capture: &mut dyn CaptureSource,
    ) -> Result<Progress, WorkflowError> {
        loop {
            match self.advance(session, capture)? {
                Progress::Recorded { .. } => continue,
                other => return Ok(other),
            }
        }
    }

    /// Try persisting again after a failed write. A saved session is never
    /// written twice.
    pub fn retry_persist(&mut self, session: &mut Session) -> PersistStatus {
        if !matches!(session.persist_status(), PersistStatus::Failed(_)) {
            return session.persist_status().clone();
        }
        if let Some(result) = session.result().cloned() {
            let status = self.persist(&result);
            session.set_persist(status);
        }
        session.persist_status().clone()
    }

    fn capture_step(
        &mut self,
        session: &mut Session,
        capture: &mut dyn CaptureSource,
        step: usize,
    ) -> Result<Progress, WorkflowError> {
        let plan = session
            .variant()
            .step(step)
            .cloned()
            .ok_or(WorkflowError::UnknownStep(step))?;

        let label = format!("Step {}: {}", step, plan.label);
        let image = match capture.capture(&label) {
            Ok(Some(image)) => image,
            Ok(None) => return Ok(Progress::Waiting { step }),
            Err(source) => {
                log::warn!("Capture failed at step {}: {}", step, source);
                return Err(WorkflowError::CaptureUnavailable { step, source });
            }
        };

        match self.pick_candidate(session, &plan, &image) {
            Some(text) => {
                log::info!("Step {} recognized {:?}", step, text);
                session.record(RawObservation::new(plan.kind, step, text));
                Ok(Progress::Recorded {
                    step,
                    degraded: false,
                })
            }
            None if session.variant().allow_degraded => {
                log::warn!("Step {}: nothing recognized, recording as absent", step);
                session.record(RawObservation::absent(plan.kind, step));
                Ok(Progress::Recorded {
                    step,
                    degraded: true,
                })
            }
            None => {
                log::warn!("Step {}: nothing recognized, waiting for another image", step);
                Ok(Progress::Retry { step })
            }
        }
    }

    fn pick_candidate(
        &self,
        session: &Session,
        plan: &StepPlan,
        image: &CapturedImage,
    ) -> Option<String> {
        let mut candidates: Vec<String> = match plan.kind {
            SourceKind::Barcode => self
                .barcodes
                .decode(image)
                .into_iter()
                .map(|hit| hit.payload)
                .collect(),
            SourceKind::TextRecognition => match self.text.recognize(image, plan.allowlist()) {
                Ok(hits) => hits.into_iter().map(|hit| hit.text).collect(),
                Err(e) => {
                    log::warn!("Text recognition failed: {}", e);
                    Vec::new()
                }
            },
        };
        log::debug!("{} candidate(s): {:?}", plan.kind.label(), candidates);

        candidates.retain(|c| !c.is_empty() && c.chars().count() >= plan.min_candidate_len);
        if plan.kind == SourceKind::Barcode && session.variant().distinct_barcodes {
            candidates.retain(|c| !session.seen_barcodes().any(|seen| seen == c.as_str()));
        }
        plan.pick.pick(&candidates).cloned()
    }

    fn verify_session(&mut self, session: &mut Session) -> Result<Progress, WorkflowError> {
        let keys = session
            .observations()
            .iter()
            .map(|o| self.normalizer.normalize(o.text(), o.kind()))
            .collect::<Vec<_>>();
        let count = keys.len();
        let set = ComparisonSet::new(keys).ok_or(WorkflowError::TooFewSources(count))?;

        let result = verify(&set);
        log::info!(
            "Session verified: {} ({})",
            result.status(),
            result
                .keys
                .keys()
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        session.finish(result.clone());
        self.sink.render(&result);

        if session.variant().persist && !session.persisted() {
            let status = self.persist(&result);
            session.set_persist(status);
        }
        Ok(verified_progress(result, session))
    }

    fn persist(&mut self, result: &VerificationResult) -> PersistStatus {
        let Some(store) = self.store.as_mut() else {
            log::error!("Result not saved: no record store configured");
            return PersistStatus::Failed("no record store configured".to_string());
        };
        let row = PersistedRow::now(result, self.zone);
        match store.append(&row) {
            Ok(()) => PersistStatus::Saved,
            Err(e) => {
                log::error!("Result not saved: {}", e);
                PersistStatus::Failed(e.to_string())
            }
        }
    }
}

fn verified_progress(result: VerificationResult, session: &Session) -> Progress {
    Progress::Verified {
        result,
        persist: session.persist_status().clone(),
    }
}
