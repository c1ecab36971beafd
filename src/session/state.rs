use crate::domain::{RawObservation, SourceKind, StepPlan, Variant, VerificationResult};

/// Where a session is in the capture-and-verify flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the image of a 1-based step
    AwaitingSource(usize),
    /// All observations recorded, not yet compared
    Ready,
    /// Result computed; terminal until reset
    Verified,
}

/// Persistence progress of a verified session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PersistStatus {
    /// The variant does not persist, or the session is not verified yet
    #[default]
    NotRequired,
    Saved,
    Failed(String),
}

/// State owned by one operator session
#[derive(Debug, Clone)]
pub struct Session {
    variant: Variant,
    phase: Phase,
    observations: Vec<RawObservation>,
    result: Option<VerificationResult>,
    persist: PersistStatus,
}

impl Session {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            phase: Phase::AwaitingSource(1),
            observations: Vec::new(),
            result: None,
            persist: PersistStatus::NotRequired,
        }
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn observations(&self) -> &[RawObservation] {
        &self.observations
    }

    pub fn result(&self) -> Option<&VerificationResult> {
        self.result.as_ref()
    }

    pub fn persist_status(&self) -> &PersistStatus {
        &self.persist
    }

    /// True once a row for this session has been written
    pub fn persisted(&self) -> bool {
        self.persist == PersistStatus::Saved
    }

    /// Plan of the step currently awaited, if any
    pub fn current_step(&self) -> Option<&StepPlan> {
        match self.phase {
            Phase::AwaitingSource(i) => self.variant.step(i),
            Phase::Ready | Phase::Verified => None,
        }
    }

    /// Barcode payloads recorded so far, in step order
    pub fn seen_barcodes(&self) -> impl Iterator<Item = &str> {
        self.observations
            .iter()
            .filter(|o| o.kind() == SourceKind::Barcode)
            .filter_map(|o| o.text())
    }

    /// Start over: drop observations, the cached result and the persisted flag
    pub fn reset(&mut self) {
        self.phase = Phase::AwaitingSource(1);
        self.observations.clear();
        self.result = None;
        self.persist = PersistStatus::NotRequired;
    }

    pub(crate) fn record(&mut self, observation: RawObservation) {
        self.observations.push(observation);
        self.phase = if self.observations.len() >= self.variant.source_count() {
            Phase::Ready
        } else {
            Phase::AwaitingSource(self.observations.len() + 1)
        };
    }

    pub(crate) fn finish(&mut self, result: VerificationResult) {
        self.result = Some(result);
        self.phase = Phase::Verified;
    }

    pub(crate) fn set_persist(&mut self, status: PersistStatus) {
        self.persist = status;
    }
}
