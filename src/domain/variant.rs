//! Step plans for the supported capture workflows

use super::observation::SourceKind;

/// Digits accepted from the label recognizer
pub const DIGIT_ALLOWLIST: &str = "0123456789";

/// Which recognizer candidate a step keeps when several are found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidatePick {
    First,
    Last,
    /// 0-based position in recognizer order
    Nth(usize),
}

impl CandidatePick {
    /// Pick one item, or `None` if the list has no item at that position
    pub fn pick<T>(self, items: &[T]) -> Option<&T> {
        match self {
            CandidatePick::First => items.first(),
            CandidatePick::Last => items.last(),
            CandidatePick::Nth(n) => items.get(n),
        }
    }
}

/// One capture step in a workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPlan {
    pub kind: SourceKind,
    /// Prompt shown to the operator
    pub label: String,
    pub pick: CandidatePick,
    /// Candidates shorter than this (in characters) are dropped before picking
    pub min_candidate_len: usize,
}

impl StepPlan {
    pub fn new(kind: SourceKind, label: impl Into<String>, pick: CandidatePick) -> Self {
        Self {
            kind,
            label: label.into(),
            pick,
            min_candidate_len: 0,
        }
    }

    pub fn with_min_len(mut self, min_candidate_len: usize) -> Self {
        self.min_candidate_len = min_candidate_len;
        self
    }

    /// Allowlist passed to the text recognizer for this step
    pub fn allowlist(&self) -> Option<&'static str> {
        match self.kind {
            SourceKind::TextRecognition => Some(DIGIT_ALLOWLIST),
            SourceKind::Barcode => None,
        }
    }
}

/// Built-in workflow names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum VariantKind {
    /// Two barcodes, then a printed label
    #[default]
    BarcodeLabel,
    /// Three printed labels
    TripleLabel,
    /// Three printed labels, result appended to a spreadsheet
    LoggedLabel,
}

/// A full workflow: ordered steps plus its policies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub name: &'static str,
    pub steps: Vec<StepPlan>,
    /// Record an absent observation and move on when recognition finds nothing
    pub allow_degraded: bool,
    /// Barcode steps skip payloads already seen earlier in the session
    pub distinct_barcodes: bool,
    /// Append the result to the record store once verified
    pub persist: bool,
}

impl Variant {
    pub fn from_kind(kind: VariantKind) -> Self {
        match kind {
            VariantKind::BarcodeLabel => Self::barcode_label(),
            VariantKind::TripleLabel => Self::triple_label(),
            VariantKind::LoggedLabel => Self::logged_label(),
        }
    }

    pub fn barcode_label() -> Self {
        Self {
            name: "barcode-label",
            steps: vec![
                StepPlan::new(SourceKind::Barcode, "Scan the first barcode", CandidatePick::First),
                StepPlan::new(SourceKind::Barcode, "Scan the second barcode", CandidatePick::First),
                StepPlan::new(
                    SourceKind::TextRecognition,
                    "Capture the printed label",
                    CandidatePick::Last,
                ),
            ],
            allow_degraded: false,
            distinct_barcodes: true,
            persist: false,
        }
    }

    pub fn triple_label() -> Self {
        Self {
            name: "triple-label",
            steps: (1..=3)
                .map(|i| {
                    StepPlan::new(
                        SourceKind::TextRecognition,
                        format!("Capture image {i}"),
                        CandidatePick::First,
                    )
                })
                .collect(),
            allow_degraded: true,
            distinct_barcodes: false,
            persist: false,
        }
    }

    pub fn logged_label() -> Self {
        let step = |i: usize, pick| {
            StepPlan::new(SourceKind::TextRecognition, format!("Capture image {i}"), pick)
                .with_min_len(4)
        };
        Self {
            name: "logged-label",
            steps: vec![
                step(1, CandidatePick::First),
                step(2, CandidatePick::First),
                step(3, CandidatePick::Nth(1)),
            ],
            allow_degraded: true,
            distinct_barcodes: false,
            persist: true,
        }
    }

    /// Number of sources compared at the end
    pub fn source_count(&self) -> usize {
        self.steps.len()
    }

    /// Plan for a 1-based step index
    pub fn step(&self, index: usize) -> Option<&StepPlan> {
        index.checked_sub(1).and_then(|i| self.steps.get(i))
    }
}
