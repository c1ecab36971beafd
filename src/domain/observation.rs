//! Observation, key and result types for a verification session

use std::fmt;

/// Where a raw observation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Decoded barcode payload
    Barcode,
    /// Text read from a printed label
    TextRecognition,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Barcode => "barcode",
            SourceKind::TextRecognition => "label",
        }
    }
}

/// A string produced by a recognizer for one capture step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObservation {
    kind: SourceKind,
    /// 1-based capture step that produced this observation
    index: usize,
    /// `None` when the step completed without a usable recognition result
    text: Option<String>,
}

impl RawObservation {
    pub fn new(kind: SourceKind, index: usize, text: impl Into<String>) -> Self {
        Self {
            kind,
            index,
            text: Some(text.into()),
        }
    }

    /// Observation for a step whose recognizer found nothing
    pub fn absent(kind: SourceKind, index: usize) -> Self {
        Self {
            kind,
            index,
            text: None,
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// Canonical comparison key derived from a raw observation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NormalizedKey {
    /// Never empty
    Value(String),
    /// No usable recognition result; never matches anything
    Absent,
}

impl NormalizedKey {
    /// Wrap a normalized string, mapping the empty string to `Absent`
    pub fn from_normalized(value: String) -> Self {
        if value.is_empty() {
            NormalizedKey::Absent
        } else {
            NormalizedKey::Value(value)
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, NormalizedKey::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NormalizedKey::Value(v) => Some(v),
            NormalizedKey::Absent => None,
        }
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedKey::Value(v) => f.write_str(v),
            NormalizedKey::Absent => f.write_str("N/A"),
        }
    }
}

/// Keys from every required source, in step order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonSet {
    keys: Vec<NormalizedKey>,
}

impl ComparisonSet {
    /// Minimum number of sources a comparison needs
    pub const MIN_SOURCES: usize = 2;

    /// Build a set, returning `None` when fewer than two keys are supplied
    pub fn new(keys: Vec<NormalizedKey>) -> Option<Self> {
        if keys.len() < Self::MIN_SOURCES {
            return None;
        }
        Some(Self { keys })
    }

    pub fn keys(&self) -> &[NormalizedKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Outcome of comparing a `ComparisonSet`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub matched: bool,
    pub keys: ComparisonSet,
}

impl VerificationResult {
    /// Status string used for display and persisted rows
    pub fn status(&self) -> &'static str {
        if self.matched { "Match" } else { "No Match" }
    }
}
