//! Reduce recognized strings to comparable trailing-digit keys

use crate::domain::{NormalizedKey, SourceKind};

/// Default number of trailing characters compared
pub const DEFAULT_TRAILING_DIGITS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    trailing_digits: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            trailing_digits: DEFAULT_TRAILING_DIGITS,
        }
    }
}

impl Normalizer {
    /// A zero length would turn every key into `Absent`, so it falls back to
    /// [`DEFAULT_TRAILING_DIGITS`]
    pub fn new(trailing_digits: usize) -> Self {
        if trailing_digits == 0 {
            log::warn!(
                "Trailing length must be at least 1, using {}",
                DEFAULT_TRAILING_DIGITS
            );
            return Self::default();
        }
        Self { trailing_digits }
    }

    pub fn trailing_digits(&self) -> usize {
        self.trailing_digits
    }

    /// Map one recognized string to its comparison key.
    ///
    /// Barcode payloads keep their last `L` characters verbatim and pass
    /// through unchanged when shorter. Label text is reduced to its digits
    /// first, then the same trailing cut applies. Anything that ends up empty
    /// is `Absent`.
    pub fn normalize(&self, raw: Option<&str>, kind: SourceKind) -> NormalizedKey {
        let Some(raw) = raw.filter(|s| !s.is_empty()) else {
            return NormalizedKey::Absent;
        };

        let value = match kind {
            SourceKind::Barcode => self.trailing(raw),
            SourceKind::TextRecognition => {
                let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
                self.trailing(&digits)
            }
        };
        NormalizedKey::from_normalized(value)
    }

    fn trailing(&self, s: &str) -> String {
        let count = s.chars().count();
        if count >= self.trailing_digits {
            s.chars().skip(count - self.trailing_digits).collect()
        } else {
            s.to_string()
        }
    }
}
