//! Exact-match agreement check over a comparison set

use crate::domain::{ComparisonSet, NormalizedKey, VerificationResult};

/// Matched iff every key equals the first and that key is not `Absent`.
pub fn verify(set: &ComparisonSet) -> VerificationResult {
    let keys = set.keys();
    let matched = match keys.first() {
        Some(first @ NormalizedKey::Value(_)) => keys.iter().all(|k| k == first),
        _ => false,
    };
    VerificationResult {
        matched,
        keys: set.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(keys: &[Option<&str>]) -> ComparisonSet {
        let keys = keys
            .iter()
            .map(|k| match k {
                Some(v) => NormalizedKey::Value(v.to_string()),
                None => NormalizedKey::Absent,
            })
            .collect();
        ComparisonSet::new(keys).unwrap()
    }

    #[test]
    fn test_all_equal_matches() {
        let s = set(&[Some("1234567"), Some("1234567"), Some("1234567")]);
        assert!(verify(&s).matched);
        let pair = set(&[Some("12"), Some("12")]);
        assert!(verify(&pair).matched);
    }

    #[test]
    fn test_one_differs() {
        let s = set(&[Some("1234567"), Some("1234568"), Some("1234567")]);
        assert!(!verify(&s).matched);
    }

    #[test]
    fn test_absent_never_matches() {
        assert!(!verify(&set(&[None, None, None])).matched);
        assert!(!verify(&set(&[Some("1234567"), Some("1234567"), None])).matched);
        assert!(!verify(&set(&[None, Some("1234567")])).matched);
    }

    #[test]
    fn test_keys_are_carried_through() {
        let s = set(&[Some("1"), None]);
        let result = verify(&s);
        assert_eq!(result.keys, s);
        assert_eq!(result.status(), "No Match");
    }

    #[test]
    fn test_verify_is_idempotent() {
        let s = set(&[Some("7654321"), Some("7654321")]);
        let first = verify(&s);
        let second = verify(&s);
        assert_eq!(first, second);
        assert_eq!(first.status(), "Match");
    }
}
