//! Normalization and comparison of recognized values

pub mod normalize;
pub mod verifier;

pub use normalize::{DEFAULT_TRAILING_DIGITS, Normalizer};
pub use verifier::verify;
