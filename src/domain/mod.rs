//! Pure domain types with minimal dependencies
//!
//! This module contains core types used throughout the crate.
//! Types here should not depend on capture, recognition or sink adapters.

pub mod observation;
pub mod variant;

pub use observation::*;
pub use variant::*;
