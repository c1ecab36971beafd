//! Verification session management module
//!
//! This module contains:
//! - Session state and phases (state.rs)
//! - The orchestrator that moves a session through its steps (orchestrator.rs)

pub mod orchestrator;
pub mod state;

pub use orchestrator::{Orchestrator, Progress};
pub use state::{PersistStatus, Phase, Session};

use crate::capture::CaptureError;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("step {step}: {source}")]
    CaptureUnavailable {
        step: usize,
        #[source]
        source: CaptureError,
    },

    #[error("a comparison needs at least two sources, got {0}")]
    TooFewSources(usize),

    #[error("step {0} is not part of this workflow")]
    UnknownStep(usize),
}
