//! Image capture module
//!
//! This module consolidates:
//! - Captured image type and preprocessing (image.rs)
//! - Capture sources for interactive and batch runs (source.rs)

pub mod image;
pub mod source;

pub use image::CapturedImage;
pub use source::{CaptureSource, FileQueueCapture, PromptCapture};

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("camera or image source unavailable: {0}")]
    Unavailable(String),

    #[error("captured image could not be decoded: {0}")]
    Decode(String),

    #[error("operator input closed")]
    Closed,
}
