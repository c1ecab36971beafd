//! Capture two barcodes and a printed label, then check that the trailing
//! digits of all sources agree.

pub mod capture;
pub mod config;
pub mod domain;
pub mod recognition;
pub mod session;
pub mod sink;
pub mod verify;
