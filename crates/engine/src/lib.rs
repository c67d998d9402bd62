//! Threshold detection engine.
//!
//! This crate contains the core logic for comparing consecutive protocol
//! snapshots against configured thresholds and producing alert events.

pub mod detector;

pub use detector::*;
