//! Speech engines.
//!
//! This module contains implementations of the [`SpeechEngine`](crate::SpeechEngine)
//! boundary.
//!
//! # Available Engines
//!
//! Enable engines via Cargo features:
//! - `vits` - VITS acoustic model (ONNX format, run with ONNX Runtime)

#[cfg(feature = "vits")]
pub mod vits;
