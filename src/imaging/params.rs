//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. They are the interface
//! between [`operations`](super::operations), which decides which derivatives
//! to create, and the [`backend`](super::backend), which does the pixel work.
//! Keeping them separate lets tests swap in a mock backend without touching
//! the planning logic.

use crate::types::OutputFormat;
use std::path::PathBuf;

/// Quality setting for lossy encoders (1-100). Ignored by lossless formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Parameters for one resize-and-encode operation.
///
/// `output` is where the encoded bytes go. The generator points it at a
/// temporary file and publishes it afterwards, so the encoder cannot infer
/// the format from the extension; `format` is explicit.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: Quality,
}
