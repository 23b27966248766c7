//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the derivative
//! generator needs: identify (read natural dimensions) and resize (decode,
//! scale, encode, write).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` below.

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Backends are shared across the rayon pool by reference, hence `Sync`.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode where the format allows it.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode `params.source`, resize to exactly `width`x`height`, encode as
    /// `params.format` and write to `params.output`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
