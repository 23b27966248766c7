//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take
//! configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{DerivativeSize, calculate_derivative_sizes};
use super::params::{Quality, ResizeParams};
use crate::types::OutputFormat;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Sizes to generate for an image of `natural` dimensions.
pub fn plan_sizes(natural: (u32, u32), widths: &[u32]) -> Vec<DerivativeSize> {
    calculate_derivative_sizes(natural, widths)
}

/// Resize `source` into `destination`, publishing atomically.
///
/// The encoder writes into a temporary file in the destination's directory;
/// only a complete file is renamed onto `destination`. Concurrent writers of
/// the same destination each publish a complete file, and readers never see
/// a truncated one. Parent directories are created as needed.
pub fn create_derivative(
    backend: &impl ImageBackend,
    source: &Path,
    destination: &Path,
    size: DerivativeSize,
    format: OutputFormat,
    quality: Quality,
) -> Result<()> {
    let parent = destination
        .parent()
        .ok_or_else(|| std::io::Error::other("derivative path has no parent directory"))?;
    std::fs::create_dir_all(parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".derivative-")
        .tempfile_in(parent)?;

    backend.resize(&ResizeParams {
        source: source.to_path_buf(),
        output: staging.path().to_path_buf(),
        width: size.width,
        height: size.height,
        format,
        quality,
    })?;

    // Staging files are created owner-only; derivatives are served.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(staging.path(), std::fs::Permissions::from_mode(0o644))?;
    }

    staging.persist(destination).map_err(|e| e.error)?;
    Ok(())
}
