//! Derivative generation.
//!
//! Given a resolved source image, [`DerivativeGenerator::ensure`] makes sure
//! every configured (format, width) derivative exists in the output image
//! directory and returns an [`ArtifactSet`] describing them.
//!
//! ## Rules
//!
//! - Widths above the image's natural width are dropped, never upscaled. If
//!   all of them are too large, nothing is made and the set is empty.
//! - A derivative whose filename already exists is reported, not regenerated.
//!   Its dimensions come from the source's natural size, so nothing is decoded
//!   for a cache hit.
//! - Concurrent requests for the same derivative run once (see
//!   [`SingleFlight`]) and every encode is published atomically.
//!
//! ## Output Structure
//!
//! ```text
//! _site/img/
//! ├── image-one-716.webp
//! ├── image-one-716.jpeg
//! ├── image-one-800.webp
//! ├── image-one-800.jpeg
//! ├── image-one-1600.webp
//! ├── image-one-1600.jpeg
//! └── trips/
//!     └── oslo-716.webp
//! ```

use crate::cache::{CacheStats, DerivativeKey, SingleFlight, VariantStatus};
use crate::config::SiteConfig;
use crate::imaging::{
    BackendError, DerivativeSize, ImageBackend, Quality, RustBackend, create_derivative,
    get_dimensions, is_supported_source, plan_sizes,
};
use crate::naming::derivative_filename;
use crate::types::{ArtifactSet, DerivativeArtifact, FormatGroup, OutputFormat};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone)]
pub enum GenerateError {
    #[error("source image not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("unsupported source format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("image processing failed: {0}")]
    Imaging(Arc<BackendError>),
}

impl From<BackendError> for GenerateError {
    fn from(err: BackendError) -> Self {
        GenerateError::Imaging(Arc::new(err))
    }
}

/// Configuration for derivative generation. Constant for a build.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub widths: Vec<u32>,
    /// Ordered; the last entry is the fallback format.
    pub formats: Vec<OutputFormat>,
    pub quality: Quality,
    /// Directory derivatives are written to.
    pub output_dir: PathBuf,
    /// Public URL prefix of `output_dir`, e.g. `/img/`.
    pub url_path: String,
    /// Stripped from source paths before naming.
    pub strip_root: PathBuf,
}

impl GeneratorConfig {
    /// Build a GeneratorConfig from SiteConfig values.
    pub fn from_site_config(config: &SiteConfig) -> Self {
        Self {
            widths: config.images.widths.clone(),
            formats: config.images.formats.clone(),
            quality: Quality::new(config.images.quality),
            output_dir: PathBuf::from(&config.images.output_dir),
            url_path: config.images.url_path.clone(),
            strip_root: config.managed_root(),
        }
    }

    fn url_for(&self, filename: &str) -> String {
        if self.url_path.ends_with('/') {
            format!("{}{}", self.url_path, filename)
        } else {
            format!("{}/{}", self.url_path, filename)
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::from_site_config(&SiteConfig::default())
    }
}

/// Outcome of one [`DerivativeGenerator::ensure`] call.
#[derive(Debug, Clone)]
pub struct Ensured {
    pub artifacts: ArtifactSet,
    pub stats: CacheStats,
}

type VariantResult = Result<VariantStatus, Arc<BackendError>>;

/// Ensures derivatives exist on disk. Shared by reference across pages.
pub struct DerivativeGenerator<B: ImageBackend = RustBackend> {
    backend: B,
    config: GeneratorConfig,
    inflight: SingleFlight<DerivativeKey, VariantResult>,
}

impl DerivativeGenerator<RustBackend> {
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_backend(RustBackend::new(), config)
    }
}

impl<B: ImageBackend> DerivativeGenerator<B> {
    /// Use a specific backend (allows testing with mock).
    pub fn with_backend(backend: B, config: GeneratorConfig) -> Self {
        Self {
            backend,
            config,
            inflight: SingleFlight::new(),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Make sure every derivative of `source` exists and describe them.
    pub fn ensure(&self, source: &Path) -> Result<Ensured, GenerateError> {
        if !source.is_file() {
            return Err(GenerateError::SourceNotFound(source.to_path_buf()));
        }
        if !is_supported_source(source) {
            return Err(GenerateError::UnsupportedFormat(source.to_path_buf()));
        }

        let natural = get_dimensions(&self.backend, source)?;
        let sizes = plan_sizes(natural, &self.config.widths);

        let mut stats = CacheStats::default();
        let mut groups = Vec::with_capacity(self.config.formats.len());

        for &format in &self.config.formats {
            let mut artifacts = Vec::with_capacity(sizes.len());
            for &size in &sizes {
                let artifact = self.ensure_variant(source, size, format, &mut stats)?;
                artifacts.push(artifact);
            }
            groups.push(FormatGroup { format, artifacts });
        }

        Ok(Ensured {
            artifacts: ArtifactSet {
                natural_width: natural.0,
                natural_height: natural.1,
                groups,
            },
            stats,
        })
    }

    fn ensure_variant(
        &self,
        source: &Path,
        size: DerivativeSize,
        format: OutputFormat,
        stats: &mut CacheStats,
    ) -> Result<DerivativeArtifact, GenerateError> {
        let filename = derivative_filename(source, &self.config.strip_root, size.width, format);
        let destination = self.config.output_dir.join(&filename);
        let key = DerivativeKey {
            source: source.to_path_buf(),
            width: size.width,
            format,
        };

        let (result, executed) = self.inflight.run(&key, || {
            if destination.is_file() {
                debug!(file = %filename, "derivative already on disk");
                return Ok(VariantStatus::Cached);
            }
            debug!(file = %filename, width = size.width, %format, "encoding derivative");
            create_derivative(
                &self.backend,
                source,
                &destination,
                size,
                format,
                self.config.quality,
            )
            .map(|()| VariantStatus::Encoded)
            .map_err(Arc::new)
        });

        match result {
            Ok(status) => {
                stats.record(if executed { status } else { VariantStatus::Cached });
                Ok(DerivativeArtifact {
                    format,
                    width: size.width,
                    height: size.height,
                    url: self.config.url_for(&filename),
                    filename,
                })
            }
            Err(err) => {
                stats.failure();
                Err(GenerateError::Imaging(err))
            }
        }
    }
}
