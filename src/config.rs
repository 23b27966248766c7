//! Build configuration.
//!
//! Handles loading, validating, and merging `srcsetter.toml`. Stock defaults
//! are overridden by whatever the user file specifies; everything is static
//! for the duration of a build.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [assets]
//! root = "src/posts/"       # Directory managed image references resolve against
//! prefix = "img/"           # Decoded `src` must start with this to be managed
//!
//! [images]
//! widths = [716, 800, 1600] # Target widths; larger than the original are skipped
//! formats = ["webp", "jpeg"] # Ordered; the last one is the <img> fallback
//! quality = 80              # JPEG/AVIF quality (1-100)
//! output_dir = "_site/img/" # Where derivatives are written
//! url_path = "/img/"        # Public URL of output_dir
//!
//! [markup]
//! sizes = "(min-width: 832px) 800px, 100vw"
//! class = "image"
//!
//! [processing]
//! max_processes = 4         # Max parallel pages (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [images]
//! formats = ["avif", "webp", "jpeg"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::OutputFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config filename looked up in the working directory.
pub const CONFIG_FILENAME: &str = "srcsetter.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build configuration loaded from `srcsetter.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Where managed source images live and how they are referenced.
    pub assets: AssetsConfig,
    /// Derivative generation settings.
    pub images: ImagesConfig,
    /// Responsive markup settings.
    pub markup: MarkupConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assets.prefix.is_empty() {
            return Err(ConfigError::Validation(
                "assets.prefix must not be empty".into(),
            ));
        }
        if self.images.widths.is_empty() {
            return Err(ConfigError::Validation(
                "images.widths must not be empty".into(),
            ));
        }
        if self.images.widths.contains(&0) {
            return Err(ConfigError::Validation(
                "images.widths must be positive".into(),
            ));
        }
        if !all_unique(&self.images.widths) {
            return Err(ConfigError::Validation(
                "images.widths must not repeat".into(),
            ));
        }
        if self.images.formats.is_empty() {
            return Err(ConfigError::Validation(
                "images.formats must not be empty".into(),
            ));
        }
        if !all_unique(&self.images.formats) {
            return Err(ConfigError::Validation(
                "images.formats must not repeat".into(),
            ));
        }
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.markup.sizes.trim().is_empty() {
            return Err(ConfigError::Validation(
                "markup.sizes must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Directory stripped from source paths when naming derivatives:
    /// the assets root joined with the managed prefix.
    pub fn managed_root(&self) -> PathBuf {
        Path::new(&self.assets.root).join(self.assets.prefix.trim_start_matches('/'))
    }
}

fn all_unique<T: std::hash::Hash + Eq>(items: &[T]) -> bool {
    let mut seen = HashSet::new();
    items.iter().all(|item| seen.insert(item))
}

/// Managed asset location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    /// Directory that managed references are resolved against.
    pub root: String,
    /// Marker a decoded `src` must start with to be managed.
    pub prefix: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: "src/posts/".to_string(),
            prefix: "img/".to_string(),
        }
    }
}

/// Derivative generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Pixel widths to generate.
    pub widths: Vec<u32>,
    /// Encodings to generate, in `<source>` order; the last is the fallback.
    pub formats: Vec<OutputFormat>,
    /// Lossy encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Directory derivatives are written into.
    pub output_dir: String,
    /// Public URL prefix for `output_dir`.
    pub url_path: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            widths: vec![716, 800, 1600],
            formats: vec![OutputFormat::Webp, OutputFormat::Jpeg],
            quality: 80,
            output_dir: "_site/img/".to_string(),
            url_path: "/img/".to_string(),
        }
    }
}

/// Responsive markup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkupConfig {
    /// The `sizes` descriptor on every generated `<source>` and `<img>`.
    pub sizes: String,
    /// Class attribute on the generated `<img>`.
    pub class: String,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            sizes: "(min-width: 832px) 800px, 100vw".to_string(),
            class: "image".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of pages transformed in parallel.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `srcsetter.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# srcsetter Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Managed assets
# ---------------------------------------------------------------------------
[assets]
# Directory that managed image references are resolved against.
root = "src/posts/"

# An <img src> is managed when its URL-decoded value starts with this marker.
# The source file is read from root + src.
prefix = "img/"

# ---------------------------------------------------------------------------
# Derivative generation
# ---------------------------------------------------------------------------
[images]
# Target widths in pixels. Widths larger than the original are skipped.
widths = [716, 800, 1600]

# Encodings in <source> order. The last one is rendered as the plain <img>
# fallback. Choices: webp, jpeg, png, avif.
formats = ["webp", "jpeg"]

# JPEG/AVIF encoding quality (1 = worst, 100 = best). WebP is lossless.
quality = 80

# Directory derivatives are written to, and the public URL it is served from.
output_dir = "_site/img/"
url_path = "/img/"

# ---------------------------------------------------------------------------
# Responsive markup
# ---------------------------------------------------------------------------
[markup]
# The sizes descriptor on every generated <source> and <img>.
sizes = "(min-width: 832px) 800px, 100vw"

# Class attribute on the generated <img>.
class = "image"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum pages transformed in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
