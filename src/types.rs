//! Shared value types passed between the generator, the markup synthesizer
//! and the transform.
//!
//! These are plain data: the generator produces an [`ArtifactSet`] per source
//! image and everything downstream only reads it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Encoding of a generated derivative.
///
/// Order matters wherever a list of formats is configured: the last entry is
/// the fallback rendered as the plain `<img>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Webp,
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
    Avif,
}

impl OutputFormat {
    /// File extension used in derivative filenames (also the identifier in config).
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Avif => "avif",
        }
    }

    /// MIME type for `<source type=...>`.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Webp => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Avif => "image/avif",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webp" => Ok(OutputFormat::Webp),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "avif" => Ok(OutputFormat::Avif),
            other => Err(format!(
                "unknown output format '{other}' (expected webp, jpeg, png or avif)"
            )),
        }
    }
}

/// One generated derivative: a source image at one width in one format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivativeArtifact {
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    /// Filename relative to the output image directory.
    pub filename: String,
    /// Public URL the markup points at.
    pub url: String,
}

/// All artifacts for one format, ascending by width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatGroup {
    pub format: OutputFormat,
    pub artifacts: Vec<DerivativeArtifact>,
}

impl FormatGroup {
    pub fn smallest(&self) -> Option<&DerivativeArtifact> {
        self.artifacts.first()
    }

    pub fn largest(&self) -> Option<&DerivativeArtifact> {
        self.artifacts.last()
    }

    pub fn widths(&self) -> Vec<u32> {
        self.artifacts.iter().map(|a| a.width).collect()
    }
}

/// Everything the generator produced for one source image, grouped by format
/// in configured order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSet {
    pub natural_width: u32,
    pub natural_height: u32,
    pub groups: Vec<FormatGroup>,
}

impl ArtifactSet {
    /// The fallback group: last in configured format order.
    pub fn fallback(&self) -> Option<&FormatGroup> {
        self.groups.last()
    }

    /// Groups rendered as `<source>` alternatives (everything but the fallback).
    pub fn alternatives(&self) -> &[FormatGroup] {
        match self.groups.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }

    pub fn group(&self, format: OutputFormat) -> Option<&FormatGroup> {
        self.groups.iter().find(|g| g.format == format)
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.artifacts.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
