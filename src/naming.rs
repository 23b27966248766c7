//! Deterministic derivative filenames.
//!
//! Every derivative written to the output image directory is named from its
//! source path, target width and target format alone:
//!
//! ```text
//! src/posts/img/Image One.JPG  @ 716 webp  →  image-one-716.webp
//! src/posts/img/trips/Oslo.png @ 800 jpeg  →  trips/oslo-800.jpeg
//! ```
//!
//! The stem is the source path with the assets root stripped, the extension
//! dropped, lower-cased, and each run of whitespace replaced by one dash.
//! Width and format are always part of the name, so two different requests
//! never share a file and two identical requests always do. The generator
//! relies on that to treat an existing file as a finished derivative.

use crate::types::OutputFormat;
use std::path::{Component, Path};

/// Normalized stem for a source image.
///
/// `strip_root` is removed when `source` lives under it; otherwise the whole
/// path is used. Path separators are emitted as `/` so stems are identical
/// across platforms.
pub fn derivative_stem(source: &Path, strip_root: &Path) -> String {
    let relative = source.strip_prefix(strip_root).unwrap_or(source);
    let without_ext = relative.with_extension("");

    // Only normal components: a stem must never be absolute or climb out
    // of the output directory.
    let joined = without_ext
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    collapse_whitespace(&joined.to_lowercase())
}

/// Filename of one derivative: `{stem}-{width}.{format}`.
pub fn derivative_filename(
    source: &Path,
    strip_root: &Path,
    width: u32,
    format: OutputFormat,
) -> String {
    format!(
        "{}-{}.{}",
        derivative_stem(source, strip_root),
        width,
        format.extension()
    )
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join("-")
}
