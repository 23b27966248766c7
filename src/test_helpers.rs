//! Shared test utilities.
//!
//! Writes real, decodable images with the `image` crate and lays out a
//! throwaway site (sources under `src/posts/img/`, rendered pages under
//! `_site/`) with a matching [`SiteConfig`].
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = site_fixture();
//! write_test_jpeg(&site.source("desk.jpg"), 200, 150);
//! write_page(&site.site_dir(), "posts/desk/index.html", r#"<img src="img/desk.jpg">"#);
//! ```

use crate::config::SiteConfig;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =========================================================================
// Image fixtures
// =========================================================================

/// Write a small valid JPEG with the given dimensions.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let writer = create(path);
    JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a small valid PNG with a translucent alpha channel.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, 64, (y % 256) as u8, 100])
    });
    let writer = create(path);
    PngEncoder::new(writer)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
        .unwrap();
}

fn create(path: &Path) -> BufWriter<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    BufWriter::new(fs::File::create(path).unwrap())
}

// =========================================================================
// Site fixture
// =========================================================================

/// A temp directory plus a config whose paths all point inside it.
pub struct SiteFixture {
    pub tmp: TempDir,
    pub config: SiteConfig,
}

impl SiteFixture {
    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// Rendered site directory (`_site/`).
    pub fn site_dir(&self) -> PathBuf {
        self.root().join("_site")
    }

    /// Derivative output directory (`_site/img/`).
    pub fn image_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.images.output_dir)
    }

    /// Path of a managed source image by its name under `img/`.
    pub fn source(&self, name: &str) -> PathBuf {
        self.config.managed_root().join(name)
    }
}

/// Fresh site with small widths so real encodes stay fast.
pub fn site_fixture() -> SiteFixture {
    let tmp = TempDir::new().unwrap();
    let mut config = SiteConfig::default();
    config.assets.root = tmp.path().join("src/posts").display().to_string();
    config.images.output_dir = tmp.path().join("_site/img").display().to_string();
    config.images.widths = vec![40, 80, 160];
    fs::create_dir_all(tmp.path().join("_site")).unwrap();
    SiteFixture { tmp, config }
}

/// Write a rendered page at `relative` under `site_dir`.
pub fn write_page(site_dir: &Path, relative: &str, body: &str) -> PathBuf {
    let path = site_dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        &path,
        format!("<!DOCTYPE html><html><head><title>t</title></head><body>{body}</body></html>"),
    )
    .unwrap();
    path
}
