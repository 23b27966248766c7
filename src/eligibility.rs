//! Decides which `<img>` references are managed assets.
//!
//! A reference is managed when its decoded path starts with the configured
//! prefix (`img/` by default, i.e. images stored next to the posts and linked
//! relatively). The source file is then `assets_root + decoded path`.
//!
//! Decoding happens exactly once, before any comparison, so `image%20one.jpg`
//! and `image one.jpg` always get the same decision and the same source path.
//! Query strings and fragments are ignored. References that climb out of the
//! assets root with `..` are treated as unmanaged.

use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};

/// Outcome of resolving one `src` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    /// Managed asset; carries the on-disk source path.
    Managed(PathBuf),
    /// Anything else: external URLs, site chrome, absolute paths.
    Unmanaged,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Managed(_))
    }

    pub fn source_path(&self) -> Option<&Path> {
        match self {
            Eligibility::Managed(path) => Some(path),
            Eligibility::Unmanaged => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EligibilityResolver {
    prefix: String,
    assets_root: PathBuf,
}

impl EligibilityResolver {
    pub fn new(prefix: impl Into<String>, assets_root: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            assets_root: assets_root.into(),
        }
    }

    pub fn resolve(&self, raw_src: &str) -> Eligibility {
        let decoded = decode_src(raw_src);
        if self.prefix.is_empty() || !decoded.starts_with(&self.prefix) {
            return Eligibility::Unmanaged;
        }

        let relative = Path::new(decoded.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Eligibility::Unmanaged;
        }

        Eligibility::Managed(self.assets_root.join(relative))
    }
}

/// URL-decode the path part of a `src` attribute.
pub fn decode_src(raw_src: &str) -> String {
    let path = raw_src
        .split(['?', '#'])
        .next()
        .unwrap_or(raw_src)
        .trim();
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}
