//! Whole-site build: transform every rendered page in place.
//!
//! Pages are independent, so they are transformed in parallel on the rayon
//! pool. One [`Transformer`] is shared by reference; its generator collapses
//! concurrent requests for the same derivative. A page is only rewritten on
//! disk when its HTML changed, and the new contents are published atomically.
//!
//! A failing page is reported and the rest of the site still gets built.
//! Callers decide what a failure means for the exit status.

use crate::cache::CacheStats;
use crate::imaging::ImageBackend;
use crate::scan::{ScanError, scan_site};
use crate::transform::{PageReport, TransformError, Transformer};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Scan(#[from] ScanError),
}

#[derive(Error, Debug)]
pub enum PageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// What happened to one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PageStatus {
    /// Contents changed and were written back.
    Rewritten,
    /// Nothing to change; the file was not touched.
    Unchanged,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PageOutcome {
    /// Path relative to the site directory.
    pub path: String,
    #[serde(flatten)]
    pub status: PageStatus,
    pub report: PageReport,
}

/// Progress event sent while the build runs.
#[derive(Debug, Clone)]
pub struct PageEvent {
    /// 1-based position in scan order.
    pub index: usize,
    pub total: usize,
    pub outcome: PageOutcome,
}

/// Result of a whole-site build, pages in scan order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteReport {
    pub pages: Vec<PageOutcome>,
    pub cache: CacheStats,
}

impl SiteReport {
    pub fn failed(&self) -> impl Iterator<Item = &PageOutcome> {
        self.pages
            .iter()
            .filter(|p| matches!(p.status, PageStatus::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    pub fn rewritten_pages(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| p.status == PageStatus::Rewritten)
            .count()
    }

    pub fn images(&self) -> u32 {
        self.pages.iter().map(|p| p.report.images).sum()
    }

    pub fn responsive_images(&self) -> usize {
        self.pages.iter().map(|p| p.report.rewritten.len()).sum()
    }

    pub fn skipped_images(&self) -> usize {
        self.pages.iter().map(|p| p.report.skipped.len()).sum()
    }
}

/// Transform every HTML page under `site_dir`.
///
/// `skip_dir` (normally the derivative output directory) is not scanned.
/// When `events` is given, one [`PageEvent`] is sent per finished page, in
/// completion order.
pub fn build_site<B: ImageBackend>(
    transformer: &Transformer<B>,
    site_dir: &Path,
    skip_dir: Option<&Path>,
    events: Option<Sender<PageEvent>>,
) -> Result<SiteReport, BuildError> {
    let pages = scan_site(site_dir, skip_dir)?;
    let total = pages.len();
    debug!(pages = total, site = %site_dir.display(), "transforming site");

    let outcomes: Vec<PageOutcome> = pages
        .par_iter()
        .enumerate()
        .map_with(events, |events, (i, path)| {
            let relative = path
                .strip_prefix(site_dir)
                .unwrap_or(path)
                .display()
                .to_string();

            let outcome = match transform_page(transformer, path) {
                Ok((report, changed)) => PageOutcome {
                    path: relative,
                    status: if changed {
                        PageStatus::Rewritten
                    } else {
                        PageStatus::Unchanged
                    },
                    report,
                },
                Err(err) => {
                    error!(page = %relative, error = %err, "page transform failed");
                    PageOutcome {
                        path: relative,
                        status: PageStatus::Failed {
                            error: err.to_string(),
                        },
                        report: PageReport::default(),
                    }
                }
            };

            if let Some(tx) = events {
                tx.send(PageEvent {
                    index: i + 1,
                    total,
                    outcome: outcome.clone(),
                })
                .ok();
            }
            outcome
        })
        .collect();

    let mut cache = CacheStats::default();
    for outcome in &outcomes {
        cache.merge(&outcome.report.cache);
    }

    Ok(SiteReport {
        pages: outcomes,
        cache,
    })
}

/// Transform one page file in place. Returns the report and whether the
/// file was rewritten.
pub fn transform_page<B: ImageBackend>(
    transformer: &Transformer<B>,
    path: &Path,
) -> Result<(PageReport, bool), PageError> {
    let html = fs::read_to_string(path)?;
    let page = transformer.transform(&html, path)?;
    let changed = page.html != html;
    if changed {
        write_atomic(path, &page.html)?;
    }
    Ok((page.report, changed))
}

/// Replace `path` with `contents` via a temp file in the same directory.
/// The original file's permissions are kept.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut staging = tempfile::NamedTempFile::new_in(parent)?;
    staging.write_all(contents.as_bytes())?;
    staging.flush()?;
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(staging.path(), meta.permissions())?;
    }
    staging.persist(path).map_err(|e| e.error)?;
    Ok(())
}
