//! CLI output formatting.
//!
//! Output is **page-centric**: every page leads with its position and path
//! relative to the site, followed by indented lines for the images that were
//! made responsive or skipped, then the page's derivative cache summary.
//!
//! # Output Format
//!
//! ## Build progress
//!
//! ```text
//! [002/014] posts/desk/index.html
//!     img/desk.jpg → 6 variants
//!     img/gone.jpg: skipped (source image not found: src/posts/img/gone.jpg)
//!     Cache: 2 cached, 4 encoded (6 total)
//! [003/014] about/index.html (unchanged)
//! [004/014] broken/index.html
//!     FAILED: malformed markup in _site/broken/index.html: ...
//! ```
//!
//! ## Summary
//!
//! ```text
//! Pages: 14 scanned, 9 rewritten, 1 failed
//! Images: 31 seen, 12 responsive, 1 skipped
//! Cache: 40 cached, 32 encoded (72 total)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::pipeline::{PageEvent, PageStatus, SiteReport};
use crate::transform::PageReport;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Zero-padded `[index/total]` counter, padded to the width of `total`.
fn counter(index: usize, total: usize) -> String {
    let width = total.to_string().len().max(3);
    format!("[{:0>w$}/{:0>w$}]", index, total, w = width)
}

/// Detail lines for one page report, indented one level.
pub fn format_page_report(report: &PageReport) -> Vec<String> {
    let mut lines = Vec::new();
    for image in &report.rewritten {
        lines.push(format!(
            "{}{} \u{2192} {} variants",
            indent(1),
            image.src,
            image.variants
        ));
    }
    for image in &report.skipped {
        lines.push(format!(
            "{}{}: skipped ({})",
            indent(1),
            image.src,
            image.reason
        ));
    }
    if report.cache.total() > 0 {
        lines.push(format!("{}Cache: {}", indent(1), report.cache));
    }
    lines
}

/// Format one build progress event.
pub fn format_page_event(event: &PageEvent) -> Vec<String> {
    let head = format!(
        "{} {}",
        counter(event.index, event.total),
        event.outcome.path
    );
    match &event.outcome.status {
        PageStatus::Failed { error } => {
            vec![head, format!("{}FAILED: {}", indent(1), error)]
        }
        PageStatus::Unchanged => vec![format!("{} (unchanged)", head)],
        PageStatus::Rewritten => {
            let mut lines = vec![head];
            lines.extend(format_page_report(&event.outcome.report));
            lines
        }
    }
}

/// Format the totals printed after a build.
pub fn format_site_summary(report: &SiteReport) -> Vec<String> {
    let failed = report.failed().count();
    let mut pages = format!(
        "Pages: {} scanned, {} rewritten",
        report.pages.len(),
        report.rewritten_pages()
    );
    if failed > 0 {
        pages.push_str(&format!(", {} failed", failed));
    }

    let mut lines = vec![
        pages,
        format!(
            "Images: {} seen, {} responsive, {} skipped",
            report.images(),
            report.responsive_images(),
            report.skipped_images()
        ),
        format!("Cache: {}", report.cache),
    ];
    for page in report.failed() {
        if let PageStatus::Failed { error } = &page.status {
            lines.push(format!("{}FAILED {}: {}", indent(1), page.path, error));
        }
    }
    lines
}

pub fn print_page_event(event: &PageEvent) {
    for line in format_page_event(event) {
        println!("{}", line);
    }
}

pub fn print_site_summary(report: &SiteReport) {
    for line in format_site_summary(report) {
        println!("{}", line);
    }
}
