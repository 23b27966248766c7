//! Rendered-site discovery.
//!
//! Walks the rendered site and returns every page the transform applies to,
//! sorted so builds process (and report) pages in a stable order. The
//! derivative output directory usually sits inside the site; it is pruned
//! from the walk. Symlinks are followed. An entry that cannot be read is
//! logged and skipped; the rest of the site is still returned.

use crate::transform::is_html_output;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("site directory not found: {}", .0.display())]
    SiteNotFound(PathBuf),
}

/// Collect HTML pages under `root`, skipping everything under `skip_dir`.
pub fn scan_site(root: &Path, skip_dir: Option<&Path>) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::SiteNotFound(root.to_path_buf()));
    }

    let mut pages = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| !skip_dir.is_some_and(|skip| entry.path().starts_with(skip)));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable site entry");
                continue;
            }
        };
        if entry.file_type().is_file() && is_html_output(entry.path()) {
            pages.push(entry.into_path());
        }
    }
    pages.sort();
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn finds_html_pages_sorted() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "posts/b/index.html");
        touch(tmp.path(), "index.html");
        touch(tmp.path(), "posts/a/index.html");
        touch(tmp.path(), "about.HTM");

        let pages = scan_site(tmp.path(), None).unwrap();
        let relative: Vec<_> = pages
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("about.HTM"),
                PathBuf::from("index.html"),
                PathBuf::from("posts/a/index.html"),
                PathBuf::from("posts/b/index.html"),
            ]
        );
    }

    #[test]
    fn ignores_non_html_outputs() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "feed.xml");
        touch(tmp.path(), "style.css");
        touch(tmp.path(), "index.html");

        let pages = scan_site(tmp.path(), None).unwrap();
        assert_eq!(pages, vec![tmp.path().join("index.html")]);
    }

    #[test]
    fn skips_image_output_dir() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "index.html");
        touch(tmp.path(), "img/stray.html");
        touch(tmp.path(), "img/a-716.webp");

        let pages = scan_site(tmp.path(), Some(&tmp.path().join("img"))).unwrap();
        assert_eq!(pages, vec![tmp.path().join("index.html")]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_entry_does_not_hide_other_pages() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "index.html");
        touch(tmp.path(), "posts/a/index.html");
        std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("dangling.html"))
            .unwrap();

        let pages = scan_site(tmp.path(), None).unwrap();
        assert_eq!(
            pages,
            vec![
                tmp.path().join("index.html"),
                tmp.path().join("posts/a/index.html"),
            ]
        );
    }

    #[test]
    fn missing_site_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = scan_site(&tmp.path().join("_site"), None);
        assert!(matches!(result, Err(ScanError::SiteNotFound(_))));
    }
}
