//! Page transform: every `<img>` becomes lazy, managed ones become responsive.
//!
//! The page is streamed through [`lol_html`]. Each call owns its rewriter and
//! output buffer, so transforms of different pages never share a document and
//! a [`Transformer`] can be used from many threads at once. Everything except
//! `<img>` start tags is passed through byte for byte.
//!
//! Per image:
//!
//! 1. `loading="lazy"` is set (overwriting any existing value).
//! 2. The `src` has its character references decoded (`&amp;` is `&`) and
//!    is resolved by the [`EligibilityResolver`]. Unmanaged images are done.
//! 3. Managed images go through the [`DerivativeGenerator`] and the
//!    [`MarkupSynthesizer`], and the element is replaced by the result.
//!
//! A missing or unsupported source is logged and recorded in the
//! [`PageReport`]; the element keeps its original attributes plus the lazy
//! hint. Only a rewriter failure fails the page.

use crate::cache::CacheStats;
use crate::config::SiteConfig;
use crate::eligibility::{Eligibility, EligibilityResolver};
use crate::imaging::{ImageBackend, RustBackend};
use crate::markup::{MarkupSynthesizer, SizingPolicy};
use crate::process::{DerivativeGenerator, GeneratorConfig};
use html_escape::decode_html_entities;
use lol_html::html_content::{ContentType, Element};
use lol_html::{HandlerResult, RewriteStrSettings, element, rewrite_str};
use serde::Serialize;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("malformed markup in {}: {reason}", .path.display())]
    MalformedMarkup { path: PathBuf, reason: String },
}

/// What happened to the images of one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageReport {
    /// `<img>` elements seen, in document order.
    pub images: u32,
    pub rewritten: Vec<RewrittenImage>,
    pub skipped: Vec<SkippedImage>,
    pub cache: CacheStats,
}

impl PageReport {
    /// Images that only received the lazy-loading hint.
    pub fn untouched(&self) -> u32 {
        self.images - self.rewritten.len() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewrittenImage {
    pub src: String,
    /// Derivatives referenced by the replacement markup.
    pub variants: usize,
}

/// A managed image that was left in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedImage {
    pub src: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct TransformedPage {
    pub html: String,
    pub report: PageReport,
}

/// True when `output_path` names an HTML document.
pub fn is_html_output(output_path: &Path) -> bool {
    output_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
        .unwrap_or(false)
}

/// Rewrites pages. Collaborators are injected; nothing is global.
pub struct Transformer<B: ImageBackend = RustBackend> {
    resolver: EligibilityResolver,
    generator: DerivativeGenerator<B>,
    synthesizer: MarkupSynthesizer,
}

impl Transformer<RustBackend> {
    /// Wire up the production collaborators from config.
    pub fn from_site_config(config: &SiteConfig) -> Self {
        Self::new(
            EligibilityResolver::new(config.assets.prefix.clone(), &config.assets.root),
            DerivativeGenerator::new(GeneratorConfig::from_site_config(config)),
            MarkupSynthesizer::new(SizingPolicy::from_site_config(config)),
        )
    }
}

impl<B: ImageBackend> Transformer<B> {
    pub fn new(
        resolver: EligibilityResolver,
        generator: DerivativeGenerator<B>,
        synthesizer: MarkupSynthesizer,
    ) -> Self {
        Self {
            resolver,
            generator,
            synthesizer,
        }
    }

    pub fn generator(&self) -> &DerivativeGenerator<B> {
        &self.generator
    }

    /// Transform one rendered page destined for `output_path`.
    ///
    /// Non-HTML outputs are returned unchanged with an empty report.
    pub fn transform(
        &self,
        html: &str,
        output_path: &Path,
    ) -> Result<TransformedPage, TransformError> {
        if !is_html_output(output_path) {
            return Ok(TransformedPage {
                html: html.to_string(),
                report: PageReport::default(),
            });
        }

        let report = RefCell::new(PageReport::default());

        let rewritten = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![element!("img", |el| {
                    self.rewrite_image(el, &mut report.borrow_mut())
                })],
                ..RewriteStrSettings::default()
            },
        )
        .map_err(|err| TransformError::MalformedMarkup {
            path: output_path.to_path_buf(),
            reason: err.to_string(),
        })?;

        Ok(TransformedPage {
            html: rewritten,
            report: report.into_inner(),
        })
    }

    /// The bare string-in, string-out form of [`transform`](Self::transform).
    pub fn transform_str(&self, html: &str, output_path: &Path) -> Result<String, TransformError> {
        self.transform(html, output_path).map(|page| page.html)
    }

    fn rewrite_image(&self, el: &mut Element<'_, '_>, report: &mut PageReport) -> HandlerResult {
        report.images += 1;
        el.set_attribute("loading", "lazy")?;

        let Some(src) = el.get_attribute("src") else {
            return Ok(());
        };
        // lol_html hands attribute values over as written in the page.
        let source = match self.resolver.resolve(&decode_html_entities(&src)) {
            Eligibility::Managed(source) => source,
            Eligibility::Unmanaged => return Ok(()),
        };

        let ensured = match self.generator.ensure(&source) {
            Ok(ensured) => ensured,
            Err(err) => {
                warn!(%src, error = %err, "leaving image unmodified");
                report.skipped.push(SkippedImage {
                    src,
                    reason: err.to_string(),
                });
                return Ok(());
            }
        };
        report.cache.merge(&ensured.stats);

        let alt = el.get_attribute("alt");
        match self.synthesizer.build(&ensured.artifacts, alt.as_deref()) {
            Some(markup) => {
                el.replace(&markup.into_string(), ContentType::Html);
                debug!(%src, variants = ensured.artifacts.len(), stats = %ensured.stats, "image rewritten");
                report.rewritten.push(RewrittenImage {
                    src,
                    variants: ensured.artifacts.len(),
                });
            }
            None => {
                warn!(%src, "no derivatives produced, leaving image unmodified");
                report.skipped.push(SkippedImage {
                    src,
                    reason: "no derivatives produced".to_string(),
                });
            }
        }
        Ok(())
    }
}
