//! Responsive markup synthesis.
//!
//! Turns an [`ArtifactSet`] into the element that replaces a managed `<img>`.
//! Uses [maud](https://maud.lambda.xyz/) like the rest of the crate's HTML.
//!
//! With several formats the result is a `<picture>`: one `<source>` per
//! alternative format, in configured order, followed by the fallback `<img>`.
//! With a single format it is the `<img>` alone.
//!
//! ```html
//! <picture>
//!   <source type="image/webp" srcset="/img/a-716.webp 716w, /img/a-800.webp 800w" sizes="...">
//!   <img class="image" alt="..." src="/img/a-716.jpeg" width="800" height="600"
//!        srcset="/img/a-716.jpeg 716w, /img/a-800.jpeg 800w" sizes="..."
//!        loading="lazy" decoding="async">
//! </picture>
//! ```

use crate::config::SiteConfig;
use crate::types::{ArtifactSet, FormatGroup};
use maud::{Markup, PreEscaped, html};

/// The `sizes` descriptor and class applied to every synthesized element.
#[derive(Debug, Clone)]
pub struct SizingPolicy {
    pub sizes: String,
    pub class: String,
}

impl SizingPolicy {
    pub fn from_site_config(config: &SiteConfig) -> Self {
        Self {
            sizes: config.markup.sizes.clone(),
            class: config.markup.class.clone(),
        }
    }
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self::from_site_config(&SiteConfig::default())
    }
}

/// Builds replacement markup. Pure; holds only the sizing policy.
#[derive(Debug, Clone, Default)]
pub struct MarkupSynthesizer {
    policy: SizingPolicy,
}

impl MarkupSynthesizer {
    pub fn new(policy: SizingPolicy) -> Self {
        Self { policy }
    }

    /// Render the responsive element for `artifacts`.
    ///
    /// `alt` is the attribute value exactly as it appeared in the page
    /// (entities left encoded); it is carried over verbatim and rendered as
    /// `alt=""` when absent. Returns `None` when there is nothing to render.
    pub fn build(&self, artifacts: &ArtifactSet, alt: Option<&str>) -> Option<Markup> {
        let fallback = artifacts.fallback()?;
        let img = self.fallback_img(fallback, alt.unwrap_or(""))?;

        let alternatives: Vec<&FormatGroup> = artifacts
            .alternatives()
            .iter()
            .filter(|group| !group.artifacts.is_empty())
            .collect();

        if alternatives.is_empty() {
            return Some(img);
        }

        Some(html! {
            picture {
                @for group in alternatives {
                    source
                        type=(group.format.mime_type())
                        srcset=(srcset(group))
                        sizes=(self.policy.sizes);
                }
                (img)
            }
        })
    }

    fn fallback_img(&self, group: &FormatGroup, alt: &str) -> Option<Markup> {
        let smallest = group.smallest()?;
        let largest = group.largest()?;
        let class = (!self.policy.class.is_empty()).then_some(self.policy.class.as_str());

        Some(html! {
            img
                class=[class]
                alt=(PreEscaped(escape_quotes(alt)))
                src=(smallest.url)
                width=(largest.width)
                height=(largest.height)
                srcset=(srcset(group))
                sizes=(self.policy.sizes)
                loading="lazy"
                decoding="async";
        })
    }
}

/// `url 716w, url 800w` in ascending width.
pub fn srcset(group: &FormatGroup) -> String {
    group
        .artifacts
        .iter()
        .map(|a| format!("{} {}w", a.url, a.width))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_quotes(raw: &str) -> String {
    raw.replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DerivativeArtifact, OutputFormat};

    const SIZES: &str = "(min-width: 832px) 800px, 100vw";

    fn artifact(stem: &str, width: u32, format: OutputFormat) -> DerivativeArtifact {
        let filename = format!("{}-{}.{}", stem, width, format.extension());
        DerivativeArtifact {
            format,
            width,
            height: width * 3 / 4,
            url: format!("/img/{filename}"),
            filename,
        }
    }

    fn group(stem: &str, widths: &[u32], format: OutputFormat) -> FormatGroup {
        FormatGroup {
            format,
            artifacts: widths.iter().map(|&w| artifact(stem, w, format)).collect(),
        }
    }

    fn set(widths: &[u32], formats: &[OutputFormat]) -> ArtifactSet {
        ArtifactSet {
            natural_width: 2000,
            natural_height: 1500,
            groups: formats.iter().map(|&f| group("image-one", widths, f)).collect(),
        }
    }

    fn render(artifacts: &ArtifactSet, alt: Option<&str>) -> String {
        MarkupSynthesizer::default()
            .build(artifacts, alt)
            .unwrap()
            .into_string()
    }

    #[test]
    fn webp_and_jpeg_become_picture() {
        let html = render(
            &set(&[716, 800, 1600], &[OutputFormat::Webp, OutputFormat::Jpeg]),
            Some("A desk"),
        );

        assert_eq!(
            html,
            format!(
                concat!(
                    r#"<picture>"#,
                    r#"<source type="image/webp" "#,
                    r#"srcset="/img/image-one-716.webp 716w, /img/image-one-800.webp 800w, /img/image-one-1600.webp 1600w" "#,
                    r#"sizes="{sizes}">"#,
                    r#"<img class="image" alt="A desk" src="/img/image-one-716.jpeg" width="1600" height="1200" "#,
                    r#"srcset="/img/image-one-716.jpeg 716w, /img/image-one-800.jpeg 800w, /img/image-one-1600.jpeg 1600w" "#,
                    r#"sizes="{sizes}" loading="lazy" decoding="async">"#,
                    r#"</picture>"#,
                ),
                sizes = SIZES
            )
        );
    }

    #[test]
    fn sources_follow_configured_order() {
        let html = render(
            &set(
                &[716, 800],
                &[OutputFormat::Avif, OutputFormat::Webp, OutputFormat::Jpeg],
            ),
            None,
        );
        let avif = html.find(r#"type="image/avif""#).unwrap();
        let webp = html.find(r#"type="image/webp""#).unwrap();
        let img = html.find("<img").unwrap();
        assert!(avif < webp && webp < img);
        assert!(!html.contains(r#"type="image/jpeg""#));
    }

    #[test]
    fn single_format_is_plain_img() {
        let html = render(&set(&[716, 800], &[OutputFormat::Jpeg]), Some("x"));
        assert!(html.starts_with("<img "));
        assert!(!html.contains("<picture>"));
        assert!(html.contains(r#"srcset="/img/image-one-716.jpeg 716w, /img/image-one-800.jpeg 800w""#));
    }

    #[test]
    fn single_artifact_keeps_width_descriptor_and_sizes() {
        let html = render(&set(&[716], &[OutputFormat::Webp, OutputFormat::Jpeg]), None);
        assert!(html.contains(&format!(
            r#"<source type="image/webp" srcset="/img/image-one-716.webp 716w" sizes="{SIZES}">"#
        )));
        let img = &html[html.find("<img").unwrap()..];
        assert!(img.contains(r#"srcset="/img/image-one-716.jpeg 716w""#));
        assert!(img.contains(&format!(r#"sizes="{SIZES}""#)));
        assert!(img.contains(r#"src="/img/image-one-716.jpeg""#));
        assert!(img.contains(r#"width="716" height="537""#));
    }

    #[test]
    fn missing_alt_renders_empty_alt() {
        let html = render(&set(&[716], &[OutputFormat::Jpeg]), None);
        assert!(html.contains(r#"alt="""#));
    }

    #[test]
    fn alt_quotes_are_escaped() {
        let html = render(&set(&[716], &[OutputFormat::Jpeg]), Some(r#"the "desk""#));
        assert!(html.contains(r#"alt="the &quot;desk&quot;""#));
    }

    #[test]
    fn alt_entities_pass_through_verbatim() {
        let html = render(&set(&[716], &[OutputFormat::Jpeg]), Some("Tom &amp; Jerry"));
        assert!(html.contains(r#"alt="Tom &amp; Jerry""#));
    }

    #[test]
    fn lazy_and_async_hints_always_present() {
        for formats in [&[OutputFormat::Jpeg][..], &[OutputFormat::Webp, OutputFormat::Jpeg]] {
            let html = render(&set(&[716, 800], formats), None);
            assert!(html.contains(r#"loading="lazy""#));
            assert!(html.contains(r#"decoding="async""#));
        }
    }

    #[test]
    fn custom_policy_applies() {
        let synth = MarkupSynthesizer::new(SizingPolicy {
            sizes: "100vw".into(),
            class: String::new(),
        });
        let html = synth
            .build(&set(&[400, 800], &[OutputFormat::Png]), None)
            .unwrap()
            .into_string();
        assert!(html.contains(r#"sizes="100vw""#));
        assert!(!html.contains("class="));
    }

    #[test]
    fn empty_set_renders_nothing() {
        let empty = ArtifactSet {
            natural_width: 10,
            natural_height: 10,
            groups: vec![],
        };
        assert!(MarkupSynthesizer::default().build(&empty, None).is_none());

        let empty_group = ArtifactSet {
            natural_width: 10,
            natural_height: 10,
            groups: vec![group("a", &[], OutputFormat::Jpeg)],
        };
        assert!(MarkupSynthesizer::default().build(&empty_group, None).is_none());
    }

    #[test]
    fn srcset_lists_ascending_widths() {
        let g = group("a", &[716, 800], OutputFormat::Webp);
        assert_eq!(srcset(&g), "/img/a-716.webp 716w, /img/a-800.webp 800w");
    }

    #[test]
    fn srcset_of_one_artifact_has_descriptor() {
        let g = group("a", &[716], OutputFormat::Webp);
        assert_eq!(srcset(&g), "/img/a-716.webp 716w");
    }
}
