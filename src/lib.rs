//! # srcsetter
//!
//! A build-time HTML transform for static sites. After pages are rendered,
//! every `<img>` gets `loading="lazy"`, and images stored next to the posts are
//! replaced by responsive `<picture>` markup backed by derivatives generated
//! at several widths and encodings.
//!
//! # Architecture
//!
//! ```text
//!   rendered page ──► Transformer ──► rewritten page
//!                        │
//!          <img src> ────┼──► EligibilityResolver   managed? source path
//!                        ├──► DerivativeGenerator   ensure files on disk
//!                        │        └─ naming         deterministic filenames
//!                        └──► MarkupSynthesizer     <picture> / <img srcset>
//! ```
//!
//! The [`transform::Transformer`] receives its three collaborators at
//! construction; nothing is registered globally. A site build
//! ([`pipeline::build_site`]) shares one transformer across a rayon pool.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`eligibility`] | Decodes `src` and decides whether it names a managed source image |
//! | [`naming`] | `(source, width, format)` → derivative filename |
//! | [`process`] | Derivative generator: plans widths, encodes what's missing |
//! | [`cache`] | Derivative keys, single-flight, cache statistics |
//! | [`imaging`] | Pure-Rust image operations: identify, resize, encode, publish |
//! | [`markup`] | Responsive markup synthesis with Maud |
//! | [`transform`] | Per-page rewrite with `lol_html` |
//! | [`scan`] | Finds the HTML pages of a rendered site |
//! | [`pipeline`] | Parallel whole-site build with per-page reports |
//! | [`config`] | `srcsetter.toml` loading, merging, validation |
//! | [`types`] | Output formats and derivative artifacts |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Filesystem Is the Cache
//!
//! Derivative filenames are a pure function of source path, width and format,
//! so a file with the right name is a finished derivative. There is no
//! manifest to go stale. Within a run, concurrent requests for the same
//! derivative are collapsed, and every encode is written to a temp file and
//! renamed into place so no reader ever sees a partial image.
//!
//! ## Streaming Rewrites
//!
//! Pages are not parsed into a DOM. `lol_html` streams them and only `<img>`
//! start tags are touched; everything else is passed through byte for byte.
//! That keeps transforms of different pages fully independent and makes a
//! second run over already-transformed output a no-op.
//!
//! ## Bad Images Don't Break Pages
//!
//! A missing or unsupported source leaves its `<img>` as it was (plus the lazy
//! hint) and is logged and reported. Only a page that cannot be rewritten at
//! all fails, and it fails alone.

pub mod cache;
pub mod config;
pub mod eligibility;
pub mod imaging;
pub mod markup;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod scan;
pub mod transform;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
