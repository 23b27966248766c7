//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Resize → WebP/JPEG/PNG/AVIF** | Lanczos3 + `image` codecs |
//! | **Publish** | `tempfile` staging file + atomic rename |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{DerivativeSize, calculate_derivative_sizes};
pub use operations::{create_derivative, get_dimensions, plan_sizes};
pub use params::{Quality, ResizeParams};
pub use rust_backend::{RustBackend, is_supported_source, supported_input_extensions};
