//! Image processing in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Sniff** | magic-byte match on the first 12 bytes |
//! | **Identify** | `ImageReader::into_dimensions` |
//! | **Resize → WebP** | Lanczos3 + lossless WebP encoder |
//!
//! The module is split into:
//! - **Format**: signature detection and the convertible/target extensions
//! - **Calculations**: pure dimension math (unit testable)
//! - **Parameters**: data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
pub mod format;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_downscale, calculate_scaled_height};
pub use format::{RasterFormat, TARGET_EXTENSION, is_convertible_extension};
pub use params::ResizeParams;
pub use rust_backend::RustBackend;
