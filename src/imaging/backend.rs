//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the narrow seam between the sweep and the
//! codec: sniff, identify, resize. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend); tests use
//! [`tests::MockBackend`].

use super::format::{RasterFormat, sniff_file};
use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Identify the raster format from the file's magic bytes.
    ///
    /// Never fails: unreadable files are simply unrecognized.
    fn sniff(&self, path: &Path) -> Option<RasterFormat> {
        sniff_file(path)
    }

    /// Get image dimensions. Only called after [`sniff`](Self::sniff) matched.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode, resize to exactly the requested size and encode to the output
    /// path. The output path is either fully written or left untouched.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
