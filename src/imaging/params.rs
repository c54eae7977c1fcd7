//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how*. They are the interface
//! between the thumbnail pipeline (which decides what to create) and the
//! [`backend`](super::backend) (which does the pixel work).

use std::path::PathBuf;

/// Parameters for a resize-and-encode operation.
///
/// The output format follows the output path's extension.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}
