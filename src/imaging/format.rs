//! Raster format detection by magic bytes, and the extension rules that go
//! with it.
//!
//! The signature check runs before any decode: a file whose header does not
//! match a known raster format is never handed to a decoder.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes read from the start of a file for signature matching.
pub const HEADER_LEN: usize = 12;

/// Extension written for every converted image.
pub const TARGET_EXTENSION: &str = "webp";

/// Source extensions eligible for conversion. Matching is case-insensitive.
pub const CONVERTIBLE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff"];

const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// A raster format recognized from its signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    WebP,
}

impl RasterFormat {
    /// Match a file header against the known signatures.
    pub fn from_header(header: &[u8]) -> Option<Self> {
        if header.starts_with(PNG_MAGIC) {
            Some(Self::Png)
        } else if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if header.starts_with(b"GIF87a") || header.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if header.starts_with(b"II*\0") || header.starts_with(b"MM\0*") {
            Some(Self::Tiff)
        } else if header.len() >= 12 && &header[0..4] == b"RIFF" && &header[8..12] == b"WEBP" {
            Some(Self::WebP)
        } else if header.starts_with(b"BM") && header.len() >= 6 {
            Some(Self::Bmp)
        } else {
            None
        }
    }
}

/// Read the header of `path` and identify its format.
///
/// Any I/O failure (missing file, permission denied, short read) yields
/// `None`; errors never escape this check.
pub fn sniff_file(path: &Path) -> Option<RasterFormat> {
    let file = File::open(path).ok()?;
    let mut header = Vec::with_capacity(HEADER_LEN);
    file.take(HEADER_LEN as u64)
        .read_to_end(&mut header)
        .ok()?;
    RasterFormat::from_header(&header)
}

/// Whether `ext` (without the dot) names a convertible source format.
pub fn is_convertible_extension(ext: &str) -> bool {
    CONVERTIBLE_EXTENSIONS
        .iter()
        .any(|c| c.eq_ignore_ascii_case(ext))
}
