//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, GIF, BMP, TIFF, WebP) | `image` crate, format guessed from content |
//! | Identify | `ImageReader::into_dimensions` (header only, no pixel decode) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Atomic output | `tempfile::NamedTempFile` in the target directory, persisted on success |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::format::TARGET_EXTENSION;
use super::params::ResizeParams;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader};
use std::fs::Permissions;
use std::io::Write;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn open_reader(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)
}

/// Load and decode an image from disk. The format comes from the file's
/// content, not its extension.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    open_reader(path)?.decode().map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
    })
}

/// Encode a DynamicImage for the given path, inferring format from extension.
///
/// The encoded bytes go to a temporary file next to `path`, which replaces
/// `path` only once everything succeeded. On any error the temporary file is
/// dropped and `path` is left as it was.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    permissions: Option<Permissions>,
) -> Result<(), BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let bytes = match ext.as_str() {
        TARGET_EXTENSION => encode_webp(img)?,
        other => {
            return Err(BackendError::ProcessingFailed(format!(
                "Unsupported output format: {}",
                other
            )));
        }
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".thumbsweep-")
        .suffix(".part")
        .tempfile_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    if let Some(permissions) = permissions {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.persist(path).map_err(|e| BackendError::Io(e.error))?;
    Ok(())
}

/// Encode as lossless WebP, keeping an alpha channel only when the source has one.
fn encode_webp(img: &DynamicImage) -> Result<Vec<u8>, BackendError> {
    let mut bytes = Vec::new();
    let encoder = WebPEncoder::new_lossless(&mut bytes);
    let result = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        encoder.write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )
    } else {
        let rgb = img.to_rgb8();
        encoder.write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
    };
    result.map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {}", e)))?;
    Ok(bytes)
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = open_reader(path)?.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        // The output is served next to the original, so it gets the same mode bits
        let permissions = std::fs::metadata(&params.source)
            .ok()
            .map(|m| m.permissions());
        save_image(&resized, &params.output, permissions)
    }
}
