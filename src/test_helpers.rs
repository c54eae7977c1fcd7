//! Shared test utilities.
//!
//! Fixture writers that build small site trees in a temp directory: real
//! PNG/JPEG files synthesized with the `image` crate, header-only stand-ins
//! for tests that never decode, and HTML pages.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let site = TempDir::new().unwrap();
//! write_png(&site.path().join("pic.png"), 1400, 800);
//! write_page(site.path(), "index.html", r#"<img class="fastimg" src="pic.png">"#);
//! let before = snapshot(site.path());
//! ```

use image::{ImageEncoder, RgbImage};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// PNG signature followed by filler: passes a signature check, fails a decode.
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nnot actually image data";

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
}

/// Write a valid PNG of the given size.
pub fn write_png(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    let img = gradient(width, height);
    let file = fs::File::create(path).unwrap();
    image::codecs::png::PngEncoder::new(std::io::BufWriter::new(file))
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a valid JPEG of the given size.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    let img = gradient(width, height);
    let file = fs::File::create(path).unwrap();
    image::codecs::jpeg::JpegEncoder::new(std::io::BufWriter::new(file))
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a file that only carries a PNG signature. Pair with `MockBackend`.
pub fn write_fake_png(path: &Path) {
    ensure_parent(path);
    fs::write(path, FAKE_PNG).unwrap();
}

/// Write an HTML page into `dir` and return its path.
pub fn write_page(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    ensure_parent(&path);
    fs::write(&path, body).unwrap();
    path
}

/// Every file under `root` with its contents, keyed by root-relative path.
///
/// Two equal snapshots mean nothing in the tree was added, removed or changed.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}
