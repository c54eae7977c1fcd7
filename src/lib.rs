//! # thumbsweep
//!
//! Downsizes oversized images on a live website tree, in place.
//!
//! Pages opt images in with a marker class. Every marked `<img>` whose file is
//! wider than the target width gets a WebP copy at exactly that width, the
//! original moves into a per-directory archive folder, and the page's `src`
//! is switched to the new file:
//!
//! ```text
//! before                               after
//! site/                                site/
//! ├── index.html                       ├── index.html   src="pic.webp"
//! │   <img class="fastimg"             ├── pic.webp     700x400
//! │        src="pic.png">              └── imgsource/
//! └── pic.png      1400x800                └── pic.png  1400x800, untouched
//! ```
//!
//! There is no build directory and no cache. The tree is the state: a second
//! run finds only `.webp` references and archived originals, and changes
//! nothing.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`sweep`] | Depth-first walk, per-page dispatch, progress events, run summary |
//! | [`page`] | Evaluates every reference of one page, then rewrites it once |
//! | [`html`] | Finds marker-classed `<img>` tags, resolves `src`, swaps extensions by byte span |
//! | [`thumbnail`] | Per-image probe, decide, resize and archive with rollback |
//! | [`archive`] | Per-directory archive of originals, atomic no-clobber by name |
//! | [`imaging`] | Signature sniffing, dimension math, the `image`-crate backend |
//! | [`paths`] | Canonical root, exclusion list, display paths, `src` resolution |
//! | [`config`] | `thumbsweep.toml` loading, merging, CLI overrides, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Text In, Text Out
//!
//! Pages are never parsed into a DOM and serialized back. Scanning records
//! byte spans and only the `src` value of a transformed reference is
//! replaced, so indentation, attribute order, entity encoding and everything
//! else in the file come through unchanged.
//!
//! ## One Write Per Page
//!
//! All references of a page are evaluated before the page is written, and it
//! is written only when at least one `src` changed. The new text goes to a
//! temporary file that replaces the page, so each page is either untouched or
//! fully rewritten. When that replacement fails, the images converted for the
//! page are put back.
//!
//! ## Consistency Over Completeness
//!
//! A failed image keeps its original and its reference. When the original
//! cannot be archived, the freshly written `.webp` is deleted again. The tree
//! never points a page at a file that is missing, and never holds both a new
//! output and a working original for the same image.

pub mod archive;
pub mod config;
pub mod html;
pub mod imaging;
pub mod output;
pub mod page;
pub mod paths;
pub mod sweep;
pub mod thumbnail;

#[cfg(test)]
pub(crate) mod test_helpers;
