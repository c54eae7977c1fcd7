//! Rewriting one HTML page.
//!
//! All marker-classed references of a page are collected first, then each
//! distinct image goes through the pipeline once. Every reference to an image
//! that was transformed gets its `src` extension swapped, and the page is
//! written exactly once at the end, and only when something changed.
//!
//! The write goes to a temporary file next to the page which then replaces
//! it, so a page is never left half written. If that fails, the images
//! converted for this page are reverted; any that cannot be are named in
//! [`PageError::Write`].
//!
//! A reference to an image that an earlier page (or run) already converted
//! no longer resolves. When the archive holds its original and the `.webp`
//! sits in its place, the reference is relinked to the `.webp`.

use crate::html::{
    ImageReference, Substitution, UnresolvedReference, apply_substitutions, scan_page,
    swap_extension,
};
use crate::imaging::{ImageBackend, TARGET_EXTENSION};
use crate::paths::PathPolicy;
use crate::thumbnail::{ImageOutcome, SkipReason, ThumbnailPipeline};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("{0} is not valid UTF-8")]
    NotUtf8(PathBuf),
    /// The page is unchanged. `unlinked` lists converted images that could
    /// not be put back, so the page still names their missing originals.
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: io::Error,
        unlinked: Vec<PathBuf>,
    },
}

/// What happened to one reference of the page.
#[derive(Debug)]
pub enum ReferenceResult {
    Unresolved(UnresolvedReference),
    /// The image was converted before; the reference now names `output`.
    Relinked {
        src: String,
        image: PathBuf,
        output: PathBuf,
    },
    /// First reference to `image` on this page. Later references to the same
    /// file reuse this outcome and are not reported again.
    Evaluated {
        src: String,
        image: PathBuf,
        outcome: ImageOutcome,
    },
}

#[derive(Debug)]
pub struct PageOutcome {
    pub results: Vec<ReferenceResult>,
    /// `src` values swapped (or, in a dry run, that would be).
    pub substitutions: usize,
    pub written: bool,
}

pub struct PageRewriter<'a, B: ImageBackend> {
    pipeline: &'a ThumbnailPipeline<'a, B>,
    policy: &'a PathPolicy,
    markers: &'a [String],
    dry_run: bool,
}

impl<'a, B: ImageBackend> PageRewriter<'a, B> {
    pub fn new(
        pipeline: &'a ThumbnailPipeline<'a, B>,
        policy: &'a PathPolicy,
        markers: &'a [String],
        dry_run: bool,
    ) -> Self {
        Self {
            pipeline,
            policy,
            markers,
            dry_run,
        }
    }

    pub fn rewrite(&self, page: &Path) -> Result<PageOutcome, PageError> {
        let bytes = fs::read(page).map_err(|source| PageError::Read {
            path: page.to_path_buf(),
            source,
        })?;
        let html = String::from_utf8(bytes).map_err(|_| PageError::NotUtf8(page.to_path_buf()))?;
        let page_dir = page.parent().unwrap_or(self.policy.root());

        // Resolve everything before touching any image: once an original is
        // archived, a later tag naming it would no longer resolve.
        let references: Vec<Result<ImageReference, UnresolvedReference>> =
            scan_page(&html, page_dir, self.policy, self.markers).collect();

        let mut results = Vec::new();
        let mut substitutes: HashMap<PathBuf, bool> = HashMap::new();
        let mut substitutions = Vec::new();

        for reference in references {
            let reference = match reference {
                Ok(r) => r,
                Err(unresolved) => {
                    results.push(self.relink(unresolved, &mut substitutions));
                    continue;
                }
            };
            let replacement = swap_extension(&reference.src, TARGET_EXTENSION);

            let substitute = match substitutes.get(&reference.path) {
                Some(&s) => s,
                None => {
                    let outcome = if replacement.is_some() {
                        self.pipeline.process(&reference.path, self.dry_run)
                    } else {
                        // The value itself could not be rewritten, so the file stays
                        ImageOutcome::Skipped(SkipReason::UnsupportedExtension)
                    };
                    let s = outcome.substitutes();
                    substitutes.insert(reference.path.clone(), s);
                    results.push(ReferenceResult::Evaluated {
                        src: reference.src.clone(),
                        image: reference.path.clone(),
                        outcome,
                    });
                    s
                }
            };

            if let (true, Some(replacement)) = (substitute, replacement) {
                substitutions.push(Substitution {
                    span: reference.src_span,
                    replacement,
                });
            }
        }

        let written = !self.dry_run && !substitutions.is_empty();
        if written {
            if let Err(source) = write_atomically(page, &apply_substitutions(&html, &substitutions)) {
                return Err(PageError::Write {
                    path: page.to_path_buf(),
                    source,
                    unlinked: self.revert(&results),
                });
            }
        }

        Ok(PageOutcome {
            results,
            substitutions: substitutions.len(),
            written,
        })
    }

    /// Turn a missing reference whose image was already converted into a
    /// substitution; anything else stays unresolved.
    fn relink(
        &self,
        unresolved: UnresolvedReference,
        substitutions: &mut Vec<Substitution>,
    ) -> ReferenceResult {
        let (src, path, src_span) = match unresolved {
            UnresolvedReference::Missing {
                src,
                path,
                src_span,
            } => (src, path, src_span),
            other => return ReferenceResult::Unresolved(other),
        };
        match (
            self.pipeline.converted_output(&path),
            swap_extension(&src, TARGET_EXTENSION),
        ) {
            (Some(output), Some(replacement)) => {
                substitutions.push(Substitution {
                    span: src_span,
                    replacement,
                });
                ReferenceResult::Relinked {
                    src,
                    image: path,
                    output,
                }
            }
            _ => ReferenceResult::Unresolved(UnresolvedReference::Missing {
                src,
                path,
                src_span,
            }),
        }
    }

    /// Undo the conversions made for a page that could not be written.
    /// Returns the originals that could not be put back.
    fn revert(&self, results: &[ReferenceResult]) -> Vec<PathBuf> {
        results
            .iter()
            .filter_map(|result| match result {
                ReferenceResult::Evaluated {
                    outcome: ImageOutcome::Transformed { plan, archive },
                    ..
                } => self
                    .pipeline
                    .revert(plan, archive)
                    .err()
                    .map(|_| plan.source.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Replace `page` with `contents` through a temporary file in its directory.
/// A symlinked page is written through to its target.
fn write_atomically(page: &Path, contents: &str) -> io::Result<()> {
    let target = fs::canonicalize(page)?;
    let dir = target
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "page has no parent"))?;
    let permissions = fs::metadata(&target)?.permissions();

    let mut tmp = tempfile::Builder::new()
        .prefix(".thumbsweep-")
        .suffix(".part")
        .tempfile_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.as_file().set_permissions(permissions)?;
    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}
