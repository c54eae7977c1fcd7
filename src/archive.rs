//! Per-directory archive of pre-downscale originals.
//!
//! Every directory that holds a converted image gets an archive folder
//! (`imgsource/` by default) next to it. The original is moved there the
//! first time an image of that name is converted:
//!
//! ```text
//! blog/
//! ├── index.html
//! ├── pic.webp          # the converted image, referenced by the page
//! └── imgsource/
//!     └── pic.png       # the original, untouched
//! ```
//!
//! ## Dedup by name
//!
//! An archive entry is never overwritten. If `imgsource/pic.png` already
//! exists, a later `pic.png` in the working directory is deleted without being
//! copied: the first archived copy stays authoritative. This keeps re-runs
//! after an interrupted sweep from clobbering the baseline, but it also means a
//! hand-edited original with an already-archived name is discarded. Dedup
//! looks at file names only, never at content.
//!
//! The existence check and the placement are one atomic no-clobber operation
//! (a hard link, or a temp copy persisted with `persist_noclobber` where links
//! are not supported), so two writers can never both archive the same name.
//! A symlinked original is resolved first: the archive holds the file it
//! points to, never the link.
//!
//! ## Twins
//!
//! `pic.png` and `pic.jpg` in one directory both convert to `pic.webp`. Once
//! one of them is archived, [`SourceArchiver::archived_twin`] finds it, so the
//! other is not converted over its output.

use crate::imaging::is_convertible_extension;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("cannot create archive folder {path}: {source}")]
    CreateFolder { path: PathBuf, source: io::Error },
    #[error("cannot copy original into {path}: {source}")]
    Place { path: PathBuf, source: io::Error },
    #[error("cannot remove original {path}: {source}")]
    RemoveOriginal { path: PathBuf, source: io::Error },
    #[error("cannot restore {path} from the archive: {source}")]
    Restore { path: PathBuf, source: io::Error },
    #[error("{0} held an earlier original; the working copy is gone")]
    NotRestorable(PathBuf),
    #[error("{0} has no parent directory or file name")]
    InvalidPath(PathBuf),
}

/// What happened to the working copy of an original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// Moved into the archive at this path.
    Archived(PathBuf),
    /// An entry of the same name already existed at this path; the working
    /// copy was deleted.
    Discarded(PathBuf),
}

#[derive(Debug, Clone)]
pub struct SourceArchiver {
    folder_name: String,
    remove: fn(&Path) -> io::Result<()>,
}

impl SourceArchiver {
    pub fn new(folder_name: impl Into<String>) -> Self {
        Self {
            folder_name: folder_name.into(),
            remove: |path: &Path| fs::remove_file(path),
        }
    }

    /// Same archiver, removing working copies through `remove`.
    #[cfg(test)]
    pub(crate) fn with_remover(
        folder_name: impl Into<String>,
        remove: fn(&Path) -> io::Result<()>,
    ) -> Self {
        Self {
            remove,
            ..Self::new(folder_name)
        }
    }

    /// Archive folder for images living in `dir`.
    pub fn folder_for(&self, dir: &Path) -> PathBuf {
        dir.join(&self.folder_name)
    }

    /// Where `original` ends up once archived.
    pub fn archive_path(&self, original: &Path) -> Result<PathBuf, ArchiveError> {
        let (dir, name) = split(original)?;
        Ok(self.folder_for(dir).join(name))
    }

    /// Create the archive folder for `dir` if it does not exist yet.
    pub fn ensure_folder(&self, dir: &Path) -> Result<PathBuf, ArchiveError> {
        let folder = self.folder_for(dir);
        fs::create_dir_all(&folder).map_err(|source| ArchiveError::CreateFolder {
            path: folder.clone(),
            source,
        })?;
        Ok(folder)
    }

    /// Move `original` into its directory's archive folder, or delete it when
    /// the archive already holds that name.
    pub fn archive(&self, original: &Path) -> Result<ArchiveOutcome, ArchiveError> {
        let (dir, name) = split(original)?;
        let target = self.ensure_folder(dir)?.join(name);
        let place_err = |source| ArchiveError::Place {
            path: target.clone(),
            source,
        };

        // Link the file itself, not a symlink pointing at it
        let resolved = fs::canonicalize(original).map_err(place_err)?;
        let placed = place_no_clobber(&resolved, &target).map_err(place_err)?;

        (self.remove)(original).map_err(|source| ArchiveError::RemoveOriginal {
            path: original.to_path_buf(),
            source,
        })?;

        Ok(if placed {
            ArchiveOutcome::Archived(target)
        } else {
            ArchiveOutcome::Discarded(target)
        })
    }

    /// Put an archived original back at its working path.
    ///
    /// Only an `Archived` outcome can be undone; a `Discarded` working copy
    /// was deleted without being kept anywhere. An archive entry whose
    /// working path has been taken again is left where it is.
    pub fn restore(&self, original: &Path, outcome: &ArchiveOutcome) -> Result<(), ArchiveError> {
        let entry = match outcome {
            ArchiveOutcome::Archived(entry) => entry,
            ArchiveOutcome::Discarded(entry) => {
                return Err(ArchiveError::NotRestorable(entry.clone()));
            }
        };
        let restore_err = |source| ArchiveError::Restore {
            path: original.to_path_buf(),
            source,
        };
        if place_no_clobber(entry, original).map_err(restore_err)? {
            fs::remove_file(entry).map_err(restore_err)?;
        }
        Ok(())
    }

    /// An archived original other than `original` that converts to the same
    /// output: same stem, different file name, convertible extension.
    pub fn archived_twin(&self, original: &Path) -> Option<PathBuf> {
        let (dir, name) = split(original).ok()?;
        let stem = original.file_stem()?;
        fs::read_dir(self.folder_for(dir))
            .ok()?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .find(|path| {
                path.file_name() != Some(name)
                    && path.file_stem() == Some(stem)
                    && path
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(is_convertible_extension)
            })
    }
}

fn split(path: &Path) -> Result<(&Path, &std::ffi::OsStr), ArchiveError> {
    match (path.parent(), path.file_name()) {
        (Some(dir), Some(name)) => Ok((dir, name)),
        _ => Err(ArchiveError::InvalidPath(path.to_path_buf())),
    }
}

/// Put a copy of `original` at `target` unless `target` exists.
///
/// Returns `false` when an entry was already there.
fn place_no_clobber(original: &Path, target: &Path) -> io::Result<bool> {
    match fs::hard_link(original, target) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        // Links unsupported (FAT, some network mounts) or across devices
        Err(_) => copy_no_clobber(original, target),
    }
}

fn copy_no_clobber(original: &Path, target: &Path) -> io::Result<bool> {
    let folder = target
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "archive target has no parent"))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".thumbsweep-")
        .suffix(".part")
        .tempfile_in(folder)?;
    let mut source = fs::File::open(original)?;
    io::copy(&mut source, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.as_file()
        .set_permissions(fs::metadata(original)?.permissions())?;

    match tmp.persist_noclobber(target) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.error),
    }
}
