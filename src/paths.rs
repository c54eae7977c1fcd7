//! Root-relative path handling and directory exclusion.
//!
//! All paths the sweep touches are absolute. [`PathPolicy`] owns the
//! canonical root and the resolved ignore list, and answers three questions:
//! how to show a path to the user, whether a directory is excluded, and where
//! an `<img src>` value points on disk.

use crate::config::ConfigError;
use std::collections::HashSet;
use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PathPolicy {
    root: PathBuf,
    ignored: HashSet<PathBuf>,
}

impl PathPolicy {
    /// Canonicalize `root` and resolve `ignore_dirs` against it.
    ///
    /// Absolute ignore entries are taken as given; relative ones are joined
    /// onto the root. Both are lexically normalized.
    pub fn new(root: &Path, ignore_dirs: &[String]) -> Result<Self, ConfigError> {
        let root = root.canonicalize().map_err(|source| ConfigError::Root {
            path: root.to_path_buf(),
            source,
        })?;
        if !root.is_dir() {
            return Err(ConfigError::RootNotDirectory(root));
        }
        let ignored = ignore_dirs
            .iter()
            .map(|dir| normalize(&root.join(dir.trim())))
            .collect();
        Ok(Self { root, ignored })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolved ignore entries, sorted for display.
    pub fn ignored(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = self.ignored.iter().map(PathBuf::as_path).collect();
        dirs.sort();
        dirs
    }

    /// Exact absolute-path match against the ignore list.
    pub fn is_excluded(&self, dir: &Path) -> bool {
        self.ignored.contains(&normalize(dir))
    }

    /// Root-relative display form, prefixed with a separator (`/blog/pic.png`).
    ///
    /// Paths outside the root are shown in full.
    pub fn display(&self, path: &Path) -> String {
        let path = normalize(path);
        match path.strip_prefix(&self.root) {
            Ok(rel) => format!("{MAIN_SEPARATOR}{}", rel.display()),
            Err(_) => path.display().to_string(),
        }
    }

    /// Map the path part of an `src` value (query and fragment already
    /// stripped) to a filesystem path.
    ///
    /// A leading `/` is site-root relative; anything else is relative to the
    /// page's directory.
    pub fn resolve_reference(&self, page_dir: &Path, src_path: &str) -> PathBuf {
        let joined = match src_path.strip_prefix('/') {
            Some(rest) => self.root.join(rest),
            None => page_dir.join(src_path),
        };
        normalize(&joined)
    }
}

/// Lexical normalization: drops `.` and folds `..` into its parent without
/// touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
