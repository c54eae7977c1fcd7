//! Sweep configuration.
//!
//! Settings come from three layers, each overriding the previous one:
//!
//! 1. Stock defaults ([`SweepConfig::default`])
//! 2. An optional `thumbsweep.toml` in the site root (or the file passed with
//!    `--config`)
//! 3. Command-line flags ([`ConfigOverrides`])
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! marker_classes = ["fastimg"]               # <img> classes that opt an image in
//! ignore_dirs = [".git", "profile", "gameitem"]  # relative to the root, or absolute
//! archive_folder = "imgsource"               # per-directory home of the originals
//! target_width = 700                         # threshold and resize target, in px
//! page_extensions = ["html"]                 # which files are scanned as pages
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys are
//! rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the site root.
pub const CONFIG_FILENAME: &str = "thumbsweep.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Root directory {path} is not usable: {source}")]
    Root {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Root {0} is not a directory")]
    RootNotDirectory(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Everything a sweep needs to know besides the root directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// CSS classes that flag an `<img>` for processing (case-insensitive).
    pub marker_classes: Vec<String>,
    /// Directories never descended into. Relative entries are resolved against
    /// the root; only that exact location is skipped.
    pub ignore_dirs: Vec<String>,
    /// Name of the per-directory folder that receives pre-downscale originals.
    pub archive_folder: String,
    /// Images wider than this are downscaled to exactly this width.
    pub target_width: u32,
    /// File extensions treated as HTML pages (case-insensitive, no dot).
    pub page_extensions: Vec<String>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            marker_classes: vec!["fastimg".to_string()],
            ignore_dirs: vec![
                ".git".to_string(),
                "profile".to_string(),
                "gameitem".to_string(),
            ],
            archive_folder: "imgsource".to_string(),
            target_width: 700,
            page_extensions: vec!["html".to_string()],
        }
    }
}

impl SweepConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_width == 0 {
            return Err(ConfigError::Validation(
                "target_width must be greater than 0".into(),
            ));
        }
        if self.marker_classes.is_empty() {
            return Err(ConfigError::Validation(
                "marker_classes must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .marker_classes
            .iter()
            .find(|m| m.is_empty() || m.chars().any(char::is_whitespace))
        {
            return Err(ConfigError::Validation(format!(
                "marker class {bad:?} must be a single non-empty class name"
            )));
        }
        if !is_plain_component(&self.archive_folder) {
            return Err(ConfigError::Validation(format!(
                "archive_folder {:?} must be a plain folder name",
                self.archive_folder
            )));
        }
        if self.page_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "page_extensions must not be empty".into(),
            ));
        }
        if self.ignore_dirs.iter().any(|d| d.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "ignore_dirs entries must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Whether `path` has one of the configured page extensions.
    pub fn is_page(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.page_extensions
            .iter()
            .any(|p| p.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// A single path component: no separators, not `.` or `..`.
fn is_plain_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).components().count() == 1
}

/// Values given on the command line. Empty lists and `None` leave the
/// underlying config value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub marker_classes: Vec<String>,
    pub ignore_dirs: Vec<String>,
    pub archive_folder: Option<String>,
    pub target_width: Option<u32>,
}

impl ConfigOverrides {
    /// Layer these overrides on top of `config`.
    pub fn apply(self, mut config: SweepConfig) -> SweepConfig {
        if !self.marker_classes.is_empty() {
            config.marker_classes = self.marker_classes;
        }
        if !self.ignore_dirs.is_empty() {
            config.ignore_dirs = self.ignore_dirs;
        }
        if let Some(folder) = self.archive_folder {
            config.archive_folder = folder;
        }
        if let Some(width) = self.target_width {
            config.target_width = width;
        }
        config
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SweepConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ConfigFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto the stock defaults, deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SweepConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SweepConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the sweep config.
///
/// An explicit `config_file` must exist. Without one, `<root>/thumbsweep.toml`
/// is used when present and stock defaults otherwise.
pub fn load_config(root: &Path, config_file: Option<&Path>) -> Result<SweepConfig, ConfigError> {
    let overlay = match config_file {
        Some(path) => Some(load_raw_config(path)?),
        None => {
            let default_path = root.join(CONFIG_FILENAME);
            if default_path.is_file() {
                Some(load_raw_config(&default_path)?)
            } else {
                None
            }
        }
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `thumbsweep.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# thumbsweep configuration
# ========================
# All settings are optional. Values shown below are the defaults.
# Place this file in the site root as thumbsweep.toml, or pass --config.
# Command-line flags override anything set here. Unknown keys are an error.

# CSS classes that opt an <img> into processing. Matching is per class token
# and case-insensitive: class="fastimg hero" matches "fastimg".
marker_classes = ["fastimg"]

# Directories that are never entered. Relative entries are resolved against
# the site root, so only that exact location is skipped, not every directory
# of the same name elsewhere in the tree.
ignore_dirs = [".git", "profile", "gameitem"]

# Folder created next to each converted image to hold its original.
archive_folder = "imgsource"

# Images wider than this (in pixels) are resized to exactly this width,
# keeping their aspect ratio, and re-encoded as WebP.
target_width = 700

# File extensions scanned as HTML pages.
page_extensions = ["html"]
"##
}
