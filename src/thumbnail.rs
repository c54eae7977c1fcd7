//! Per-image downscale pipeline.
//!
//! One image goes through a fixed sequence and ends in exactly one terminal
//! state:
//!
//! ```text
//! probe ──► decide ──► resize + encode ──► archive ──► Transformed
//!   │          │              │                │
//!   ▼          ▼              ▼                ▼
//! Skipped   Skipped        Failed(Codec)   Failed(Archive)
//!           (or Planned in a dry run)
//! ```
//!
//! - **probe**: the file's magic bytes must match a known raster format before
//!   anything decodes it; then its dimensions are read.
//! - **decide**: only convertible source extensions wider than the threshold
//!   get a [`ThumbnailPlan`].
//! - **resize + encode**: the backend writes `<stem>.webp` next to the
//!   original, atomically. On failure the original is untouched.
//! - **archive**: the original moves to the archive folder. If that fails the
//!   new `.webp` is removed again, so the directory never holds both a new
//!   output and a stale original that the page no longer points to.
//!
//! A finished transformation can be [reverted](ThumbnailPipeline::revert)
//! when the page that references it cannot be written.
//!
//! The output name drops the source extension, so `pic.png` and `pic.jpg`
//! share `pic.webp`. The first one converted owns it; the other is skipped
//! with [`SkipReason::OutputTaken`] for as long as its twin sits in the
//! archive.

use crate::archive::{ArchiveError, ArchiveOutcome, SourceArchiver};
use crate::config::SweepConfig;
use crate::imaging::{
    BackendError, Dimensions, ImageBackend, ResizeParams, TARGET_EXTENSION, calculate_downscale,
    is_convertible_extension,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why an image was left alone. None of these change the tree or the page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("not a recognized raster image")]
    InvalidSignature,
    #[error("cannot read image dimensions: {0}")]
    Undecodable(String),
    #[error("extension is not a convertible source format")]
    UnsupportedExtension,
    #[error("width {width} is within the {threshold}px threshold")]
    WithinThreshold { width: u32, threshold: u32 },
    #[error("output already holds the conversion of {}", .0.display())]
    OutputTaken(PathBuf),
}

/// Why a planned transformation did not complete.
#[derive(Error, Debug)]
pub enum FailReason {
    #[error("encode failed: {0}")]
    Codec(#[source] BackendError),
    #[error("archiving failed: {0}")]
    Archive(#[source] ArchiveError),
}

/// A decided downscale: everything needed to produce the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailPlan {
    pub source: PathBuf,
    pub output: PathBuf,
    pub original: Dimensions,
    pub target: Dimensions,
}

impl ThumbnailPlan {
    pub fn resize_params(&self) -> ResizeParams {
        ResizeParams {
            source: self.source.clone(),
            output: self.output.clone(),
            width: self.target.width,
            height: self.target.height,
        }
    }
}

#[derive(Debug)]
pub enum ImageOutcome {
    Skipped(SkipReason),
    /// Dry run: the image would have been transformed as planned.
    Planned(ThumbnailPlan),
    Transformed {
        plan: ThumbnailPlan,
        archive: ArchiveOutcome,
    },
    Failed(FailReason),
}

impl ImageOutcome {
    /// Whether references to this image switch to the new extension.
    pub fn substitutes(&self) -> bool {
        matches!(self, Self::Planned(_) | Self::Transformed { .. })
    }
}

/// Runs images through probe, decide, resize and archive.
pub struct ThumbnailPipeline<'a, B: ImageBackend> {
    backend: &'a B,
    archiver: SourceArchiver,
    threshold: u32,
}

impl<'a, B: ImageBackend> ThumbnailPipeline<'a, B> {
    pub fn new(backend: &'a B, config: &SweepConfig) -> Self {
        Self {
            backend,
            archiver: SourceArchiver::new(config.archive_folder.clone()),
            threshold: config.target_width,
        }
    }

    /// Signature check, then dimensions. Nothing is decoded unless the
    /// signature matched.
    pub fn probe(&self, path: &Path) -> Result<Dimensions, SkipReason> {
        self.backend
            .sniff(path)
            .ok_or(SkipReason::InvalidSignature)?;
        self.backend
            .identify(path)
            .map_err(|e| SkipReason::Undecodable(e.to_string()))
    }

    /// Probe and decide, without writing anything.
    pub fn plan(&self, path: &Path) -> Result<ThumbnailPlan, SkipReason> {
        let original = self.probe(path)?;

        let convertible = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(is_convertible_extension);
        if !convertible {
            return Err(SkipReason::UnsupportedExtension);
        }

        let (width, height) = calculate_downscale((original.width, original.height), self.threshold)
            .ok_or(SkipReason::WithinThreshold {
                width: original.width,
                threshold: self.threshold,
            })?;

        let output = path.with_extension(TARGET_EXTENSION);
        if output.exists() {
            if let Some(twin) = self.archiver.archived_twin(path) {
                return Err(SkipReason::OutputTaken(twin));
            }
        }

        Ok(ThumbnailPlan {
            source: path.to_path_buf(),
            output,
            original,
            target: Dimensions { width, height },
        })
    }

    /// Carry out a plan: encode the output, then archive the original.
    pub fn execute(&self, plan: ThumbnailPlan) -> ImageOutcome {
        if let Err(e) = self.backend.resize(&plan.resize_params()) {
            return ImageOutcome::Failed(FailReason::Codec(e));
        }

        match self.archiver.archive(&plan.source) {
            Ok(archive) => ImageOutcome::Transformed { plan, archive },
            Err(e) => {
                // Best effort: the archive error is what gets reported
                let _ = std::fs::remove_file(&plan.output);
                ImageOutcome::Failed(FailReason::Archive(e))
            }
        }
    }

    /// Undo a `Transformed` outcome: the original goes back to its working
    /// path and the output is removed. Fails, leaving the output in place,
    /// when the original cannot be put back.
    pub fn revert(
        &self,
        plan: &ThumbnailPlan,
        archive: &ArchiveOutcome,
    ) -> Result<(), ArchiveError> {
        self.archiver.restore(&plan.source, archive)?;
        // Best effort once the original is back
        let _ = std::fs::remove_file(&plan.output);
        Ok(())
    }

    /// Output of an earlier run for `path`, when `path` itself is gone: the
    /// original sits in the archive and `<stem>.webp` next to it.
    pub fn converted_output(&self, path: &Path) -> Option<PathBuf> {
        let convertible = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(is_convertible_extension);
        let entry = self.archiver.archive_path(path).ok()?;
        let output = path.with_extension(TARGET_EXTENSION);
        (convertible && !path.exists() && entry.is_file() && output.is_file()).then_some(output)
    }

    /// Run the whole pipeline for one image. A dry run stops after deciding.
    pub fn process(&self, path: &Path, dry_run: bool) -> ImageOutcome {
        match self.plan(path) {
            Err(reason) => ImageOutcome::Skipped(reason),
            Ok(plan) if dry_run => ImageOutcome::Planned(plan),
            Ok(plan) => self.execute(plan),
        }
    }
}
