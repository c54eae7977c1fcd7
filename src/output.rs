//! CLI output formatting.
//!
//! # Image-First Display
//!
//! Every image line leads with the image itself (root-relative path and what
//! happened to it). Where it came from and where things went are indented
//! context lines, so the output reads as an inventory of images while still
//! tracing each one back to its page.
//!
//! ```text
//! ==> Sweeping /srv/site
//!     Markers: fastimg
//!     Target width: 700px
//!     Archive folder: imgsource
//!     Ignoring: /.git
//! /pic.png: 1400x800 → 700x400
//!     Output: /pic.webp
//!     Archived: /imgsource/pic.png
//!     Page: /index.html
//! /blog/small.png: skipped (width 300 is within the 700px threshold)
//!     Page: /blog/post.html
//! Updated /index.html (1 reference)
//! ==> Done: 1 images transformed, 1 skipped, 0 failed; …
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function returns `Vec<String>` and does no I/O, so output
//! is unit testable. `print_*` wrappers write to stdout.

use crate::config::SweepConfig;
use crate::paths::PathPolicy;
use crate::sweep::{ArchiveNote, SweepEvent, SweepSummary};

// ============================================================================
// Shared helpers
// ============================================================================

/// Indented `Label: value` context line.
fn context(label: &str, value: &str) -> String {
    format!("    {}: {}", label, value)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

// ============================================================================
// Run header and summary
// ============================================================================

/// Banner printed before the sweep starts.
pub fn format_run_header(policy: &PathPolicy, config: &SweepConfig, dry_run: bool) -> Vec<String> {
    let root = policy.root().display();
    let mut lines = vec![if dry_run {
        format!("==> Checking {} (dry run, nothing is written)", root)
    } else {
        format!("==> Sweeping {}", root)
    }];
    lines.push(context("Markers", &config.marker_classes.join(", ")));
    lines.push(context("Target width", &format!("{}px", config.target_width)));
    lines.push(context("Archive folder", &config.archive_folder));
    for dir in policy.ignored() {
        lines.push(context("Ignoring", &policy.display(dir)));
    }
    lines
}

pub fn print_run_header(policy: &PathPolicy, config: &SweepConfig, dry_run: bool) {
    for line in format_run_header(policy, config, dry_run) {
        println!("{}", line);
    }
}

pub fn format_summary(summary: &SweepSummary) -> Vec<String> {
    let label = if summary.dry_run { "Dry run" } else { "Done" };
    vec![format!("==> {}: {}", label, summary)]
}

pub fn print_summary(summary: &SweepSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Sweep events
// ============================================================================

/// Format a single sweep progress event as display lines.
pub fn format_sweep_event(event: &SweepEvent) -> Vec<String> {
    match event {
        SweepEvent::DirectoryFetched { path } => vec![format!("Directory {}", path)],
        SweepEvent::FileFetched { path } => vec![context("File", path)],
        SweepEvent::DirectoryExcluded { path } => vec![format!("Excluded {}", path)],
        SweepEvent::WalkError { path, message } => match path {
            Some(p) => vec![format!("Walk error at {}: {}", p, message)],
            None => vec![format!("Walk error: {}", message)],
        },
        SweepEvent::ReferenceUnresolved {
            page,
            reference,
            reason,
        } => {
            let reference = if reference.is_empty() {
                "(no src)"
            } else {
                reference.as_str()
            };
            vec![
                format!("{}: unresolved ({})", reference, reason),
                context("Page", page),
            ]
        }
        SweepEvent::ReferenceRelinked {
            page,
            reference,
            output,
        } => vec![
            format!("{}: already converted", reference),
            context("Relinked", output),
            context("Page", page),
        ],
        SweepEvent::ImageSkipped {
            page,
            image,
            reason,
        } => vec![
            format!("{}: skipped ({})", image, reason),
            context("Page", page),
        ],
        SweepEvent::ImageFailed {
            page,
            image,
            reason,
        } => vec![
            format!("{}: FAILED ({})", image, reason),
            context("Page", page),
        ],
        SweepEvent::ImagePlanned {
            page,
            image,
            output,
            from,
            to,
        } => vec![
            format!("{}: {} \u{2192} {} (planned)", image, from, to),
            context("Output", output),
            context("Page", page),
        ],
        SweepEvent::ImageTransformed {
            page,
            image,
            output,
            from,
            to,
            archive,
        } => {
            let archive_line = match archive {
                ArchiveNote::Archived(path) => context("Archived", path),
                ArchiveNote::AlreadyArchived(path) => {
                    context("Already archived", &format!("{} (working copy removed)", path))
                }
            };
            vec![
                format!("{}: {} \u{2192} {}", image, from, to),
                context("Output", output),
                archive_line,
                context("Page", page),
            ]
        }
        SweepEvent::PageUpdated {
            page,
            substitutions,
        } => vec![format!(
            "Updated {} ({})",
            page,
            plural(*substitutions, "reference")
        )],
        SweepEvent::PageWouldUpdate {
            page,
            substitutions,
        } => vec![format!(
            "Would update {} ({})",
            page,
            plural(*substitutions, "reference")
        )],
        SweepEvent::PageFailed {
            page,
            reason,
            unlinked,
        } => {
            let mut lines = vec![format!("Page {} FAILED ({})", page, reason)];
            lines.extend(unlinked.iter().map(|image| context("Unlinked", image)));
            lines
        }
    }
}
