//! Depth-first traversal of the site tree.
//!
//! ## Order
//!
//! The root's own pages are handled first. Below the root, every directory's
//! subdirectories are handled before its own pages (post-order), siblings in
//! file-name order:
//!
//! ```text
//! site/                    visit order
//! ├── index.html           1
//! ├── a/
//! │   ├── index.html       3
//! │   └── deep/
//! │       └── index.html   2
//! └── b/
//!     └── index.html       4
//! ```
//!
//! Excluded directories (exact absolute-path match, see
//! [`PathPolicy`](crate::paths::PathPolicy)) are pruned before they are
//! entered, so nothing below them is ever read. Symlinked directories are
//! followed; a link back to one of its own ancestors is reported and skipped.
//!
//! ## Errors
//!
//! Nothing that goes wrong with one directory, page or image stops the walk.
//! Those problems become [`SweepEvent`]s and summary counts. Only an unusable
//! root ends the run with a [`SweepError`].
//!
//! ## Events
//!
//! Progress is reported through an optional `mpsc::Sender<SweepEvent>`; the
//! CLI drains it on a printer thread and formats each event with
//! [`output::format_sweep_event`](crate::output::format_sweep_event). Paths in
//! events are already in root-relative display form.

use crate::archive::ArchiveOutcome;
use crate::config::{ConfigError, SweepConfig};
use crate::html::UnresolvedReference;
use crate::imaging::{Dimensions, ImageBackend};
use crate::page::{PageError, PageOutcome, PageRewriter, ReferenceResult};
use crate::paths::PathPolicy;
use crate::thumbnail::{ImageOutcome, ThumbnailPipeline};
use serde::Serialize;
use std::cell::Cell;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot read site root {path}: {source}")]
    ReadRoot { path: PathBuf, source: io::Error },
    #[error("cannot write report {path}: {source}")]
    Report { path: PathBuf, source: io::Error },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SweepOptions {
    /// Decide everything, change nothing.
    pub dry_run: bool,
    /// Also report every directory and file fetched.
    pub verbose: bool,
}

/// Archive result as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveNote {
    Archived(String),
    /// An entry of that name already existed; the working copy was dropped.
    AlreadyArchived(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepEvent {
    DirectoryFetched {
        path: String,
    },
    FileFetched {
        path: String,
    },
    DirectoryExcluded {
        path: String,
    },
    WalkError {
        path: Option<String>,
        message: String,
    },
    ReferenceUnresolved {
        page: String,
        reference: String,
        reason: String,
    },
    /// The image was converted earlier; the reference now names `output`.
    ReferenceRelinked {
        page: String,
        reference: String,
        output: String,
    },
    ImageSkipped {
        page: String,
        image: String,
        reason: String,
    },
    ImageFailed {
        page: String,
        image: String,
        reason: String,
    },
    ImagePlanned {
        page: String,
        image: String,
        output: String,
        from: Dimensions,
        to: Dimensions,
    },
    ImageTransformed {
        page: String,
        image: String,
        output: String,
        from: Dimensions,
        to: Dimensions,
        archive: ArchiveNote,
    },
    PageUpdated {
        page: String,
        substitutions: usize,
    },
    PageWouldUpdate {
        page: String,
        substitutions: usize,
    },
    PageFailed {
        page: String,
        reason: String,
        /// Images converted for this page whose originals could not be put
        /// back; the page still names them.
        unlinked: Vec<String>,
    },
}

/// Counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub dry_run: bool,
    pub directories: usize,
    pub excluded_directories: usize,
    pub pages_scanned: usize,
    /// Pages rewritten, or in a dry run, pages that would be.
    pub pages_updated: usize,
    pub pages_failed: usize,
    /// Images transformed, or in a dry run, planned.
    pub images_transformed: usize,
    pub images_skipped: usize,
    pub images_failed: usize,
    pub references_unresolved: usize,
    pub references_relinked: usize,
    pub walk_errors: usize,
}

impl SweepSummary {
    /// Whether anything was reported as failed.
    pub fn has_failures(&self) -> bool {
        self.pages_failed + self.images_failed + self.walk_errors > 0
    }
}

impl fmt::Display for SweepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (transformed, updated) = if self.dry_run {
            ("to transform", "to update")
        } else {
            ("transformed", "updated")
        };
        write!(
            f,
            "{} images {}, {} skipped, {} failed; {} of {} pages {}; {} unresolved references; {} directories",
            self.images_transformed,
            transformed,
            self.images_skipped,
            self.images_failed,
            self.pages_updated,
            self.pages_scanned,
            updated,
            self.references_unresolved,
            self.directories,
        )?;
        if self.references_relinked > 0 {
            write!(f, "; {} relinked", self.references_relinked)?;
        }
        if self.pages_failed > 0 {
            write!(f, "; {} pages failed", self.pages_failed)?;
        }
        if self.walk_errors > 0 {
            write!(f, "; {} walk errors", self.walk_errors)?;
        }
        Ok(())
    }
}

/// Write the summary as pretty JSON.
pub fn write_report(summary: &SweepSummary, path: &Path) -> Result<(), SweepError> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).map_err(|source| SweepError::Report {
        path: path.to_path_buf(),
        source,
    })
}

/// Sweep the tree under `policy.root()`.
pub fn sweep<B: ImageBackend>(
    config: &SweepConfig,
    policy: &PathPolicy,
    backend: &B,
    options: SweepOptions,
    events: Option<Sender<SweepEvent>>,
) -> Result<SweepSummary, SweepError> {
    let pipeline = ThumbnailPipeline::new(backend, config);
    let rewriter = PageRewriter::new(&pipeline, policy, &config.marker_classes, options.dry_run);
    let mut walker = Walker {
        config,
        policy,
        rewriter,
        options,
        events,
        summary: SweepSummary {
            dry_run: options.dry_run,
            ..SweepSummary::default()
        },
    };
    walker.run()?;
    Ok(walker.summary)
}

struct Walker<'a, B: ImageBackend> {
    config: &'a SweepConfig,
    policy: &'a PathPolicy,
    rewriter: PageRewriter<'a, B>,
    options: SweepOptions,
    events: Option<Sender<SweepEvent>>,
    summary: SweepSummary,
}

impl<B: ImageBackend> Walker<'_, B> {
    fn emit(&self, event: SweepEvent) {
        if let Some(tx) = &self.events {
            // A closed receiver only means nobody is listening
            let _ = tx.send(event);
        }
    }

    fn display(&self, path: &Path) -> String {
        self.policy.display(path)
    }

    fn run(&mut self) -> Result<(), SweepError> {
        let root = self.policy.root().to_path_buf();
        let root_pages = self.list_pages(&root).map_err(|source| SweepError::ReadRoot {
            path: root.clone(),
            source,
        })?;
        self.visit_directory(&root, root_pages);

        let excluded = Cell::new(Vec::new());
        let policy = self.policy;
        // Pre-order so that excluded directories are pruned before walkdir
        // reads them; pages are handled in post-order from `pending`.
        let entries = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let skip = entry.file_type().is_dir() && policy.is_excluded(entry.path());
                if skip {
                    let mut dirs = excluded.take();
                    dirs.push(entry.path().to_path_buf());
                    excluded.set(dirs);
                }
                !skip
            });

        let mut pending: Vec<(usize, PathBuf)> = Vec::new();
        for entry in entries {
            self.report_excluded(&excluded);
            match entry {
                Ok(entry) if entry.file_type().is_dir() => {
                    self.finish_directories(&mut pending, entry.depth());
                    pending.push((entry.depth(), entry.into_path()));
                }
                Ok(_) => {}
                Err(err) => {
                    if let Some(path) = err.path() {
                        // Already reported here, don't list it again
                        pending.retain(|(_, dir)| dir != path);
                    }
                    let message = match err.loop_ancestor() {
                        Some(ancestor) => format!("symlink loop back to {}", self.display(ancestor)),
                        None => err
                            .io_error()
                            .map_or_else(|| err.to_string(), ToString::to_string),
                    };
                    self.walk_error(err.path(), message);
                }
            }
        }
        self.report_excluded(&excluded);
        self.finish_directories(&mut pending, 0);
        Ok(())
    }

    /// Handle the pages of every pending directory at `depth` or deeper,
    /// deepest first. Called when the walk moves on to an entry at `depth`,
    /// at which point those directories have no unvisited descendants left.
    fn finish_directories(&mut self, pending: &mut Vec<(usize, PathBuf)>, depth: usize) {
        while pending.last().is_some_and(|(d, _)| *d >= depth) {
            let Some((_, dir)) = pending.pop() else {
                break;
            };
            match self.list_pages(&dir) {
                Ok(pages) => self.visit_directory(&dir, pages),
                Err(e) => self.walk_error(Some(&dir), e.to_string()),
            }
        }
    }

    fn report_excluded(&mut self, excluded: &Cell<Vec<PathBuf>>) {
        for dir in excluded.take() {
            self.summary.excluded_directories += 1;
            self.emit(SweepEvent::DirectoryExcluded {
                path: self.display(&dir),
            });
        }
    }

    fn walk_error(&mut self, path: Option<&Path>, message: String) {
        self.summary.walk_errors += 1;
        self.emit(SweepEvent::WalkError {
            path: path.map(|p| self.display(p)),
            message,
        });
    }

    /// Pages directly inside `dir`, sorted by name. In verbose mode every
    /// file seen is reported.
    fn list_pages(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        if self.options.verbose {
            for file in &files {
                self.emit(SweepEvent::FileFetched {
                    path: self.display(file),
                });
            }
        }
        files.retain(|p| self.config.is_page(p));
        Ok(files)
    }

    fn visit_directory(&mut self, dir: &Path, pages: Vec<PathBuf>) {
        self.summary.directories += 1;
        if self.options.verbose {
            self.emit(SweepEvent::DirectoryFetched {
                path: self.display(dir),
            });
        }
        for page in pages {
            self.visit_page(&page);
        }
    }

    fn visit_page(&mut self, page: &Path) {
        self.summary.pages_scanned += 1;
        let page_display = self.display(page);
        match self.rewriter.rewrite(page) {
            Ok(outcome) => self.report_page(page_display, outcome),
            Err(e) => {
                self.summary.pages_failed += 1;
                let (reason, unlinked) = match e {
                    PageError::Read { source, .. } => (format!("cannot read: {source}"), Vec::new()),
                    PageError::NotUtf8(_) => ("not valid UTF-8".to_string(), Vec::new()),
                    PageError::Write {
                        source, unlinked, ..
                    } => (
                        format!("cannot write: {source}"),
                        unlinked.iter().map(|p| self.display(p)).collect(),
                    ),
                };
                self.emit(SweepEvent::PageFailed {
                    page: page_display,
                    reason,
                    unlinked,
                });
            }
        }
    }

    fn report_page(&mut self, page: String, outcome: PageOutcome) {
        for result in outcome.results {
            let event = match result {
                ReferenceResult::Unresolved(unresolved) => {
                    self.summary.references_unresolved += 1;
                    self.unresolved_event(&page, unresolved)
                }
                ReferenceResult::Relinked { image, output, .. } => {
                    self.summary.references_relinked += 1;
                    SweepEvent::ReferenceRelinked {
                        page: page.clone(),
                        reference: self.display(&image),
                        output: self.display(&output),
                    }
                }
                ReferenceResult::Evaluated { image, outcome, .. } => {
                    self.image_event(&page, &image, outcome)
                }
            };
            self.emit(event);
        }

        if outcome.written {
            self.summary.pages_updated += 1;
            self.emit(SweepEvent::PageUpdated {
                page,
                substitutions: outcome.substitutions,
            });
        } else if self.options.dry_run && outcome.substitutions > 0 {
            self.summary.pages_updated += 1;
            self.emit(SweepEvent::PageWouldUpdate {
                page,
                substitutions: outcome.substitutions,
            });
        }
    }

    fn unresolved_event(&self, page: &str, unresolved: UnresolvedReference) -> SweepEvent {
        let (reference, reason) = match unresolved {
            UnresolvedReference::Missing { path, .. } => (self.display(&path), "file not found"),
            UnresolvedReference::External { src } => (src, "not a local file"),
            UnresolvedReference::Empty => (String::new(), "empty src"),
        };
        SweepEvent::ReferenceUnresolved {
            page: page.to_string(),
            reference,
            reason: reason.to_string(),
        }
    }

    fn image_event(&mut self, page: &str, image: &Path, outcome: ImageOutcome) -> SweepEvent {
        let page = page.to_string();
        let image = self.display(image);
        match outcome {
            ImageOutcome::Skipped(reason) => {
                self.summary.images_skipped += 1;
                SweepEvent::ImageSkipped {
                    page,
                    image,
                    reason: reason.to_string(),
                }
            }
            ImageOutcome::Failed(reason) => {
                self.summary.images_failed += 1;
                SweepEvent::ImageFailed {
                    page,
                    image,
                    reason: reason.to_string(),
                }
            }
            ImageOutcome::Planned(plan) => {
                self.summary.images_transformed += 1;
                SweepEvent::ImagePlanned {
                    page,
                    image,
                    output: self.display(&plan.output),
                    from: plan.original,
                    to: plan.target,
                }
            }
            ImageOutcome::Transformed { plan, archive } => {
                self.summary.images_transformed += 1;
                let archive = match archive {
                    ArchiveOutcome::Archived(p) => ArchiveNote::Archived(self.display(&p)),
                    ArchiveOutcome::Discarded(p) => ArchiveNote::AlreadyArchived(self.display(&p)),
                };
                SweepEvent::ImageTransformed {
                    page,
                    image,
                    output: self.display(&plan.output),
                    from: plan.original,
                    to: plan.target,
                    archive,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::{snapshot, write_fake_png, write_page};
    use std::sync::mpsc;
    use tempfile::TempDir;

    struct Site {
        _tmp: TempDir,
        root: PathBuf,
        backend: MockBackend,
        config: SweepConfig,
    }

    impl Site {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let root = tmp.path().canonicalize().unwrap();
            Self {
                _tmp: tmp,
                root,
                backend: MockBackend::new(),
                config: SweepConfig::default(),
            }
        }

        fn image(&self, rel: &str, w: u32, h: u32) -> PathBuf {
            let path = self.root.join(rel);
            write_fake_png(&path);
            self.backend.set_dimensions(&path, w, h);
            path
        }

        fn page(&self, rel: &str, body: &str) -> PathBuf {
            write_page(&self.root, rel, body)
        }

        fn run(&self, options: SweepOptions) -> (SweepSummary, Vec<SweepEvent>) {
            let policy = PathPolicy::new(&self.root, &self.config.ignore_dirs).unwrap();
            let (tx, rx) = mpsc::channel();
            let summary = sweep(&self.config, &policy, &self.backend, options, Some(tx)).unwrap();
            (summary, rx.into_iter().collect())
        }
    }

    fn sep(path: &str) -> String {
        path.replace('/', std::path::MAIN_SEPARATOR_STR)
    }

    fn page_order(events: &[SweepEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                SweepEvent::PageUpdated { page, .. } => Some(page.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn transforms_images_and_rewrites_pages() {
        let site = Site::new();
        site.image("pic.png", 1400, 800);
        let page = site.page("index.html", r#"<img class="fastimg hero" src="pic.png">"#);

        let (summary, events) = site.run(SweepOptions::default());

        assert_eq!(fs::read_to_string(&page).unwrap(), r#"<img class="fastimg hero" src="pic.webp">"#);
        assert!(site.root.join("pic.webp").exists());
        assert!(site.root.join("imgsource").join("pic.png").exists());
        assert!(!site.root.join("pic.png").exists());
        assert_eq!(summary.images_transformed, 1);
        assert_eq!(summary.pages_updated, 1);
        assert!(events.contains(&SweepEvent::ImageTransformed {
            page: sep("/index.html"),
            image: sep("/pic.png"),
            output: sep("/pic.webp"),
            from: Dimensions { width: 1400, height: 800 },
            to: Dimensions { width: 700, height: 400 },
            archive: ArchiveNote::Archived(sep("/imgsource/pic.png")),
        }));
    }

    #[test]
    fn subdirectories_before_their_parent_pages() {
        let site = Site::new();
        for page in ["index.html", "a/index.html", "a/deep/index.html", "b/index.html"] {
            // Each page gets its own image so every page is rewritten
            let dir = Path::new(page).parent().unwrap();
            let image = dir.join("pic.png");
            site.image(image.to_str().unwrap(), 1400, 800);
            site.page(page, r#"<img class="fastimg" src="pic.png">"#);
        }

        let (_, events) = site.run(SweepOptions::default());

        assert_eq!(
            page_order(&events),
            vec![
                sep("/index.html"),
                sep("/a/deep/index.html"),
                sep("/a/index.html"),
                sep("/b/index.html"),
            ]
        );
    }

    #[test]
    fn ignored_directories_are_never_touched() {
        let mut site = Site::new();
        site.config.ignore_dirs = vec!["profile".into(), "blog/drafts".into()];
        site.image("profile/pic.png", 1400, 800);
        site.page("profile/index.html", r#"<img class="fastimg" src="pic.png">"#);
        site.image("blog/drafts/pic.png", 1400, 800);
        site.page("blog/drafts/index.html", r#"<img class="fastimg" src="pic.png">"#);
        // Same name, different location: not excluded
        site.image("blog/profile/pic.png", 1400, 800);
        site.page("blog/profile/index.html", r#"<img class="fastimg" src="pic.png">"#);

        let before_profile = snapshot(&site.root.join("profile"));
        let before_drafts = snapshot(&site.root.join("blog").join("drafts"));
        let (summary, events) = site.run(SweepOptions::default());

        assert_eq!(snapshot(&site.root.join("profile")), before_profile);
        assert_eq!(snapshot(&site.root.join("blog").join("drafts")), before_drafts);
        assert!(site.root.join("blog/profile/pic.webp").exists());
        assert_eq!(summary.excluded_directories, 2);
        assert_eq!(summary.images_transformed, 1);
        assert!(events.contains(&SweepEvent::DirectoryExcluded {
            path: sep("/profile"),
        }));
    }

    #[test]
    fn dry_run_changes_nothing() {
        let site = Site::new();
        site.image("pic.png", 1400, 800);
        site.image("blog/small.png", 300, 200);
        site.page("index.html", r#"<img class="fastimg" src="pic.png">"#);
        site.page("blog/post.html", r#"<img class="fastimg" src="small.png">"#);
        let before = snapshot(&site.root);

        let (summary, events) = site.run(SweepOptions {
            dry_run: true,
            verbose: false,
        });

        assert_eq!(snapshot(&site.root), before);
        assert!(summary.dry_run);
        assert_eq!(summary.images_transformed, 1);
        assert_eq!(summary.images_skipped, 1);
        assert_eq!(summary.pages_updated, 1);
        assert!(events.contains(&SweepEvent::PageWouldUpdate {
            page: sep("/index.html"),
            substitutions: 1,
        }));
        assert_eq!(site.backend.resize_count(), 0);
    }

    #[test]
    fn second_run_changes_nothing() {
        let site = Site::new();
        site.image("pic.png", 1400, 800);
        site.page("index.html", r#"<img class="fastimg" src="pic.png">"#);

        site.run(SweepOptions::default());
        let after_first = snapshot(&site.root);
        let (summary, _) = site.run(SweepOptions::default());

        assert_eq!(snapshot(&site.root), after_first);
        assert_eq!(summary.images_transformed, 0);
        assert_eq!(summary.pages_updated, 0);
    }

    #[test]
    fn problems_are_reported_and_walk_continues() {
        let site = Site::new();
        site.image("b/pic.png", 1400, 800);
        site.page("a/index.html", r#"<img class="fastimg" src="gone.png">"#);
        fs::write(site.root.join("a").join("bad.html"), b"\xff\xfe").unwrap();
        site.page("b/index.html", r#"<img class="fastimg" src="pic.png">"#);

        let (summary, events) = site.run(SweepOptions::default());

        assert_eq!(summary.references_unresolved, 1);
        assert_eq!(summary.pages_failed, 1);
        assert_eq!(summary.images_transformed, 1);
        assert!(summary.has_failures());
        assert!(events.contains(&SweepEvent::ReferenceUnresolved {
            page: sep("/a/index.html"),
            reference: sep("/a/gone.png"),
            reason: "file not found".into(),
        }));
        assert!(events.contains(&SweepEvent::PageFailed {
            page: sep("/a/bad.html"),
            reason: "not valid UTF-8".into(),
            unlinked: vec![],
        }));
    }

    #[test]
    fn only_configured_page_extensions_are_scanned() {
        let mut site = Site::new();
        site.config.page_extensions = vec!["html".into(), "htm".into()];
        site.image("pic.png", 1400, 800);
        site.page("old.htm", r#"<img class="fastimg" src="pic.png">"#);
        let notes = site.page("notes.txt", r#"<img class="fastimg" src="pic.png">"#);

        let (summary, _) = site.run(SweepOptions::default());

        assert_eq!(summary.pages_scanned, 1);
        assert_eq!(
            fs::read_to_string(notes).unwrap(),
            r#"<img class="fastimg" src="pic.png">"#
        );
    }

    #[test]
    fn verbose_reports_directories_and_files() {
        let site = Site::new();
        site.page("blog/index.html", "<p>hello</p>");

        let (summary, events) = site.run(SweepOptions {
            dry_run: false,
            verbose: true,
        });

        assert_eq!(summary.directories, 2);
        assert!(events.contains(&SweepEvent::DirectoryFetched { path: sep("/blog") }));
        assert!(events.contains(&SweepEvent::FileFetched {
            path: sep("/blog/index.html"),
        }));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_is_reported_not_followed_forever() {
        let site = Site::new();
        site.page("a/index.html", "<p></p>");
        std::os::unix::fs::symlink(site.root.join("a"), site.root.join("a").join("again")).unwrap();

        let (summary, events) = site.run(SweepOptions::default());

        assert_eq!(summary.walk_errors, 1);
        assert!(events.iter().any(|e| matches!(
            e,
            SweepEvent::WalkError { message, .. } if message.starts_with("symlink loop")
        )));
    }

    #[test]
    fn image_shared_by_two_pages_is_relinked_on_the_second() {
        let site = Site::new();
        site.image("img/pic.png", 1400, 800);
        let home = site.page("index.html", r#"<img class="fastimg" src="/img/pic.png">"#);
        let post = site.page("a/post.html", r#"<img class="fastimg" src="../img/pic.png">"#);

        let (summary, events) = site.run(SweepOptions::default());

        assert_eq!(summary.images_transformed, 1);
        assert_eq!(summary.references_relinked, 1);
        assert_eq!(summary.references_unresolved, 0);
        assert_eq!(summary.pages_updated, 2);
        assert_eq!(
            fs::read_to_string(home).unwrap(),
            r#"<img class="fastimg" src="/img/pic.webp">"#
        );
        assert_eq!(
            fs::read_to_string(post).unwrap(),
            r#"<img class="fastimg" src="../img/pic.webp">"#
        );
        assert!(events.contains(&SweepEvent::ReferenceRelinked {
            page: sep("/a/post.html"),
            reference: sep("/img/pic.png"),
            output: sep("/img/pic.webp"),
        }));
    }

    #[test]
    fn summary_display() {
        let summary = SweepSummary {
            directories: 3,
            pages_scanned: 4,
            pages_updated: 2,
            images_transformed: 5,
            images_skipped: 1,
            references_unresolved: 1,
            ..SweepSummary::default()
        };
        assert_eq!(
            summary.to_string(),
            "5 images transformed, 1 skipped, 0 failed; 2 of 4 pages updated; 1 unresolved references; 3 directories"
        );

        let relinked = SweepSummary {
            references_relinked: 2,
            ..SweepSummary::default()
        };
        assert!(relinked.to_string().ends_with("; 2 relinked"));
    }

    #[test]
    fn report_is_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.json");
        let summary = SweepSummary {
            images_transformed: 2,
            ..SweepSummary::default()
        };
        write_report(&summary, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["images_transformed"], 2);
        assert_eq!(value["dry_run"], false);
    }
}
