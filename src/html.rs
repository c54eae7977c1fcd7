//! Extraction and rewriting of marker-classed `<img>` references.
//!
//! Pages are treated as raw text, not parsed into a DOM: the sweep must leave
//! every byte it does not deliberately change exactly as it was. Scanning
//! finds whole `<img …>` elements (attributes may wrap lines and come in any
//! order) and records byte spans, so a rewrite can replace one `src` value
//! without touching anything else in the tag or the page.
//!
//! ```text
//! <img class="fastimg hero" alt="pic.png" src="pic.png?v=2">
//!                                              ^^^^^^^^^^^  src_span
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^  tag_span
//! ```

use crate::imaging::is_convertible_extension;
use crate::paths::PathPolicy;
use regex::{CaptureMatches, Regex};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// A whole `<img>` element. Quoted values may contain `>` and newlines.
static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#).expect("img tag pattern")
});

/// One attribute: name, optionally followed by a double-, single- or unquoted value.
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern")
});

/// A marker-classed image reference that resolved to an existing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// The `src` value exactly as written.
    pub src: String,
    /// The configured marker class that matched.
    pub marker: String,
    /// Absolute path of the referenced file, query and fragment stripped.
    pub path: PathBuf,
    /// Byte span of the whole `<img …>` tag in the page.
    pub tag_span: Range<usize>,
    /// Byte span of the `src` value (without quotes) in the page.
    pub src_span: Range<usize>,
}

impl ImageReference {
    /// The original tag text.
    pub fn tag<'h>(&self, html: &'h str) -> &'h str {
        &html[self.tag_span.clone()]
    }
}

/// A marker-classed `<img>` whose `src` does not lead to a local file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReference {
    #[error("image not found: {}", .path.display())]
    Missing {
        src: String,
        path: PathBuf,
        /// Byte span of the `src` value, for relinking an earlier conversion.
        src_span: Range<usize>,
    },
    #[error("not a local image: {src}")]
    External { src: String },
    #[error("empty src attribute")]
    Empty,
}

/// Scan one page for marker-classed images.
///
/// The returned iterator is lazy: each tag is matched, and its file checked
/// for existence, only when the next item is requested.
pub fn scan_page<'h, 'c>(
    html: &'h str,
    page_dir: &'c Path,
    policy: &'c PathPolicy,
    markers: &'c [String],
) -> ImageRefs<'h, 'c> {
    ImageRefs {
        html,
        tags: IMG_TAG.captures_iter(html),
        page_dir,
        policy,
        markers,
    }
}

/// Iterator over the image references of one page. See [`scan_page`].
pub struct ImageRefs<'h, 'c> {
    html: &'h str,
    tags: CaptureMatches<'static, 'h>,
    page_dir: &'c Path,
    policy: &'c PathPolicy,
    markers: &'c [String],
}

impl Iterator for ImageRefs<'_, '_> {
    type Item = Result<ImageReference, UnresolvedReference>;

    fn next(&mut self) -> Option<Self::Item> {
        for caps in self.tags.by_ref() {
            let (Some(tag), Some(attrs)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let attributes = parse_attributes(attrs.as_str(), attrs.start());

            let Some(marker) = find_attribute(self.html, &attributes, "class")
                .and_then(|class| matching_marker(&self.html[class], self.markers))
            else {
                continue;
            };
            let Some(src_span) = find_attribute(self.html, &attributes, "src") else {
                continue;
            };

            let src = &self.html[src_span.clone()];
            return Some(resolve(
                self.policy,
                self.page_dir,
                src,
                marker,
                tag.range(),
                src_span,
            ));
        }
        None
    }
}

fn resolve(
    policy: &PathPolicy,
    page_dir: &Path,
    src: &str,
    marker: &str,
    tag_span: Range<usize>,
    src_span: Range<usize>,
) -> Result<ImageReference, UnresolvedReference> {
    let path_part = src_path(src);
    if path_part.is_empty() {
        return Err(UnresolvedReference::Empty);
    }
    if is_external(path_part) {
        return Err(UnresolvedReference::External {
            src: src.to_string(),
        });
    }
    let path = policy.resolve_reference(page_dir, path_part);
    if !path.is_file() {
        return Err(UnresolvedReference::Missing {
            src: src.to_string(),
            path,
            src_span,
        });
    }
    Ok(ImageReference {
        src: src.to_string(),
        marker: marker.to_string(),
        path,
        tag_span,
        src_span,
    })
}

/// An attribute with absolute byte spans into the page.
struct Attribute {
    name: Range<usize>,
    value: Option<Range<usize>>,
}

fn parse_attributes(attrs: &str, offset: usize) -> Vec<Attribute> {
    ATTRIBUTE
        .captures_iter(attrs)
        .filter_map(|caps| {
            let name = caps.get(1)?;
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| offset + m.start()..offset + m.end());
            Some(Attribute {
                name: offset + name.start()..offset + name.end(),
                value,
            })
        })
        .collect()
}

/// Value span of the first attribute called `name` (case-insensitive).
/// A bare attribute without a value counts as absent.
fn find_attribute(html: &str, attributes: &[Attribute], name: &str) -> Option<Range<usize>> {
    attributes
        .iter()
        .find(|a| html[a.name.clone()].eq_ignore_ascii_case(name))
        .and_then(|a| a.value.clone())
}

/// First configured marker present as a whole class token.
fn matching_marker<'m>(class: &str, markers: &'m [String]) -> Option<&'m str> {
    class.split_ascii_whitespace().find_map(|token| {
        markers
            .iter()
            .find(|m| m.eq_ignore_ascii_case(token))
            .map(String::as_str)
    })
}

/// The path part of an `src` value: trimmed, query string and fragment removed.
pub fn src_path(src: &str) -> &str {
    let value = src.trim();
    let end = value.find(['?', '#']).unwrap_or(value.len());
    &value[..end]
}

/// URLs with a scheme (`https:`, `data:`) or protocol-relative (`//host/…`).
fn is_external(path: &str) -> bool {
    if path.starts_with("//") {
        return true;
    }
    match path.find(':') {
        Some(colon) => {
            let scheme = &path[..colon];
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Swap a convertible source extension in an `src` value for `target_ext`.
///
/// Only an extension that ends the path part (followed by the end of the
/// value, `?` or `#`) is replaced; query string, fragment and surrounding
/// whitespace are kept. Returns `None` when the value has no convertible
/// extension.
///
/// ```
/// # use thumbsweep::html::swap_extension;
/// assert_eq!(swap_extension("img/pic.PNG?v=3#top", "webp").as_deref(), Some("img/pic.webp?v=3#top"));
/// assert_eq!(swap_extension("pic.png.bak", "webp"), None);
/// ```
pub fn swap_extension(src: &str, target_ext: &str) -> Option<String> {
    let lead = src.len() - src.trim_start().len();
    let value = src.trim();
    let trail = &src[lead + value.len()..];

    let end = value.find(['?', '#']).unwrap_or(value.len());
    let path = &value[..end];
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    let dot = name_start + path[name_start..].rfind('.')?;
    // ".png" alone is a stem, not an extension
    if dot == name_start || !is_convertible_extension(&path[dot + 1..]) {
        return None;
    }

    Some(format!(
        "{}{}.{}{}{}",
        &src[..lead],
        &path[..dot],
        target_ext,
        &value[end..],
        trail
    ))
}

/// A replacement of one byte span of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub span: Range<usize>,
    pub replacement: String,
}

/// Apply substitutions in one pass. Bytes outside the spans are copied
/// unchanged. Overlapping spans after the first are ignored.
pub fn apply_substitutions(html: &str, substitutions: &[Substitution]) -> String {
    let mut ordered: Vec<&Substitution> = substitutions.iter().collect();
    ordered.sort_by_key(|s| s.span.start);

    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;
    for sub in ordered {
        if sub.span.start < cursor || sub.span.end > html.len() {
            continue;
        }
        out.push_str(&html[cursor..sub.span.start]);
        out.push_str(&sub.replacement);
        cursor = sub.span.end;
    }
    out.push_str(&html[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_fake_png;
    use tempfile::TempDir;

    struct Site {
        _tmp: TempDir,
        policy: PathPolicy,
    }

    impl Site {
        fn new(images: &[&str]) -> Self {
            let tmp = TempDir::new().unwrap();
            for image in images {
                write_fake_png(&tmp.path().join(image));
            }
            let policy = PathPolicy::new(tmp.path(), &[]).unwrap();
            Self { _tmp: tmp, policy }
        }

        fn root(&self) -> &Path {
            self.policy.root()
        }

        fn scan(&self, html: &str) -> Vec<Result<ImageReference, UnresolvedReference>> {
            self.scan_in(self.root(), html, &["fastimg"])
        }

        fn scan_in(
            &self,
            dir: &Path,
            html: &str,
            markers: &[&str],
        ) -> Vec<Result<ImageReference, UnresolvedReference>> {
            let markers: Vec<String> = markers.iter().map(|m| m.to_string()).collect();
            scan_page(html, dir, &self.policy, &markers).collect()
        }
    }

    fn found(results: &[Result<ImageReference, UnresolvedReference>]) -> Vec<&ImageReference> {
        results.iter().filter_map(|r| r.as_ref().ok()).collect()
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    #[test]
    fn finds_marker_classed_image() {
        let site = Site::new(&["pic.png"]);
        let html = r#"<p><img class="fastimg hero" src="pic.png"></p>"#;
        let results = site.scan(html);

        let refs = found(&results);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].src, "pic.png");
        assert_eq!(refs[0].marker, "fastimg");
        assert_eq!(refs[0].path, site.root().join("pic.png"));
        assert_eq!(refs[0].tag(html), r#"<img class="fastimg hero" src="pic.png">"#);
        assert_eq!(&html[refs[0].src_span.clone()], "pic.png");
    }

    #[test]
    fn ignores_images_without_marker() {
        let site = Site::new(&["pic.png"]);
        let html = r#"<img src="pic.png"><img class="hero" src="pic.png"><img class="fastimg-large" src="pic.png">"#;
        assert!(site.scan(html).is_empty());
    }

    #[test]
    fn attribute_order_case_and_line_wrapping() {
        let site = Site::new(&["a.png", "b.png", "c.png"]);
        let html = "<IMG SRC='a.png' CLASS='FastImg'>\n\
                    <img\n    alt=\"x > y\"\n    src=\"b.png\"\n    class=\"card fastimg\"\n/>\n\
                    <img data-x=1 class=fastimg src=c.png>";
        let results = site.scan(html);
        let srcs: Vec<&str> = found(&results).iter().map(|r| r.src.as_str()).collect();
        assert_eq!(srcs, vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn multiple_markers_any_matches() {
        let site = Site::new(&["a.png", "b.png"]);
        let html = r#"<img class="lazy" src="a.png"><img class="thumb" src="b.png">"#;
        let results = site.scan_in(site.root(), html, &["thumb", "lazy"]);
        let refs = found(&results);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].marker, "lazy");
        assert_eq!(refs[1].marker, "thumb");
    }

    #[test]
    fn query_and_fragment_are_stripped_for_resolution() {
        let site = Site::new(&["pic.png"]);
        let results = site.scan(r#"<img class="fastimg" src="pic.png?v=2#hero">"#);
        let refs = found(&results);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].src, "pic.png?v=2#hero");
        assert_eq!(refs[0].path, site.root().join("pic.png"));
    }

    #[test]
    fn resolves_against_page_directory_and_site_root() {
        let site = Site::new(&["blog/local.png", "shared/logo.png"]);
        let blog = site.root().join("blog");
        let html = r#"<img class="fastimg" src="local.png"><img class="fastimg" src="../shared/logo.png"><img class="fastimg" src="/shared/logo.png">"#;
        let results = site.scan_in(&blog, html, &["fastimg"]);
        let paths: Vec<PathBuf> = found(&results).iter().map(|r| r.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                blog.join("local.png"),
                site.root().join("shared").join("logo.png"),
                site.root().join("shared").join("logo.png"),
            ]
        );
    }

    #[test]
    fn missing_and_external_files_are_reported_not_fatal() {
        let site = Site::new(&["pic.png"]);
        let html = r#"<img class="fastimg" src="gone.png">
<img class="fastimg" src="https://cdn.example.com/pic.png">
<img class="fastimg" src="//cdn.example.com/pic.png">
<img class="fastimg" src="data:image/png;base64,AAAA">
<img class="fastimg" src="">
<img class="fastimg" src="pic.png">"#;
        let results = site.scan(html);
        assert_eq!(results.len(), 6);
        assert!(matches!(&results[0], Err(UnresolvedReference::Missing { src, .. }) if src == "gone.png"));
        assert!(matches!(&results[1], Err(UnresolvedReference::External { .. })));
        assert!(matches!(&results[2], Err(UnresolvedReference::External { .. })));
        assert!(matches!(&results[3], Err(UnresolvedReference::External { .. })));
        assert!(matches!(&results[4], Err(UnresolvedReference::Empty)));
        assert!(results[5].is_ok());
    }

    #[test]
    fn directory_named_like_image_is_missing() {
        let site = Site::new(&[]);
        std::fs::create_dir(site.root().join("dir.png")).unwrap();
        let results = site.scan(r#"<img class="fastimg" src="dir.png">"#);
        assert!(matches!(&results[0], Err(UnresolvedReference::Missing { .. })));
    }

    #[test]
    fn tag_without_src_is_not_a_candidate() {
        let site = Site::new(&[]);
        assert!(site.scan(r#"<img class="fastimg" data-src="pic.png">"#).is_empty());
    }

    #[test]
    fn scanning_is_lazy() {
        let site = Site::new(&["a.png", "b.png"]);
        let html = r#"<img class="fastimg" src="a.png"><img class="fastimg" src="b.png">"#;
        let markers = vec!["fastimg".to_string()];
        let mut refs = scan_page(html, site.root(), &site.policy, &markers);

        assert!(refs.next().unwrap().is_ok());
        // Removing b.png after the first item still affects the second
        std::fs::remove_file(site.root().join("b.png")).unwrap();
        assert!(matches!(refs.next(), Some(Err(UnresolvedReference::Missing { .. }))));
        assert!(refs.next().is_none());
    }

    // =========================================================================
    // Extension swap
    // =========================================================================

    #[test]
    fn swap_extension_cases() {
        let cases = [
            ("pic.png", Some("pic.webp")),
            ("pic.PNG", Some("pic.webp")),
            ("img/pic.jpeg", Some("img/pic.webp")),
            ("pic.png?v=2", Some("pic.webp?v=2")),
            ("pic.png#frag", Some("pic.webp#frag")),
            ("  pic.png ", Some("  pic.webp ")),
            ("my.png.folder/pic.gif", Some("my.png.folder/pic.webp")),
            ("pic.png.bak", None),
            ("pic.webp", None),
            ("pic", None),
            ("img/.png", None),
            ("dir.png/pic", None),
        ];
        for (src, expected) in cases {
            assert_eq!(
                swap_extension(src, "webp").as_deref(),
                expected,
                "swap_extension({src:?})"
            );
        }
    }

    #[test]
    fn src_path_strips_query_fragment_and_whitespace() {
        assert_eq!(src_path(" pic.png?v=1 "), "pic.png");
        assert_eq!(src_path("pic.png#a?b"), "pic.png");
        assert_eq!(src_path("?only"), "");
    }

    // =========================================================================
    // Substitution
    // =========================================================================

    #[test]
    fn substitution_touches_only_the_src_value() {
        let site = Site::new(&["pic.png"]);
        let html = r#"<img alt="pic.png" class="fastimg" data-full="pic.png" src="pic.png">"#;
        let results = site.scan(html);
        let r = found(&results)[0];

        let out = apply_substitutions(
            html,
            &[Substitution {
                span: r.src_span.clone(),
                replacement: swap_extension(&r.src, "webp").unwrap(),
            }],
        );
        assert_eq!(
            out,
            r#"<img alt="pic.png" class="fastimg" data-full="pic.png" src="pic.webp">"#
        );
    }

    #[test]
    fn identical_src_different_markers_only_marked_tag_changes() {
        let site = Site::new(&["pic.png"]);
        let html = "<img class=\"fastimg\" src=\"pic.png\">\n<img class=\"plain\" src=\"pic.png\">";
        let results = site.scan(html);
        let refs = found(&results);
        assert_eq!(refs.len(), 1);

        let out = apply_substitutions(
            html,
            &[Substitution {
                span: refs[0].src_span.clone(),
                replacement: "pic.webp".into(),
            }],
        );
        assert_eq!(
            out,
            "<img class=\"fastimg\" src=\"pic.webp\">\n<img class=\"plain\" src=\"pic.png\">"
        );
    }

    #[test]
    fn apply_substitutions_orders_and_skips_overlaps() {
        let html = "0123456789";
        let out = apply_substitutions(
            html,
            &[
                Substitution {
                    span: 6..8,
                    replacement: "b".into(),
                },
                Substitution {
                    span: 1..3,
                    replacement: "a".into(),
                },
                Substitution {
                    span: 2..4,
                    replacement: "X".into(),
                },
            ],
        );
        assert_eq!(out, "0a345b89");
    }

    #[test]
    fn apply_no_substitutions_is_identity() {
        let html = "<html>\r\n  <img class=\"fastimg\" src=\"pic.png\">\n</html>";
        assert_eq!(apply_substitutions(html, &[]), html);
    }
}
