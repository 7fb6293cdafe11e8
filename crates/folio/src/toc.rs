//! Table of contents generation.
//!
//! Headings are numbered by their position in the outline (`section-1`,
//! `section-1.2`, ...), given matching `id`s, and listed as nested `<ol>`s
//! appended to the first element matching a target selector.

use std::cell::{Cell, RefCell};
use std::fmt::Write;
use std::sync::Arc;

use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, Selector, element, rewrite_str, text};
use serde::Deserialize;
use tracing::warn;

use crate::error::{Result, TransformError};
use crate::processor::{RunStats, WalkOptions, collect_files, process_files};
use crate::transform::{HtmlTransform, transform_file};

const ID_PREFIX: &str = "section-";

/// What goes into the table of contents and where it is placed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TocOptions {
    /// Leave `h1` out of the outline; `h2` becomes the top level.
    pub exclude_h1: bool,
    /// Number of heading levels to include.
    pub levels: usize,
    /// Selector of the element the outline is appended to.
    pub target_selector: String,
    /// Optional heading placed before the outline.
    pub title: Option<String>,
    /// Tag used for the title.
    pub title_tag: String,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            exclude_h1: true,
            levels: 3,
            target_selector: "nav".to_string(),
            title: None,
            title_tag: "h4".to_string(),
        }
    }
}

impl TocOptions {
    fn first_level(&self) -> usize {
        if self.exclude_h1 { 2 } else { 1 }
    }

    /// Absolute heading levels included in the outline.
    fn heading_levels(&self) -> std::ops::RangeInclusive<usize> {
        let first = self.first_level();
        let last = (first + self.levels).saturating_sub(1).min(6);
        first..=last
    }
}

/// Options for [`add_table_of_contents`].
#[derive(Debug, Clone, Deserialize)]
pub struct TocStepOptions {
    #[serde(flatten)]
    pub walk: WalkOptions,
    #[serde(flatten)]
    pub toc: TocOptions,
}

/// One line of the outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub id: String,
    pub text: String,
    pub children: Vec<TocEntry>,
}

struct Node {
    id: String,
    text: String,
    children: Vec<usize>,
}

/// Build the outline for headings given as (relative level, text) in document order.
///
/// Relative levels start at 1. A heading deeper than the current depth nests
/// once under the previous entry; a shallower one closes lists until the
/// depths match. Jumping more than two levels past the current depth fails.
pub fn build_outline(headings: &[(usize, String)]) -> Result<Vec<TocEntry>, TransformError> {
    let mut nodes: Vec<Node> = Vec::with_capacity(headings.len());
    let mut roots: Vec<usize> = Vec::new();
    // Open lists, outermost first; `None` is the root list.
    let mut stack: Vec<Option<usize>> = vec![None];
    let mut previous: Option<usize> = None;

    for (level, text) in headings {
        let level = (*level).max(1);
        let depth = stack.len();
        if level > depth + 2 {
            return Err(TransformError::IllegalHeading {
                text: text.clone(),
                level,
                depth,
            });
        }

        while stack.len() > level {
            stack.pop();
        }
        if level > stack.len()
            && let Some(prev) = previous
        {
            stack.push(Some(prev));
        }

        let index = nodes.len();
        nodes.push(Node {
            id: String::new(),
            text: text.clone(),
            children: Vec::new(),
        });
        match stack.last().copied().flatten() {
            Some(parent) => nodes[parent].children.push(index),
            None => roots.push(index),
        }

        let path: Vec<String> = stack
            .iter()
            .map(|list| match list {
                Some(parent) => nodes[*parent].children.len(),
                None => roots.len(),
            })
            .map(|position| position.to_string())
            .collect();
        nodes[index].id = format!("{ID_PREFIX}{}", path.join("."));
        previous = Some(index);
    }

    fn convert(nodes: &[Node], indices: &[usize]) -> Vec<TocEntry> {
        indices
            .iter()
            .map(|&i| TocEntry {
                id: nodes[i].id.clone(),
                text: nodes[i].text.clone(),
                children: convert(nodes, &nodes[i].children),
            })
            .collect()
    }

    Ok(convert(&nodes, &roots))
}

/// Ids in document order, matching the order headings were given to [`build_outline`].
fn ids_in_order(entries: &[TocEntry], ids: &mut Vec<String>) {
    for entry in entries {
        ids.push(entry.id.clone());
        ids_in_order(&entry.children, ids);
    }
}

/// Render the outline as nested `<ol>` lists.
pub fn render_outline(entries: &[TocEntry]) -> String {
    let mut html = String::new();
    write_list(&mut html, entries);
    html
}

fn write_list(html: &mut String, entries: &[TocEntry]) {
    html.push_str("<ol>");
    for entry in entries {
        let _ = write!(
            html,
            "<li><a href='#{}'>{}</a>",
            entry.id,
            html_escape::encode_text(&entry.text)
        );
        if !entry.children.is_empty() {
            write_list(html, &entry.children);
        }
        html.push_str("</li>");
    }
    html.push_str("</ol>");
}

fn normalize_text(raw: &str) -> String {
    html_escape::decode_html_entities(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The `toc` transform.
#[derive(Debug, Clone)]
pub struct TableOfContents {
    options: TocOptions,
    fail_on_missing_target: bool,
}

impl TableOfContents {
    pub fn new(options: TocOptions) -> Result<Self, TransformError> {
        options
            .target_selector
            .parse::<Selector>()
            .map_err(|e| TransformError::Selector {
                selector: options.target_selector.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            options,
            fail_on_missing_target: false,
        })
    }

    /// Fail instead of leaving the document unchanged when the target is missing.
    pub fn with_fail_on_missing_target(mut self, fail: bool) -> Self {
        self.fail_on_missing_target = fail;
        self
    }

    fn collect_headings(&self, html: &str) -> Result<(Vec<(usize, String)>, usize), TransformError> {
        let headings: RefCell<Vec<(usize, String)>> = RefCell::new(Vec::new());
        let targets = Cell::new(0usize);
        let offset = self.options.first_level() - 1;

        let mut handlers = Vec::new();
        for level in self.options.heading_levels() {
            let tag = format!("h{level}");
            let headings = &headings;
            handlers.push(element!(tag.as_str(), move |_el| {
                headings.borrow_mut().push((level - offset, String::new()));
                Ok(())
            }));
            handlers.push(text!(tag.as_str(), move |t| {
                if let Some((_, text)) = headings.borrow_mut().last_mut() {
                    text.push_str(t.as_str());
                }
                Ok(())
            }));
        }
        handlers.push(element!(self.options.target_selector.as_str(), |_el| {
            targets.set(targets.get() + 1);
            Ok(())
        }));

        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: handlers,
                ..RewriteStrSettings::new()
            },
        )?;

        let headings = headings
            .into_inner()
            .into_iter()
            .map(|(level, raw)| (level, normalize_text(&raw)))
            .collect();
        Ok((headings, targets.get()))
    }

    fn outline_markup(&self, entries: &[TocEntry]) -> String {
        let mut markup = String::new();
        if let Some(title) = &self.options.title {
            let tag = &self.options.title_tag;
            let _ = write!(markup, "<{tag}>{}</{tag}>", html_escape::encode_text(title));
        }
        markup.push_str(&render_outline(entries));
        markup
    }
}

impl HtmlTransform for TableOfContents {
    fn name(&self) -> &str {
        "toc"
    }

    fn transform(&self, html: &str) -> Result<String, TransformError> {
        let (headings, targets) = self.collect_headings(html)?;
        if targets == 0 {
            warn!(selector = %self.options.target_selector, "table of contents target matched no elements");
            if self.fail_on_missing_target {
                return Err(TransformError::TargetNotFound(
                    self.options.target_selector.clone(),
                ));
            }
            return Ok(html.to_string());
        }

        let entries = build_outline(&headings)?;
        let mut ids = Vec::with_capacity(headings.len());
        ids_in_order(&entries, &mut ids);
        let markup = self.outline_markup(&entries);

        let index = Cell::new(0usize);
        let placed = Cell::new(false);
        let mut handlers = Vec::new();
        for level in self.options.heading_levels() {
            let tag = format!("h{level}");
            let (index, ids) = (&index, &ids);
            handlers.push(element!(tag.as_str(), move |el| {
                let i = index.get();
                index.set(i + 1);
                if let Some(id) = ids.get(i) {
                    el.set_attribute("id", id)?;
                }
                Ok(())
            }));
        }
        handlers.push(element!(self.options.target_selector.as_str(), |el| {
            if !placed.get() {
                placed.set(true);
                el.append(&markup, ContentType::Html);
            }
            Ok(())
        }));

        Ok(rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: handlers,
                ..RewriteStrSettings::new()
            },
        )?)
    }
}

/// Add a table of contents to every matching file (default `*.html`) in place.
pub fn add_table_of_contents(options: &TocStepOptions) -> Result<RunStats> {
    let toc = TableOfContents::new(options.toc.clone())?
        .with_fail_on_missing_target(options.walk.fail_on_error);
    let pipeline: Vec<Arc<dyn HtmlTransform>> = vec![Arc::new(toc)];
    let files = collect_files(&options.walk, "*.html")?;
    process_files("toc", &files, options.walk.fail_on_error, |path| {
        transform_file(path, &pipeline)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use fs_err as fs;
    use indoc::indoc;

    fn h(level: usize, text: &str) -> (usize, String) {
        (level, text.to_string())
    }

    fn ids(entries: &[TocEntry]) -> Vec<String> {
        let mut ids = Vec::new();
        ids_in_order(entries, &mut ids);
        ids
    }

    #[test]
    fn test_flat_outline() {
        let entries = build_outline(&[h(1, "A"), h(1, "B")]).unwrap();
        assert_eq!(ids(&entries), vec!["section-1", "section-2"]);
    }

    #[test]
    fn test_nested_numbering() {
        let entries =
            build_outline(&[h(1, "A"), h(2, "A1"), h(2, "A2"), h(3, "A2a"), h(1, "B"), h(2, "B1")])
                .unwrap();
        assert_eq!(
            ids(&entries),
            vec![
                "section-1",
                "section-1.1",
                "section-1.2",
                "section-1.2.1",
                "section-2",
                "section-2.1"
            ]
        );
        assert_eq!(entries[0].children[1].children[0].text, "A2a");
    }

    #[test]
    fn test_skipped_level_nests_once() {
        let entries = build_outline(&[h(1, "A"), h(3, "deep"), h(2, "B")]).unwrap();
        assert_eq!(ids(&entries), vec!["section-1", "section-1.1", "section-1.2"]);
    }

    #[test]
    fn test_first_heading_deeper_attaches_to_root() {
        let entries = build_outline(&[h(2, "A"), h(1, "B")]).unwrap();
        assert_eq!(ids(&entries), vec!["section-1", "section-2"]);
    }

    #[test]
    fn test_illegal_jump() {
        let err = build_outline(&[h(1, "A"), h(4, "too deep")]).unwrap_err();
        assert!(matches!(err, TransformError::IllegalHeading { level: 4, depth: 1, .. }));
    }

    #[test]
    fn test_render_escapes_text() {
        let entries = build_outline(&[h(1, "a < b"), h(2, "c")]).unwrap();
        assert_eq!(
            render_outline(&entries),
            "<ol><li><a href='#section-1'>a &lt; b</a><ol><li><a href='#section-1.1'>c</a></li></ol></li></ol>"
        );
    }

    #[test]
    fn test_transform_sets_ids_and_appends_outline() {
        let toc = TableOfContents::new(TocOptions {
            title: Some("Contents".into()),
            ..TocOptions::default()
        })
        .unwrap();
        let html = indoc! {"
            <html><body><nav></nav>
            <h1>Title</h1>
            <h2>Intro  <em>now</em></h2>
            <h3>Detail</h3>
            <h2>End</h2>
            </body></html>
        "};
        let out = toc.transform(html).unwrap();
        let expected = indoc! {"
            <html><body><nav><h4>Contents</h4><ol><li><a href='#section-1'>Intro now</a><ol><li><a href='#section-1.1'>Detail</a></li></ol></li><li><a href='#section-2'>End</a></li></ol></nav>
            <h1>Title</h1>
            <h2 id=\"section-1\">Intro  <em>now</em></h2>
            <h3 id=\"section-1.1\">Detail</h3>
            <h2 id=\"section-2\">End</h2>
            </body></html>
        "};
        assert_eq!(out, expected);
    }

    #[test]
    fn test_include_h1_and_limit_levels() {
        let toc = TableOfContents::new(TocOptions {
            exclude_h1: false,
            levels: 1,
            ..TocOptions::default()
        })
        .unwrap();
        let out = toc
            .transform("<nav></nav><h1>A</h1><h2>skipped</h2>")
            .unwrap();
        assert_eq!(
            out,
            "<nav><ol><li><a href='#section-1'>A</a></li></ol></nav><h1 id=\"section-1\">A</h1><h2>skipped</h2>"
        );
    }

    #[test]
    fn test_missing_target() {
        let html = "<h2>A</h2>";
        let lenient = TableOfContents::new(TocOptions::default()).unwrap();
        assert_eq!(lenient.transform(html).unwrap(), html);

        let strict = lenient.with_fail_on_missing_target(true);
        assert!(matches!(
            strict.transform(html),
            Err(TransformError::TargetNotFound(_))
        ));
    }

    #[test]
    fn test_only_first_target_receives_outline() {
        let toc = TableOfContents::new(TocOptions::default()).unwrap();
        let out = toc.transform("<nav></nav><nav></nav><h2>A</h2>").unwrap();
        assert_eq!(
            out,
            "<nav><ol><li><a href='#section-1'>A</a></li></ol></nav><nav></nav><h2 id=\"section-1\">A</h2>"
        );
    }

    #[test]
    fn test_invalid_selector() {
        let err = TableOfContents::new(TocOptions {
            target_selector: "nav[".into(),
            ..TocOptions::default()
        })
        .unwrap_err();
        assert!(matches!(err, TransformError::Selector { .. }));
    }

    #[test]
    fn test_step_over_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.html"), "<nav></nav><h2>A</h2>").unwrap();
        fs::write(dir.path().join("b.html"), "<h2>no nav</h2>").unwrap();

        let options = TocStepOptions {
            walk: WalkOptions::new(dir.path()),
            toc: TocOptions::default(),
        };
        let err = add_table_of_contents(&options).unwrap_err();
        assert!(matches!(
            err,
            Error::Transform {
                source: TransformError::TargetNotFound(_),
                ..
            }
        ));

        let options = TocStepOptions {
            walk: WalkOptions::new(dir.path()).fail_on_error(false),
            toc: TocOptions::default(),
        };
        let stats = add_table_of_contents(&options).unwrap();
        assert_eq!(stats.files_processed, 2);
        assert!(
            fs::read_to_string(dir.path().join("a.html"))
                .unwrap()
                .contains("<h2 id=\"section-1\">A</h2>")
        );
    }
}
