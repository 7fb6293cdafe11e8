//! Markdown to HTML conversion.

use std::path::{Path, PathBuf};

use fs_err as fs;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, html};
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::error::Result;
use crate::processor::{
    FileOutcome, RunStats, WalkOptions, collect_files, default_true, process_files, relative_path,
};

/// Placeholder in header and footer templates for the path back to the output root.
pub const SITE_ROOT_TOKEN: &str = "${site-root}";

pub const DEFAULT_HEADER: &str = "<html><head></head><body>";
pub const DEFAULT_FOOTER: &str = "</body></html>";

/// Options for [`convert_markdown`].
#[derive(Debug, Clone, Deserialize)]
pub struct MarkdownOptions {
    #[serde(flatten)]
    pub walk: WalkOptions,
    /// Where generated pages are written, mirroring the layout of `base_dir`.
    pub output_dir: PathBuf,
    /// Rewrite local links to `.md` files so they point at the generated `.html`.
    #[serde(default = "default_true")]
    pub fix_markdown_links: bool,
    /// HTML file placed before every page body.
    #[serde(default)]
    pub header: Option<PathBuf>,
    /// HTML file placed after every page body.
    #[serde(default)]
    pub footer: Option<PathBuf>,
}

impl MarkdownOptions {
    pub fn new(walk: WalkOptions, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            walk,
            output_dir: output_dir.into(),
            fix_markdown_links: true,
            header: None,
            footer: None,
        }
    }

    pub(crate) fn resolve_paths(&mut self, root: &Path) {
        self.walk.resolve_paths(root);
        self.output_dir = root.join(&self.output_dir);
        for template in [&mut self.header, &mut self.footer].into_iter().flatten() {
            *template = root.join(&*template);
        }
    }
}

/// Render markdown to an HTML fragment wrapped in `<main>`.
///
/// Fenced code blocks carry their language as `data-language`, ready for the
/// highlighting pass. Raw HTML in the source is escaped, not passed through.
pub fn render_markdown(markdown: &str, fix_links: bool) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES).map(|event| match event {
        Event::Start(Tag::CodeBlock(kind)) => Event::Html(open_code_block(&kind).into()),
        Event::End(TagEnd::CodeBlock) => Event::Html("</code></pre>\n".into()),
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => {
            let dest_url = match correct_link(&dest_url, fix_links) {
                Some(fixed) => fixed.into(),
                None => dest_url,
            };
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            })
        }
        other => other,
    });

    let mut body = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut body, parser);
    format!("<main>{body}</main>")
}

fn open_code_block(kind: &CodeBlockKind<'_>) -> String {
    let language = match kind {
        CodeBlockKind::Fenced(info) => info.split_whitespace().next(),
        CodeBlockKind::Indented => None,
    };
    match language {
        Some(language) => {
            let language = html_escape::encode_double_quoted_attribute(language);
            format!("<pre><code class=\"language-{language}\" data-language=\"{language}\">")
        }
        None => "<pre><code>".to_string(),
    }
}

/// The `.html` form of a local link to a `.md` file; `None` leaves the link alone.
fn correct_link(link: &str, fix_links: bool) -> Option<String> {
    let stem = link.strip_suffix(".md")?;
    // Network-path references (`//host/x.md`) name a host
    if !fix_links || link.starts_with("//") {
        return None;
    }
    match Url::parse(link) {
        Ok(url) if url.host().is_some() => None,
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
            info!(link, "correcting link to markdown file");
            Some(format!("{stem}.html"))
        }
        Err(err) => {
            warn!(link, error = %err, "invalid link url");
            None
        }
    }
}

/// `../` once per directory between `relative` (a file path below the base) and the base.
pub fn site_root(relative: &Path) -> String {
    let depth = relative
        .parent()
        .map_or(0, |parent| parent.components().count());
    "../".repeat(depth)
}

fn read_template(path: Option<&Path>, default: &str) -> Result<String> {
    match path {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => Ok(default.to_string()),
    }
}

fn convert_file(path: &Path, options: &MarkdownOptions, header: &str, footer: &str) -> Result<FileOutcome> {
    let markdown = fs::read_to_string(path)?;
    let body = render_markdown(&markdown, options.fix_markdown_links);

    let relative = relative_path(path, &options.walk.base_dir);
    let root = site_root(&relative);
    let page = format!(
        "{}{body}{}",
        header.replace(SITE_ROOT_TOKEN, &root),
        footer.replace(SITE_ROOT_TOKEN, &root)
    );

    let target = options.output_dir.join(relative.with_extension("html"));
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, &page)?;

    Ok(FileOutcome {
        bytes_input: markdown.len() as u64,
        bytes_output: page.len() as u64,
        ..FileOutcome::default()
    })
}

/// Convert every matching file (default `*.md`) under the base directory to a page in `output_dir`.
pub fn convert_markdown(options: &MarkdownOptions) -> Result<RunStats> {
    let header = read_template(options.header.as_deref(), DEFAULT_HEADER)?;
    let footer = read_template(options.footer.as_deref(), DEFAULT_FOOTER)?;
    let files = collect_files(&options.walk, "*.md")?;
    process_files("markdown", &files, options.walk.fail_on_error, |path| {
        convert_file(path, options, &header, &footer)
    })
}
