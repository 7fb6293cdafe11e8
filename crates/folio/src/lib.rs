//! folio: a static documentation pipeline.
//!
//! The pipeline is a handful of steps, each walking a directory in parallel:
//!
//! - [`convert_markdown`]: markdown to HTML pages, fenced code tagged with `data-language`
//! - [`copy_artifacts`]: front-end files copied into the output tree
//! - [`transform_html`]: named whole-page transforms applied in place
//! - [`add_table_of_contents`]: heading ids plus a nested outline
//!
//! The `highlight` transform is [`highlight_code_elements`]: every
//! `code[data-language]` element whose language the registry knows gets its
//! text replaced by highlighted markup; everything else is left alone.
//!
//! [`build`] runs the steps configured in a [`Config`] in that order.

mod chrome;
mod config;
mod copy;
mod error;
mod highlight;
mod markdown;
mod mask;
mod processor;
mod toc;
mod transform;

pub use chrome::{PageChrome, PageChromeOptions};
pub use config::{Config, DEFAULT_CONFIG_FILE, HighlightSettings};
pub use copy::{CopyOptions, copy_artifacts, copy_tree};
pub use error::{Error, Result, TransformError};
pub use highlight::{
    CodeHighlighter, HighlightStats, LANGUAGE_ATTRIBUTE, highlight_code_elements,
    highlight_directory, highlight_with,
};
pub use markdown::{MarkdownOptions, SITE_ROOT_TOKEN, convert_markdown, render_markdown, site_root};
pub use mask::FileMask;
pub use processor::{FileOutcome, RunStats, WalkOptions, collect_files, validate_base_dir};
pub use toc::{
    TableOfContents, TocEntry, TocOptions, TocStepOptions, add_table_of_contents, build_outline,
    render_outline,
};
pub use transform::{HtmlTransform, TransformOptions, TransformRegistry, transform_html};

use std::path::{Path, PathBuf};

use fs_err as fs;
use tracing::info;

/// Statistics for each step [`build`] ran, in order.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub steps: Vec<(&'static str, RunStats)>,
    /// Stylesheet written, if one was configured.
    pub stylesheet: Option<PathBuf>,
}

impl BuildReport {
    /// All step statistics folded together.
    pub fn total(&self) -> RunStats {
        let mut total = RunStats::default();
        for (_, stats) in &self.steps {
            total.merge(stats.clone());
        }
        total
    }
}

/// Write the highlighting stylesheet for `settings` to `path`.
pub fn write_stylesheet(path: &Path, settings: &HighlightSettings) -> Result<()> {
    let css = folio_highlight::stylesheet(&settings.html_format()?);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, css)?;
    Ok(())
}

/// The transform registry described by `config`.
pub fn registry(config: &Config) -> Result<TransformRegistry> {
    let toc = config
        .toc
        .as_ref()
        .map(|step| step.toc.clone())
        .unwrap_or_default();
    TransformRegistry::builtin(config.highlight.highlighter()?, &config.page_chrome, toc)
}

/// Run every configured step: markdown, copy, transform, then table of contents.
pub fn build(config: &Config) -> Result<BuildReport> {
    let mut report = BuildReport::default();

    if let Some(markdown) = &config.markdown {
        info!(base_dir = %markdown.walk.base_dir.display(), "converting markdown");
        report.steps.push(("markdown", convert_markdown(markdown)?));
    }
    if let Some(copy) = &config.copy {
        info!(base_dir = %copy.walk.base_dir.display(), "copying artifacts");
        report.steps.push(("copy", copy_artifacts(copy)?));
    }
    if let Some(transform) = &config.transform {
        info!(transformers = ?transform.transformers, "transforming html");
        let registry = registry(config)?;
        report.steps.push(("transform", transform_html(transform, &registry)?));
    }
    if let Some(toc) = &config.toc {
        info!(base_dir = %toc.walk.base_dir.display(), "adding table of contents");
        report.steps.push(("toc", add_table_of_contents(toc)?));
    }
    if let Some(path) = &config.highlight.stylesheet {
        write_stylesheet(path, &config.highlight)?;
        report.stylesheet = Some(path.clone());
    }

    Ok(report)
}
