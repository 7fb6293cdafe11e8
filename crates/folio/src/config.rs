//! `folio.toml` configuration.
//!
//! Every step has its own optional table; a step runs during `build` only if
//! its table is present. Relative paths are resolved against the directory
//! containing the configuration file.
//!
//! ```toml
//! [markdown]
//! base_dir = "docs"
//! output_dir = "target/site"
//! header = "templates/header.html"
//!
//! [copy]
//! base_dir = "frontend"
//! output_dir = "target/site"
//!
//! [transform]
//! base_dir = "target/site"
//! transformers = ["page-chrome", "highlight"]
//!
//! [toc]
//! base_dir = "target/site"
//! title = "Contents"
//!
//! [highlight]
//! format = "custom-elements"
//! stylesheet = "target/site/css/highlight.css"
//!
//! [page_chrome]
//! copyright_holder = "Folio Authors"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use folio_highlight::{HighlightConfig, Highlighter, HtmlFormat, Languages};
use fs_err as fs;
use serde::Deserialize;

use crate::chrome::PageChromeOptions;
use crate::copy::CopyOptions;
use crate::error::{Error, Result};
use crate::markdown::MarkdownOptions;
use crate::toc::TocStepOptions;
use crate::transform::TransformOptions;

/// File name looked up when no configuration path is given.
pub const DEFAULT_CONFIG_FILE: &str = "folio.toml";

/// Highlighting settings shared by the `highlight` transform and the stylesheet.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HighlightSettings {
    /// `custom-elements`, `class-names`, or either with a `:prefix`.
    pub format: String,
    pub max_injection_depth: u32,
    /// Where to write the generated stylesheet during `build`.
    pub stylesheet: Option<PathBuf>,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            format: "custom-elements".to_string(),
            max_injection_depth: HighlightConfig::default().max_injection_depth,
            stylesheet: None,
        }
    }
}

impl HighlightSettings {
    pub fn html_format(&self) -> Result<HtmlFormat> {
        self.format.parse().map_err(Error::HtmlFormat)
    }

    /// A highlighter over every built-in language.
    pub fn highlighter(&self) -> Result<Highlighter> {
        let languages = Arc::new(Languages::builtin()?);
        Ok(Highlighter::new(
            languages,
            HighlightConfig {
                max_injection_depth: self.max_injection_depth,
                html_format: self.html_format()?,
            },
        ))
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub markdown: Option<MarkdownOptions>,
    pub copy: Option<CopyOptions>,
    pub transform: Option<TransformOptions>,
    pub toc: Option<TocStepOptions>,
    pub highlight: HighlightSettings,
    pub page_chrome: PageChromeOptions,
}

impl Config {
    /// Read and parse `path`, resolving relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let root = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&text, root).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration text, resolving relative paths against `root`.
    pub fn parse(text: &str, root: &Path) -> std::result::Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(text)?;
        config.resolve_paths(root);
        Ok(config)
    }

    fn resolve_paths(&mut self, root: &Path) {
        if let Some(markdown) = &mut self.markdown {
            markdown.resolve_paths(root);
        }
        if let Some(copy) = &mut self.copy {
            copy.resolve_paths(root);
        }
        if let Some(transform) = &mut self.transform {
            transform.walk.resolve_paths(root);
        }
        if let Some(toc) = &mut self.toc {
            toc.walk.resolve_paths(root);
        }
        if let Some(stylesheet) = &self.highlight.stylesheet {
            self.highlight.stylesheet = Some(root.join(stylesheet));
        }
        self.page_chrome.resolve_paths(root);
    }
}
