//! Whole-document HTML transforms and the in-place transform step.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use fs_err as fs;
use serde::Deserialize;
use tracing::warn;

use folio_highlight::Highlighter;

use crate::chrome::{PageChrome, PageChromeOptions};
use crate::error::{Error, Result, TransformError};
use crate::highlight::{CodeHighlighter, HighlightStats};
use crate::toc::{TableOfContents, TocOptions};
use crate::processor::{FileOutcome, RunStats, WalkOptions, collect_files, process_files};

/// A named rewrite of a complete HTML document.
pub trait HtmlTransform: Send + Sync {
    /// Name used to select the transform in configuration.
    fn name(&self) -> &str;

    fn transform(&self, html: &str) -> Result<String, TransformError>;

    /// Like [`transform`](Self::transform), also recording highlighting counters.
    fn transform_with_stats(
        &self,
        html: &str,
        stats: &mut HighlightStats,
    ) -> Result<String, TransformError> {
        let _ = stats;
        self.transform(html)
    }
}

fn default_transformers() -> Vec<String> {
    vec!["highlight".to_string()]
}

/// Options for [`transform_html`].
#[derive(Debug, Clone, Deserialize)]
pub struct TransformOptions {
    #[serde(flatten)]
    pub walk: WalkOptions,
    /// Transform names, applied in order.
    #[serde(default = "default_transformers")]
    pub transformers: Vec<String>,
}

impl TransformOptions {
    pub fn new(walk: WalkOptions) -> Self {
        Self {
            walk,
            transformers: default_transformers(),
        }
    }

    pub fn with_transformers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transformers = names.into_iter().map(Into::into).collect();
        self
    }
}

/// Transforms available by name.
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: HashMap<String, Arc<dyn HtmlTransform>>,
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in transforms: `highlight`, `page-chrome` and `toc`.
    pub fn builtin(
        highlighter: Highlighter,
        chrome: &PageChromeOptions,
        toc: TocOptions,
    ) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(CodeHighlighter::new(highlighter));
        registry.register(PageChrome::new(chrome)?);
        registry.register(TableOfContents::new(toc)?);
        Ok(registry)
    }

    /// Register `transform` under its own name, replacing any previous entry.
    pub fn register(&mut self, transform: impl HtmlTransform + 'static) {
        self.transforms
            .insert(transform.name().to_string(), Arc::new(transform));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn HtmlTransform>> {
        self.transforms.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve `names` in order.
    ///
    /// Unknown names are an error with `fail_on_error`; otherwise they are
    /// logged and left out.
    pub fn pipeline(
        &self,
        names: &[String],
        fail_on_error: bool,
    ) -> Result<Vec<Arc<dyn HtmlTransform>>> {
        let mut pipeline = Vec::with_capacity(names.len());
        for name in names {
            match self.transforms.get(name) {
                Some(transform) => pipeline.push(transform.clone()),
                None if fail_on_error => return Err(Error::UnknownTransform(name.clone())),
                None => warn!(transformer = %name, "unknown transformer, skipping"),
            }
        }
        Ok(pipeline)
    }
}

/// Run every transform in `pipeline` over the file at `path`, writing it back if it changed.
pub(crate) fn transform_file(
    path: &Path,
    pipeline: &[Arc<dyn HtmlTransform>],
) -> Result<FileOutcome> {
    let html = fs::read_to_string(path)?;
    let mut highlight = HighlightStats::default();

    let mut output: Option<String> = None;
    for transform in pipeline {
        let input = output.as_deref().unwrap_or(&html);
        let next = transform
            .transform_with_stats(input, &mut highlight)
            .map_err(|e| Error::transform(path, e))?;
        output = Some(next);
    }

    let bytes_input = html.len() as u64;
    let output = match output {
        Some(output) if output != html => {
            fs::write(path, &output)?;
            output
        }
        _ => html,
    };

    Ok(FileOutcome {
        bytes_input,
        bytes_output: output.len() as u64,
        highlight,
    })
}

/// Apply the configured transforms to every matching file (default `*.html`) in place.
pub fn transform_html(options: &TransformOptions, registry: &TransformRegistry) -> Result<RunStats> {
    let pipeline = registry.pipeline(&options.transformers, options.walk.fail_on_error)?;
    let files = collect_files(&options.walk, "*.html")?;
    process_files("transform", &files, options.walk.fail_on_error, |path| {
        transform_file(path, &pipeline)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl HtmlTransform for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn transform(&self, html: &str) -> Result<String, TransformError> {
            Ok(html.to_uppercase())
        }
    }

    struct Exclaim;

    impl HtmlTransform for Exclaim {
        fn name(&self) -> &str {
            "exclaim"
        }

        fn transform(&self, html: &str) -> Result<String, TransformError> {
            Ok(format!("{html}!"))
        }
    }

    struct Broken;

    impl HtmlTransform for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn transform(&self, _html: &str) -> Result<String, TransformError> {
            Err(TransformError::TargetNotFound("nav".into()))
        }
    }

    fn registry() -> TransformRegistry {
        let mut registry = TransformRegistry::new();
        registry.register(Upper);
        registry.register(Exclaim);
        registry.register(Broken);
        registry
    }

    #[test]
    fn test_pipeline_resolution() {
        let registry = registry();
        assert_eq!(registry.names(), vec!["broken", "exclaim", "upper"]);

        let names = vec!["upper".to_string(), "nope".to_string()];
        assert!(matches!(
            registry.pipeline(&names, true),
            Err(Error::UnknownTransform(name)) if name == "nope"
        ));
        let pipeline = registry.pipeline(&names, false).unwrap();
        assert_eq!(pipeline.len(), 1);
        assert_eq!(pipeline[0].name(), "upper");
    }

    #[test]
    fn test_builtin_names() {
        let highlighter = Highlighter::new(
            std::sync::Arc::new(folio_highlight::Languages::new()),
            folio_highlight::HighlightConfig::default(),
        );
        let registry = TransformRegistry::builtin(
            highlighter,
            &PageChromeOptions::default(),
            TocOptions::default(),
        )
        .unwrap();
        assert_eq!(registry.names(), vec!["highlight", "page-chrome", "toc"]);
    }

    #[test]
    fn test_transforms_apply_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.html"), "<p>a</p>").unwrap();
        fs::write(dir.path().join("skip.txt"), "<p>a</p>").unwrap();

        let options = TransformOptions::new(WalkOptions::new(dir.path()))
            .with_transformers(["exclaim", "upper"]);
        let stats = transform_html(&options, &registry()).unwrap();

        assert_eq!(stats.files_processed, 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("a.html")).unwrap(),
            "<P>A</P>!"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("skip.txt")).unwrap(),
            "<p>a</p>"
        );
    }

    #[test]
    fn test_failing_transform() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.html"), "<p>a</p>").unwrap();

        let options = TransformOptions::new(WalkOptions::new(dir.path()))
            .with_transformers(["broken"]);
        let err = transform_html(&options, &registry()).unwrap_err();
        assert!(matches!(err, Error::Transform { .. }));

        let options = TransformOptions::new(WalkOptions::new(dir.path()).fail_on_error(false))
            .with_transformers(["broken"]);
        let stats = transform_html(&options, &registry()).unwrap();
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.files_processed, 0);
    }
}
