//! Error types for the pipeline.

use std::path::PathBuf;

/// Errors raised while transforming a single HTML document.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The HTML rewriter failed.
    #[error("html rewriting failed: {0}")]
    Rewrite(#[from] lol_html::errors::RewritingError),

    /// A CSS selector taken from configuration did not parse.
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    /// A heading skips too many levels to be placed in the table of contents.
    #[error("illegal heading level {level} for `{text}` (current depth {depth})")]
    IllegalHeading {
        text: String,
        level: usize,
        depth: usize,
    },

    /// The table of contents target selector matched nothing.
    #[error("table of contents target `{0}` matched no elements")]
    TargetNotFound(String),
}

/// Errors raised by the pipeline steps.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("base directory does not exist: {}", .0.display())]
    MissingBaseDir(PathBuf),

    #[error("base directory is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// I/O failure. Paths are carried by the `fs-err` message.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The output directory overlaps the input tree.
    #[error("output {} overlaps input {}", output.display(), input.display())]
    OutputOverlapsInput { input: PathBuf, output: PathBuf },

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid file mask `{mask}`: {source}")]
    FileMask {
        mask: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{}: {source}", path.display())]
    Transform {
        path: PathBuf,
        #[source]
        source: TransformError,
    },

    /// A transform could not be set up, e.g. from a bad selector.
    #[error(transparent)]
    Html(#[from] TransformError),

    #[error("unknown transformer `{0}`")]
    UnknownTransform(String),

    #[error("invalid highlight format: {0}")]
    HtmlFormat(String),

    #[error(transparent)]
    Grammar(#[from] folio_highlight::GrammarError),
}

impl Error {
    pub(crate) fn transform(path: impl Into<PathBuf>, source: TransformError) -> Self {
        Error::Transform {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
