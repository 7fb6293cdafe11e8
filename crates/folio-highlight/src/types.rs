//! Plain data passed between grammars and the renderer.

/// A highlighted byte range produced by a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Byte offset where the span starts (inclusive).
    pub start: u32,
    /// Byte offset where the span ends (exclusive).
    pub end: u32,
    /// Capture name from the highlights query, e.g. `keyword.function`.
    pub capture: String,
    /// Index of the query pattern that produced this span.
    ///
    /// Later patterns win when two spans cover the exact same range.
    pub pattern_index: u32,
}

/// A region of the source that should be highlighted with another language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    /// Byte offset where the injected region starts.
    pub start: u32,
    /// Byte offset where the injected region ends.
    pub end: u32,
    /// Language key of the injected content.
    pub language: String,
}

/// Output of a single [`Grammar::parse`](crate::Grammar::parse) call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub spans: Vec<Span>,
    pub injections: Vec<Injection>,
}

/// Errors returned by [`Highlighter`](crate::Highlighter).
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    /// No grammar is registered under the requested key.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
}
