//! Syntax highlighting for folio.
//!
//! The crate exposes the two things a page needs to highlight code:
//!
//! - [`Languages`]: the mapping from language key to [`Grammar`]
//! - [`Highlighter::highlight_with_grammar`] (or the free function [`highlight`]):
//!   render text with a grammar into HTML markup
//!
//! Grammars are tree-sitter grammars compiled in through cargo features
//! (`lang-rust`, `lang-python`, ...). Anything implementing [`Grammar`] can be
//! registered alongside them.
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_highlight::{Highlighter, HighlightConfig, Languages};
//! use std::sync::Arc;
//!
//! let languages = Arc::new(Languages::builtin()?);
//! let highlighter = Highlighter::new(languages, HighlightConfig::default());
//! let html = highlighter.highlight("python", "x = 1")?;
//! // <a-v>x</a-v> <a-o>=</a-o> <a-n>1</a-n>
//! ```
//!
//! # HTML output formats
//!
//! - **`CustomElements`** (default): compact custom elements, `<a-k>`, `<a-f>`
//! - **`CustomElementsWithPrefix(prefix)`**: `<prefix-k>`
//! - **`ClassNames`**: `<span class="keyword">`
//! - **`ClassNamesWithPrefix(prefix)`**: `<span class="prefix-keyword">`

pub mod captures;
mod css;
mod grammar;
mod languages;
mod render;
mod types;

pub use css::{STYLESHEET_MARKER, selector, stylesheet};
pub use grammar::{GrammarConfig, GrammarError, TreeSitterGrammar};
pub use languages::Languages;
pub use render::spans_to_html;
pub use types::{HighlightError, Injection, ParseResult, Span};

use std::str::FromStr;
use std::sync::Arc;

/// A grammar that can parse text and produce highlight spans.
///
/// Implemented by [`TreeSitterGrammar`] and by test doubles.
pub trait Grammar: Send + Sync {
    /// Parse `text` and return spans plus injection points.
    fn parse(&self, text: &str) -> ParseResult;
}

/// HTML output format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HtmlFormat {
    /// `<a-k>fn</a-k>`
    #[default]
    CustomElements,
    /// `<code-k>fn</code-k>` with prefix `code`
    CustomElementsWithPrefix(String),
    /// `<span class="keyword">fn</span>`
    ClassNames,
    /// `<span class="hl-keyword">fn</span>` with prefix `hl`
    ClassNamesWithPrefix(String),
}

impl FromStr for HtmlFormat {
    type Err = String;

    /// Parses `custom-elements`, `class-names`, and the `:prefix` forms of both.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, prefix) = match s.split_once(':') {
            Some((kind, prefix)) => (kind, Some(prefix)),
            None => (s, None),
        };
        match (kind, prefix) {
            ("custom-elements", None) => Ok(Self::CustomElements),
            ("custom-elements", Some(p)) if !p.is_empty() => {
                Ok(Self::CustomElementsWithPrefix(p.to_string()))
            }
            ("class-names", None) => Ok(Self::ClassNames),
            ("class-names", Some(p)) if !p.is_empty() => {
                Ok(Self::ClassNamesWithPrefix(p.to_string()))
            }
            _ => Err(format!(
                "unknown html format `{s}` (expected custom-elements, class-names, \
                 custom-elements:<prefix> or class-names:<prefix>)"
            )),
        }
    }
}

/// Configuration for [`Highlighter`].
#[derive(Debug, Clone)]
pub struct HighlightConfig {
    /// Maximum depth for following language injections. `0` disables them.
    pub max_injection_depth: u32,
    pub html_format: HtmlFormat,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            max_injection_depth: 3,
            html_format: HtmlFormat::default(),
        }
    }
}

/// Render `text` with `grammar`, registered as `language`, into markup.
///
/// No registry is consulted, so the only injections followed are those back
/// into `language` itself.
pub fn highlight(text: &str, grammar: &dyn Grammar, language: &str, format: &HtmlFormat) -> String {
    let config = HighlightConfig {
        html_format: format.clone(),
        ..HighlightConfig::default()
    };
    Highlighter::new(Arc::new(Languages::new()), config).highlight_with_grammar(grammar, language, text)
}

/// Registry-backed highlighter that also follows language injections.
///
/// Cheap to clone; the registry is shared.
#[derive(Debug, Clone)]
pub struct Highlighter {
    languages: Arc<Languages>,
    config: HighlightConfig,
}

impl Highlighter {
    pub fn new(languages: Arc<Languages>, config: HighlightConfig) -> Self {
        Self { languages, config }
    }

    pub fn languages(&self) -> &Arc<Languages> {
        &self.languages
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// Look up `language` and render `source` with it.
    pub fn highlight(&self, language: &str, source: &str) -> Result<String, HighlightError> {
        let grammar = self
            .languages
            .get(language)
            .ok_or_else(|| HighlightError::UnsupportedLanguage(language.into()))?;
        Ok(self.highlight_with_grammar(grammar.as_ref(), language, source))
    }

    /// Render `source` with an already resolved grammar.
    ///
    /// `language` is the key `grammar` was resolved from; injections naming
    /// that key reuse `grammar` instead of going through the registry.
    pub fn highlight_with_grammar(
        &self,
        grammar: &dyn Grammar,
        language: &str,
        source: &str,
    ) -> String {
        let spans = self.highlight_spans(grammar, language, source);
        spans_to_html(source, spans, &self.config.html_format)
    }

    /// Raw spans for `source`, including those of injected regions.
    pub fn highlight_spans(&self, grammar: &dyn Grammar, language: &str, source: &str) -> Vec<Span> {
        let result = grammar.parse(source);
        let mut all_spans = result.spans;

        if self.config.max_injection_depth > 0 {
            self.process_injections(
                (grammar, language),
                source,
                result.injections,
                0,
                self.config.max_injection_depth,
                &mut all_spans,
            );
        }

        all_spans
    }

    fn process_injections(
        &self,
        host: (&dyn Grammar, &str),
        source: &str,
        injections: Vec<Injection>,
        base_offset: u32,
        remaining_depth: u32,
        all_spans: &mut Vec<Span>,
    ) {
        if remaining_depth == 0 {
            return;
        }

        for injection in injections {
            let start = injection.start as usize;
            let end = injection.end as usize;
            if end > source.len() || start >= end {
                continue;
            }

            let grammar: &dyn Grammar = if injection.language == host.1 {
                host.0
            } else {
                match self.languages.get(&injection.language) {
                    Some(grammar) => grammar.as_ref(),
                    // Unknown injected languages are left unstyled
                    None => continue,
                }
            };

            let injected = &source[start..end];
            let result = grammar.parse(injected);
            all_spans.extend(result.spans.into_iter().map(|mut s| {
                s.start += base_offset + injection.start;
                s.end += base_offset + injection.start;
                s
            }));

            if !result.injections.is_empty() {
                self.process_injections(
                    host,
                    injected,
                    result.injections,
                    base_offset + injection.start,
                    remaining_depth - 1,
                    all_spans,
                );
            }
        }
    }
}
