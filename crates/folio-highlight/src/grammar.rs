//! Tree-sitter backed [`Grammar`] implementation.
//!
//! ```rust,ignore
//! use folio_highlight::{GrammarConfig, TreeSitterGrammar, Grammar};
//!
//! let grammar = TreeSitterGrammar::new(GrammarConfig {
//!     language: tree_sitter_rust::LANGUAGE.into(),
//!     highlights_query: tree_sitter_rust::HIGHLIGHTS_QUERY,
//!     injections_query: "",
//! })?;
//! let result = grammar.parse("fn main() {}");
//! ```

use crate::Grammar;
use crate::types::{Injection, ParseResult, Span};
use ::tree_sitter::{Language, Parser, Query, QueryCursor};
use streaming_iterator::StreamingIterator;

/// Inputs for [`TreeSitterGrammar::new`].
pub struct GrammarConfig<'a> {
    pub language: Language,
    /// Highlights query source (required).
    pub highlights_query: &'a str,
    /// Injections query source; empty disables injections.
    pub injections_query: &'a str,
}

/// Errors raised while compiling a grammar.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("failed to set parser language: {0}")]
    Language(String),
    #[error("query compilation error: {0}")]
    Query(String),
}

/// A compiled tree-sitter grammar.
///
/// Queries are compiled once and shared; each `parse` call gets its own
/// parser and cursor, so a grammar can be used from several threads at once.
pub struct TreeSitterGrammar {
    language: Language,
    highlights_query: Query,
    injections_query: Option<Query>,
}

impl std::fmt::Debug for TreeSitterGrammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSitterGrammar")
            .field("patterns", &self.highlights_query.pattern_count())
            .field("injections", &self.injections_query.is_some())
            .finish()
    }
}

impl TreeSitterGrammar {
    pub fn new(config: GrammarConfig<'_>) -> Result<Self, GrammarError> {
        // Fail early if the language ABI is incompatible with the runtime
        Parser::new()
            .set_language(&config.language)
            .map_err(|e| GrammarError::Language(e.to_string()))?;

        let highlights_query = Query::new(&config.language, config.highlights_query)
            .map_err(|e| GrammarError::Query(e.to_string()))?;

        let injections_query = if config.injections_query.is_empty() {
            None
        } else {
            Some(
                Query::new(&config.language, config.injections_query)
                    .map_err(|e| GrammarError::Query(e.to_string()))?,
            )
        };

        Ok(Self {
            language: config.language,
            highlights_query,
            injections_query,
        })
    }

    fn injection_capture_indices(query: &Query) -> (Option<u32>, Option<u32>) {
        let mut content_idx = None;
        let mut language_idx = None;
        for (i, name) in query.capture_names().iter().enumerate() {
            match *name {
                "injection.content" => content_idx = Some(i as u32),
                "injection.language" => language_idx = Some(i as u32),
                _ => {}
            }
        }
        (content_idx, language_idx)
    }

    fn collect_injections(
        query: &Query,
        cursor: &mut QueryCursor,
        root: ::tree_sitter::Node<'_>,
        source: &[u8],
    ) -> Vec<Injection> {
        let (content_idx, language_idx) = Self::injection_capture_indices(query);
        let mut injections = Vec::new();
        let mut matches = cursor.matches(query, root, source);

        while let Some(m) = matches.next() {
            let mut content_node = None;
            let mut language_name = None;

            for prop in query.property_settings(m.pattern_index) {
                if prop.key.as_ref() == "injection.language"
                    && let Some(value) = &prop.value
                {
                    language_name = Some(value.to_string());
                }
            }

            for capture in m.captures {
                if Some(capture.index) == content_idx {
                    content_node = Some(capture.node);
                } else if Some(capture.index) == language_idx
                    && language_name.is_none()
                    && let Ok(lang) = capture.node.utf8_text(source)
                {
                    language_name = Some(lang.to_string());
                }
            }

            if let (Some(node), Some(language)) = (content_node, language_name) {
                injections.push(Injection {
                    start: node.start_byte() as u32,
                    end: node.end_byte() as u32,
                    language,
                });
            }
        }

        injections
    }
}

impl Grammar for TreeSitterGrammar {
    fn parse(&self, text: &str) -> ParseResult {
        let mut parser = Parser::new();
        if parser.set_language(&self.language).is_err() {
            return ParseResult::default();
        }
        let Some(tree) = parser.parse(text, None) else {
            return ParseResult::default();
        };

        let root = tree.root_node();
        let source = text.as_bytes();
        let mut cursor = QueryCursor::new();
        let capture_names = self.highlights_query.capture_names();

        let mut spans = Vec::new();
        let mut matches = cursor.matches(&self.highlights_query, root, source);
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let name = capture_names[capture.index as usize];
                if name.starts_with('_') || name.starts_with("injection.") {
                    continue;
                }
                spans.push(Span {
                    start: capture.node.start_byte() as u32,
                    end: capture.node.end_byte() as u32,
                    capture: name.to_string(),
                    pattern_index: m.pattern_index as u32,
                });
            }
        }

        let injections = match &self.injections_query {
            Some(query) => Self::collect_injections(query, &mut cursor, root, source),
            None => Vec::new(),
        };

        ParseResult { spans, injections }
    }
}


#[cfg(all(test, feature = "lang-rust"))]
mod rust_tests {
    use super::*;

    #[test]
    fn test_macro_token_trees_are_injected_as_rust() {
        let grammar = TreeSitterGrammar::new(GrammarConfig {
            language: tree_sitter_rust::LANGUAGE.into(),
            highlights_query: tree_sitter_rust::HIGHLIGHTS_QUERY,
            injections_query: tree_sitter_rust::INJECTIONS_QUERY,
        })
        .unwrap();
        let source = "fn main() { vec![1, 2]; }";
        let result = grammar.parse(source);

        let injection = result
            .injections
            .iter()
            .find(|i| i.language == "rust")
            .unwrap();
        assert_eq!(&source[injection.start as usize..injection.end as usize], "[1, 2]");
    }
}
