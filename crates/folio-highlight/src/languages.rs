//! The language-keyed grammar mapping.
//!
//! Lookups are exact: the key a caller passes is the key that was registered.
//! Alternative spellings (`py`, `rs`, ...) are ordinary extra entries created
//! with [`Languages::alias`], never a normalization step on lookup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::Grammar;
#[allow(unused_imports)]
use crate::grammar::{GrammarConfig, GrammarError, TreeSitterGrammar};

/// Mapping from language key to grammar.
#[derive(Clone, Default)]
pub struct Languages {
    grammars: HashMap<String, Arc<dyn Grammar>>,
}

impl std::fmt::Debug for Languages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Languages")
            .field("keys", &self.keys())
            .finish()
    }
}

impl Languages {
    /// An empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mapping holding every grammar compiled into this build, plus aliases.
    pub fn builtin() -> Result<Self, GrammarError> {
        #[allow(unused_mut)]
        let mut languages = Self::new();

        macro_rules! register {
            ($feature:literal, $key:literal, $language:expr, $highlights:expr, $injections:expr, [$($alias:literal),*]) => {
                #[cfg(feature = $feature)]
                {
                    let grammar = TreeSitterGrammar::new(GrammarConfig {
                        language: $language.into(),
                        highlights_query: $highlights,
                        injections_query: $injections,
                    })?;
                    languages.register($key, grammar);
                    $(languages.alias($alias, $key);)*
                }
            };
        }

        register!("lang-bash", "bash", tree_sitter_bash::LANGUAGE, tree_sitter_bash::HIGHLIGHT_QUERY, "", ["sh", "shell"]);
        register!("lang-c", "c", tree_sitter_c::LANGUAGE, tree_sitter_c::HIGHLIGHT_QUERY, "", []);
        register!("lang-cpp", "cpp", tree_sitter_cpp::LANGUAGE, tree_sitter_cpp::HIGHLIGHT_QUERY, "", ["c++"]);
        register!("lang-go", "go", tree_sitter_go::LANGUAGE, tree_sitter_go::HIGHLIGHTS_QUERY, "", ["golang"]);
        register!("lang-java", "java", tree_sitter_java::LANGUAGE, tree_sitter_java::HIGHLIGHTS_QUERY, "", []);
        register!("lang-php", "php", tree_sitter_php::LANGUAGE_PHP, tree_sitter_php::HIGHLIGHTS_QUERY, "", []);
        register!("lang-python", "python", tree_sitter_python::LANGUAGE, tree_sitter_python::HIGHLIGHTS_QUERY, "", ["py"]);
        register!("lang-rust", "rust", tree_sitter_rust::LANGUAGE, tree_sitter_rust::HIGHLIGHTS_QUERY, tree_sitter_rust::INJECTIONS_QUERY, ["rs"]);

        Ok(languages)
    }

    /// Register `grammar` under `key`, replacing any previous entry.
    pub fn register(&mut self, key: impl Into<String>, grammar: impl Grammar + 'static) {
        self.grammars.insert(key.into(), Arc::new(grammar));
    }

    /// Make `alias` resolve to the grammar currently registered as `key`.
    ///
    /// Returns `false` (and registers nothing) if `key` is unknown.
    pub fn alias(&mut self, alias: impl Into<String>, key: &str) -> bool {
        match self.grammars.get(key).cloned() {
            Some(grammar) => {
                self.grammars.insert(alias.into(), grammar);
                true
            }
            None => false,
        }
    }

    /// Look up the grammar for `key`.
    pub fn get(&self, key: &str) -> Option<&Arc<dyn Grammar>> {
        self.grammars.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.grammars.contains_key(key)
    }

    /// All registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.grammars.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParseResult;

    struct Nothing;

    impl Grammar for Nothing {
        fn parse(&self, _text: &str) -> ParseResult {
            ParseResult::default()
        }
    }

    #[test]
    fn test_lookup_is_exact() {
        let mut languages = Languages::new();
        languages.register("python", Nothing);
        assert!(languages.contains("python"));
        assert!(!languages.contains("Python"));
        assert!(!languages.contains(" python"));
        assert!(languages.get("py").is_none());
    }

    #[test]
    fn test_alias_shares_grammar() {
        let mut languages = Languages::new();
        languages.register("python", Nothing);
        assert!(languages.alias("py", "python"));
        assert!(!languages.alias("bf", "brainfuck"));
        assert!(Arc::ptr_eq(
            languages.get("py").unwrap(),
            languages.get("python").unwrap()
        ));
        assert_eq!(languages.keys(), vec!["py", "python"]);
        assert_eq!(languages.len(), 2);
    }

    #[cfg(feature = "all-languages")]
    #[test]
    fn test_builtin_grammars_compile() {
        let languages = Languages::builtin().unwrap();
        for key in [
            "bash", "sh", "shell", "c", "cpp", "c++", "go", "golang", "java", "php", "python",
            "py", "rust", "rs",
        ] {
            assert!(languages.contains(key), "missing builtin language {key}");
        }
        assert!(!languages.contains("brainfuck"));
    }
}
