//! Highlighting of `code[data-language]` elements in whole HTML documents.
//!
//! Each element whose `data-language` value is a key in the language mapping
//! gets its text content replaced by highlighted markup. Everything else in
//! the document, including code elements with unknown or missing languages,
//! passes through untouched.
//!
//! The rewrite runs in two streaming passes: the first collects the decoded
//! text of every matched element, the second replaces the content of the
//! elements whose language resolves.

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::sync::Arc;

use folio_highlight::{Highlighter, HighlightConfig, HtmlFormat, Languages};
use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, element, rewrite_str, text};

use crate::copy::{Placement, copy_tree, output_placement};
use crate::error::{Result, TransformError};
use crate::processor::{RunStats, WalkOptions, collect_files, process_files, validate_base_dir};
use crate::transform::{HtmlTransform, transform_file};

/// Attribute carrying the language key.
pub const LANGUAGE_ATTRIBUTE: &str = "data-language";

const CODE_SELECTOR: &str = "code[data-language]";

/// Per-document highlighting counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HighlightStats {
    /// Number of elements whose content was replaced.
    pub blocks_highlighted: usize,
    /// Number of elements left alone because their language is unknown.
    pub blocks_skipped: usize,
    /// Unknown language keys, in first-seen order.
    pub unsupported_languages: Vec<String>,
}

impl HighlightStats {
    pub fn merge(&mut self, other: HighlightStats) {
        self.blocks_highlighted += other.blocks_highlighted;
        self.blocks_skipped += other.blocks_skipped;
        for lang in other.unsupported_languages {
            self.record_unsupported(lang);
        }
    }

    fn record_unsupported(&mut self, lang: String) {
        if !self.unsupported_languages.contains(&lang) {
            self.unsupported_languages.push(lang);
        }
    }
}

/// Highlight every `code[data-language]` element of `html` whose language is in `languages`.
pub fn highlight_code_elements(
    html: &str,
    languages: &Arc<Languages>,
    format: &HtmlFormat,
) -> Result<(String, HighlightStats), TransformError> {
    let config = HighlightConfig {
        html_format: format.clone(),
        ..HighlightConfig::default()
    };
    let highlighter = Highlighter::new(languages.clone(), config);
    highlight_with(html, &highlighter)
}

/// Same as [`highlight_code_elements`], with an already configured highlighter.
pub fn highlight_with(
    html: &str,
    highlighter: &Highlighter,
) -> Result<(String, HighlightStats), TransformError> {
    if !html.contains(LANGUAGE_ATTRIBUTE) {
        return Ok((html.to_string(), HighlightStats::default()));
    }

    let texts = collect_code_text(html)?;
    if texts.is_empty() {
        return Ok((html.to_string(), HighlightStats::default()));
    }

    let index = Cell::new(0usize);
    let stats = RefCell::new(HighlightStats::default());

    let output = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(CODE_SELECTOR, |el| {
                let i = index.get();
                index.set(i + 1);

                let Some(key) = el.get_attribute(LANGUAGE_ATTRIBUTE) else {
                    return Ok(());
                };
                let Some(grammar) = highlighter.languages().get(&key) else {
                    let mut stats = stats.borrow_mut();
                    stats.blocks_skipped += 1;
                    stats.record_unsupported(key);
                    return Ok(());
                };

                let text = texts.get(i).map(String::as_str).unwrap_or_default();
                let markup = highlighter.highlight_with_grammar(grammar.as_ref(), &key, text);
                el.set_inner_content(&markup, ContentType::Html);
                stats.borrow_mut().blocks_highlighted += 1;
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )?;

    Ok((output, stats.into_inner()))
}

/// Decoded text content of every `code[data-language]` element, in document order.
fn collect_code_text(html: &str) -> Result<Vec<String>, TransformError> {
    let raw: RefCell<Vec<String>> = RefCell::new(Vec::new());

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(CODE_SELECTOR, |_el| {
                    raw.borrow_mut().push(String::new());
                    Ok(())
                }),
                text!(CODE_SELECTOR, |t| {
                    if let Some(current) = raw.borrow_mut().last_mut() {
                        current.push_str(t.as_str());
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )?;

    Ok(raw
        .into_inner()
        .iter()
        .map(|text| html_escape::decode_html_entities(text).into_owned())
        .collect())
}

/// The `highlight` transform.
#[derive(Debug, Clone)]
pub struct CodeHighlighter {
    highlighter: Highlighter,
}

impl CodeHighlighter {
    pub fn new(highlighter: Highlighter) -> Self {
        Self { highlighter }
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }
}

impl HtmlTransform for CodeHighlighter {
    fn name(&self) -> &str {
        "highlight"
    }

    fn transform(&self, html: &str) -> Result<String, TransformError> {
        highlight_with(html, &self.highlighter).map(|(output, _)| output)
    }

    fn transform_with_stats(
        &self,
        html: &str,
        stats: &mut HighlightStats,
    ) -> Result<String, TransformError> {
        let (output, page) = highlight_with(html, &self.highlighter)?;
        stats.merge(page);
        Ok(output)
    }
}

/// Highlight every `*.html` file under `input_dir`.
///
/// With an `output_dir`, the tree is cloned there first (replacing what was
/// there) and only the clone is modified. An `output_dir` resolving to
/// `input_dir` means in place; one that contains or lies inside it is an
/// error. Files that fail are logged and skipped.
pub fn highlight_directory(
    input_dir: &Path,
    output_dir: Option<&Path>,
    highlighter: &Highlighter,
) -> Result<RunStats> {
    validate_base_dir(input_dir)?;
    let target = match output_dir {
        Some(out) if output_placement(input_dir, out)? == Placement::Separate => {
            copy_tree(input_dir, out)?;
            out
        }
        _ => input_dir,
    };

    let pipeline: Vec<Arc<dyn HtmlTransform>> =
        vec![Arc::new(CodeHighlighter::new(highlighter.clone()))];
    let walk = WalkOptions::new(target).fail_on_error(false);
    let files = collect_files(&walk, "*.html")?;
    process_files("highlight", &files, false, |path| {
        transform_file(path, &pipeline)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_highlight::{Grammar, Injection, ParseResult, Span};
    use indoc::indoc;

    /// Marks the whole input as a single `keyword` span.
    struct WholeKeyword;

    impl Grammar for WholeKeyword {
        fn parse(&self, text: &str) -> ParseResult {
            ParseResult {
                spans: vec![Span {
                    start: 0,
                    end: text.len() as u32,
                    capture: "keyword".into(),
                    pattern_index: 0,
                }],
                injections: vec![],
            }
        }
    }

    /// Marks the first byte as a variable, like `x` in `x=1`.
    struct FirstByteVariable;

    impl Grammar for FirstByteVariable {
        fn parse(&self, text: &str) -> ParseResult {
            ParseResult {
                spans: if text.is_empty() {
                    vec![]
                } else {
                    vec![Span {
                        start: 0,
                        end: 1,
                        capture: "variable".into(),
                        pattern_index: 0,
                    }]
                },
                injections: vec![],
            }
        }
    }

    fn languages() -> Arc<Languages> {
        let mut languages = Languages::new();
        languages.register("python", FirstByteVariable);
        languages.register("kw", WholeKeyword);
        Arc::new(languages)
    }

    fn run(html: &str) -> (String, HighlightStats) {
        highlight_code_elements(html, &languages(), &HtmlFormat::default()).unwrap()
    }

    #[test]
    fn test_known_language_is_replaced_with_library_output() {
        let languages = languages();
        let (html, stats) = run(r#"<code data-language="python">x=1</code>"#);

        let highlighter = Highlighter::new(languages.clone(), HighlightConfig::default());
        let grammar = languages.get("python").unwrap();
        let expected = highlighter
            .highlight_with_grammar(grammar.as_ref(), "python", "x=1");
        assert_eq!(expected, "<a-v>x</a-v>=1");
        assert_eq!(html, format!(r#"<code data-language="python">{expected}</code>"#));
        assert_eq!(stats.blocks_highlighted, 1);
        assert_eq!(stats.blocks_skipped, 0);
    }

    #[test]
    fn test_unknown_language_is_untouched() {
        let input = r#"<code data-language="brainfuck">++</code>"#;
        let (html, stats) = run(input);
        assert_eq!(html, input);
        assert_eq!(stats.blocks_highlighted, 0);
        assert_eq!(stats.blocks_skipped, 1);
        assert_eq!(stats.unsupported_languages, vec!["brainfuck".to_string()]);
    }

    #[test]
    fn test_element_without_attribute_is_untouched() {
        let input = "<p><code>no attribute</code></p>";
        let (html, stats) = run(input);
        assert_eq!(html, input);
        assert_eq!(stats, HighlightStats::default());
    }

    #[test]
    fn test_lookup_is_exact() {
        let input = r#"<code data-language="Python">x</code><code data-language="">y</code>"#;
        let (html, stats) = run(input);
        assert_eq!(html, input);
        assert_eq!(stats.blocks_skipped, 2);
    }

    #[test]
    fn test_text_content_is_decoded_then_escaped() {
        let (html, _) = run(r#"<code data-language="kw">a &lt; b &amp;&amp; c</code>"#);
        assert_eq!(
            html,
            r#"<code data-language="kw"><a-k>a &lt; b &amp;&amp; c</a-k></code>"#
        );
    }

    #[test]
    fn test_descendant_text_is_collected() {
        let (html, _) = run(r#"<code data-language="kw">a<b>b</b>c</code>"#);
        assert_eq!(html, r#"<code data-language="kw"><a-k>abc</a-k></code>"#);
    }

    #[test]
    fn test_mixed_document() {
        let input = indoc! {r#"
            <html><body>
            <pre><code class="language-python" data-language="python">x=1</code></pre>
            <pre><code data-language="brainfuck">++</code></pre>
            <pre><code>plain</code></pre>
            <pre><code data-language="kw">fn</code></pre>
            </body></html>
        "#};
        let (html, stats) = run(input);
        let expected = indoc! {r#"
            <html><body>
            <pre><code class="language-python" data-language="python"><a-v>x</a-v>=1</code></pre>
            <pre><code data-language="brainfuck">++</code></pre>
            <pre><code>plain</code></pre>
            <pre><code data-language="kw"><a-k>fn</a-k></code></pre>
            </body></html>
        "#};
        assert_eq!(html, expected);
        assert_eq!(stats.blocks_highlighted, 2);
        assert_eq!(stats.blocks_skipped, 1);
    }

    #[test]
    fn test_document_without_attribute_skips_parsing() {
        let input = "<p>not even <b>balanced";
        let (html, stats) = run(input);
        assert_eq!(html, input);
        assert_eq!(stats, HighlightStats::default());
    }

    #[test]
    fn test_class_name_format() {
        let (html, _) = highlight_code_elements(
            r#"<code data-language="kw">fn</code>"#,
            &languages(),
            &HtmlFormat::ClassNames,
        )
        .unwrap();
        assert_eq!(
            html,
            r#"<code data-language="kw"><span class="keyword">fn</span></code>"#
        );
    }

    #[test]
    fn test_transform_accumulates_stats() {
        let transform = CodeHighlighter::new(Highlighter::new(languages(), HighlightConfig::default()));
        let mut stats = HighlightStats::default();
        transform
            .transform_with_stats(r#"<code data-language="kw">a</code>"#, &mut stats)
            .unwrap();
        transform
            .transform_with_stats(r#"<code data-language="bf">a</code>"#, &mut stats)
            .unwrap();
        assert_eq!(transform.name(), "highlight");
        assert_eq!(stats.blocks_highlighted, 1);
        assert_eq!(stats.unsupported_languages, vec!["bf".to_string()]);
    }

    #[test]
    fn test_highlight_directory_into_copy() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc");
        let output = dir.path().join("out");
        fs_err::create_dir_all(input.join("sub")).unwrap();
        fs_err::write(input.join("sub/a.html"), r#"<code data-language="kw">fn</code>"#).unwrap();
        fs_err::write(input.join("b.html"), r#"<code data-language="bf">+</code>"#).unwrap();

        let highlighter = Highlighter::new(languages(), HighlightConfig::default());
        let stats = highlight_directory(&input, Some(&output), &highlighter).unwrap();

        assert_eq!(stats.files_processed, 2);
        assert_eq!(stats.blocks_highlighted, 1);
        assert_eq!(stats.blocks_skipped, 1);
        assert_eq!(
            fs_err::read_to_string(output.join("sub/a.html")).unwrap(),
            r#"<code data-language="kw"><a-k>fn</a-k></code>"#
        );
        assert_eq!(
            fs_err::read_to_string(input.join("sub/a.html")).unwrap(),
            r#"<code data-language="kw">fn</code>"#
        );
    }

    #[test]
    fn test_second_run_is_stable_for_whole_text_grammar() {
        let once = run(r#"<code data-language="kw">fn</code>"#).0;
        let twice = run(&once).0;
        assert_eq!(twice, once);
    }

    /// Marks the whole input as a keyword only when it ends with a newline.
    struct TrailingNewlineKeyword;

    impl Grammar for TrailingNewlineKeyword {
        fn parse(&self, text: &str) -> ParseResult {
            ParseResult {
                spans: if text.ends_with('\n') {
                    vec![Span {
                        start: 0,
                        end: text.len() as u32,
                        capture: "keyword".into(),
                        pattern_index: 0,
                    }]
                } else {
                    vec![]
                },
                injections: vec![],
            }
        }
    }

    #[test]
    fn test_second_run_can_differ() {
        let mut languages = Languages::new();
        languages.register("nl", TrailingNewlineKeyword);
        let languages = Arc::new(languages);
        let format = HtmlFormat::default();

        let (once, _) =
            highlight_code_elements("<code data-language=\"nl\">fn\n</code>", &languages, &format)
                .unwrap();
        assert_eq!(once, r#"<code data-language="nl"><a-k>fn</a-k></code>"#);
        let (twice, _) = highlight_code_elements(&once, &languages, &format).unwrap();
        assert_eq!(twice, r#"<code data-language="nl">fn</code>"#);
    }

    /// Injects `inner` over the whole input.
    struct InjectsInner;

    impl Grammar for InjectsInner {
        fn parse(&self, text: &str) -> ParseResult {
            ParseResult {
                spans: vec![],
                injections: vec![Injection {
                    start: 0,
                    end: text.len() as u32,
                    language: "inner".into(),
                }],
            }
        }
    }

    #[test]
    fn test_injections_into_registered_languages_are_followed() {
        let mut languages = Languages::new();
        languages.register("outer", InjectsInner);
        languages.register("inner", WholeKeyword);
        let (html, stats) = highlight_code_elements(
            r#"<code data-language="outer">abc</code>"#,
            &Arc::new(languages),
            &HtmlFormat::default(),
        )
        .unwrap();
        assert_eq!(html, r#"<code data-language="outer"><a-k>abc</a-k></code>"#);
        assert_eq!(stats.blocks_highlighted, 1);
    }

    #[test]
    fn test_highlight_directory_same_directory_spelled_differently() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc");
        fs_err::create_dir_all(input.join("x")).unwrap();
        fs_err::write(input.join("a.html"), r#"<code data-language="kw">fn</code>"#).unwrap();

        let highlighter = Highlighter::new(languages(), HighlightConfig::default());
        let alias = input.join("x/..");
        let stats = highlight_directory(&input, Some(&alias), &highlighter).unwrap();

        assert_eq!(stats.files_processed, 1);
        assert_eq!(
            fs_err::read_to_string(input.join("a.html")).unwrap(),
            r#"<code data-language="kw"><a-k>fn</a-k></code>"#
        );
    }

    #[test]
    fn test_highlight_directory_refuses_overlapping_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc");
        fs_err::create_dir_all(&input).unwrap();
        fs_err::write(input.join("a.html"), r#"<code data-language="kw">fn</code>"#).unwrap();

        let highlighter = Highlighter::new(languages(), HighlightConfig::default());
        for output in [dir.path().to_path_buf(), input.join("out")] {
            let err = highlight_directory(&input, Some(&output), &highlighter).unwrap_err();
            assert!(matches!(err, crate::Error::OutputOverlapsInput { .. }), "{err}");
        }
        assert_eq!(
            fs_err::read_to_string(input.join("a.html")).unwrap(),
            r#"<code data-language="kw">fn</code>"#
        );
        assert!(!input.join("out").exists());
    }

    #[test]
    fn test_highlight_directory_skips_failing_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc");
        fs_err::create_dir_all(&input).unwrap();
        fs_err::write(input.join("a.html"), r#"<code data-language="kw">fn</code>"#).unwrap();
        fs_err::write(input.join("bad.html"), [0xff, 0xfe, 0xfd]).unwrap();

        let highlighter = Highlighter::new(languages(), HighlightConfig::default());
        let stats = highlight_directory(&input, None, &highlighter).unwrap();

        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.files_processed, 1);
        assert_eq!(
            fs_err::read_to_string(input.join("a.html")).unwrap(),
            r#"<code data-language="kw"><a-k>fn</a-k></code>"#
        );
    }
}
