//! HTML rendering from highlight spans.
//!
//! Raw spans from a grammar overlap, repeat and use many capture names. This
//! module resolves them into flat, escaped markup:
//!
//! 1. Identical ranges are deduplicated (styled beats unstyled, later pattern wins).
//! 2. Captures are mapped to slots; unstyled ones are dropped.
//! 3. Adjacent or overlapping spans in the same slot are coalesced, so
//!    `keyword.function` at 0..4 followed by `keyword` at 4..8 becomes one `<a-k>`.
//! 4. Text is emitted wrapped in the innermost active span.

use crate::HtmlFormat;
use crate::captures::{tag_for_capture, tag_to_name};
use crate::types::Span;
use std::collections::HashMap;

/// Opening and closing markup for a short tag in the given format.
fn make_html_tags(short_tag: &str, format: &HtmlFormat) -> (String, String) {
    match format {
        HtmlFormat::CustomElements => (format!("<a-{short_tag}>"), format!("</a-{short_tag}>")),
        HtmlFormat::CustomElementsWithPrefix(prefix) => (
            format!("<{prefix}-{short_tag}>"),
            format!("</{prefix}-{short_tag}>"),
        ),
        HtmlFormat::ClassNames => match tag_to_name(short_tag) {
            Some(name) => (format!("<span class=\"{name}\">"), "</span>".to_string()),
            None => ("<span>".to_string(), "</span>".to_string()),
        },
        HtmlFormat::ClassNamesWithPrefix(prefix) => match tag_to_name(short_tag) {
            Some(name) => (
                format!("<span class=\"{prefix}-{name}\">"),
                "</span>".to_string(),
            ),
            None => ("<span>".to_string(), "</span>".to_string()),
        },
    }
}

#[derive(Debug, Clone)]
struct NormalizedSpan {
    start: u32,
    end: u32,
    tag: &'static str,
}

/// Map captures to slot tags and merge adjacent spans with the same tag.
fn normalize_and_coalesce(spans: Vec<Span>) -> Vec<NormalizedSpan> {
    let mut normalized: Vec<NormalizedSpan> = spans
        .into_iter()
        .filter_map(|span| {
            tag_for_capture(&span.capture).map(|tag| NormalizedSpan {
                start: span.start,
                end: span.end,
                tag,
            })
        })
        .collect();

    normalized.sort_by_key(|s| (s.start, s.end));

    let mut coalesced: Vec<NormalizedSpan> = Vec::with_capacity(normalized.len());
    for span in normalized {
        if let Some(last) = coalesced.last_mut()
            && span.tag == last.tag
            && span.start <= last.end
        {
            last.end = last.end.max(span.end);
            continue;
        }
        coalesced.push(span);
    }

    coalesced
}

/// Keep one span per exact range.
fn dedupe(spans: Vec<Span>) -> Vec<Span> {
    let mut deduped: HashMap<(u32, u32), Span> = HashMap::new();
    for span in spans {
        let key = (span.start, span.end);
        let new_styled = tag_for_capture(&span.capture).is_some();

        match deduped.get(&key) {
            Some(existing) => {
                let existing_styled = tag_for_capture(&existing.capture).is_some();
                let replace = match (new_styled, existing_styled) {
                    (true, false) => true,
                    (false, true) => false,
                    _ => span.pattern_index >= existing.pattern_index,
                };
                if replace {
                    deduped.insert(key, span);
                }
            }
            None => {
                deduped.insert(key, span);
            }
        }
    }
    deduped.into_values().collect()
}

fn push_text(html: &mut String, text: &str, tag: Option<&str>, format: &HtmlFormat) {
    match tag {
        Some(tag) => {
            let (open, close) = make_html_tags(tag, format);
            html.push_str(&open);
            html.push_str(&html_escape::encode_text(text));
            html.push_str(&close);
        }
        None => html.push_str(&html_escape::encode_text(text)),
    }
}

/// Render `source` with `spans` as HTML in the given format.
///
/// Trailing line breaks (`\n` or `\r\n`) are trimmed so the output sits flush inside `<pre><code>`.
pub fn spans_to_html(source: &str, spans: Vec<Span>, format: &HtmlFormat) -> String {
    let source = source.trim_end_matches(['\r', '\n']);

    if spans.is_empty() {
        return html_escape::encode_text(source).into_owned();
    }

    let mut spans = normalize_and_coalesce(dedupe(spans));
    if spans.is_empty() {
        return html_escape::encode_text(source).into_owned();
    }
    spans.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.end.cmp(&a.end)));

    // (pos, is_start, span index); ends sort before starts at the same position
    let mut events: Vec<(u32, bool, usize)> = Vec::with_capacity(spans.len() * 2);
    for (i, span) in spans.iter().enumerate() {
        events.push((span.start, true, i));
        events.push((span.end, false, i));
    }
    events.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut html = String::with_capacity(source.len() * 2);
    let mut last_pos: usize = 0;
    let mut stack: Vec<usize> = Vec::new();

    for (pos, is_start, span_idx) in events {
        let pos = pos as usize;

        if pos > last_pos && pos <= source.len() {
            let tag = stack.last().map(|&top| spans[top].tag);
            push_text(&mut html, &source[last_pos..pos], tag, format);
            last_pos = pos;
        }

        if is_start {
            stack.push(span_idx);
        } else if let Some(idx) = stack.iter().rposition(|&x| x == span_idx) {
            stack.remove(idx);
        }
    }

    if last_pos < source.len() {
        let tag = stack.last().map(|&top| spans[top].tag);
        push_text(&mut html, &source[last_pos..], tag, format);
    }

    html
}
