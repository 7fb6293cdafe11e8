//! Default stylesheet for highlighted markup.

use std::fmt::Write;

use crate::HtmlFormat;
use crate::captures::Slot;

/// Marker written at the top of generated stylesheets.
pub const STYLESHEET_MARKER: &str = "/* folio syntax highlighting */";

struct Palette {
    light: &'static str,
    dark: &'static str,
    bold: bool,
    italic: bool,
}

fn palette(slot: Slot) -> Palette {
    let (light, dark) = match slot {
        Slot::Keyword => ("#8839ef", "#cba6f7"),
        Slot::Function => ("#1e66f5", "#89b4fa"),
        Slot::String => ("#40a02b", "#a6e3a1"),
        Slot::Comment => ("#8c8fa1", "#7f849c"),
        Slot::Type => ("#df8e1d", "#f9e2af"),
        Slot::Variable => ("#4c4f69", "#cdd6f4"),
        Slot::Constant | Slot::Number => ("#fe640b", "#fab387"),
        Slot::Operator => ("#04a5e5", "#89dceb"),
        Slot::Punctuation => ("#7c7f93", "#9399b2"),
        Slot::Property | Slot::Label => ("#179299", "#94e2d5"),
        Slot::Attribute | Slot::Macro => ("#e64553", "#eba0ac"),
        Slot::Tag | Slot::Title => ("#d20f39", "#f38ba8"),
        Slot::Namespace | Slot::Constructor => ("#7287fd", "#b4befe"),
        Slot::Strong | Slot::Emphasis | Slot::Literal | Slot::Embedded => ("inherit", "inherit"),
        Slot::Link => ("#1e66f5", "#89b4fa"),
        Slot::DiffAdd => ("#40a02b", "#a6e3a1"),
        Slot::DiffDelete | Slot::Error => ("#d20f39", "#f38ba8"),
        Slot::None => ("inherit", "inherit"),
    };
    Palette {
        light,
        dark,
        bold: matches!(slot, Slot::Strong | Slot::Title),
        italic: matches!(slot, Slot::Comment | Slot::Emphasis),
    }
}

/// CSS selector for a slot in the given output format.
pub fn selector(slot: Slot, format: &HtmlFormat) -> Option<String> {
    let tag = slot.tag()?;
    let name = slot.name()?;
    Some(match format {
        HtmlFormat::CustomElements => format!("a-{tag}"),
        HtmlFormat::CustomElementsWithPrefix(prefix) => format!("{prefix}-{tag}"),
        HtmlFormat::ClassNames => format!(".{name}"),
        HtmlFormat::ClassNamesWithPrefix(prefix) => format!(".{prefix}-{name}"),
    })
}

/// Generate a light/dark stylesheet for markup rendered in `format`.
pub fn stylesheet(format: &HtmlFormat) -> String {
    let mut light = String::new();
    let mut dark = String::new();

    for &slot in Slot::STYLED {
        let Some(sel) = selector(slot, format) else {
            continue;
        };
        let p = palette(slot);
        let _ = write!(light, "{sel} {{ color: {};", p.light);
        if p.bold {
            light.push_str(" font-weight: bold;");
        }
        if p.italic {
            light.push_str(" font-style: italic;");
        }
        light.push_str(" }\n");
        let _ = writeln!(dark, "  {sel} {{ color: {}; }}", p.dark);
    }

    format!(
        "{STYLESHEET_MARKER}\n{light}@media (prefers-color-scheme: dark) {{\n{dark}}}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_element_stylesheet() {
        let css = stylesheet(&HtmlFormat::CustomElements);
        assert!(css.starts_with(STYLESHEET_MARKER));
        assert!(css.contains("a-k { color: #8839ef; }"));
        assert!(css.contains("a-c { color: #8c8fa1; font-style: italic; }"));
        assert!(css.contains("@media (prefers-color-scheme: dark)"));
    }

    #[test]
    fn test_class_name_selectors() {
        assert_eq!(
            selector(Slot::Keyword, &HtmlFormat::ClassNames).as_deref(),
            Some(".keyword")
        );
        assert_eq!(
            selector(Slot::Keyword, &HtmlFormat::ClassNamesWithPrefix("hl".into())).as_deref(),
            Some(".hl-keyword")
        );
        assert_eq!(selector(Slot::None, &HtmlFormat::ClassNames), None);
    }
}
