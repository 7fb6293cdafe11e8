//! Capture classification.
//!
//! Highlight queries use a large, editor-dependent vocabulary of capture names
//! (`@keyword.function`, `@include`, `@repeat`, ...). Rendering only cares
//! about a small fixed set of slots, each with a short tag used for custom
//! elements and a long name used for class-based output.
//!
//! Multiple capture names map to the same slot. Adjacent spans that end up in
//! the same slot are coalesced by the renderer.

/// The fixed set of styling categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Keyword,
    Function,
    String,
    Comment,
    Type,
    Variable,
    Constant,
    Number,
    Operator,
    Punctuation,
    Property,
    Attribute,
    Tag,
    Macro,
    Label,
    Namespace,
    Constructor,
    Title,
    Strong,
    Emphasis,
    Link,
    Literal,
    DiffAdd,
    DiffDelete,
    Embedded,
    Error,
    /// Captures that carry no styling (`spell`, `none`, unknown names).
    None,
}

impl Slot {
    /// Every styled slot, in stylesheet order.
    pub const STYLED: &'static [Slot] = &[
        Slot::Keyword,
        Slot::Function,
        Slot::String,
        Slot::Comment,
        Slot::Type,
        Slot::Variable,
        Slot::Constant,
        Slot::Number,
        Slot::Operator,
        Slot::Punctuation,
        Slot::Property,
        Slot::Attribute,
        Slot::Tag,
        Slot::Macro,
        Slot::Label,
        Slot::Namespace,
        Slot::Constructor,
        Slot::Title,
        Slot::Strong,
        Slot::Emphasis,
        Slot::Link,
        Slot::Literal,
        Slot::DiffAdd,
        Slot::DiffDelete,
        Slot::Embedded,
        Slot::Error,
    ];

    /// Short tag suffix, e.g. `k` for `<a-k>`. `None` for unstyled captures.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Slot::Keyword => Some("k"),
            Slot::Function => Some("f"),
            Slot::String => Some("s"),
            Slot::Comment => Some("c"),
            Slot::Type => Some("t"),
            Slot::Variable => Some("v"),
            Slot::Constant => Some("co"),
            Slot::Number => Some("n"),
            Slot::Operator => Some("o"),
            Slot::Punctuation => Some("p"),
            Slot::Property => Some("pr"),
            Slot::Attribute => Some("at"),
            Slot::Tag => Some("tg"),
            Slot::Macro => Some("m"),
            Slot::Label => Some("l"),
            Slot::Namespace => Some("ns"),
            Slot::Constructor => Some("cr"),
            Slot::Title => Some("tt"),
            Slot::Strong => Some("st"),
            Slot::Emphasis => Some("em"),
            Slot::Link => Some("tu"),
            Slot::Literal => Some("tl"),
            Slot::DiffAdd => Some("da"),
            Slot::DiffDelete => Some("dd"),
            Slot::Embedded => Some("eb"),
            Slot::Error => Some("er"),
            Slot::None => None,
        }
    }

    /// Long name used for class-based output, e.g. `keyword`.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Slot::Keyword => Some("keyword"),
            Slot::Function => Some("function"),
            Slot::String => Some("string"),
            Slot::Comment => Some("comment"),
            Slot::Type => Some("type"),
            Slot::Variable => Some("variable"),
            Slot::Constant => Some("constant"),
            Slot::Number => Some("number"),
            Slot::Operator => Some("operator"),
            Slot::Punctuation => Some("punctuation"),
            Slot::Property => Some("property"),
            Slot::Attribute => Some("attribute"),
            Slot::Tag => Some("tag"),
            Slot::Macro => Some("macro"),
            Slot::Label => Some("label"),
            Slot::Namespace => Some("namespace"),
            Slot::Constructor => Some("constructor"),
            Slot::Title => Some("title"),
            Slot::Strong => Some("strong"),
            Slot::Emphasis => Some("emphasis"),
            Slot::Link => Some("link"),
            Slot::Literal => Some("literal"),
            Slot::DiffAdd => Some("diff-add"),
            Slot::DiffDelete => Some("diff-delete"),
            Slot::Embedded => Some("embedded"),
            Slot::Error => Some("error"),
            Slot::None => None,
        }
    }
}

/// Map any capture name to its slot.
pub fn capture_to_slot(capture: &str) -> Slot {
    let capture = capture.strip_prefix('@').unwrap_or(capture);

    match capture {
        "keyword" | "keyword.conditional" | "keyword.coroutine" | "keyword.debug"
        | "keyword.exception" | "keyword.function" | "keyword.import" | "keyword.operator"
        | "keyword.repeat" | "keyword.return" | "keyword.type" | "keyword.modifier"
        | "keyword.directive" | "keyword.storage" | "keyword.control"
        // nvim-treesitter legacy names
        | "include" | "conditional" | "repeat" | "exception" | "storageclass" | "preproc"
        | "define" | "structure" => Slot::Keyword,

        "function" | "function.builtin" | "function.method" | "function.definition"
        | "function.call" | "function.special" | "method" | "method.call" => Slot::Function,

        "string" | "string.special" | "string.special.symbol" | "string.special.path"
        | "string.special.url" | "string.escape" | "string.regexp" | "string.regex"
        | "character" | "character.special" | "escape" => Slot::String,

        "comment" | "comment.documentation" | "comment.line" | "comment.block" => Slot::Comment,

        "type" | "type.builtin" | "type.qualifier" | "type.definition" | "type.enum"
        | "type.enum.variant" | "type.parameter" => Slot::Type,

        "variable" | "variable.builtin" | "variable.parameter" | "variable.member"
        | "variable.other" | "variable.other.member" | "parameter" | "field" => Slot::Variable,

        "constant" | "constant.builtin" | "constant.builtin.boolean" | "boolean" => {
            Slot::Constant
        }

        "number" | "constant.numeric" | "float" | "number.float" => Slot::Number,

        "operator" => Slot::Operator,

        "punctuation" | "punctuation.bracket" | "punctuation.delimiter" | "punctuation.special" => {
            Slot::Punctuation
        }

        "property" | "property.builtin" => Slot::Property,

        "attribute" | "attribute.builtin" => Slot::Attribute,

        "tag" | "tag.delimiter" | "tag.error" | "tag.attribute" | "tag.builtin" => Slot::Tag,

        "macro" | "function.macro" | "preproc.macro" => Slot::Macro,

        "label" => Slot::Label,

        "namespace" | "module" => Slot::Namespace,

        "constructor" | "constructor.builtin" => Slot::Constructor,

        "text.title" | "markup.heading" => Slot::Title,
        "text.strong" | "markup.bold" => Slot::Strong,
        "text.emphasis" | "markup.italic" => Slot::Emphasis,
        "text.uri" | "text.reference" | "markup.link" | "markup.link.url" => Slot::Link,
        "text.literal" | "markup.raw" | "markup.raw.block" | "markup.raw.inline" => Slot::Literal,

        "diff.addition" | "diff.plus" | "diff.delta" => Slot::DiffAdd,
        "diff.deletion" | "diff.minus" => Slot::DiffDelete,

        "embedded" => Slot::Embedded,
        "error" => Slot::Error,

        "none" | "nospell" | "spell" | "text" | "markup" => Slot::None,

        // Fall back to the prefix
        other => {
            if other.starts_with("keyword") {
                Slot::Keyword
            } else if other.starts_with("function") || other.starts_with("method") {
                Slot::Function
            } else if other.starts_with("string") || other.starts_with("character") {
                Slot::String
            } else if other.starts_with("comment") {
                Slot::Comment
            } else if other.starts_with("type") {
                Slot::Type
            } else if other.starts_with("variable") || other.starts_with("parameter") {
                Slot::Variable
            } else if other.starts_with("constant") {
                Slot::Constant
            } else if other.starts_with("punctuation") {
                Slot::Punctuation
            } else if other.starts_with("tag") {
                Slot::Tag
            } else if other.starts_with("markup.heading") {
                Slot::Title
            } else {
                Slot::None
            }
        }
    }
}

/// Short tag for a capture name, or `None` if the capture is unstyled.
///
/// ```
/// use folio_highlight::captures::tag_for_capture;
///
/// assert_eq!(tag_for_capture("keyword"), Some("k"));
/// assert_eq!(tag_for_capture("keyword.function"), Some("k"));
/// assert_eq!(tag_for_capture("include"), Some("k"));
/// assert_eq!(tag_for_capture("spell"), None);
/// ```
pub fn tag_for_capture(capture: &str) -> Option<&'static str> {
    capture_to_slot(capture).tag()
}

/// Long class name for a short tag.
pub fn tag_to_name(tag: &str) -> Option<&'static str> {
    Slot::STYLED
        .iter()
        .find(|slot| slot.tag() == Some(tag))
        .and_then(|slot| slot.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_fallback() {
        assert_eq!(capture_to_slot("keyword.whatever"), Slot::Keyword);
        assert_eq!(capture_to_slot("@string.special.key"), Slot::String);
        assert_eq!(capture_to_slot("totally.unknown"), Slot::None);
    }

    #[test]
    fn test_tags_are_unique() {
        let mut tags: Vec<_> = Slot::STYLED.iter().filter_map(|s| s.tag()).collect();
        let before = tags.len();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(before, tags.len());
        assert_eq!(before, Slot::STYLED.len());
    }

    #[test]
    fn test_tag_to_name() {
        assert_eq!(tag_to_name("k"), Some("keyword"));
        assert_eq!(tag_to_name("co"), Some("constant"));
        assert_eq!(tag_to_name("zz"), None);
    }
}
