//! Element classification tables used by the tree builder and region parser.

/// Leaf text-bearing elements whose inner content becomes an editable region.
pub const EDITABLE_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "td",
    "th",
    "blockquote",
    "figcaption",
    "dt",
    "dd",
    "label",
    "legend",
    "summary",
];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is not scanned for markup until the matching end tag.
const RAW_TEXT_TAGS: &[&str] = &[
    "script", "style", "textarea", "title", "xmp", "iframe", "noembed", "noframes",
];

/// Elements whose start tag implicitly closes an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "details",
    "dialog",
    "dd",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hgroup",
    "hr",
    "li",
    "main",
    "menu",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "summary",
    "table",
    "ul",
];

pub const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Scope boundaries shared by every scope check.
pub const DEFAULT_SCOPE: &[&str] = &[
    "html", "table", "td", "th", "caption", "marquee", "object", "applet", "template",
];

pub fn is_editable(name: &str) -> bool {
    EDITABLE_TAGS.contains(&name)
}

pub fn is_void(name: &str) -> bool {
    VOID_TAGS.contains(&name)
}

pub fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_TAGS.contains(&name)
}

pub fn closes_paragraph(name: &str) -> bool {
    CLOSES_PARAGRAPH.contains(&name)
}

pub fn is_heading(name: &str) -> bool {
    HEADING_TAGS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("p", true)]
    #[case("h3", true)]
    #[case("summary", true)]
    #[case("div", false)]
    #[case("span", false)]
    #[case("ul", false)]
    fn editable_allow_list(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_editable(name), expected);
    }

    #[test]
    fn void_and_raw_text_are_disjoint() {
        for name in VOID_TAGS {
            assert!(!is_raw_text(name), "{name} is both void and raw text");
        }
    }
}
