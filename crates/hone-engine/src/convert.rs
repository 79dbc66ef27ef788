//! Markdown ⇄ HTML conversion.
//!
//! Markdown documents are edited as HTML. The converter is a seam so the
//! session never depends on a particular Markdown dialect.

use pulldown_cmark::{Options, Parser, html};

use crate::dom::{Dom, NodeData, NodeId};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Conversion failed: {0}")]
    Failed(String),
}

pub trait MarkdownConverter: std::fmt::Debug {
    fn to_html(&self, markdown: &str) -> Result<String, ConvertError>;
    fn to_markdown(&self, html: &str) -> Result<String, ConvertError>;
}

/// CommonMark (plus tables and strikethrough) via `pulldown-cmark`; the
/// reverse direction walks the parsed HTML.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMarkConverter;

impl MarkdownConverter for CommonMarkConverter {
    fn to_html(&self, markdown: &str) -> Result<String, ConvertError> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        let parser = Parser::new_ext(markdown, options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        Ok(out)
    }

    fn to_markdown(&self, html: &str) -> Result<String, ConvertError> {
        let dom = Dom::parse(html);
        let mut out = String::new();
        blocks(&dom, dom.root(), &mut out);
        let trimmed = out.trim_end();
        if trimmed.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("{trimmed}\n"))
    }
}

const SKIPPED: &[&str] = &["head", "script", "style", "title", "template"];

fn blocks(dom: &Dom, node: NodeId, out: &mut String) {
    let mut inline_run = String::new();
    for &child in dom.children(node) {
        if is_block(dom, child) {
            flush_paragraph(&mut inline_run, out);
            block(dom, child, out);
        } else {
            inline(dom, child, &mut inline_run);
        }
    }
    flush_paragraph(&mut inline_run, out);
}

fn flush_paragraph(run: &mut String, out: &mut String) {
    let text = run.trim();
    if !text.is_empty() {
        out.push_str(text);
        out.push_str("\n\n");
    }
    run.clear();
}

fn is_block(dom: &Dom, node: NodeId) -> bool {
    match dom.element_name(node) {
        Some(name) => matches!(
            name,
            "p" | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "ul"
                | "ol"
                | "blockquote"
                | "pre"
                | "hr"
                | "table"
                | "div"
                | "section"
                | "article"
                | "main"
                | "header"
                | "footer"
                | "html"
                | "body"
                | "figure"
        ) || SKIPPED.contains(&name),
        None => false,
    }
}

fn block(dom: &Dom, node: NodeId, out: &mut String) {
    let Some(name) = dom.element_name(node) else {
        return;
    };
    match name {
        "p" => {
            let mut text = String::new();
            inline_children(dom, node, &mut text);
            flush_paragraph(&mut text, out);
        }
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse::<usize>().unwrap_or(1);
            let mut text = String::new();
            inline_children(dom, node, &mut text);
            out.push_str(&"#".repeat(level));
            out.push(' ');
            out.push_str(text.trim());
            out.push_str("\n\n");
        }
        "ul" | "ol" => {
            list(dom, node, name == "ol", "", out);
            out.push('\n');
        }
        "blockquote" => {
            let mut inner = String::new();
            blocks(dom, node, &mut inner);
            for line in inner.trim_end().lines() {
                if line.is_empty() {
                    out.push_str(">\n");
                } else {
                    out.push_str("> ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            out.push('\n');
        }
        "pre" => {
            let code = dom.text_content(node);
            out.push_str("```\n");
            out.push_str(code.strip_suffix('\n').unwrap_or(&code));
            out.push_str("\n```\n\n");
        }
        "hr" => out.push_str("---\n\n"),
        "table" => table(dom, node, out),
        _ if SKIPPED.contains(&name) => {}
        _ => blocks(dom, node, out),
    }
}

fn list(dom: &Dom, node: NodeId, ordered: bool, indent: &str, out: &mut String) {
    let mut number = dom
        .attribute(node, "start")
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(1);
    for &item in dom.children(node) {
        if dom.element_name(item) != Some("li") {
            continue;
        }
        let marker = if ordered {
            let marker = format!("{number}.");
            number += 1;
            marker
        } else {
            "-".to_string()
        };

        let mut line = String::new();
        let mut nested = Vec::new();
        for &child in dom.children(item) {
            match dom.element_name(child) {
                Some("ul") => nested.push((child, false)),
                Some("ol") => nested.push((child, true)),
                Some("p") => {
                    if !line.trim().is_empty() {
                        line.push(' ');
                    }
                    inline_children(dom, child, &mut line);
                }
                _ => inline(dom, child, &mut line),
            }
        }
        out.push_str(indent);
        out.push_str(&marker);
        out.push(' ');
        out.push_str(line.trim());
        out.push('\n');

        let child_indent = format!("{indent}{}", " ".repeat(marker.len() + 1));
        for (child, ordered) in nested {
            list(dom, child, ordered, &child_indent, out);
        }
    }
}

fn table(dom: &Dom, node: NodeId, out: &mut String) {
    let rows: Vec<NodeId> = dom
        .descendants(node)
        .into_iter()
        .filter(|&id| dom.element_name(id) == Some("tr"))
        .collect();
    for (idx, row) in rows.iter().enumerate() {
        let cells: Vec<String> = dom
            .children(*row)
            .iter()
            .filter(|&&c| matches!(dom.element_name(c), Some("td" | "th")))
            .map(|&c| {
                let mut text = String::new();
                inline_children(dom, c, &mut text);
                text.trim().replace('|', "\\|")
            })
            .collect();
        out.push_str("| ");
        out.push_str(&cells.join(" | "));
        out.push_str(" |\n");
        if idx == 0 {
            out.push('|');
            out.push_str(&" --- |".repeat(cells.len()));
            out.push('\n');
        }
    }
    out.push('\n');
}

fn inline_children(dom: &Dom, node: NodeId, out: &mut String) {
    for &child in dom.children(node) {
        inline(dom, child, out);
    }
}

fn wrap(dom: &Dom, node: NodeId, marker: &str, out: &mut String) {
    out.push_str(marker);
    inline_children(dom, node, out);
    out.push_str(marker);
}

fn inline(dom: &Dom, node: NodeId, out: &mut String) {
    match dom.data(node) {
        Some(NodeData::Text(_)) => {
            if let Some(text) = dom.text(node) {
                out.push_str(text);
            }
        }
        Some(NodeData::Element(el)) => match el.name.as_str() {
            "strong" | "b" => wrap(dom, node, "**", out),
            "em" | "i" => wrap(dom, node, "*", out),
            "del" | "s" | "strike" => wrap(dom, node, "~~", out),
            "code" => {
                out.push('`');
                out.push_str(&dom.text_content(node));
                out.push('`');
            }
            "a" => {
                out.push('[');
                inline_children(dom, node, out);
                out.push_str("](");
                out.push_str(dom.attribute(node, "href").unwrap_or(""));
                out.push(')');
            }
            "img" => {
                out.push_str("![");
                out.push_str(dom.attribute(node, "alt").unwrap_or(""));
                out.push_str("](");
                out.push_str(dom.attribute(node, "src").unwrap_or(""));
                out.push(')');
            }
            "br" => out.push_str("  \n"),
            name if SKIPPED.contains(&name) => {}
            _ => inline_children(dom, node, out),
        },
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    #[test]
    fn markdown_to_html() {
        let html = CommonMarkConverter.to_html("# Title\n\nHello *world*.\n").unwrap();
        assert_eq!(html, "<h1>Title</h1>\n<p>Hello <em>world</em>.</p>\n");
    }

    #[test]
    fn common_constructs_survive_a_round_trip() {
        let md = "# Title\n\nHello *world* and **bold** with `code`.\n\n- one\n- two\n  - nested\n\n1. first\n2. second\n\n> quoted\n\n---\n\n[link](https://example.com) ![alt](img.png)\n";
        let converter = CommonMarkConverter;
        let html = converter.to_html(md).unwrap();
        assert_eq!(converter.to_markdown(&html).unwrap(), md);
    }

    #[test]
    fn code_blocks_and_tables() {
        let html = "<pre><code>fn main() {}\n</code></pre>\n<table><thead><tr><th>a</th><th>b</th></tr></thead><tbody><tr><td>1</td><td>2</td></tr></tbody></table>";
        assert_snapshot!(CommonMarkConverter.to_markdown(html).unwrap(), @r"
        ```
        fn main() {}
        ```

        | a | b |
        | --- | --- |
        | 1 | 2 |
        ");
    }

    #[test]
    fn entities_are_decoded() {
        let md = CommonMarkConverter.to_markdown("<p>a &amp; b &lt;c&gt;</p>").unwrap();
        assert_eq!(md, "a & b <c>\n");
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(CommonMarkConverter.to_markdown("").unwrap(), "");
    }
}
