//! Builds arena nodes from the token stream.
//!
//! This is a small subset of the HTML tree construction rules: an open
//! element stack, implied end tags for the elements authors habitually leave
//! open, and stray end tags kept as raw markup instead of being dropped.

use super::{Attribute, Close, Dom, ElementData, NodeData, NodeId, SourceLocation, TextData};
use crate::markup::{RawAttribute, Span, StartTag, Token, Tokenizer, tags};

const TABLE_SCOPE: &[&str] = &["html", "table", "template"];

pub(super) struct TreeBuilder<'a> {
    dom: &'a mut Dom,
    source: &'a str,
    /// Bottom entry is the context node and is never popped.
    stack: Vec<NodeId>,
    track_locations: bool,
}

impl<'a> TreeBuilder<'a> {
    pub(super) fn new(
        dom: &'a mut Dom,
        source: &'a str,
        context: NodeId,
        track_locations: bool,
    ) -> Self {
        Self {
            dom,
            source,
            stack: vec![context],
            track_locations,
        }
    }

    pub(super) fn run(mut self) {
        for token in Tokenizer::new(self.source) {
            match token {
                Token::StartTag(tag) => self.start_tag(&tag),
                Token::EndTag { name, span } => self.end_tag(&name, span),
                Token::Text(span) => self.text(span),
                Token::Comment(span) => {
                    let text = span.slice(self.source).to_string();
                    self.append_leaf(NodeData::Comment(text));
                }
                Token::Doctype(span) => {
                    let text = span.slice(self.source).to_string();
                    self.append_leaf(NodeData::Doctype(text));
                }
            }
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(NodeId::ROOT)
    }

    fn current_name(&self) -> Option<&str> {
        self.dom.element_name(self.current())
    }

    fn append_leaf(&mut self, data: NodeData) {
        let id = self.dom.push_node(data, None);
        self.dom.attach(self.current(), id);
    }

    fn text(&mut self, span: Span) {
        let raw = span.slice(self.source);
        // textarea and title decode entities; the rest of the raw-text set does not
        let literal = self
            .current_name()
            .is_some_and(|n| tags::is_raw_text(n) && n != "textarea" && n != "title");
        let data = if literal {
            raw.to_string()
        } else {
            html_escape::decode_html_entities(raw).into_owned()
        };
        self.append_leaf(NodeData::Text(TextData {
            data,
            raw: Some(raw.to_string()),
            literal,
        }));
    }

    fn start_tag(&mut self, tag: &StartTag) {
        self.close_implied(&tag.name);

        let close = if tag.self_closing || tags::is_void(&tag.name) {
            Close::Void
        } else {
            Close::Implied
        };
        let open = close == Close::Implied;
        let el = ElementData {
            name: tag.name.clone(),
            name_raw: tag.name_span.slice(self.source).to_string(),
            attrs: tag
                .attrs
                .iter()
                .map(|a| parsed_attribute(a, self.source))
                .collect(),
            tail: tag.tail.slice(self.source).to_string(),
            close,
            marks: Vec::new(),
        };
        let location = self.track_locations.then_some(SourceLocation {
            open: tag.span,
            close: None,
        });
        let id = self.dom.push_node(NodeData::Element(el), location);
        self.dom.attach(self.current(), id);
        if open {
            self.stack.push(id);
        }
    }

    fn end_tag(&mut self, name: &str, span: Span) {
        let found = self
            .stack
            .iter()
            .rposition(|&id| self.dom.element_name(id) == Some(name));
        let Some(pos) = found.filter(|&pos| pos > 0) else {
            let raw = span.slice(self.source).to_string();
            self.append_leaf(NodeData::Raw(raw));
            return;
        };
        // everything above the match was closed implicitly
        self.stack.truncate(pos + 1);
        let Some(id) = self.stack.pop() else {
            return;
        };
        let raw = span.slice(self.source).to_string();
        if let Some(node) = self.dom.node_mut(id) {
            if let NodeData::Element(el) = &mut node.data {
                el.close = Close::Tag(raw);
            }
            if let Some(location) = &mut node.location {
                location.close = Some(span);
            }
        }
    }

    fn close_implied(&mut self, name: &str) {
        match name {
            "li" => self.close_in_scope(&["li"], &["ol", "ul"]),
            "dd" | "dt" => self.close_in_scope(&["dd", "dt"], &["dl"]),
            "td" | "th" => self.close_in_scope_of(&["td", "th"], TABLE_SCOPE),
            "tr" => self.close_in_scope_of(&["tr"], TABLE_SCOPE),
            "thead" | "tbody" | "tfoot" => {
                self.close_in_scope_of(&["thead", "tbody", "tfoot"], TABLE_SCOPE)
            }
            "option" => self.close_in_scope_of(&["option"], &["select", "datalist"]),
            _ => {}
        }
        if tags::closes_paragraph(name) {
            self.close_in_scope(&["p"], &["button"]);
        }
        if tags::is_heading(name) && self.current_name().is_some_and(tags::is_heading) {
            self.stack.pop();
        }
    }

    fn close_in_scope(&mut self, targets: &[&str], extra: &[&str]) {
        let boundaries: Vec<&str> = tags::DEFAULT_SCOPE.iter().chain(extra).copied().collect();
        self.close_in_scope_of(targets, &boundaries);
    }

    /// Pops up to and including the nearest open `targets` element, unless a
    /// boundary element is reached first.
    fn close_in_scope_of(&mut self, targets: &[&str], boundaries: &[&str]) {
        for i in (1..self.stack.len()).rev() {
            let Some(name) = self.dom.element_name(self.stack[i]) else {
                return;
            };
            if targets.contains(&name) {
                self.stack.truncate(i);
                return;
            }
            if boundaries.contains(&name) {
                return;
            }
        }
    }
}

fn parsed_attribute(raw: &RawAttribute, source: &str) -> Attribute {
    let value = raw
        .value
        .as_deref()
        .map(|v| html_escape::decode_html_entities(v).into_owned());
    Attribute {
        name: raw.name.clone(),
        value: value.clone(),
        source: Some((raw.span.slice(source).to_string(), value)),
    }
}

#[cfg(test)]
mod tests {
    use super::super::*;
    use rstest::rstest;

    fn shape(dom: &Dom, id: NodeId) -> String {
        match dom.data(id) {
            Some(NodeData::Element(el)) => {
                let inner: Vec<String> = dom.children(id).iter().map(|&c| shape(dom, c)).collect();
                format!("{}({})", el.name, inner.join(","))
            }
            Some(NodeData::Text(_)) => "#".to_string(),
            Some(NodeData::Raw(s)) => format!("raw{s}"),
            _ => String::new(),
        }
    }

    fn root_shape(src: &str) -> String {
        let dom = Dom::parse(src);
        let parts: Vec<String> = dom.children(dom.root()).iter().map(|&c| shape(&dom, c)).collect();
        parts.join(",")
    }

    #[rstest]
    #[case("<ul><li>a<li>b</ul>", "ul(li(#),li(#))")]
    #[case("<dl><dt>a<dd>b<dt>c</dl>", "dl(dt(#),dd(#),dt(#))")]
    #[case("<table><tr><td>a<td>b<tr><td>c</table>", "table(tr(td(#),td(#)),tr(td(#)))")]
    #[case("<p>a<p>b", "p(#),p(#)")]
    #[case("<p>a<ul><li>b</ul>", "p(#),ul(li(#))")]
    #[case("<h1>a<h2>b</h2>", "h1(#),h2(#)")]
    #[case("<p>a<span>b</p>", "p(#,span(#))")]
    #[case("<div>a</span>b</div>", "div(#,raw</span>,#)")]
    #[case("<ul><li>a<ul><li>b</ul><li>c</ul>", "ul(li(#,ul(li(#))),li(#))")]
    fn implied_structure(#[case] src: &str, #[case] expected: &str) {
        assert_eq!(root_shape(src), expected);
    }

    #[test]
    fn script_text_is_literal() {
        let src = "<script>a &amp;&lt; b</script>";
        let dom = Dom::parse(src);
        let script = dom.children(dom.root())[0];
        let text = dom.children(script)[0];
        assert_eq!(dom.text(text), Some("a &amp;&lt; b"));
        assert_eq!(dom.to_source(), src);
    }

    #[test]
    fn attribute_values_are_decoded() {
        let dom = Dom::parse("<a title=\"x &amp; y\" hidden>l</a>");
        let a = dom.children(dom.root())[0];
        assert_eq!(dom.attribute(a, "title"), Some("x & y"));
        assert_eq!(dom.attribute(a, "hidden"), Some(""));
    }
}
