use super::{Attribute, Close, Dom, ElementData, NodeData, NodeId, ORIGINAL_SRC_ATTR};

impl Dom {
    /// Serialized children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serializes the whole document.
    pub fn to_source(&self) -> String {
        self.inner_html(NodeId::ROOT)
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(data) = self.data(id) else {
            return;
        };
        match data {
            NodeData::Document => {
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeData::Element(el) => {
                write_open_tag(el, out);
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                match &el.close {
                    Close::Tag(raw) => out.push_str(raw),
                    Close::Generated => {
                        out.push_str("</");
                        out.push_str(&el.name_raw);
                        out.push('>');
                    }
                    Close::Implied | Close::Void => {}
                }
            }
            NodeData::Text(text) => match (&text.raw, text.literal) {
                (Some(raw), _) => out.push_str(raw),
                (None, true) => out.push_str(&text.data),
                (None, false) => out.push_str(&html_escape::encode_text(&text.data)),
            },
            NodeData::Comment(s) | NodeData::Doctype(s) | NodeData::Raw(s) => out.push_str(s),
        }
    }
}

fn write_open_tag(el: &ElementData, out: &mut String) {
    out.push('<');
    out.push_str(&el.name_raw);

    // the original-src marker stands in for src and is never written itself
    let persisted_src = el
        .attrs
        .iter()
        .find(|a| a.name == ORIGINAL_SRC_ATTR)
        .map(|a| a.value.as_deref().unwrap_or(""));
    let mut wrote_src = false;
    for attr in &el.attrs {
        if attr.name == ORIGINAL_SRC_ATTR {
            continue;
        }
        let value = match persisted_src {
            Some(src) if attr.name == "src" => {
                wrote_src = true;
                Some(src)
            }
            _ => attr.value.as_deref(),
        };
        write_attribute(attr, value, out);
    }
    if let Some(src) = persisted_src
        && !wrote_src
    {
        out.push_str(" src=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(src));
        out.push('"');
    }
    out.push_str(&el.tail);
}

fn write_attribute(attr: &Attribute, value: Option<&str>, out: &mut String) {
    if let Some((raw, parsed)) = &attr.source
        && parsed.as_deref() == value
    {
        out.push_str(raw);
        return;
    }
    out.push(' ');
    out.push_str(&attr.name);
    if let Some(value) = value {
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(value));
        out.push('"');
    }
}
