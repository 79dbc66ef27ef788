//! In-memory live document surface.
//!
//! `Dom` is the editing surface the rest of the engine works against: an
//! arena of nodes with stable handles, a selection, and a queue of mutation
//! records. It is built from the same lossless token stream the region
//! parser uses, so every region maps to exactly one live element.
//!
//! ## Serialization fidelity
//!
//! Nodes built from source remember the exact text they were parsed from.
//! Serializing an untouched subtree reproduces those bytes; only text that
//! was edited is re-encoded, and only attributes that were changed are
//! rewritten. Transient *marks* (region ids, `contenteditable`) are
//! discoverable through [`Dom::attribute`] but never serialized.
//!
//! ## Node lifetime
//!
//! Nodes are never freed. Removing a node detaches it, so a handle held by
//! an undo command can be re-inserted later with its identity intact.

mod builder;
mod serialize;

use crate::markup::Span;

/// Mark naming the region an element was injected for.
pub const REGION_ID_ATTR: &str = "data-region-id";
/// Mark that makes an element's content independently editable.
pub const EDITABLE_ATTR: &str = "contenteditable";
/// Image attribute holding the `src` that should be written back on save.
pub const ORIGINAL_SRC_ATTR: &str = "data-original-src";

/// Stable handle to a node in a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The document node. Always present, never detached.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Lowercased name.
    pub name: String,
    /// Entity-decoded value; `None` for bare attributes like `hidden`.
    pub value: Option<String>,
    /// Text as parsed and the value it decoded to.
    source: Option<(String, Option<String>)>,
}

impl Attribute {
    fn generated(name: &str, value: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            value: Some(value.to_string()),
            source: None,
        }
    }
}

/// How an element's end is represented in serialized output.
#[derive(Debug, Clone, PartialEq)]
pub enum Close {
    /// An explicit end tag, kept as written.
    Tag(String),
    /// Closed implicitly by the parser (or end of input); nothing is written.
    Implied,
    /// Void or self-closing; nothing is written.
    Void,
    /// Created programmatically; a canonical end tag is written.
    Generated,
}

#[derive(Debug, Clone)]
pub struct ElementData {
    /// Lowercased tag name.
    pub name: String,
    name_raw: String,
    attrs: Vec<Attribute>,
    tail: String,
    close: Close,
    marks: Vec<(String, String)>,
}

impl ElementData {
    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    pub fn close(&self) -> &Close {
        &self.close
    }

    /// Attribute value or mark. Bare attributes read as `""`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref().unwrap_or(""))
            .or_else(|| self.mark(name))
    }

    fn mark(&self, name: &str) -> Option<&str> {
        self.marks
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct TextData {
    /// Decoded character data.
    data: String,
    /// Source text, dropped as soon as the data changes.
    raw: Option<String>,
    /// Content of a script-like element; never entity-encoded.
    literal: bool,
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(TextData),
    Comment(String),
    Doctype(String),
    /// Markup the tree builder could not place, such as a stray end tag.
    Raw(String),
}

/// Where an element's tags sit in the source it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub open: Span,
    pub close: Option<Span>,
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    location: Option<SourceLocation>,
}

/// A boundary point: a node and an offset into it (characters for text
/// nodes, children otherwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A directional selection: `anchor` is where it started, `focus` is the
/// active end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomSelection {
    pub anchor: Position,
    pub focus: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    CharacterData,
    ChildList,
    Attributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub kind: MutationKind,
}

#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    selection: Option<DomSelection>,
    records: Vec<MutationRecord>,
    /// Bumped by every mutation that lands outside an injected region.
    outside_revision: u64,
}

impl Dom {
    /// Builds a live surface from a complete document, recording the source
    /// location of every element.
    pub fn parse(source: &str) -> Self {
        let mut dom = Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
                location: None,
            }],
            selection: None,
            records: Vec::new(),
            outside_revision: 0,
        };
        builder::TreeBuilder::new(&mut dom, source, NodeId::ROOT, true).run();
        dom
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.node(id).map(|n| &n.data)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn location(&self, id: NodeId) -> Option<SourceLocation> {
        self.node(id)?.location
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id)? {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name.as_str())
    }

    /// Character data of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text(t) => Some(t.data.as_str()),
            _ => None,
        }
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Inclusive ancestor check.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(NodeId::ROOT, id)
    }

    /// Largest valid boundary offset inside `id`.
    pub fn max_offset(&self, id: NodeId) -> usize {
        match self.text(id) {
            Some(data) => data.chars().count(),
            None => self.children(id).len(),
        }
    }

    /// All descendants of `id` in document order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attribute(name)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(el) = self.element_mut(id) else {
            return;
        };
        match el.attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = Some(value.to_string()),
            None => el.attrs.push(Attribute::generated(name, value)),
        }
        self.record(id, MutationKind::Attributes);
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let el = self.element_mut(id)?;
        let idx = el.attrs.iter().position(|a| a.name == name)?;
        let removed = el.attrs.remove(idx);
        self.record(id, MutationKind::Attributes);
        Some(removed.value.unwrap_or_default())
    }

    /// Sets a transient mark. Marks are not mutations and are never serialized.
    pub fn set_mark(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(el) = self.element_mut(id) else {
            return;
        };
        match el.marks.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => el.marks.push((name.to_string(), value.to_string())),
        }
    }

    /// Removes the mark `name` from every node, attached or not.
    pub fn clear_marks(&mut self, name: &str) {
        for node in &mut self.nodes {
            if let NodeData::Element(el) = &mut node.data {
                el.marks.retain(|(n, _)| n != name);
            }
        }
    }

    /// First attached element whose attribute (or mark) `name` equals `value`.
    pub fn find_by_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
        self.descendants(NodeId::ROOT)
            .into_iter()
            .find(|&id| self.attribute(id, name) == Some(value))
    }

    /// Nearest inclusive ancestor carrying the mark `name`.
    pub fn closest_marked(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.element(node).and_then(|el| el.mark(name)).is_some() {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Child-index path from `root` down to `node`. Empty when they are equal;
    /// `None` when `node` is not inside `root`.
    pub fn path_from(&self, root: NodeId, node: NodeId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = node;
        while current != root {
            path.push(self.index_in_parent(current)?);
            current = self.parent(current)?;
        }
        path.reverse();
        Some(path)
    }

    /// Walks `path` child by child from `root`.
    pub fn resolve_path(&self, root: NodeId, path: &[usize]) -> Option<NodeId> {
        path.iter()
            .try_fold(root, |node, &idx| self.children(node).get(idx).copied())
    }

    /// Like [`Dom::resolve_path`], but each index counts element children
    /// only.
    pub fn resolve_element_path(&self, root: NodeId, path: &[usize]) -> Option<NodeId> {
        path.iter().try_fold(root, |node, &idx| {
            self.children(node)
                .iter()
                .copied()
                .filter(|&child| self.element(child).is_some())
                .nth(idx)
        })
    }

    /// Creates a detached element that serializes with canonical tags.
    pub fn create_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let name = name.to_ascii_lowercase();
        let close = if crate::markup::tags::is_void(&name) {
            Close::Void
        } else {
            Close::Generated
        };
        let el = ElementData {
            name_raw: name.clone(),
            name,
            attrs: attrs
                .iter()
                .map(|(n, v)| Attribute::generated(n, v))
                .collect(),
            tail: ">".to_string(),
            close,
            marks: Vec::new(),
        };
        self.push_node(NodeData::Element(el), None)
    }

    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.push_node(
            NodeData::Text(TextData {
                data: data.to_string(),
                raw: None,
                literal: false,
            }),
            None,
        )
    }

    fn push_node(&mut self, data: NodeData, location: Option<SourceLocation>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
            location,
        });
        id
    }

    /// Appends without recording a mutation; used while building.
    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    /// Inserts `child` under `parent` at `index` (clamped), detaching it from
    /// its current parent first. Refuses to create a cycle.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> bool {
        if self.node(parent).is_none() || self.node(child).is_none() || self.contains(child, parent)
        {
            return false;
        }
        if self.text(parent).is_some() {
            return false;
        }
        self.detach(child);
        let index = index.min(self.children(parent).len());
        if let Some(node) = self.node_mut(parent) {
            node.children.insert(index, child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(sel) = &mut self.selection {
            for pos in [&mut sel.anchor, &mut sel.focus] {
                if pos.node == parent && pos.offset > index {
                    pos.offset += 1;
                }
            }
        }
        self.record(parent, MutationKind::ChildList);
        true
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let end = self.children(parent).len();
        self.insert_child(parent, end, child)
    }

    /// Removes `id` from its parent, returning where it was.
    pub fn detach(&mut self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.fix_selection_for_removal(id, parent, index);
        if let Some(node) = self.node_mut(parent) {
            node.children.remove(index);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
        self.record(parent, MutationKind::ChildList);
        Some((parent, index))
    }

    fn fix_selection_for_removal(&mut self, removed: NodeId, parent: NodeId, index: usize) {
        let inside: Vec<bool> = match &self.selection {
            Some(sel) => [sel.anchor, sel.focus]
                .iter()
                .map(|pos| self.contains(removed, pos.node))
                .collect(),
            None => return,
        };
        if let Some(sel) = &mut self.selection {
            for (pos, inside) in [&mut sel.anchor, &mut sel.focus].into_iter().zip(inside) {
                if inside {
                    *pos = Position::new(parent, index);
                } else if pos.node == parent && pos.offset > index {
                    pos.offset -= 1;
                }
            }
        }
    }

    /// Replaces every child of `id` with nodes parsed from `html`. The old
    /// descendants are detached, not reused.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        if self.element(id).is_none() && id != NodeId::ROOT {
            return;
        }
        let old = std::mem::take(&mut self.nodes[id.0].children);
        let displaced: Vec<bool> = match &self.selection {
            Some(sel) => [sel.anchor, sel.focus]
                .iter()
                .map(|pos| pos.node == id || old.iter().any(|&c| self.contains(c, pos.node)))
                .collect(),
            None => Vec::new(),
        };
        if let Some(sel) = &mut self.selection {
            for (pos, displaced) in [&mut sel.anchor, &mut sel.focus].into_iter().zip(displaced) {
                if displaced {
                    *pos = Position::new(id, 0);
                }
            }
        }
        for child in old {
            if let Some(node) = self.node_mut(child) {
                node.parent = None;
            }
        }
        builder::TreeBuilder::new(self, html, id, false).run();
        self.record(id, MutationKind::ChildList);
    }

    /// Replaces the character data of a text node.
    pub fn set_text(&mut self, id: NodeId, data: &str) {
        let Some(NodeData::Text(text)) = self.node_mut(id).map(|n| &mut n.data) else {
            return;
        };
        text.data = data.to_string();
        text.raw = None;
        let len = data.chars().count();
        if let Some(sel) = &mut self.selection {
            for pos in [&mut sel.anchor, &mut sel.focus] {
                if pos.node == id {
                    pos.offset = pos.offset.min(len);
                }
            }
        }
        self.record(id, MutationKind::CharacterData);
    }

    /// Inserts `s` at character `offset` of a text node. Boundary points
    /// strictly after `offset` shift right; a caret exactly at `offset` stays.
    pub fn insert_text(&mut self, id: NodeId, offset: usize, s: &str) {
        let Some(NodeData::Text(text)) = self.node_mut(id).map(|n| &mut n.data) else {
            return;
        };
        let at = byte_index(&text.data, offset);
        text.data.insert_str(at, s);
        text.raw = None;
        let inserted = s.chars().count();
        if let Some(sel) = &mut self.selection {
            for pos in [&mut sel.anchor, &mut sel.focus] {
                if pos.node == id && pos.offset > offset {
                    pos.offset += inserted;
                }
            }
        }
        self.record(id, MutationKind::CharacterData);
    }

    /// Deletes `count` characters starting at character `offset`.
    pub fn delete_text(&mut self, id: NodeId, offset: usize, count: usize) {
        let Some(NodeData::Text(text)) = self.node_mut(id).map(|n| &mut n.data) else {
            return;
        };
        let start = byte_index(&text.data, offset);
        let end = byte_index(&text.data, offset + count);
        text.data.replace_range(start..end, "");
        text.raw = None;
        if let Some(sel) = &mut self.selection {
            for pos in [&mut sel.anchor, &mut sel.focus] {
                if pos.node != id || pos.offset <= offset {
                    continue;
                }
                pos.offset = if pos.offset <= offset + count {
                    offset
                } else {
                    pos.offset - count
                };
            }
        }
        self.record(id, MutationKind::CharacterData);
    }

    pub fn selection(&self) -> Option<DomSelection> {
        self.selection
    }

    pub fn set_selection(&mut self, anchor: Position, focus: Position) {
        self.selection = Some(DomSelection { anchor, focus });
    }

    /// Places a caret.
    pub fn collapse(&mut self, node: NodeId, offset: usize) {
        let pos = Position::new(node, offset);
        self.set_selection(pos, pos);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Drains the queued mutation records.
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn has_pending_mutations(&self) -> bool {
        !self.records.is_empty()
    }

    /// Revision counter for mutations outside injected regions. Equal values
    /// mean nothing outside a region changed in between.
    pub fn outside_revision(&self) -> u64 {
        self.outside_revision
    }

    fn record(&mut self, target: NodeId, kind: MutationKind) {
        if self.closest_marked(target, REGION_ID_ATTR).is_none() {
            self.outside_revision += 1;
        }
        self.records.push(MutationRecord { target, kind });
    }
}

fn byte_index(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}
