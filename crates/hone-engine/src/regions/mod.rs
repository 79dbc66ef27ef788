/*!
 * # Region Parser
 *
 * Finds the substrings of a source document that the editor exposes as
 * independently editable *regions*.
 *
 * A region is the inner content of an allow-listed element (paragraphs,
 * headings, list items, table cells and a few others) whose open and close
 * tags both appear in the source. Regions are reported in document order
 * and never overlap: once an element becomes a region, nothing inside it is
 * considered.
 *
 * Offsets are byte offsets into the exact string that was parsed. They are
 * never shifted after an edit; the session re-parses the saved output
 * instead.
 */

use std::sync::LazyLock;

use log::trace;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dom::{Dom, NodeId};
use crate::markup::tags;

/// Doctype used when the source declares none.
pub const DEFAULT_DOCTYPE: &str = "<!DOCTYPE html>";

static DOCTYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\u{feff}?\s*(<!doctype[^>]*>)").expect("doctype pattern is valid")
});

/// An editable substring of the original document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// `region-N`, numbered in document order from zero.
    pub id: String,
    /// Lowercased tag name of the element that owns the region.
    pub tag_name: String,
    /// Byte offset where the inner content starts (end of the open tag).
    pub start_offset: usize,
    /// Byte offset where the inner content ends (start of the close tag).
    pub end_offset: usize,
    pub original_content: String,
    /// Live inner markup, filled in by [`crate::editing::sync`].
    pub current_content: Option<String>,
    pub is_dirty: bool,
    /// Path of the owning element from the document root, counting element
    /// children only. Text and comment boundaries do not survive a save and
    /// re-parse, so they are left out.
    pub element_path: Vec<usize>,
}

/// Parses `source` and returns its editable regions in document order.
pub fn parse(source: &str) -> Vec<Region> {
    let dom = Dom::parse(source);
    collect_regions(&dom, source)
}

/// Collects regions from a tree that was parsed from `source`.
///
/// Each region's `element_path` addresses its element inside `dom`, so a
/// live surface built from the same source can be marked without any
/// positional tag matching.
pub fn collect_regions(dom: &Dom, source: &str) -> Vec<Region> {
    let mut regions = Vec::new();
    let mut path = Vec::new();
    walk(dom, dom.root(), source, &mut path, &mut regions);
    regions
}

fn walk(dom: &Dom, node: NodeId, source: &str, path: &mut Vec<usize>, out: &mut Vec<Region>) {
    let elements = dom
        .children(node)
        .iter()
        .copied()
        .filter(|&child| dom.element(child).is_some());
    for (idx, child) in elements.enumerate() {
        path.push(idx);
        match region_for(dom, child, source, path, out.len()) {
            Some(region) => out.push(region),
            None => walk(dom, child, source, path, out),
        }
        path.pop();
    }
}

fn region_for(
    dom: &Dom,
    node: NodeId,
    source: &str,
    path: &[usize],
    ordinal: usize,
) -> Option<Region> {
    let name = dom.element_name(node)?;
    if !tags::is_editable(name) {
        return None;
    }
    let location = dom.location(node)?;
    let Some(close) = location.close else {
        trace!("skipping <{name}> at {}: no close tag", location.open.start);
        return None;
    };
    let (start, end) = (location.open.end, close.start);
    let original_content = source.get(start..end)?.to_string();
    Some(Region {
        id: format!("region-{ordinal}"),
        tag_name: name.to_string(),
        start_offset: start,
        end_offset: end,
        original_content,
        current_content: None,
        is_dirty: false,
        element_path: path.to_vec(),
    })
}

/// Returns the document's leading doctype declaration verbatim, or
/// [`DEFAULT_DOCTYPE`].
pub fn extract_doctype(source: &str) -> String {
    DOCTYPE_RE
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_DOCTYPE.to_string())
}
