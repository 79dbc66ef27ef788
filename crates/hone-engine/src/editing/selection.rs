//! Selection addressing by structural path.
//!
//! Node handles do not survive a content replacement, so anything that has
//! to outlive one (undo history, pending edits) stores the selection as a
//! pair of child-index paths from a root plus offsets.

use serde::{Deserialize, Serialize};

use crate::dom::{Dom, NodeId, Position};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionState {
    pub anchor_path: Vec<usize>,
    pub focus_path: Vec<usize>,
    /// Characters into a text node, children otherwise.
    pub anchor_offset: usize,
    pub focus_offset: usize,
}

/// Records the live selection relative to `root`. `None` without a
/// selection or when either end lies outside `root`.
pub fn capture(dom: &Dom, root: NodeId) -> Option<SelectionState> {
    let selection = dom.selection()?;
    Some(SelectionState {
        anchor_path: dom.path_from(root, selection.anchor.node)?,
        focus_path: dom.path_from(root, selection.focus.node)?,
        anchor_offset: selection.anchor.offset,
        focus_offset: selection.focus.offset,
    })
}

/// Re-applies a captured selection. Offsets are clamped to what the
/// resolved nodes can hold; a path that no longer resolves leaves the
/// selection unchanged.
pub fn restore(dom: &mut Dom, root: NodeId, state: &SelectionState) {
    let (Some(anchor), Some(focus)) = (
        dom.resolve_path(root, &state.anchor_path),
        dom.resolve_path(root, &state.focus_path),
    ) else {
        return;
    };
    let anchor_offset = state.anchor_offset.min(dom.max_offset(anchor));
    let focus_offset = state.focus_offset.min(dom.max_offset(focus));
    dom.set_selection(
        Position::new(anchor, anchor_offset),
        Position::new(focus, focus_offset),
    );
}
