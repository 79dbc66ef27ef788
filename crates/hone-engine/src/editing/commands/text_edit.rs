use super::Selections;
use crate::dom::{Dom, NodeId};
use crate::editing::selection::SelectionState;

/// A change to the content of one region.
///
/// The edit has already happened on the live surface when the command is
/// recorded, so `execute` does nothing. Undo and redo write the stored
/// snapshots back into the region's element.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEdit {
    pub region_id: String,
    pub element: NodeId,
    pub before: String,
    pub after: String,
    pub selections: Selections,
}

impl TextEdit {
    pub fn new(
        region_id: impl Into<String>,
        element: NodeId,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        Self {
            region_id: region_id.into(),
            element,
            before: before.into(),
            after: after.into(),
            selections: Selections::default(),
        }
    }

    pub fn with_selections(
        mut self,
        before: Option<SelectionState>,
        after: Option<SelectionState>,
    ) -> Self {
        self.selections = Selections { before, after };
        self
    }

    pub fn execute(&mut self, _dom: &mut Dom) {}

    pub fn undo(&mut self, dom: &mut Dom) {
        dom.set_inner_html(self.element, &self.before);
    }

    pub fn redo(&mut self, dom: &mut Dom) {
        dom.set_inner_html(self.element, &self.after);
    }

    pub fn can_merge_with(&self, other: &TextEdit) -> bool {
        self.region_id == other.region_id
    }

    /// Extends this edit to end where `other` ends.
    pub fn merge_with(&mut self, other: TextEdit) {
        self.after = other.after;
        self.selections.after = other.selections.after;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn state(offset: usize) -> Option<SelectionState> {
        Some(SelectionState {
            anchor_path: vec![0, 0],
            focus_path: vec![0, 0],
            anchor_offset: offset,
            focus_offset: offset,
        })
    }

    #[test]
    fn undo_and_redo_write_snapshots() {
        let mut dom = Dom::parse("<p>new</p>");
        let p = dom.children(dom.root())[0];
        let mut edit = TextEdit::new("region-0", p, "old <i>x</i>", "new");
        edit.execute(&mut dom);
        assert_eq!(dom.inner_html(p), "new");
        edit.undo(&mut dom);
        assert_eq!(dom.inner_html(p), "old <i>x</i>");
        edit.redo(&mut dom);
        assert_eq!(dom.inner_html(p), "new");
    }

    #[test]
    fn merge_keeps_first_before_and_last_after() {
        let p = NodeId::ROOT;
        let mut first = TextEdit::new("region-0", p, "a", "ab").with_selections(state(1), state(2));
        let second = TextEdit::new("region-0", p, "ab", "abc").with_selections(state(2), state(3));
        assert!(first.can_merge_with(&second));
        first.merge_with(second);
        assert_eq!(first.before, "a");
        assert_eq!(first.after, "abc");
        assert_eq!(first.selections.before, state(1));
        assert_eq!(first.selections.after, state(3));
    }

    #[test]
    fn different_regions_do_not_merge() {
        let a = TextEdit::new("region-0", NodeId::ROOT, "", "x");
        let b = TextEdit::new("region-1", NodeId::ROOT, "", "y");
        assert!(!a.can_merge_with(&b));
    }
}
