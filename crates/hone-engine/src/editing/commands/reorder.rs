use super::Selections;
use crate::dom::{Dom, NodeId};

/// Moves an element to a new position.
///
/// `new_index` is counted among the new parent's children *before* the
/// element is removed, so moving an element one step down in its own
/// parent uses `old_index + 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reorder {
    pub element: NodeId,
    pub old_parent: NodeId,
    pub old_index: usize,
    pub new_parent: NodeId,
    pub new_index: usize,
    pub selections: Selections,
}

impl Reorder {
    /// Builds a move of `element` from where it currently sits. `None` when
    /// the element is detached.
    pub fn new(dom: &Dom, element: NodeId, new_parent: NodeId, new_index: usize) -> Option<Self> {
        let old_parent = dom.parent(element)?;
        let old_index = dom.index_in_parent(element)?;
        Some(Self {
            element,
            old_parent,
            old_index,
            new_parent,
            new_index,
            selections: Selections::default(),
        })
    }

    /// Insert position once the element has been taken out.
    fn target_index(&self) -> usize {
        if self.old_parent == self.new_parent && self.new_index > self.old_index {
            self.new_index - 1
        } else {
            self.new_index
        }
    }

    pub fn execute(&mut self, dom: &mut Dom) {
        dom.insert_child(self.new_parent, self.target_index(), self.element);
    }

    pub fn undo(&mut self, dom: &mut Dom) {
        dom.insert_child(self.old_parent, self.old_index, self.element);
    }

    pub fn redo(&mut self, dom: &mut Dom) {
        self.execute(dom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, 2, "<ul><li>b</li><li>a</li><li>c</li></ul>")]
    #[case(0, 3, "<ul><li>b</li><li>c</li><li>a</li></ul>")]
    #[case(2, 0, "<ul><li>c</li><li>a</li><li>b</li></ul>")]
    #[case(1, 1, "<ul><li>a</li><li>b</li><li>c</li></ul>")]
    fn moves_within_a_parent(#[case] from: usize, #[case] to: usize, #[case] expected: &str) {
        let src = "<ul><li>a</li><li>b</li><li>c</li></ul>";
        let mut dom = Dom::parse(src);
        let ul = dom.children(dom.root())[0];
        let item = dom.children(ul)[from];
        let mut cmd = Reorder::new(&dom, item, ul, to).unwrap();

        cmd.execute(&mut dom);
        assert_eq!(dom.to_source(), expected);
        cmd.undo(&mut dom);
        assert_eq!(dom.to_source(), src);
        cmd.redo(&mut dom);
        assert_eq!(dom.to_source(), expected);
    }

    #[test]
    fn moves_between_parents() {
        let src = "<ol><li>a</li></ol><ul><li>b</li></ul>";
        let mut dom = Dom::parse(src);
        let ol = dom.children(dom.root())[0];
        let ul = dom.children(dom.root())[1];
        let a = dom.children(ol)[0];
        let mut cmd = Reorder::new(&dom, a, ul, 1).unwrap();
        cmd.execute(&mut dom);
        assert_eq!(dom.to_source(), "<ol></ol><ul><li>b</li><li>a</li></ul>");
        cmd.undo(&mut dom);
        assert_eq!(dom.to_source(), src);
    }

    #[test]
    fn detached_element_cannot_be_reordered() {
        let mut dom = Dom::parse("<p>x</p>");
        let orphan = dom.create_element("p", &[]);
        assert_eq!(Reorder::new(&dom, orphan, dom.root(), 0), None);
    }
}
