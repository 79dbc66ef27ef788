//! Bounded linear undo history.

use std::fmt;

use log::debug;

use crate::dom::{Dom, NodeId};
use crate::editing::commands::Command;
use crate::editing::selection::{capture, restore};

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// What the history can currently do, as reported to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryState {
    pub can_undo: bool,
    pub can_redo: bool,
}

pub type HistoryListener = Box<dyn FnMut(HistoryState)>;

/// Command history with a cursor.
///
/// `index` points at the last executed command; `None` means nothing is
/// executed. Commands after the cursor form the redo future, which is
/// dropped by the next [`UndoManager::execute`]. When the stack grows past
/// its capacity the oldest command is evicted.
pub struct UndoManager {
    stack: Vec<Command>,
    index: Option<usize>,
    capacity: usize,
    listeners: Vec<HistoryListener>,
}

impl fmt::Debug for UndoManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoManager")
            .field("stack", &self.stack)
            .field("index", &self.index)
            .field("capacity", &self.capacity)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoManager {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stack: Vec::new(),
            index: None,
            capacity: capacity.max(1),
            listeners: Vec::new(),
        }
    }

    /// Runs `cmd` and pushes it onto the history.
    ///
    /// Selections the command does not already carry are captured from the
    /// live surface around the call.
    pub fn execute(&mut self, dom: &mut Dom, cmd: impl Into<Command>) {
        let mut cmd = cmd.into();
        if cmd.selections().before.is_none() {
            cmd.selections_mut().before = capture(dom, dom.root());
        }
        cmd.execute(dom);
        if cmd.selections().after.is_none() {
            cmd.selections_mut().after = capture(dom, dom.root());
        }
        debug!("executed {}", cmd.label());

        self.stack.truncate(self.index.map_or(0, |i| i + 1));
        self.stack.push(cmd);
        if self.stack.len() > self.capacity {
            self.stack.remove(0);
        }
        self.index = self.stack.len().checked_sub(1);
        self.notify();
    }

    /// Reverts the command at the cursor. `false` when there is nothing to
    /// undo.
    pub fn undo(&mut self, dom: &mut Dom) -> bool {
        let Some(index) = self.index else {
            return false;
        };
        let cmd = &mut self.stack[index];
        cmd.undo(dom);
        if let Some(selection) = cmd.selection_before() {
            restore(dom, NodeId::ROOT, selection);
        }
        debug!("undid {}", cmd.label());
        self.index = index.checked_sub(1);
        self.notify();
        true
    }

    /// Re-applies the command after the cursor. `false` when there is
    /// nothing to redo.
    pub fn redo(&mut self, dom: &mut Dom) -> bool {
        let next = self.index.map_or(0, |i| i + 1);
        let Some(cmd) = self.stack.get_mut(next) else {
            return false;
        };
        cmd.redo(dom);
        if let Some(selection) = cmd.selection_after() {
            restore(dom, NodeId::ROOT, selection);
        }
        debug!("redid {}", cmd.label());
        self.index = Some(next);
        self.notify();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.index.map_or(0, |i| i + 1) < self.stack.len()
    }

    pub fn state(&self) -> HistoryState {
        HistoryState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    /// Position of the last executed command.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The command an undo would revert.
    pub fn current(&self) -> Option<&Command> {
        self.stack.get(self.index?)
    }

    pub fn commands(&self) -> &[Command] {
        &self.stack
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.index = None;
        self.notify();
    }

    /// Registers a callback invoked after every history change.
    pub fn subscribe(&mut self, listener: impl FnMut(HistoryState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self) {
        let state = self.state();
        for listener in &mut self.listeners {
            listener(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Position;
    use crate::editing::commands::TextEdit;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (Dom, NodeId) {
        let dom = Dom::parse("<p>0</p>");
        let p = dom.children(dom.root())[0];
        (dom, p)
    }

    /// Simulates typing: change the live content, then record it.
    fn type_into(undo: &mut UndoManager, dom: &mut Dom, p: NodeId, text: &str) {
        let before = dom.inner_html(p);
        dom.set_inner_html(p, text);
        undo.execute(dom, TextEdit::new("region-0", p, before, text));
    }

    fn assert_invariants(undo: &UndoManager) {
        let index = undo.index().map_or(-1, |i| i as isize);
        assert_eq!(undo.can_undo(), index >= 0);
        assert_eq!(undo.can_redo(), index < undo.len() as isize - 1);
    }

    #[test]
    fn undo_redo_walk_the_history() {
        let (mut dom, p) = setup();
        let mut undo = UndoManager::new();
        assert!(!undo.undo(&mut dom));
        assert!(!undo.redo(&mut dom));

        type_into(&mut undo, &mut dom, p, "1");
        type_into(&mut undo, &mut dom, p, "2");
        assert_invariants(&undo);

        assert!(undo.undo(&mut dom));
        assert_eq!(dom.inner_html(p), "1");
        assert!(undo.undo(&mut dom));
        assert_eq!(dom.inner_html(p), "0");
        assert!(!undo.undo(&mut dom));
        assert_invariants(&undo);

        assert!(undo.redo(&mut dom));
        assert!(undo.redo(&mut dom));
        assert_eq!(dom.inner_html(p), "2");
        assert!(!undo.redo(&mut dom));
        assert_invariants(&undo);
    }

    #[test]
    fn execute_after_undo_drops_redo_future() {
        let (mut dom, p) = setup();
        let mut undo = UndoManager::new();
        type_into(&mut undo, &mut dom, p, "1");
        type_into(&mut undo, &mut dom, p, "2");
        undo.undo(&mut dom);
        type_into(&mut undo, &mut dom, p, "3");

        assert!(!undo.can_redo());
        assert_eq!(undo.len(), 2);
        undo.undo(&mut dom);
        assert_eq!(dom.inner_html(p), "1");
        assert_invariants(&undo);
    }

    #[test]
    fn history_is_bounded() {
        let (mut dom, p) = setup();
        let mut undo = UndoManager::with_capacity(3);
        for n in 1..=5 {
            type_into(&mut undo, &mut dom, p, &n.to_string());
        }
        assert_eq!(undo.len(), 3);
        assert_eq!(undo.index(), Some(2));
        while undo.undo(&mut dom) {}
        // the two oldest edits were evicted
        assert_eq!(dom.inner_html(p), "2");
        assert_invariants(&undo);
    }

    #[test]
    fn undo_restores_selection_before() {
        let (mut dom, p) = setup();
        let mut undo = UndoManager::new();
        let text = dom.children(p)[0];
        dom.collapse(text, 1);
        let before = capture(&dom, dom.root());

        dom.set_inner_html(p, "0 and more");
        let typed = dom.children(p)[0];
        dom.collapse(typed, 10);
        undo.execute(
            &mut dom,
            TextEdit::new("region-0", p, "0", "0 and more").with_selections(before.clone(), None),
        );
        assert_eq!(undo.current().unwrap().selection_before(), before.as_ref());

        undo.undo(&mut dom);
        let restored = dom.children(p)[0];
        assert_eq!(dom.selection().unwrap().focus, Position::new(restored, 1));
        undo.redo(&mut dom);
        let redone = dom.children(p)[0];
        assert_eq!(dom.selection().unwrap().focus, Position::new(redone, 10));
    }

    #[test]
    fn listeners_see_every_change() {
        let (mut dom, p) = setup();
        let mut undo = UndoManager::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        undo.subscribe(move |state| sink.borrow_mut().push((state.can_undo, state.can_redo)));

        type_into(&mut undo, &mut dom, p, "1");
        undo.undo(&mut dom);
        undo.redo(&mut dom);
        undo.clear();

        assert_eq!(
            *seen.borrow(),
            vec![(true, false), (false, true), (true, false), (false, false)]
        );
    }
}
