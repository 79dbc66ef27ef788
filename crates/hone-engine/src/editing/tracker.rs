//! Turns raw mutations into debounced text edits.
//!
//! The tracker keeps a clean snapshot of every region (its markup and the
//! selection captured with it). The first mutation inside a region opens a
//! pending edit whose "before" is that snapshot; further mutations in the
//! same region only push the deadline back. The pending edit is committed
//! to the history when the deadline passes, on an explicit
//! [`MutationTracker::flush`], or when a mutation lands in another region.
//!
//! Time is passed in by the caller so the event loop owns the clock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::dom::{Dom, NodeId, REGION_ID_ATTR};
use crate::editing::commands::TextEdit;
use crate::editing::selection::{SelectionState, capture};
use crate::editing::sync::region_elements;
use crate::editing::undo::UndoManager;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
struct CleanSnapshot {
    content: String,
    selection: Option<SelectionState>,
}

#[derive(Debug)]
pub struct MutationTracker {
    debounce: Duration,
    snapshots: HashMap<String, CleanSnapshot>,
    pending: Option<TextEdit>,
    deadline: Option<Instant>,
    paused: bool,
}

impl Default for MutationTracker {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl MutationTracker {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            snapshots: HashMap::new(),
            pending: None,
            deadline: None,
            paused: false,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// When the pending edit will be committed, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Retakes the clean snapshot of every region on the live surface.
    pub fn refresh_snapshots(&mut self, dom: &Dom) {
        let selection = capture(dom, NodeId::ROOT);
        self.snapshots = region_elements(dom)
            .into_iter()
            .map(|(id, node)| {
                let snapshot = CleanSnapshot {
                    content: dom.inner_html(node),
                    selection: selection.clone(),
                };
                (id, snapshot)
            })
            .collect();
    }

    /// Stores the current selection with the clean snapshot of the region
    /// it sits in, so the next edit there undoes to this caret.
    pub fn note_selection(&mut self, dom: &Dom) {
        if self.pending.is_some() {
            return;
        }
        let Some(selection) = dom.selection() else {
            return;
        };
        let Some(id) = dom
            .closest_marked(selection.focus.node, REGION_ID_ATTR)
            .and_then(|element| dom.attribute(element, REGION_ID_ATTR))
        else {
            return;
        };
        if let Some(snapshot) = self.snapshots.get_mut(id) {
            snapshot.selection = capture(dom, NodeId::ROOT);
        }
    }

    /// Consumes queued mutation records.
    ///
    /// Records outside any region are ignored here; structural edits are
    /// recorded as their own commands.
    pub fn observe(&mut self, dom: &mut Dom, undo: &mut UndoManager, now: Instant) {
        let records = dom.take_mutations();
        if self.paused {
            return;
        }
        for record in records {
            let Some(element) = dom.closest_marked(record.target, REGION_ID_ATTR) else {
                continue;
            };
            if !dom.is_attached(element) {
                continue;
            }
            let Some(region_id) = dom.attribute(element, REGION_ID_ATTR).map(str::to_string)
            else {
                continue;
            };
            if self
                .pending
                .as_ref()
                .is_some_and(|pending| pending.region_id != region_id)
            {
                self.flush(dom, undo);
            }
            if self.pending.is_none() {
                let Some(snapshot) = self.snapshots.get(&region_id) else {
                    trace!("no clean snapshot for {region_id}");
                    continue;
                };
                let edit = TextEdit::new(
                    region_id,
                    element,
                    snapshot.content.clone(),
                    snapshot.content.clone(),
                )
                .with_selections(snapshot.selection.clone(), None);
                self.pending = Some(edit);
            }
            self.deadline = Some(now + self.debounce);
        }
    }

    /// Commits the pending edit if its deadline has passed.
    pub fn poll(&mut self, dom: &mut Dom, undo: &mut UndoManager, now: Instant) -> bool {
        if self.deadline.is_some_and(|deadline| now >= deadline) {
            self.flush(dom, undo)
        } else {
            false
        }
    }

    /// Commits the pending edit now. Returns whether a command was pushed;
    /// an edit that ended where it started is dropped.
    pub fn flush(&mut self, dom: &mut Dom, undo: &mut UndoManager) -> bool {
        self.deadline = None;
        let Some(mut edit) = self.pending.take() else {
            return false;
        };
        let after = dom.inner_html(edit.element);
        let selection_after = capture(dom, NodeId::ROOT);
        if after == edit.before {
            trace!("dropping no-op edit in {}", edit.region_id);
            return false;
        }

        let latest = TextEdit::new(
            edit.region_id.clone(),
            edit.element,
            edit.before.clone(),
            after.clone(),
        )
        .with_selections(None, selection_after.clone());
        edit.merge_with(latest);

        self.snapshots.insert(
            edit.region_id.clone(),
            CleanSnapshot {
                content: after,
                selection: selection_after,
            },
        );
        debug!("committing text edit in {}", edit.region_id);
        undo.execute(dom, edit);
        true
    }

    /// Flushes, then ignores mutations until [`MutationTracker::resume`].
    pub fn pause(&mut self, dom: &mut Dom, undo: &mut UndoManager) {
        self.flush(dom, undo);
        self.paused = true;
    }

    /// Drops mutations made while paused and starts again from fresh
    /// snapshots.
    pub fn resume(&mut self, dom: &mut Dom) {
        dom.take_mutations();
        self.refresh_snapshots(dom);
        self.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Position;
    use crate::editing::commands::Command;
    use crate::editing::inject::inject;
    use crate::regions::collect_regions;
    use pretty_assertions::assert_eq;

    fn edit(region: &str, before: &str, after: &str) -> (String, String, String) {
        (region.to_string(), before.to_string(), after.to_string())
    }

    struct Harness {
        dom: Dom,
        undo: UndoManager,
        tracker: MutationTracker,
        start: Instant,
    }

    impl Harness {
        fn new(src: &str) -> Self {
            let mut dom = Dom::parse(src);
            let regions = collect_regions(&dom, src);
            inject(&mut dom, &regions);
            let mut tracker = MutationTracker::default();
            tracker.refresh_snapshots(&dom);
            Self {
                dom,
                undo: UndoManager::new(),
                tracker,
                start: Instant::now(),
            }
        }

        fn text_of(&self, region: &str) -> NodeId {
            let element = self.dom.find_by_attribute(REGION_ID_ATTR, region).unwrap();
            self.dom.children(element)[0]
        }

        fn type_at(&mut self, region: &str, offset: usize, s: &str, ms: u64) {
            let text = self.text_of(region);
            self.dom.insert_text(text, offset, s);
            let end = offset + s.chars().count();
            self.dom.collapse(text, end);
            let now = self.start + Duration::from_millis(ms);
            self.tracker.observe(&mut self.dom, &mut self.undo, now);
        }

        fn poll(&mut self, ms: u64) -> bool {
            let now = self.start + Duration::from_millis(ms);
            self.tracker.poll(&mut self.dom, &mut self.undo, now)
        }

        fn edits(&self) -> Vec<(String, String, String)> {
            self.undo
                .commands()
                .iter()
                .map(|cmd| match cmd {
                    Command::TextEdit(e) => (e.region_id.clone(), e.before.clone(), e.after.clone()),
                    other => panic!("unexpected {}", other.label()),
                })
                .collect()
        }
    }

    #[test]
    fn commits_after_the_debounce() {
        let mut h = Harness::new("<p>Hello</p>");
        h.type_at("region-0", 5, "!", 0);
        assert!(h.tracker.has_pending());
        assert!(!h.poll(499));
        assert!(h.undo.is_empty());
        assert!(h.poll(500));
        assert_eq!(
            h.edits(),
            vec![edit("region-0", "Hello", "Hello!")]
        );
        assert!(!h.tracker.has_pending());
    }

    #[test]
    fn each_mutation_pushes_the_deadline_back() {
        let mut h = Harness::new("<p>a</p>");
        h.type_at("region-0", 1, "b", 0);
        h.type_at("region-0", 2, "c", 400);
        h.type_at("region-0", 3, "d", 800);
        assert!(!h.poll(1000));
        assert!(h.poll(1300));
        assert_eq!(h.edits(), vec![edit("region-0", "a", "abcd")]);
    }

    #[test]
    fn batched_keystrokes_undo_and_redo_as_one_step() {
        let mut h = Harness::new("<p>a</p>");
        h.type_at("region-0", 1, "b", 0);
        h.type_at("region-0", 2, "c", 100);
        h.type_at("region-0", 3, "d", 200);
        assert!(h.tracker.flush(&mut h.dom, &mut h.undo));
        assert_eq!(h.undo.len(), 1);

        let p = h.dom.find_by_attribute(REGION_ID_ATTR, "region-0").unwrap();
        assert!(h.undo.undo(&mut h.dom));
        assert_eq!(h.dom.inner_html(p), "a");
        assert!(!h.undo.can_undo());

        assert!(h.undo.redo(&mut h.dom));
        assert_eq!(h.dom.inner_html(p), "abcd");
        assert!(!h.undo.can_redo());
    }

    #[test]
    fn switching_regions_flushes_the_pending_edit() {
        let mut h = Harness::new("<p>one</p><p>two</p>");
        h.type_at("region-0", 3, "!", 0);
        h.type_at("region-1", 3, "?", 10);
        assert_eq!(h.edits(), vec![edit("region-0", "one", "one!")]);
        h.tracker.flush(&mut h.dom, &mut h.undo);
        assert_eq!(h.edits()[1], edit("region-1", "two", "two?"));
    }

    #[test]
    fn reverted_edit_is_dropped() {
        let mut h = Harness::new("<p>abc</p>");
        h.type_at("region-0", 3, "d", 0);
        let text = h.text_of("region-0");
        h.dom.delete_text(text, 3, 1);
        h.tracker.observe(&mut h.dom, &mut h.undo, h.start);
        assert!(!h.tracker.flush(&mut h.dom, &mut h.undo));
        assert!(h.undo.is_empty());
    }

    #[test]
    fn consecutive_edits_start_from_the_last_commit() {
        let mut h = Harness::new("<p>x</p>");
        h.type_at("region-0", 1, "y", 0);
        h.tracker.flush(&mut h.dom, &mut h.undo);
        h.type_at("region-0", 2, "z", 10);
        h.tracker.flush(&mut h.dom, &mut h.undo);
        assert_eq!(
            h.edits(),
            vec![
                edit("region-0", "x", "xy"),
                edit("region-0", "xy", "xyz"),
            ]
        );
    }

    #[test]
    fn selection_is_recorded_on_both_sides() {
        let mut h = Harness::new("<p>abc</p>");
        let text = h.text_of("region-0");
        h.dom.collapse(text, 1);
        h.tracker.note_selection(&h.dom);
        h.type_at("region-0", 1, "X", 0);
        h.tracker.flush(&mut h.dom, &mut h.undo);

        let cmd = h.undo.current().unwrap();
        assert_eq!(cmd.selection_before().unwrap().focus_offset, 1);
        assert_eq!(cmd.selection_after().unwrap().focus_offset, 2);

        h.undo.undo(&mut h.dom);
        let restored = h.text_of("region-0");
        assert_eq!(h.dom.selection().unwrap().focus, Position::new(restored, 1));
    }

    #[test]
    fn mutations_outside_regions_are_ignored() {
        let mut h = Harness::new("<div><p>a</p><span>b</span></div>");
        let span = h
            .dom
            .descendants(h.dom.root())
            .into_iter()
            .find(|&id| h.dom.element_name(id) == Some("span"))
            .unwrap();
        h.dom.set_inner_html(span, "c");
        h.tracker.observe(&mut h.dom, &mut h.undo, h.start);
        assert!(!h.tracker.has_pending());
    }

    #[test]
    fn paused_tracker_ignores_mutations() {
        let mut h = Harness::new("<p>a</p>");
        h.type_at("region-0", 1, "b", 0);
        h.tracker.pause(&mut h.dom, &mut h.undo);
        assert_eq!(h.undo.len(), 1);

        h.type_at("region-0", 2, "c", 10);
        assert!(!h.tracker.has_pending());

        h.tracker.resume(&mut h.dom);
        h.type_at("region-0", 3, "d", 20);
        h.tracker.flush(&mut h.dom, &mut h.undo);
        assert_eq!(h.edits()[1], edit("region-0", "abc", "abcd"));
    }
}
