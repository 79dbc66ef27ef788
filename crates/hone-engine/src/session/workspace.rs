use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use log::debug;

use super::{EditorSession, EditorSettings, SessionError};

/// Stable identifier of an open document. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TabId(u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// Open documents in the order they were opened.
#[derive(Debug, Default)]
pub struct Workspace {
    sessions: BTreeMap<TabId, EditorSession>,
    next_id: u64,
    active: Option<TabId>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `path`, or activates the tab that already has it open.
    pub fn open(&mut self, path: &Path, settings: &EditorSettings) -> Result<TabId, SessionError> {
        if let Some(id) = self.find_by_path(path) {
            self.active = Some(id);
            return Ok(id);
        }
        let session = EditorSession::open(path, settings)?;
        Ok(self.insert(session))
    }

    /// Adds a session and makes it active.
    pub fn insert(&mut self, session: EditorSession) -> TabId {
        let id = TabId(self.next_id);
        self.next_id += 1;
        debug!("opened {id}: {}", session.title());
        self.sessions.insert(id, session);
        self.active = Some(id);
        id
    }

    /// Removes a tab. If it was active, the next tab (or else the previous
    /// one) becomes active.
    pub fn close(&mut self, id: TabId) -> Option<EditorSession> {
        let session = self.sessions.remove(&id)?;
        if self.active == Some(id) {
            self.active = self
                .sessions
                .range(id..)
                .next()
                .or_else(|| self.sessions.range(..id).next_back())
                .map(|(&next, _)| next);
        }
        Some(session)
    }

    pub fn activate(&mut self, id: TabId) -> bool {
        if self.sessions.contains_key(&id) {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn active_id(&self) -> Option<TabId> {
        self.active
    }

    pub fn active(&self) -> Option<&EditorSession> {
        self.sessions.get(&self.active?)
    }

    pub fn active_mut(&mut self) -> Option<&mut EditorSession> {
        self.sessions.get_mut(&self.active?)
    }

    pub fn get(&self, id: TabId) -> Option<&EditorSession> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: TabId) -> Option<&mut EditorSession> {
        self.sessions.get_mut(&id)
    }

    pub fn find_by_path(&self, path: &Path) -> Option<TabId> {
        self.sessions
            .iter()
            .find(|(_, session)| session.path() == Some(path))
            .map(|(&id, _)| id)
    }

    pub fn tabs(&self) -> impl Iterator<Item = (TabId, &EditorSession)> {
        self.sessions.iter().map(|(&id, session)| (id, session))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Whether any open document has unsaved changes.
    pub fn has_unsaved(&self) -> bool {
        self.sessions.values().any(EditorSession::is_dirty)
    }
}
