//! One open document and the workspace of open documents.
//!
//! [`EditorSession`] owns everything needed to edit a single file: the
//! source the regions index into, the live surface, the undo history and
//! the mutation tracker. It enforces the ordering the engine relies on:
//! pending text edits are flushed before any structural command, and
//! regions are re-parsed from the written output after every save.

mod workspace;

pub use workspace::{TabId, Workspace};

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::convert::{CommonMarkConverter, ConvertError, MarkdownConverter};
use crate::dom::{Dom, NodeId, REGION_ID_ATTR};
use crate::editing::{
    DEFAULT_DEBOUNCE, DEFAULT_HISTORY_CAPACITY, ImageDelete, ImageInsert, ImageReplace,
    MutationTracker, Reorder, UndoManager, clear_injection, inject, patch, sync,
};
use crate::io::{self, IoError};
use crate::models::{DocumentFile, DocumentFormat};
use crate::regions::{Region, collect_regions, extract_doctype};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("Document has never been saved; a path is required")]
    MissingPath,
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error("Document is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Tunables for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSettings {
    pub history_capacity: usize,
    pub debounce: Duration,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug)]
pub struct EditorSession {
    file: Option<DocumentFile>,
    format: DocumentFormat,
    doctype: String,
    /// HTML the current regions were parsed from.
    original: String,
    regions: Vec<Region>,
    dom: Dom,
    undo: UndoManager,
    tracker: MutationTracker,
    converter: Box<dyn MarkdownConverter>,
    dirty: bool,
    /// `outside_revision` of the live surface when `original` was taken.
    saved_revision: u64,
}

impl EditorSession {
    /// Reads and loads the document at `path`.
    pub fn open(path: &Path, settings: &EditorSettings) -> Result<Self, SessionError> {
        let text = io::read_file(path)?;
        let file = DocumentFile::new(path.to_path_buf());
        let format = file.format();
        Self::load(
            &text,
            format,
            Some(file),
            settings,
            Box::new(CommonMarkConverter),
        )
    }

    /// An untitled HTML document.
    pub fn from_html(html: &str) -> Self {
        Self::build(
            html.to_string(),
            DocumentFormat::Html,
            None,
            &EditorSettings::default(),
            Box::new(CommonMarkConverter),
        )
    }

    /// An untitled document from raw bytes, which must be UTF-8.
    pub fn from_bytes(bytes: &[u8], format: DocumentFormat) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::load(
            text,
            format,
            None,
            &EditorSettings::default(),
            Box::new(CommonMarkConverter),
        )?)
    }

    /// Loads `text` stored as `format`, converting Markdown to HTML first.
    pub fn load(
        text: &str,
        format: DocumentFormat,
        file: Option<DocumentFile>,
        settings: &EditorSettings,
        converter: Box<dyn MarkdownConverter>,
    ) -> Result<Self, SessionError> {
        let html = match format {
            DocumentFormat::Html => text.to_string(),
            DocumentFormat::Markdown => converter.to_html(text)?,
        };
        Ok(Self::build(html, format, file, settings, converter))
    }

    fn build(
        html: String,
        format: DocumentFormat,
        file: Option<DocumentFile>,
        settings: &EditorSettings,
        converter: Box<dyn MarkdownConverter>,
    ) -> Self {
        let mut dom = Dom::parse(&html);
        let regions = collect_regions(&dom, &html);
        inject(&mut dom, &regions);
        let mut tracker = MutationTracker::new(settings.debounce);
        tracker.refresh_snapshots(&dom);
        debug!("loaded document with {} region(s)", regions.len());
        Self {
            file,
            format,
            doctype: extract_doctype(&html),
            saved_revision: dom.outside_revision(),
            original: html,
            regions,
            dom,
            undo: UndoManager::with_capacity(settings.history_capacity),
            tracker,
            converter,
            dirty: false,
        }
    }

    pub fn file(&self) -> Option<&DocumentFile> {
        self.file.as_ref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path())
    }

    /// Tab title.
    pub fn title(&self) -> &str {
        self.file
            .as_ref()
            .map(|f| f.display_name())
            .unwrap_or("Untitled")
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn doctype(&self) -> &str {
        &self.doctype
    }

    /// The HTML the current regions index into.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// Direct access to the live surface. Changes are picked up by the next
    /// [`EditorSession::observe`] or [`EditorSession::tick`].
    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn history(&self) -> &UndoManager {
        &self.undo
    }

    pub fn history_mut(&mut self) -> &mut UndoManager {
        &mut self.undo
    }

    pub fn tracker(&self) -> &MutationTracker {
        &self.tracker
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Live element of a region.
    pub fn region_element(&self, region_id: &str) -> Option<NodeId> {
        self.dom.find_by_attribute(REGION_ID_ATTR, region_id)
    }

    /// Live inner markup of a region.
    pub fn region_content(&self, region_id: &str) -> Option<String> {
        self.region_element(region_id)
            .map(|node| self.dom.inner_html(node))
    }

    /// Feeds queued mutations to the tracker.
    pub fn observe(&mut self, now: Instant) {
        if self.dom.has_pending_mutations() {
            self.dirty = true;
        }
        self.tracker.observe(&mut self.dom, &mut self.undo, now);
    }

    /// Observes, then commits the pending edit if its deadline has passed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.observe(now);
        self.tracker.poll(&mut self.dom, &mut self.undo, now)
    }

    /// Commits any pending text edit immediately.
    pub fn flush(&mut self) -> bool {
        self.observe(Instant::now());
        self.tracker.flush(&mut self.dom, &mut self.undo)
    }

    /// Lets the selection-aware tracker know where the caret is before an
    /// edit starts.
    pub fn note_selection(&mut self) {
        self.tracker.note_selection(&self.dom);
    }

    /// Replaces a region's content the way typing would: the change is
    /// observed and batched like any other mutation.
    pub fn replace_region_content(&mut self, region_id: &str, html: &str, now: Instant) -> bool {
        let Some(node) = self.region_element(region_id) else {
            return false;
        };
        self.note_selection();
        self.dom.set_inner_html(node, html);
        let end = self.dom.children(node).len();
        self.dom.collapse(node, end);
        self.observe(now);
        true
    }

    pub fn undo(&mut self) -> bool {
        self.flush();
        let done = self.undo.undo(&mut self.dom);
        self.after_history_change(done);
        done
    }

    pub fn redo(&mut self) -> bool {
        self.flush();
        let done = self.undo.redo(&mut self.dom);
        self.after_history_change(done);
        done
    }

    /// History replays are not user edits: drop their mutation records and
    /// start the tracker over from what is now on the surface.
    fn after_history_change(&mut self, changed: bool) {
        self.dom.take_mutations();
        self.tracker.refresh_snapshots(&self.dom);
        if changed {
            self.dirty = true;
        }
    }

    /// Moves `element` so it is inserted before the child currently at
    /// `new_index` of `new_parent`.
    pub fn reorder(&mut self, element: NodeId, new_parent: NodeId, new_index: usize) -> bool {
        self.flush();
        let Some(cmd) = Reorder::new(&self.dom, element, new_parent, new_index) else {
            return false;
        };
        self.undo.execute(&mut self.dom, cmd);
        self.after_history_change(true);
        true
    }

    /// Swaps a region's element with its previous or next element sibling.
    pub fn move_region(&mut self, region_id: &str, direction: MoveDirection) -> bool {
        let Some(element) = self.region_element(region_id) else {
            return false;
        };
        let Some(parent) = self.dom.parent(element) else {
            return false;
        };
        let Some(index) = self.dom.index_in_parent(element) else {
            return false;
        };
        let siblings = self.dom.children(parent);
        let is_element = |id: &NodeId| self.dom.element(*id).is_some();
        // new_index counts the element itself, so "after the next one" is +2
        let target = match direction {
            MoveDirection::Up => siblings[..index].iter().rposition(is_element),
            MoveDirection::Down => siblings[index + 1..]
                .iter()
                .position(is_element)
                .map(|pos| index + pos + 2),
        };
        match target {
            Some(new_index) => self.reorder(element, parent, new_index),
            None => false,
        }
    }

    /// Points an image at a new source.
    pub fn replace_image(&mut self, image: NodeId, new_src: &str) -> bool {
        if self.dom.element_name(image) != Some("img") {
            return false;
        }
        self.flush();
        let cmd = ImageReplace::new(&self.dom, image, new_src);
        self.undo.execute(&mut self.dom, cmd);
        self.after_history_change(true);
        true
    }

    /// Inserts a new image under `parent`.
    pub fn insert_image(
        &mut self,
        parent: NodeId,
        index: usize,
        src: &str,
        alt: &str,
    ) -> Option<NodeId> {
        if !self.dom.is_attached(parent) || self.dom.element(parent).is_none() {
            return None;
        }
        self.flush();
        let image = self.dom.create_element("img", &[("src", src), ("alt", alt)]);
        let index = index.min(self.dom.children(parent).len());
        let cmd = ImageInsert::new(&self.dom, image, parent, index);
        self.undo.execute(&mut self.dom, cmd);
        self.after_history_change(true);
        Some(image)
    }

    pub fn delete_image(&mut self, image: NodeId) -> bool {
        if self.dom.element_name(image) != Some("img") {
            return false;
        }
        self.flush();
        let Some(cmd) = ImageDelete::new(&self.dom, image) else {
            return false;
        };
        self.undo.execute(&mut self.dom, cmd);
        self.after_history_change(true);
        true
    }

    /// The document as it would be written, in its own format.
    pub fn render(&mut self) -> Result<String, SessionError> {
        let format = self.format;
        Ok(self.render_as(format)?.1)
    }

    /// Returns the HTML and the output in `format`.
    fn render_as(&mut self, format: DocumentFormat) -> Result<(String, String), SessionError> {
        self.flush();
        let html = self.render_html();
        let output = match format {
            DocumentFormat::Html => html.clone(),
            DocumentFormat::Markdown => self.converter.to_markdown(&html)?,
        };
        Ok((html, output))
    }

    /// Surgical patch while nothing outside the regions changed, full
    /// serialization of the live surface otherwise.
    fn render_html(&mut self) -> String {
        if self.dom.outside_revision() == self.saved_revision {
            sync(&self.dom, &mut self.regions);
            patch(&self.original, &self.regions).into_owned()
        } else {
            debug!("structure changed outside regions, serializing the whole document");
            self.dom.to_source()
        }
    }

    pub fn save(&mut self) -> Result<(), SessionError> {
        let path = self
            .path()
            .map(Path::to_path_buf)
            .ok_or(SessionError::MissingPath)?;
        let format = self.format;
        self.write_to(&path, format)
    }

    /// Writes to `path`, which becomes the document's path. The format
    /// follows the new extension.
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<(), SessionError> {
        let file = DocumentFile::new(path.into());
        self.write_to(file.path(), file.format())?;
        self.format = file.format();
        self.file = Some(file);
        Ok(())
    }

    fn write_to(&mut self, path: &Path, format: DocumentFormat) -> Result<(), SessionError> {
        let (html, output) = self.render_as(format)?;
        io::write_file(path, &output)?;
        self.rebase(html);
        info!("saved {}", path.display());
        Ok(())
    }

    /// Makes `html` the new original: regions are parsed from it and marked
    /// on the live surface again. If the surface no longer lines up with
    /// the saved output it is rebuilt, which invalidates the history.
    fn rebase(&mut self, html: String) {
        let fresh = Dom::parse(&html);
        let regions = collect_regions(&fresh, &html);
        clear_injection(&mut self.dom);
        let missing = inject(&mut self.dom, &regions);
        if !missing.is_empty() || !self.injection_matches(&regions) {
            warn!(
                "live document no longer matches the saved output ({} region(s) unplaced), rebuilding",
                missing.len()
            );
            self.dom = fresh;
            inject(&mut self.dom, &regions);
            self.undo.clear();
        }
        self.dom.take_mutations();
        self.doctype = extract_doctype(&html);
        self.saved_revision = self.dom.outside_revision();
        self.original = html;
        self.regions = regions;
        self.tracker.refresh_snapshots(&self.dom);
        self.dirty = false;
    }

    fn injection_matches(&self, regions: &[Region]) -> bool {
        regions.iter().all(|region| {
            self.region_element(&region.id)
                .is_some_and(|node| self.dom.inner_html(node) == region.original_content)
        })
    }
}
