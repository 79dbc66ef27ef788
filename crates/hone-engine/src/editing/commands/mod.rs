//! Reversible edits recorded in the undo history.
//!
//! Every command carries the node handles it manipulates and the selection
//! to restore on either side of it. [`Command`] dispatches to the variant.

mod image;
mod reorder;
mod text_edit;

pub use image::{ImageDelete, ImageInsert, ImageReplace};
pub use reorder::Reorder;
pub use text_edit::TextEdit;

use crate::dom::Dom;
use crate::editing::selection::SelectionState;

/// Selections on either side of a command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selections {
    pub before: Option<SelectionState>,
    pub after: Option<SelectionState>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TextEdit(TextEdit),
    Reorder(Reorder),
    ImageReplace(ImageReplace),
    ImageInsert(ImageInsert),
    ImageDelete(ImageDelete),
}

impl Command {
    pub fn execute(&mut self, dom: &mut Dom) {
        match self {
            Command::TextEdit(cmd) => cmd.execute(dom),
            Command::Reorder(cmd) => cmd.execute(dom),
            Command::ImageReplace(cmd) => cmd.execute(dom),
            Command::ImageInsert(cmd) => cmd.execute(dom),
            Command::ImageDelete(cmd) => cmd.execute(dom),
        }
    }

    pub fn undo(&mut self, dom: &mut Dom) {
        match self {
            Command::TextEdit(cmd) => cmd.undo(dom),
            Command::Reorder(cmd) => cmd.undo(dom),
            Command::ImageReplace(cmd) => cmd.undo(dom),
            Command::ImageInsert(cmd) => cmd.undo(dom),
            Command::ImageDelete(cmd) => cmd.undo(dom),
        }
    }

    pub fn redo(&mut self, dom: &mut Dom) {
        match self {
            Command::TextEdit(cmd) => cmd.redo(dom),
            Command::Reorder(cmd) => cmd.redo(dom),
            Command::ImageReplace(cmd) => cmd.redo(dom),
            Command::ImageInsert(cmd) => cmd.redo(dom),
            Command::ImageDelete(cmd) => cmd.redo(dom),
        }
    }

    pub fn selections(&self) -> &Selections {
        match self {
            Command::TextEdit(cmd) => &cmd.selections,
            Command::Reorder(cmd) => &cmd.selections,
            Command::ImageReplace(cmd) => &cmd.selections,
            Command::ImageInsert(cmd) => &cmd.selections,
            Command::ImageDelete(cmd) => &cmd.selections,
        }
    }

    pub(crate) fn selections_mut(&mut self) -> &mut Selections {
        match self {
            Command::TextEdit(cmd) => &mut cmd.selections,
            Command::Reorder(cmd) => &mut cmd.selections,
            Command::ImageReplace(cmd) => &mut cmd.selections,
            Command::ImageInsert(cmd) => &mut cmd.selections,
            Command::ImageDelete(cmd) => &mut cmd.selections,
        }
    }

    pub fn selection_before(&self) -> Option<&SelectionState> {
        self.selections().before.as_ref()
    }

    pub fn selection_after(&self) -> Option<&SelectionState> {
        self.selections().after.as_ref()
    }

    /// Short name for logs and status lines.
    pub fn label(&self) -> &'static str {
        match self {
            Command::TextEdit(_) => "text edit",
            Command::Reorder(_) => "reorder",
            Command::ImageReplace(_) => "replace image",
            Command::ImageInsert(_) => "insert image",
            Command::ImageDelete(_) => "delete image",
        }
    }
}

impl From<TextEdit> for Command {
    fn from(cmd: TextEdit) -> Self {
        Command::TextEdit(cmd)
    }
}

impl From<Reorder> for Command {
    fn from(cmd: Reorder) -> Self {
        Command::Reorder(cmd)
    }
}

impl From<ImageReplace> for Command {
    fn from(cmd: ImageReplace) -> Self {
        Command::ImageReplace(cmd)
    }
}

impl From<ImageInsert> for Command {
    fn from(cmd: ImageInsert) -> Self {
        Command::ImageInsert(cmd)
    }
}

impl From<ImageDelete> for Command {
    fn from(cmd: ImageDelete) -> Self {
        Command::ImageDelete(cmd)
    }
}
