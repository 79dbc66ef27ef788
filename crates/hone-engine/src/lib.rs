//! Byte-preserving WYSIWYG editing engine.
//!
//! The engine splits a document into editable regions, lets a live surface
//! change them, and writes back only what changed. See [`editing`] for the
//! data flow and [`session::EditorSession`] for the entry point.

pub mod convert;
pub mod dom;
pub mod editing;
pub mod io;
pub mod markup;
pub mod models;
pub mod regions;
pub mod session;


// Re-export key types for easier usage
pub use convert::{CommonMarkConverter, ConvertError, MarkdownConverter};
pub use dom::{Dom, NodeId, Position};
pub use editing::{Command, HistoryState, MutationTracker, SelectionState, UndoManager};
pub use io::*;
pub use models::{DocumentFile, DocumentFormat};
pub use regions::{DEFAULT_DOCTYPE, Region, extract_doctype};
pub use session::{EditorSession, EditorSettings, MoveDirection, SessionError, TabId, Workspace};
