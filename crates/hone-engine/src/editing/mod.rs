/*!
 * # Editing Core
 *
 * Everything between the region parser and the file on disk.
 *
 * ## Data flow
 *
 * 1. [`inject`] marks the live element of every parsed region.
 * 2. Edits mutate the live surface; the [`MutationTracker`] turns the
 *    resulting mutation records into debounced [`TextEdit`] commands.
 * 3. Structural edits (reorder, image insert/delete/replace) are pushed to
 *    the [`UndoManager`] directly, after flushing the tracker.
 * 4. On save, [`sync`] reads each region's live markup and [`patch`]
 *    splices the dirty ones into the original bytes.
 *
 * ## Module structure
 *
 * - **`inject`**: region id and `contenteditable` marks
 * - **`sync`**: live content back into regions
 * - **`patch`**: surgical splicing
 * - **`selection`**: selection capture/restore by structural path
 * - **`commands`**: the reversible command variants
 * - **`undo`**: bounded history with a cursor
 * - **`tracker`**: mutation batching and debouncing
 */

pub mod commands;
pub mod inject;
pub mod patch;
pub mod selection;
pub mod sync;
pub mod tracker;
pub mod undo;

pub use commands::{Command, ImageDelete, ImageInsert, ImageReplace, Reorder, Selections, TextEdit};
pub use inject::{clear_injection, inject};
pub use patch::patch;
pub use selection::{SelectionState, capture, restore};
pub use sync::sync;
pub use tracker::{DEFAULT_DEBOUNCE, MutationTracker};
pub use undo::{DEFAULT_HISTORY_CAPACITY, HistoryListener, HistoryState, UndoManager};
