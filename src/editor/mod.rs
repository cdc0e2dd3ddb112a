//! # Editor Module
//!
//! Selection and edit-buffer state for the script editor.
//!
//! - [`EditBuffer`] - the working copy of the selected script
//! - [`Coordinator`] - single selection plus the save-before-switch protocol

pub mod buffer;
pub mod coordinator;

pub use buffer::{Cursor, EditAction, EditBuffer};
pub use coordinator::{Coordinator, CoordinatorError, Selection};
