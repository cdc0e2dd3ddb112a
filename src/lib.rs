//! Macrokey - a terminal editor for keyboard macro scripts
//!
//! This library provides the item list and edit-buffer coordination, the
//! bridge to the host that stores and runs scripts, and the relay that turns
//! host execution events into state the TUI can display.

pub mod editor;
pub mod host;
pub mod item;
pub mod relay;
pub mod ui;
