//! # UI Module
//!
//! This module provides the terminal user interface for Macrokey.
//!
//! ## Components
//!
//! - [`App`] - View state: focus, list cursor, dialogs, status line
//! - [`mod@render`] - Rendering functions for drawing the TUI
//! - [`input`] - Key bindings
//! - [`config`] - Persisted user configuration
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                    Header                        │
//! ├─────────────────┬───────────────────────────────┤
//! │                 │                               │
//! │   Item List     │      Editor                   │
//! │   (● selected,  │   (selected item's script)    │
//! │    [key])       │                               │
//! │                 ├───────────────────────────────┤
//! │                 │      Script Error (if any)    │
//! ├─────────────────┴───────────────────────────────┤
//! │              Footer / status message             │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod config;
pub mod input;
pub mod render;
pub mod status;

pub use app::App;
pub use render::render;
