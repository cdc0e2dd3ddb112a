//! # Host Module
//!
//! The host owns persisted items and executes scripts. The editor never calls
//! it directly: mutating intents travel as [`HostRequest`]s over a channel to
//! the [`bridge`], and the host pushes [`HostNotification`]s back on named
//! channels.
//!
//! ## Channels
//!
//! | Channel | Payload |
//! |---------|---------|
//! | `execution-started` | `{"itemId", "itemName", "timestamp"}` |
//! | `execution-error` | `{"status", "itemId", "itemName", "error", "timestamp"}` |
//!
//! Payloads are serialized JSON strings; parsing happens in the relay.

pub mod bridge;
pub mod local;
pub mod runner;

use crate::item::{Item, ItemId};
use std::future::Future;
use std::time::Duration;

pub use bridge::spawn_bridge;
pub use local::LocalHost;
pub use runner::ScriptRunner;

/// Channel raised when a script begins executing
pub const EXECUTION_STARTED: &str = "execution-started";

/// Channel raised when a script fails
pub const EXECUTION_ERROR: &str = "execution-error";

/// Errors returned by host calls
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("item {0} not found")]
    NotFound(ItemId),
    #[error("key '{key}' is already assigned to another item")]
    KeyInUse { key: String },
    #[error("no item is bound to key '{0}'")]
    NoItemForKey(String),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("script execution failed: {0}")]
    Execution(String),
    #[error("host did not respond within {0:?}")]
    Timeout(Duration),
}

/// Operations the host process exposes.
///
/// Methods return `Send` futures so the bridge can run calls on spawned
/// tasks.
pub trait Host: Send + Sync + 'static {
    fn list_items(&self) -> impl Future<Output = Result<Vec<Item>, HostError>> + Send;

    /// Persist buffer content for an item
    fn update_item_content(
        &self,
        id: ItemId,
        content: String,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Record the active selection
    fn select_item(&self, id: ItemId) -> impl Future<Output = Result<(), HostError>> + Send;

    fn add_item(&self) -> impl Future<Output = Result<Item, HostError>> + Send;

    fn rename_item(
        &self,
        id: ItemId,
        name: String,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    fn delete_item(&self, id: ItemId) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Bind `key` to an item, or clear the binding with `None`
    fn assign_key(
        &self,
        id: ItemId,
        key: Option<String>,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Execute an item's script. Script failures are reported on the
    /// `execution-error` channel, not through the returned result.
    fn run_item(&self, id: ItemId) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Execute the item bound to `key`
    fn trigger_key(&self, key: String) -> impl Future<Output = Result<(), HostError>> + Send;
}

/// A fire-and-forget call issued by the editor
#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
    UpdateItemContent { id: ItemId, content: String },
    SelectItem { id: ItemId },
    AddItem,
    RenameItem { id: ItemId, name: String },
    DeleteItem { id: ItemId },
    AssignKey { id: ItemId, key: Option<String> },
    RunItem { id: ItemId },
}

impl HostRequest {
    /// Phrase used in "Error <context>: <details>" status messages
    pub fn context(&self) -> &'static str {
        match self {
            HostRequest::UpdateItemContent { .. } => "while saving",
            HostRequest::SelectItem { .. } => "while selecting",
            HostRequest::AddItem => "while adding",
            HostRequest::RenameItem { .. } => "while renaming",
            HostRequest::DeleteItem { .. } => "while deleting",
            HostRequest::AssignKey { .. } => "while assigning key",
            HostRequest::RunItem { .. } => "while running",
        }
    }
}

/// Outcome of a request that the view needs to hear about
#[derive(Debug, Clone, PartialEq)]
pub enum HostReply {
    ItemAdded(Item),
    Failed {
        context: &'static str,
        error: String,
    },
}

/// A push notification from the host on a named channel
#[derive(Debug, Clone, PartialEq)]
pub struct HostNotification {
    pub channel: String,
    pub payload: String,
}

impl HostNotification {
    pub fn new(channel: &str, payload: impl Into<String>) -> Self {
        Self {
            channel: channel.to_string(),
            payload: payload.into(),
        }
    }
}
