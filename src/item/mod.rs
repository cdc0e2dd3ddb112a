//! # Item Module
//!
//! Script items and their on-disk storage.
//!
//! ## Overview
//!
//! An [`Item`] is one user-authored macro script: a display name, an optional
//! key it is bound to, and the script body. Items are owned by the host; the
//! editor keeps a working copy and pushes edits back through host requests.
//!
//! ## Data Format
//!
//! ```json
//! [
//!   {
//!     "display_text": "Open Terminal",
//!     "assigned_key": "F13",
//!     "id": "5b0c1c7e-4f7a-4a53-9a0e-0d5f6c1f3b2a",
//!     "content": "press('ctrl')",
//!     "is_selected": false
//!   }
//! ]
//! ```

mod store;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use store::{data_dir, ItemStore, ITEMS_FILE_NAME};

/// Opaque item identifier assigned by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A single macro script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Human-readable name shown in the item list
    pub display_text: String,
    /// Key that triggers this script, if any
    #[serde(default)]
    pub assigned_key: Option<String>,
    pub id: ItemId,
    /// Script body
    #[serde(default)]
    pub content: String,
    /// True for at most one item; recomputed on every selection change
    #[serde(default)]
    pub is_selected: bool,
}

impl Item {
    pub fn new(id: ItemId, display_text: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            display_text: display_text.into(),
            assigned_key: None,
            id,
            content: content.into(),
            is_selected: false,
        }
    }

    /// Builder-style helper for binding a key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.assigned_key = Some(key.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_display() {
        let id = ItemId::from("abc");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(id.as_str(), "abc");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(ItemId::generate(), ItemId::generate());
    }

    #[test]
    fn test_deserialize_legacy_item() {
        let json = r#"{
            "display_text": "New Item",
            "assigned_key": "new",
            "id": "1234",
            "content": "print('hi')",
            "is_selected": true
        }"#;
        let item: Item = serde_json::from_str(json).expect("deserialize");
        assert_eq!(item.id, ItemId::from("1234"));
        assert_eq!(item.assigned_key.as_deref(), Some("new"));
        assert!(item.is_selected);
    }

    #[test]
    fn test_deserialize_minimal_item_uses_defaults() {
        let json = r#"{"display_text": "Bare", "id": "x"}"#;
        let item: Item = serde_json::from_str(json).expect("deserialize");
        assert_eq!(item.assigned_key, None);
        assert!(item.content.is_empty());
        assert!(!item.is_selected);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let item = Item::new(ItemId::from("7"), "Seven", "");
        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json["id"], "7");
    }
}
