//! # Item Storage
//!
//! Persists the item list as a single JSON file in the XDG data directory.
//!
//! ## Storage Location
//!
//! ```text
//! ~/.local/share/macrokey/
//! └── items.json
//! ```
//!
//! Writes go to `items.json.tmp` first and are renamed over the real file, so
//! a crash mid-write never leaves a truncated item list behind.

use super::Item;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the persisted item list
pub const ITEMS_FILE_NAME: &str = "items.json";

/// Reads and writes the item list
#[derive(Debug, Clone)]
pub struct ItemStore {
    path: PathBuf,
}

impl ItemStore {
    /// Store `items.json` inside `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(ITEMS_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all items. A missing file is an empty list; a corrupt file is an
    /// error so the caller never overwrites scripts it could not read.
    pub fn load(&self) -> Result<Vec<Item>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read items file: {}", self.path.display()))?;

        let items: Vec<Item> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse items file: {}", self.path.display()))?;

        Ok(items)
    }

    /// Save all items with an atomic replace
    pub fn save(&self, items: &[Item]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create items directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(items).context("Failed to serialize items")?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json)
            .with_context(|| format!("Failed to write temporary file: {}", temp_path.display()))?;

        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace items file: {}", self.path.display()))?;

        Ok(())
    }
}

/// Platform data directory for macrokey (items, logs)
pub fn data_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("", "", "macrokey")
        .context("Failed to determine application data directory")?;

    Ok(proj_dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemId;
    use tempfile::TempDir;

    fn sample_items() -> Vec<Item> {
        vec![
            Item::new(ItemId::from("1"), "First", "print(1)").with_key("F13"),
            Item::new(ItemId::from("2"), "Second", "print(2)"),
        ]
    }

    #[test]
    fn test_load_missing_file_returns_empty() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = ItemStore::new(temp_dir.path());

        let items = store.load().expect("load");
        assert!(items.is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = ItemStore::new(temp_dir.path().join("nested"));

        store.save(&sample_items()).expect("save");
        let loaded = store.load().expect("load");

        assert_eq!(loaded, sample_items());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = ItemStore::new(temp_dir.path());

        store.save(&sample_items()).expect("save");

        assert!(store.path().exists());
        assert!(!temp_dir.path().join("items.json.tmp").exists());
    }

    #[test]
    fn test_corrupted_items_file_is_an_error() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = ItemStore::new(temp_dir.path());
        fs::write(store.path(), "not valid json").expect("write");

        let err = store.load().expect_err("corrupt file must not load");
        assert!(err.to_string().contains("Failed to parse items file"));
    }

    #[test]
    fn test_save_overwrites_previous_contents() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = ItemStore::new(temp_dir.path());

        store.save(&sample_items()).expect("save");
        store.save(&sample_items()[..1]).expect("save again");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].display_text, "First");
    }
}
