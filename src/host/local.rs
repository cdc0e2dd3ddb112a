//! # Local Host
//!
//! In-process implementation of [`Host`]: keeps the item list in memory,
//! writes it through [`ItemStore`] after every change, and runs scripts with a
//! [`ScriptRunner`]. Execution progress is announced on the notification
//! channel the relay listens to.
//!
//! File writes happen on the blocking pool while the list lock is held, so
//! saves land on disk in the order the changes were made.

use super::{Host, HostError, HostNotification, ScriptRunner, EXECUTION_ERROR, EXECUTION_STARTED};
use crate::item::{Item, ItemId, ItemStore};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::SystemTime;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{Mutex, MutexGuard};

/// Display name given to freshly created items
pub const NEW_ITEM_NAME: &str = "New Item";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartedPayload<'a> {
    item_id: &'a ItemId,
    item_name: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorPayload<'a> {
    status: &'static str,
    item_id: &'a ItemId,
    item_name: &'a str,
    error: String,
    timestamp: String,
}

/// Host backed by a JSON file and an external interpreter
pub struct LocalHost {
    items: Mutex<Vec<Item>>,
    store: ItemStore,
    runner: ScriptRunner,
    notifier: UnboundedSender<HostNotification>,
}

impl LocalHost {
    /// Open the host, loading any previously saved items
    pub fn open(
        store: ItemStore,
        runner: ScriptRunner,
        notifier: UnboundedSender<HostNotification>,
    ) -> Result<Self> {
        let items = store.load()?;
        tracing::info!(target: "host", count = items.len(), path = %store.path().display(), "items_loaded");

        Ok(Self {
            items: Mutex::new(items),
            store,
            runner,
            notifier,
        })
    }

    async fn items(&self) -> MutexGuard<'_, Vec<Item>> {
        self.items.lock().await
    }

    /// Write a snapshot of `items`; callers keep holding the list lock
    async fn persist(&self, items: &[Item]) -> Result<(), HostError> {
        let store = self.store.clone();
        let snapshot = items.to_vec();
        tokio::task::spawn_blocking(move || store.save(&snapshot))
            .await
            .map_err(|e| HostError::Storage(format!("save task failed: {}", e)))?
            .map_err(|e| HostError::Storage(format!("{:#}", e)))
    }

    /// Apply `f` to the item with `id` and persist the result
    async fn modify<F>(&self, id: &ItemId, f: F) -> Result<(), HostError>
    where
        F: FnOnce(&mut Item),
    {
        let mut items = self.items().await;
        let item = items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(|| HostError::NotFound(id.clone()))?;
        f(item);
        self.persist(&items).await
    }

    fn notify<T: Serialize>(&self, channel: &str, payload: &T) {
        let payload = match serde_json::to_string(payload) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(target: "host", channel, error = %e, "payload_serialize_failed");
                return;
            }
        };

        if self
            .notifier
            .send(HostNotification::new(channel, payload))
            .is_err()
        {
            tracing::debug!(target: "host", channel, "no_listener");
        }
    }

    async fn execute(&self, item: Item) -> Result<(), HostError> {
        self.notify(
            EXECUTION_STARTED,
            &StartedPayload {
                item_id: &item.id,
                item_name: &item.display_text,
                timestamp: formatted_timestamp(),
            },
        );

        match self.runner.run(&item.display_text, &item.content).await {
            Ok(()) => {
                tracing::info!(target: "host", item = %item.id, "script_succeeded");
            }
            Err(e) => {
                let error = match e {
                    HostError::Execution(message) => message,
                    other => other.to_string(),
                };
                tracing::warn!(target: "host", item = %item.id, error = %error, "script_failed");
                self.notify(
                    EXECUTION_ERROR,
                    &ErrorPayload {
                        status: "error",
                        item_id: &item.id,
                        item_name: &item.display_text,
                        error,
                        timestamp: formatted_timestamp(),
                    },
                );
            }
        }

        Ok(())
    }
}

impl Host for LocalHost {
    async fn list_items(&self) -> Result<Vec<Item>, HostError> {
        Ok(self.items().await.clone())
    }

    async fn update_item_content(&self, id: ItemId, content: String) -> Result<(), HostError> {
        self.modify(&id, |item| item.content = content).await
    }

    async fn select_item(&self, id: ItemId) -> Result<(), HostError> {
        let mut items = self.items().await;
        if !items.iter().any(|item| item.id == id) {
            return Err(HostError::NotFound(id));
        }
        for item in items.iter_mut() {
            item.is_selected = item.id == id;
        }
        self.persist(&items).await
    }

    async fn add_item(&self) -> Result<Item, HostError> {
        let item = Item::new(ItemId::generate(), NEW_ITEM_NAME, "");
        let mut items = self.items().await;
        items.push(item.clone());
        self.persist(&items).await?;
        Ok(item)
    }

    async fn rename_item(&self, id: ItemId, name: String) -> Result<(), HostError> {
        self.modify(&id, |item| item.display_text = name).await
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), HostError> {
        let mut items = self.items().await;
        let initial_len = items.len();
        items.retain(|item| item.id != id);
        if items.len() == initial_len {
            return Err(HostError::NotFound(id));
        }
        self.persist(&items).await
    }

    async fn assign_key(&self, id: ItemId, key: Option<String>) -> Result<(), HostError> {
        let mut items = self.items().await;
        if let Some(key) = &key {
            if items
                .iter()
                .any(|item| item.id != id && item.assigned_key.as_deref() == Some(key))
            {
                return Err(HostError::KeyInUse { key: key.clone() });
            }
        }
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| HostError::NotFound(id.clone()))?;
        item.assigned_key = key;
        self.persist(&items).await
    }

    async fn run_item(&self, id: ItemId) -> Result<(), HostError> {
        let item = self
            .items()
            .await
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or(HostError::NotFound(id))?;
        self.execute(item).await
    }

    async fn trigger_key(&self, key: String) -> Result<(), HostError> {
        let item = self
            .items()
            .await
            .iter()
            .find(|item| item.assigned_key.as_deref() == Some(key.as_str()))
            .cloned()
            .ok_or(HostError::NoItemForKey(key))?;
        self.execute(item).await
    }
}

/// Timestamp shown in execution payloads
fn formatted_timestamp() -> String {
    let datetime: DateTime<Utc> = SystemTime::now().into();
    datetime.format("Date: %Y-%m-%d, Time: %H:%M:%S%.3fZ").to_string()
}
