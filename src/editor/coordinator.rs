//! # Selection / Edit-Buffer Coordinator
//!
//! Owns the item list, the current selection and the edit buffer, and keeps
//! them consistent:
//!
//! - at most one item has `is_selected`, and it is the selected id
//! - nothing selected means an empty, unbound buffer
//! - switching items writes the outgoing buffer back into its item and
//!   enqueues a save *before* the buffer is reloaded
//!
//! Host calls are enqueued on a channel and never awaited here. Local state is
//! applied first and is not rolled back if the host later reports a failure.

use super::buffer::{EditAction, EditBuffer};
use crate::host::HostRequest;
use crate::item::{Item, ItemId};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Selected(ItemId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinatorError {
    #[error("item {0} does not exist")]
    UnknownItem(ItemId),
    #[error("item name cannot be empty")]
    EmptyName,
    #[error("key '{key}' is already assigned to '{owner}'")]
    KeyInUse { key: String, owner: String },
}

#[derive(Debug)]
pub struct Coordinator {
    items: Vec<Item>,
    selection: Selection,
    buffer: EditBuffer,
    requests: UnboundedSender<HostRequest>,
}

impl Coordinator {
    /// Take over the host's item list. If the host remembered a selection,
    /// it is restored locally without notifying the host again.
    pub fn new(items: Vec<Item>, requests: UnboundedSender<HostRequest>) -> Self {
        let mut coordinator = Self {
            items,
            selection: Selection::None,
            buffer: EditBuffer::new(),
            requests,
        };

        let remembered = coordinator
            .items
            .iter()
            .find(|item| item.is_selected)
            .map(|item| item.id.clone());
        match remembered {
            Some(id) => {
                coordinator.mark_selected(&id);
                coordinator.load_buffer(&id);
                coordinator.selection = Selection::Selected(id);
            }
            None => {
                for item in coordinator.items.iter_mut() {
                    item.is_selected = false;
                }
            }
        }

        coordinator
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_id(&self) -> Option<&ItemId> {
        match &self.selection {
            Selection::Selected(id) => Some(id),
            Selection::None => None,
        }
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.selected_id().and_then(|id| self.item(id))
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    /// True when the buffer holds edits not yet written back to the item
    pub fn is_dirty(&self) -> bool {
        self.selected_item()
            .is_some_and(|item| item.content != self.buffer.text())
    }

    /// Switch the editor to `target`.
    ///
    /// Re-selecting the current item does nothing and issues no host calls.
    pub fn select(&mut self, target: &ItemId) -> Result<(), CoordinatorError> {
        if self.item(target).is_none() {
            return Err(CoordinatorError::UnknownItem(target.clone()));
        }

        if let Selection::Selected(prev) = &self.selection {
            if prev == target {
                return Ok(());
            }
            let prev = prev.clone();
            self.flush(&prev);
        }

        self.mark_selected(target);
        self.selection = Selection::Selected(target.clone());
        self.load_buffer(target);

        tracing::debug!(target: "editor", item = %target, "selected");
        self.dispatch(HostRequest::SelectItem { id: target.clone() });
        Ok(())
    }

    /// Apply an edit to the buffer. Ignored while nothing is selected.
    pub fn edit(&mut self, action: EditAction) -> bool {
        if self.selection == Selection::None {
            return false;
        }
        self.buffer.apply(action);
        true
    }

    /// Write the buffer into the selected item and ask the host to persist it
    pub fn save(&mut self) -> bool {
        match self.selected_id().cloned() {
            Some(id) => {
                self.flush(&id);
                true
            }
            None => false,
        }
    }

    pub fn request_add(&self) {
        self.dispatch(HostRequest::AddItem);
    }

    /// Add an item created by the host. New items arrive unselected.
    pub fn insert_item(&mut self, mut item: Item) {
        if self.item(&item.id).is_some() {
            tracing::debug!(target: "editor", item = %item.id, "duplicate_insert_ignored");
            return;
        }
        item.is_selected = false;
        self.items.push(item);
    }

    pub fn rename(&mut self, id: &ItemId, name: &str) -> Result<(), CoordinatorError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoordinatorError::EmptyName);
        }
        let item = self.item_mut(id)?;
        item.display_text = name.to_string();
        self.dispatch(HostRequest::RenameItem {
            id: id.clone(),
            name: name.to_string(),
        });
        Ok(())
    }

    /// Bind a key to an item; an empty key clears the binding
    pub fn assign_key(&mut self, id: &ItemId, key: &str) -> Result<(), CoordinatorError> {
        let key = key.trim();
        let key = (!key.is_empty()).then(|| key.to_string());

        if let Some(key) = &key {
            if let Some(owner) = self
                .items
                .iter()
                .find(|item| &item.id != id && item.assigned_key.as_ref() == Some(key))
            {
                return Err(CoordinatorError::KeyInUse {
                    key: key.clone(),
                    owner: owner.display_text.clone(),
                });
            }
        }

        let item = self.item_mut(id)?;
        item.assigned_key = key.clone();
        self.dispatch(HostRequest::AssignKey { id: id.clone(), key });
        Ok(())
    }

    /// Remove an item. Deleting the selected item leaves nothing selected.
    pub fn delete(&mut self, id: &ItemId) -> Result<(), CoordinatorError> {
        let pos = self
            .position(id)
            .ok_or_else(|| CoordinatorError::UnknownItem(id.clone()))?;
        self.items.remove(pos);

        if self.selected_id() == Some(id) {
            self.selection = Selection::None;
            self.buffer.clear();
        }

        self.dispatch(HostRequest::DeleteItem { id: id.clone() });
        Ok(())
    }

    /// Save pending edits, then ask the host to run the selected script
    pub fn run_selected(&mut self) -> Option<ItemId> {
        let id = self.selected_id()?.clone();
        if self.is_dirty() {
            self.flush(&id);
        }
        self.dispatch(HostRequest::RunItem { id: id.clone() });
        Some(id)
    }

    fn item_mut(&mut self, id: &ItemId) -> Result<&mut Item, CoordinatorError> {
        self.items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(|| CoordinatorError::UnknownItem(id.clone()))
    }

    /// Capture the buffer into `id` and enqueue the save
    fn flush(&mut self, id: &ItemId) {
        let content = self.buffer.text();
        if let Some(item) = self.items.iter_mut().find(|item| &item.id == id) {
            item.content = content.clone();
            self.dispatch(HostRequest::UpdateItemContent {
                id: id.clone(),
                content,
            });
        }
    }

    /// Full pass over the collection; never patched incrementally
    fn mark_selected(&mut self, target: &ItemId) {
        for item in self.items.iter_mut() {
            item.is_selected = &item.id == target;
        }
    }

    fn load_buffer(&mut self, id: &ItemId) {
        match self.items.iter().find(|item| &item.id == id) {
            Some(item) => self.buffer.load(&item.content),
            None => self.buffer.clear(),
        }
    }

    fn dispatch(&self, request: HostRequest) {
        if let Err(e) = self.requests.send(request) {
            tracing::warn!(target: "editor", request = ?e.0, "host_unavailable");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn setup(items: Vec<Item>) -> (Coordinator, UnboundedReceiver<HostRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Coordinator::new(items, tx), rx)
    }

    fn items() -> Vec<Item> {
        vec![
            Item::new(ItemId::from("1"), "One", "a").with_key("F1"),
            Item::new(ItemId::from("2"), "Two", "b"),
        ]
    }

    fn drain(rx: &mut UnboundedReceiver<HostRequest>) -> Vec<HostRequest> {
        let mut out = Vec::new();
        while let Ok(request) = rx.try_recv() {
            out.push(request);
        }
        out
    }

    fn type_str(c: &mut Coordinator, s: &str) {
        for ch in s.chars() {
            c.edit(EditAction::Insert(ch));
        }
    }

    #[test]
    fn test_new_restores_remembered_selection() {
        let mut seeded = items();
        seeded[1].is_selected = true;
        let (c, mut rx) = setup(seeded);

        assert_eq!(c.selected_id(), Some(&ItemId::from("2")));
        assert_eq!(c.buffer().text(), "b");
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_new_keeps_only_first_remembered_flag() {
        let mut seeded = items();
        seeded[0].is_selected = true;
        seeded[1].is_selected = true;
        let (c, _rx) = setup(seeded);

        let flagged: Vec<_> = c.items().iter().filter(|i| i.is_selected).collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].id, ItemId::from("1"));
    }

    #[test]
    fn test_select_unknown_item_is_rejected() {
        let (mut c, mut rx) = setup(items());
        let err = c.select(&ItemId::from("9")).expect_err("unknown");
        assert_eq!(err, CoordinatorError::UnknownItem(ItemId::from("9")));
        assert_eq!(c.selection(), &Selection::None);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_edit_without_selection_is_ignored() {
        let (mut c, _rx) = setup(items());
        assert!(!c.edit(EditAction::Insert('x')));
        assert!(c.buffer().is_empty());
    }

    #[test]
    fn test_dirty_tracking_and_save() {
        let (mut c, mut rx) = setup(items());
        c.select(&ItemId::from("1")).expect("select");
        drain(&mut rx);

        assert!(!c.is_dirty());
        c.edit(EditAction::End);
        type_str(&mut c, "!");
        assert!(c.is_dirty());

        assert!(c.save());
        assert!(!c.is_dirty());
        assert_eq!(
            drain(&mut rx),
            vec![HostRequest::UpdateItemContent {
                id: ItemId::from("1"),
                content: "a!".to_string(),
            }]
        );
    }

    #[test]
    fn test_save_without_selection() {
        let (mut c, mut rx) = setup(items());
        assert!(!c.save());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_rename_trims_and_dispatches() {
        let (mut c, mut rx) = setup(items());
        c.rename(&ItemId::from("2"), "  Deploy  ").expect("rename");
        assert_eq!(c.items()[1].display_text, "Deploy");
        assert_eq!(
            drain(&mut rx),
            vec![HostRequest::RenameItem {
                id: ItemId::from("2"),
                name: "Deploy".to_string(),
            }]
        );

        assert_eq!(
            c.rename(&ItemId::from("2"), "   "),
            Err(CoordinatorError::EmptyName)
        );
    }

    #[test]
    fn test_assign_key_conflict() {
        let (mut c, mut rx) = setup(items());
        let err = c.assign_key(&ItemId::from("2"), "F1").expect_err("in use");
        assert_eq!(
            err,
            CoordinatorError::KeyInUse {
                key: "F1".to_string(),
                owner: "One".to_string(),
            }
        );
        assert!(drain(&mut rx).is_empty());

        c.assign_key(&ItemId::from("2"), "F2").expect("assign");
        assert_eq!(c.items()[1].assigned_key.as_deref(), Some("F2"));
    }

    #[test]
    fn test_assign_empty_key_clears_binding() {
        let (mut c, mut rx) = setup(items());
        c.assign_key(&ItemId::from("1"), "").expect("clear");
        assert_eq!(c.items()[0].assigned_key, None);
        assert_eq!(
            drain(&mut rx),
            vec![HostRequest::AssignKey {
                id: ItemId::from("1"),
                key: None,
            }]
        );
    }

    #[test]
    fn test_delete_selected_item_clears_selection() {
        let (mut c, mut rx) = setup(items());
        c.select(&ItemId::from("2")).expect("select");
        drain(&mut rx);

        c.delete(&ItemId::from("2")).expect("delete");
        assert_eq!(c.selection(), &Selection::None);
        assert!(c.buffer().is_empty());
        assert_eq!(c.items().len(), 1);
        assert!(!c.items()[0].is_selected);
        assert_eq!(
            drain(&mut rx),
            vec![HostRequest::DeleteItem {
                id: ItemId::from("2")
            }]
        );
    }

    #[test]
    fn test_delete_other_item_keeps_selection() {
        let (mut c, _rx) = setup(items());
        c.select(&ItemId::from("1")).expect("select");
        c.delete(&ItemId::from("2")).expect("delete");
        assert_eq!(c.selected_id(), Some(&ItemId::from("1")));
        assert_eq!(c.buffer().text(), "a");
    }

    #[test]
    fn test_insert_item_arrives_unselected() {
        let (mut c, _rx) = setup(items());
        let mut added = Item::new(ItemId::from("3"), "New Item", "");
        added.is_selected = true;
        c.insert_item(added.clone());
        c.insert_item(added);

        assert_eq!(c.items().len(), 3);
        assert!(!c.items()[2].is_selected);
    }

    #[test]
    fn test_run_selected_saves_dirty_buffer_first() {
        let (mut c, mut rx) = setup(items());
        assert_eq!(c.run_selected(), None);

        c.select(&ItemId::from("1")).expect("select");
        drain(&mut rx);
        type_str(&mut c, "x");

        assert_eq!(c.run_selected(), Some(ItemId::from("1")));
        assert_eq!(
            drain(&mut rx),
            vec![
                HostRequest::UpdateItemContent {
                    id: ItemId::from("1"),
                    content: "xa".to_string(),
                },
                HostRequest::RunItem {
                    id: ItemId::from("1")
                },
            ]
        );
    }

    #[test]
    fn test_dispatch_survives_closed_channel() {
        let (mut c, rx) = setup(items());
        drop(rx);
        c.select(&ItemId::from("1")).expect("select");
        assert_eq!(c.buffer().text(), "a");
    }
}
