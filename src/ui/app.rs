use crate::editor::{Coordinator, CoordinatorError};
use crate::host::{HostNotification, HostReply};
use crate::item::{Item, ItemId};
use crate::relay::EventRelay;
use crate::ui::config::Config;
use crate::ui::status::StatusLine;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusPane {
    ItemList,
    Editor,
}

/// Modal prompt over the main layout
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    Rename { id: ItemId, input: String },
    AssignKey { id: ItemId, input: String },
    ConfirmDelete { id: ItemId, name: String },
}

impl Dialog {
    pub fn title(&self) -> &'static str {
        match self {
            Dialog::Rename { .. } => "Rename Item",
            Dialog::AssignKey { .. } => "Assign Key",
            Dialog::ConfirmDelete { .. } => "Delete Item",
        }
    }

    fn input_mut(&mut self) -> Option<&mut String> {
        match self {
            Dialog::Rename { input, .. } | Dialog::AssignKey { input, .. } => Some(input),
            Dialog::ConfirmDelete { .. } => None,
        }
    }
}

pub struct App {
    pub coordinator: Coordinator,
    pub relay: EventRelay,
    pub status: StatusLine,
    pub focus: FocusPane,
    /// Highlighted row in the item list (not the selection)
    pub list_index: usize,
    pub dialog: Option<Dialog>,
    pub show_help: bool,
    pub should_quit: bool,
    status_duration: Duration,
    error_duration: Duration,
}

impl App {
    pub fn new(coordinator: Coordinator, relay: EventRelay, config: &Config) -> Self {
        let list_index = coordinator
            .selected_id()
            .and_then(|id| coordinator.position(id))
            .unwrap_or(0);

        Self {
            coordinator,
            relay,
            status: StatusLine::new(),
            focus: FocusPane::ItemList,
            list_index,
            dialog: None,
            show_help: false,
            should_quit: false,
            status_duration: config.status_duration(),
            error_duration: config.error_status_duration(),
        }
    }

    pub fn items(&self) -> &[Item] {
        self.coordinator.items()
    }

    /// Item under the list cursor
    pub fn highlighted(&self) -> Option<&Item> {
        self.items().get(self.list_index)
    }

    pub fn next(&mut self) {
        let count = self.items().len();
        if count > 0 {
            self.list_index = (self.list_index + 1) % count;
        }
    }

    pub fn previous(&mut self) {
        let count = self.items().len();
        if count > 0 {
            if self.list_index > 0 {
                self.list_index -= 1;
            } else {
                self.list_index = count - 1;
            }
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::ItemList if self.coordinator.selected_id().is_some() => FocusPane::Editor,
            FocusPane::ItemList => FocusPane::ItemList,
            FocusPane::Editor => FocusPane::ItemList,
        };
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Select the highlighted item and move focus to the editor
    pub fn select_highlighted(&mut self) {
        let Some(id) = self.highlighted().map(|item| item.id.clone()) else {
            return;
        };
        match self.coordinator.select(&id) {
            Ok(()) => self.focus = FocusPane::Editor,
            Err(e) => self.report("while selecting", &e),
        }
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.status.show(message, self.status_duration);
    }

    /// Show "Error <context>: <details>"
    pub fn notify_error(&mut self, context: &str, error: &str) {
        self.status
            .show(format!("Error {}: {}", context, error), self.error_duration);
    }

    fn report(&mut self, context: &str, error: &CoordinatorError) {
        self.notify_error(context, &error.to_string());
    }

    pub fn apply_reply(&mut self, reply: HostReply) {
        match reply {
            HostReply::ItemAdded(item) => {
                let id = item.id.clone();
                let name = item.display_text.clone();
                self.coordinator.insert_item(item);
                if let Some(pos) = self.coordinator.position(&id) {
                    self.list_index = pos;
                }
                self.notify(format!("Created '{}'", name));
            }
            HostReply::Failed { context, error } => {
                tracing::warn!(target: "ui", context, error = %error, "host_call_failed");
                self.notify_error(context, &error);
            }
        }
    }

    pub fn handle_notification(&mut self, notification: &HostNotification) {
        self.relay.dispatch(notification);
    }

    pub fn new_item(&mut self) {
        self.coordinator.request_add();
    }

    pub fn save(&mut self) {
        if self.coordinator.save() {
            self.notify("Saved");
        }
    }

    pub fn run_selected(&mut self) {
        let name = self
            .coordinator
            .selected_item()
            .map(|item| item.display_text.clone());
        match (self.coordinator.run_selected(), name) {
            (Some(_), Some(name)) => self.notify(format!("Running '{}'", name)),
            _ => self.notify("Select an item to run it"),
        }
    }

    /// Save pending edits and stop the event loop
    pub fn quit(&mut self) {
        if self.coordinator.is_dirty() {
            self.coordinator.save();
        }
        self.should_quit = true;
    }

    pub fn tick(&mut self, now: Instant) {
        self.status.tick(now);
    }

    pub fn open_rename(&mut self) {
        if let Some(item) = self.highlighted() {
            self.dialog = Some(Dialog::Rename {
                id: item.id.clone(),
                input: item.display_text.clone(),
            });
        }
    }

    pub fn open_assign_key(&mut self) {
        if let Some(item) = self.highlighted() {
            self.dialog = Some(Dialog::AssignKey {
                id: item.id.clone(),
                input: item.assigned_key.clone().unwrap_or_default(),
            });
        }
    }

    pub fn open_delete(&mut self) {
        if let Some(item) = self.highlighted() {
            self.dialog = Some(Dialog::ConfirmDelete {
                id: item.id.clone(),
                name: item.display_text.clone(),
            });
        }
    }

    pub fn dialog_push(&mut self, c: char) {
        if let Some(input) = self.dialog.as_mut().and_then(Dialog::input_mut) {
            input.push(c);
        }
    }

    pub fn dialog_pop(&mut self) {
        if let Some(input) = self.dialog.as_mut().and_then(Dialog::input_mut) {
            input.pop();
        }
    }

    pub fn cancel_dialog(&mut self) {
        self.dialog = None;
    }

    /// Apply the open dialog. An invalid entry keeps the dialog open.
    pub fn confirm_dialog(&mut self) {
        let Some(dialog) = self.dialog.take() else {
            return;
        };

        let (context, result) = match &dialog {
            Dialog::Rename { id, input } => ("while renaming", self.coordinator.rename(id, input)),
            Dialog::AssignKey { id, input } => (
                "while assigning key",
                self.coordinator.assign_key(id, input),
            ),
            Dialog::ConfirmDelete { id, .. } => ("while deleting", self.coordinator.delete(id)),
        };

        match result {
            Ok(()) => {
                if let Dialog::ConfirmDelete { name, .. } = &dialog {
                    self.clamp_list_index();
                    self.notify(format!("Deleted '{}'", name));
                }
            }
            Err(e) => {
                self.report(context, &e);
                if !matches!(e, CoordinatorError::UnknownItem(_)) {
                    self.dialog = Some(dialog);
                }
            }
        }
    }

    fn clamp_list_index(&mut self) {
        let count = self.items().len();
        if self.list_index >= count {
            self.list_index = count.saturating_sub(1);
        }
        if self.coordinator.selected_id().is_none() {
            self.focus = FocusPane::ItemList;
        }
    }
}
