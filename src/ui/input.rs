//! Key bindings.
//!
//! Dialogs take every key while open; otherwise keys are routed by the
//! focused pane. `Ctrl+Q` and `Ctrl+C` quit from anywhere.

use crate::editor::EditAction;
use crate::ui::app::{App, Dialog, FocusPane};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Spaces inserted for `Tab` in the editor
const TAB_WIDTH: usize = 4;

pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
        app.quit();
        return;
    }

    if app.show_help {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
            app.toggle_help();
        }
        return;
    }

    if app.dialog.is_some() {
        handle_dialog_key(app, key);
        return;
    }

    match app.focus {
        FocusPane::ItemList => handle_list_key(app, key),
        FocusPane::Editor => handle_editor_key(app, key, ctrl),
    }
}

fn handle_dialog_key(app: &mut App, key: KeyEvent) {
    let confirm_only = matches!(app.dialog, Some(Dialog::ConfirmDelete { .. }));

    match key.code {
        KeyCode::Esc => app.cancel_dialog(),
        KeyCode::Enter => app.confirm_dialog(),
        KeyCode::Char('y') | KeyCode::Char('Y') if confirm_only => app.confirm_dialog(),
        KeyCode::Char('n') | KeyCode::Char('N') if confirm_only => app.cancel_dialog(),
        KeyCode::Backspace => app.dialog_pop(),
        KeyCode::Char(c) => app.dialog_push(c),
        _ => {}
    }
}

fn handle_list_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => app.quit(),
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Tab => app.toggle_focus(),
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.previous(),
        KeyCode::Enter => app.select_highlighted(),
        KeyCode::Char('n') => app.new_item(),
        KeyCode::Char('r') | KeyCode::F(2) => app.open_rename(),
        KeyCode::Char('a') => app.open_assign_key(),
        KeyCode::Char('d') | KeyCode::Delete => app.open_delete(),
        KeyCode::Char('x') | KeyCode::F(5) => app.run_selected(),
        KeyCode::Esc => app.relay.clear_error(),
        _ => {}
    }
}

fn handle_editor_key(app: &mut App, key: KeyEvent, ctrl: bool) {
    let action = match key.code {
        KeyCode::Char('s') if ctrl => {
            app.save();
            return;
        }
        KeyCode::F(5) => {
            app.run_selected();
            return;
        }
        KeyCode::Esc => {
            app.focus = FocusPane::ItemList;
            return;
        }
        KeyCode::Tab => {
            for _ in 0..TAB_WIDTH {
                app.coordinator.edit(EditAction::Insert(' '));
            }
            return;
        }
        KeyCode::Char(_) if ctrl => return,
        KeyCode::Char(c) => EditAction::Insert(c),
        KeyCode::Enter => EditAction::Newline,
        KeyCode::Backspace => EditAction::Backspace,
        KeyCode::Delete => EditAction::Delete,
        KeyCode::Left => EditAction::Left,
        KeyCode::Right => EditAction::Right,
        KeyCode::Up => EditAction::Up,
        KeyCode::Down => EditAction::Down,
        KeyCode::Home => EditAction::Home,
        KeyCode::End => EditAction::End,
        _ => return,
    };
    app.coordinator.edit(action);
}
