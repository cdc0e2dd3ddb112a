use crate::ui::app::{App, Dialog, FocusPane};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

pub fn render(frame: &mut Frame, app: &App) {
    // Main layout: Header + Body + Footer
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    render_header(frame, app, main_chunks[0]);

    // Split body into left (items) and right (editor)
    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(main_chunks[1]);

    render_item_list(frame, app, body_chunks[0]);

    // Error banner takes the bottom of the right side while an error is live
    if app.relay.latest_error().is_some() {
        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(7)])
            .split(body_chunks[1]);

        render_editor(frame, app, right_chunks[0]);
        render_error_banner(frame, app, right_chunks[1]);
    } else {
        render_editor(frame, app, body_chunks[1]);
    }

    render_footer(frame, app, main_chunks[2]);

    if let Some(dialog) = &app.dialog {
        render_dialog(frame, dialog);
    } else if app.show_help {
        render_help(frame);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let count = app.items().len();
    let header_text = vec![Line::from(vec![
        Span::styled(
            "  MACROKEY - Macro Script Editor  ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{} item{}", count, if count == 1 { "" } else { "s" }),
            Style::default().fg(Color::Gray),
        ),
    ])];

    let header = Paragraph::new(header_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(header, area);
}

fn render_item_list(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let highlighted = i == app.list_index;
            let style = if highlighted {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if item.is_selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };

            let marker = if item.is_selected { "●" } else { " " };
            let mut spans = vec![Span::raw(format!("{} {}", marker, item.display_text))];
            if let Some(key) = &item.assigned_key {
                spans.push(Span::styled(
                    format!("  [{}]", key),
                    if highlighted {
                        style
                    } else {
                        Style::default().fg(Color::Magenta)
                    },
                ));
            }
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let border_color = if app.focus == FocusPane::ItemList {
        Color::Cyan
    } else {
        Color::Gray
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("📜 Macros")
            .border_style(Style::default().fg(border_color)),
    );

    frame.render_widget(list, area);
}

fn render_editor(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == FocusPane::Editor;
    let border_color = if focused { Color::Cyan } else { Color::Gray };

    let title = match app.coordinator.selected_item() {
        Some(item) if app.coordinator.is_dirty() => format!("✏️  {} *", item.display_text),
        Some(item) => format!("✏️  {}", item.display_text),
        None => "✏️  Editor".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(border_color));

    if app.coordinator.selected_id().is_none() {
        let hint = Paragraph::new(vec![
            Line::from("No item selected"),
            Line::from(""),
            Line::from("Use ↑↓ or j/k to navigate, Enter to open"),
        ])
        .style(Style::default().fg(Color::Gray))
        .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let buffer = app.coordinator.buffer();
    let cursor = buffer.cursor();
    let visible_rows = area.height.saturating_sub(2) as usize;
    let scroll = (cursor.row + 1).saturating_sub(visible_rows);

    let lines: Vec<Line> = buffer
        .lines()
        .iter()
        .skip(scroll)
        .take(visible_rows)
        .map(|line| Line::from(line.as_str()))
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);

    if focused && visible_rows > 0 && app.dialog.is_none() && !app.show_help {
        let max_x = area.x + area.width.saturating_sub(2);
        let x = (area.x + 1).saturating_add(cursor.col as u16).min(max_x);
        let y = area.y + 1 + cursor.row.saturating_sub(scroll) as u16;
        frame.set_cursor_position((x, y));
    }
}

fn render_error_banner(frame: &mut Frame, app: &App, area: Rect) {
    let Some(error) = app.relay.latest_error() else {
        return;
    };

    let text = vec![
        Line::from(Span::styled(
            error.error.clone(),
            Style::default().fg(Color::White),
        )),
        Line::from(""),
        Line::from(Span::styled(
            error.timestamp.clone(),
            Style::default().fg(Color::Gray),
        )),
    ];

    let banner = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("⚠️  Script error in: {}", error.item_name))
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(banner, area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(message) = app.status.current() {
        let style = if message.starts_with("Error") {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        frame.render_widget(Paragraph::new(message.to_string()).style(style), area);
        return;
    }

    let help_text = match app.focus {
        FocusPane::ItemList => {
            "[↑↓/jk] Navigate  [Enter] Open  [n] New  [r] Rename  [a] Key  [d] Delete  [x] Run  [?] Help  [q] Quit"
        }
        FocusPane::Editor => "[Ctrl+S] Save  [F5] Run  [Esc] Back to list  [Ctrl+Q] Quit",
    };

    let footer = Paragraph::new(help_text).style(Style::default().fg(Color::Gray));

    frame.render_widget(footer, area);
}

fn render_dialog(frame: &mut Frame, dialog: &Dialog) {
    let area = centered_rect(50, 7, frame.area());

    let lines = match dialog {
        Dialog::Rename { input, .. } => vec![
            Line::from("New name:"),
            Line::from(Span::styled(
                format!("{}▏", input),
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "[Enter] OK  [Esc] Cancel",
                Style::default().fg(Color::Gray),
            )),
        ],
        Dialog::AssignKey { input, .. } => vec![
            Line::from("Key name (empty to clear):"),
            Line::from(Span::styled(
                format!("{}▏", input),
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "[Enter] OK  [Esc] Cancel",
                Style::default().fg(Color::Gray),
            )),
        ],
        Dialog::ConfirmDelete { name, .. } => vec![
            Line::from(format!("Delete '{}'?", name)),
            Line::from(""),
            Line::from(""),
            Line::from(Span::styled(
                "[y] Yes  [n] No",
                Style::default().fg(Color::Gray),
            )),
        ],
    };

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(dialog.title())
            .border_style(Style::default().fg(Color::Yellow)),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(popup, area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(60, 18, frame.area());

    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("{:<12}", k), Style::default().fg(Color::Cyan)),
            Span::raw(what),
        ])
    };

    let lines = vec![
        Line::from(Span::styled(
            "Item list",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        key("j/k ↑/↓", "Move"),
        key("Enter", "Open item in editor"),
        key("n", "New item"),
        key("r / F2", "Rename"),
        key("a", "Assign key"),
        key("d / Del", "Delete"),
        key("x / F5", "Run selected item"),
        key("Esc", "Dismiss script error"),
        Line::from(""),
        Line::from(Span::styled(
            "Editor",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        key("Ctrl+S", "Save"),
        key("F5", "Run"),
        key("Esc", "Back to list"),
        Line::from(""),
        key("Ctrl+Q", "Quit (saves pending edits)"),
    ];

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Help [?]")
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(popup, area);
}

/// Rect of `percent_x` width and fixed `height`, centered in `area`
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}
