//! The edit buffer: a line-oriented working copy of the selected script.
//!
//! Columns are counted in `char`s, not bytes, so multi-byte text moves the
//! cursor one visible character at a time.

/// One editing intent, routed through the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    Insert(char),
    Newline,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    lines: Vec<String>,
    cursor: Cursor,
}

impl Default for EditBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl EditBuffer {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor: Cursor::default(),
        }
    }

    /// Replace the contents and move the cursor to the start
    pub fn load(&mut self, content: &str) {
        self.lines = content.split('\n').map(str::to_string).collect();
        self.cursor = Cursor::default();
    }

    pub fn clear(&mut self) {
        self.load("");
    }

    /// Full text; inverse of [`load`](Self::load)
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn apply(&mut self, action: EditAction) {
        match action {
            EditAction::Insert(c) => self.insert_char(c),
            EditAction::Newline => self.insert_newline(),
            EditAction::Backspace => self.backspace(),
            EditAction::Delete => self.delete(),
            EditAction::Left => self.move_left(),
            EditAction::Right => self.move_right(),
            EditAction::Up => self.move_vertical(-1),
            EditAction::Down => self.move_vertical(1),
            EditAction::Home => self.cursor.col = 0,
            EditAction::End => self.cursor.col = self.line_len(self.cursor.row),
        }
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, |line| line.chars().count())
    }

    /// Byte offset of a char column within a line
    fn byte_index(line: &str, col: usize) -> usize {
        line.char_indices()
            .nth(col)
            .map_or(line.len(), |(idx, _)| idx)
    }

    fn insert_char(&mut self, c: char) {
        if c == '\n' {
            self.insert_newline();
            return;
        }
        let Cursor { row, col } = self.cursor;
        let line = &mut self.lines[row];
        let idx = Self::byte_index(line, col);
        line.insert(idx, c);
        self.cursor.col += 1;
    }

    fn insert_newline(&mut self) {
        let Cursor { row, col } = self.cursor;
        let line = &mut self.lines[row];
        let idx = Self::byte_index(line, col);
        let rest = line.split_off(idx);
        self.lines.insert(row + 1, rest);
        self.cursor = Cursor { row: row + 1, col: 0 };
    }

    fn backspace(&mut self) {
        let Cursor { row, col } = self.cursor;
        if col > 0 {
            let line = &mut self.lines[row];
            let idx = Self::byte_index(line, col - 1);
            line.remove(idx);
            self.cursor.col -= 1;
        } else if row > 0 {
            let line = self.lines.remove(row);
            let prev_len = self.line_len(row - 1);
            self.lines[row - 1].push_str(&line);
            self.cursor = Cursor {
                row: row - 1,
                col: prev_len,
            };
        }
    }

    fn delete(&mut self) {
        let Cursor { row, col } = self.cursor;
        if col < self.line_len(row) {
            let line = &mut self.lines[row];
            let idx = Self::byte_index(line, col);
            line.remove(idx);
        } else if row + 1 < self.lines.len() {
            let next = self.lines.remove(row + 1);
            self.lines[row].push_str(&next);
        }
    }

    fn move_left(&mut self) {
        if self.cursor.col > 0 {
            self.cursor.col -= 1;
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
            self.cursor.col = self.line_len(self.cursor.row);
        }
    }

    fn move_right(&mut self) {
        if self.cursor.col < self.line_len(self.cursor.row) {
            self.cursor.col += 1;
        } else if self.cursor.row + 1 < self.lines.len() {
            self.cursor.row += 1;
            self.cursor.col = 0;
        }
    }

    fn move_vertical(&mut self, delta: isize) {
        let last = self.lines.len() - 1;
        let row = self.cursor.row.saturating_add_signed(delta).min(last);
        self.cursor.row = row;
        self.cursor.col = self.cursor.col.min(self.line_len(row));
    }
}
