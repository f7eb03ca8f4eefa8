//! Position Management
//!
//! Keeps sibling positions sequential (0, 1, 2, ...) for columns and for the
//! visible todos of each column. Archived todos hold no slot.

use chrono::{DateTime, Utc};

use super::board_repo::Tables;

impl Tables {
    /// Visible todo ids of a column, ordered by position then id
    pub(super) fn visible_todo_ids(&self, column_id: &str) -> Vec<String> {
        let mut todos: Vec<_> = self
            .todos
            .values()
            .filter(|t| t.column_id == column_id && !t.archived)
            .collect();
        todos.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        todos.into_iter().map(|t| t.id.clone()).collect()
    }

    /// Column ids of a board, ordered by position then id
    pub(super) fn board_column_ids(&self, board_id: &str) -> Vec<String> {
        let mut columns: Vec<_> = self.columns.values().filter(|c| c.board_id == board_id).collect();
        columns.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        columns.into_iter().map(|c| c.id.clone()).collect()
    }

    /// Next position for a new todo (appends)
    pub(super) fn next_todo_position(&self, column_id: &str) -> i32 {
        self.visible_todo_ids(column_id).len() as i32
    }

    pub(super) fn next_column_position(&self, board_id: &str) -> i32 {
        self.board_column_ids(board_id).len() as i32
    }

    /// Shift visible todos at or after `position` down by one
    pub(super) fn open_todo_slot(&mut self, column_id: &str, position: i32) {
        for todo in self
            .todos
            .values_mut()
            .filter(|t| t.column_id == column_id && !t.archived && t.position >= position)
        {
            todo.position += 1;
        }
    }

    pub(super) fn reindex_todos(&mut self, column_id: &str, now: DateTime<Utc>) {
        for (new_pos, id) in self.visible_todo_ids(column_id).iter().enumerate() {
            if let Some(todo) = self.todos.get_mut(id) {
                if todo.position != new_pos as i32 {
                    todo.position = new_pos as i32;
                    todo.updated_at = Some(now);
                }
            }
        }
    }

    pub(super) fn reindex_columns(&mut self, board_id: &str, now: DateTime<Utc>) {
        for (new_pos, id) in self.board_column_ids(board_id).iter().enumerate() {
            if let Some(column) = self.columns.get_mut(id) {
                if column.position != new_pos as i32 {
                    column.position = new_pos as i32;
                    column.updated_at = Some(now);
                }
            }
        }
    }
}
