//! Board Repository
//!
//! Boards, columns and todos stored as flat tables behind an async lock.
//! Nested `Board` values are assembled on read.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use kanban_board::commands::PositionEntry;
use kanban_board::{Board, BoardSummary, Column, Todo};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{DomainError, DomainResult};

/// Row storage. Board rows carry no columns and column rows carry no todos.
#[derive(Debug, Default)]
pub(super) struct Tables {
    pub(super) boards: HashMap<String, Board>,
    pub(super) columns: HashMap<String, Column>,
    pub(super) todos: HashMap<String, Todo>,
    last_id: u64,
}

impl Tables {
    fn next_id(&mut self, prefix: &str) -> String {
        self.last_id += 1;
        format!("{}-{}", prefix, self.last_id)
    }

    fn board_row(&self, board_id: &str) -> DomainResult<&Board> {
        self.boards
            .get(board_id)
            .ok_or_else(|| DomainError::NotFound(format!("board {}", board_id)))
    }

    fn column_row(&self, column_id: &str) -> DomainResult<&Column> {
        self.columns
            .get(column_id)
            .ok_or_else(|| DomainError::NotFound(format!("column {}", column_id)))
    }

    fn todo_row(&self, todo_id: &str) -> DomainResult<&Todo> {
        self.todos
            .get(todo_id)
            .ok_or_else(|| DomainError::NotFound(format!("todo {}", todo_id)))
    }

    fn visible_todos(&self, column_id: &str) -> Vec<Todo> {
        self.visible_todo_ids(column_id)
            .iter()
            .filter_map(|id| self.todos.get(id).cloned())
            .collect()
    }

    fn board_columns(&self, board_id: &str) -> Vec<Column> {
        self.board_column_ids(board_id)
            .iter()
            .filter_map(|id| self.columns.get(id).cloned())
            .collect()
    }

    fn visible_count(&self, board_id: &str) -> u32 {
        self.board_column_ids(board_id)
            .iter()
            .map(|column_id| self.visible_todo_ids(column_id).len() as u32)
            .sum()
    }

    fn assemble(&self, board_id: &str) -> DomainResult<Board> {
        let mut board = self.board_row(board_id)?.clone();
        board.columns = self
            .board_columns(board_id)
            .into_iter()
            .map(|column| {
                let todos = self.visible_todos(&column.id);
                column.with_todos(todos)
            })
            .collect();
        board.todo_count = Some(self.visible_count(board_id));
        Ok(board)
    }

    /// A full-order payload must name every sibling exactly once
    fn validate_full_order(container: &str, entries: &[PositionEntry], siblings: &[String]) -> DomainResult<()> {
        if entries.len() != siblings.len() {
            return Err(DomainError::InvalidInput(format!(
                "{}: expected {} entries, got {}",
                container,
                siblings.len(),
                entries.len()
            )));
        }
        let known: HashSet<&str> = siblings.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();
        for entry in entries {
            if !known.contains(entry.id.as_str()) {
                return Err(DomainError::InvalidInput(format!("{}: unknown id {}", container, entry.id)));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(DomainError::InvalidInput(format!("{}: duplicate id {}", container, entry.id)));
            }
        }
        Ok(())
    }
}

/// In-memory board repository
#[derive(Debug, Clone, Default)]
pub struct BoardRepository {
    tables: Arc<Mutex<Tables>>,
}

impl BoardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================
    // Create
    // ========================

    pub async fn create_board(&self, name: &str) -> DomainResult<Board> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidInput("board name is empty".to_string()));
        }
        let mut tables = self.tables.lock().await;
        let now = Utc::now();

        let mut board = Board::new(tables.next_id("board"), name);
        board.position = tables.boards.len() as i32;
        board.created_at = Some(now);
        board.updated_at = Some(now);
        tables.boards.insert(board.id.clone(), board.clone());
        Ok(board)
    }

    pub async fn create_column(&self, board_id: &str, name: &str) -> DomainResult<Column> {
        let mut tables = self.tables.lock().await;
        tables.board_row(board_id)?;
        let now = Utc::now();

        let position = tables.next_column_position(board_id);
        let mut column = Column::new(tables.next_id("col"), name, board_id, position);
        column.created_at = Some(now);
        column.updated_at = Some(now);
        tables.columns.insert(column.id.clone(), column.clone());
        Ok(column)
    }

    /// Create a todo at the end of a column
    pub async fn create_todo(&self, column_id: &str, title: &str) -> DomainResult<Todo> {
        if title.trim().is_empty() {
            return Err(DomainError::InvalidInput("todo title is empty".to_string()));
        }
        let mut tables = self.tables.lock().await;
        tables.column_row(column_id)?;
        let now = Utc::now();

        let position = tables.next_todo_position(column_id);
        let mut todo = Todo::new(tables.next_id("todo"), title, column_id, position);
        todo.created_at = Some(now);
        todo.updated_at = Some(now);
        tables.todos.insert(todo.id.clone(), todo.clone());
        Ok(todo)
    }

    // ========================
    // Read
    // ========================

    /// Board with visible todos, everything sorted by position
    pub async fn find_board(&self, board_id: &str) -> DomainResult<Board> {
        let tables = self.tables.lock().await;
        tables.assemble(board_id)
    }

    pub async fn list_boards(&self) -> DomainResult<Vec<BoardSummary>> {
        let tables = self.tables.lock().await;
        let mut summaries: Vec<BoardSummary> = tables
            .boards
            .values()
            .map(|board| BoardSummary {
                id: board.id.clone(),
                name: board.name.clone(),
                position: board.position,
                todo_count: tables.visible_count(&board.id),
            })
            .collect();
        summaries.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }

    pub async fn find_todo(&self, todo_id: &str) -> DomainResult<Todo> {
        let tables = self.tables.lock().await;
        tables.todo_row(todo_id).cloned()
    }

    // ========================
    // Positioning
    // ========================

    /// Move a todo into a column. `None` appends; positions past the end clamp.
    pub async fn move_todo(&self, todo_id: &str, column_id: &str, position: Option<i32>) -> DomainResult<Todo> {
        let mut tables = self.tables.lock().await;
        let todo = tables.todo_row(todo_id)?;
        if todo.archived {
            return Err(DomainError::Conflict(format!("todo {} is archived", todo_id)));
        }
        let source_id = todo.column_id.clone();
        let target_board = tables.column_row(column_id)?.board_id.clone();
        let source_board = tables
            .columns
            .get(&source_id)
            .map(|c| c.board_id.clone())
            .ok_or_else(|| DomainError::Internal(format!("todo {} has no column", todo_id)))?;
        if source_board != target_board {
            return Err(DomainError::InvalidInput(format!("column {} is on another board", column_id)));
        }

        let now = Utc::now();
        let mut todo = tables
            .todos
            .remove(todo_id)
            .ok_or_else(|| DomainError::NotFound(format!("todo {}", todo_id)))?;
        tables.reindex_todos(&source_id, now);

        let len = tables.next_todo_position(column_id);
        let insert_at = position.unwrap_or(len).clamp(0, len);
        tables.open_todo_slot(column_id, insert_at);

        todo.column_id = column_id.to_string();
        todo.position = insert_at;
        todo.updated_at = Some(now);
        tables.todos.insert(todo.id.clone(), todo);
        tables.reindex_todos(column_id, now);

        info!("[Repo] moved {} from {} to {} at {}", todo_id, source_id, column_id, insert_at);
        tables.todo_row(todo_id).cloned()
    }

    /// Apply a complete new order to a column's visible todos
    pub async fn reorder_todos(&self, column_id: &str, entries: &[PositionEntry]) -> DomainResult<Vec<Todo>> {
        let mut tables = self.tables.lock().await;
        tables.column_row(column_id)?;
        let siblings = tables.visible_todo_ids(column_id);
        Tables::validate_full_order(column_id, entries, &siblings)?;

        let now = Utc::now();
        for entry in entries {
            if let Some(todo) = tables.todos.get_mut(&entry.id) {
                todo.position = entry.position;
                todo.updated_at = Some(now);
            }
        }
        tables.reindex_todos(column_id, now);

        debug!("[Repo] reordered {} todos in {}", entries.len(), column_id);
        Ok(tables.visible_todos(column_id))
    }

    /// Apply a complete new order to a board's columns
    pub async fn reorder_columns(&self, board_id: &str, entries: &[PositionEntry]) -> DomainResult<Vec<Column>> {
        let mut tables = self.tables.lock().await;
        tables.board_row(board_id)?;
        let siblings = tables.board_column_ids(board_id);
        Tables::validate_full_order(board_id, entries, &siblings)?;

        let now = Utc::now();
        for entry in entries {
            if let Some(column) = tables.columns.get_mut(&entry.id) {
                column.position = entry.position;
                column.updated_at = Some(now);
            }
        }
        tables.reindex_columns(board_id, now);

        debug!("[Repo] reordered {} columns on {}", entries.len(), board_id);
        Ok(tables.board_columns(board_id))
    }

    /// Archiving frees the todo's slot; unarchiving appends it to its column
    pub async fn archive_todo(&self, todo_id: &str, archived: bool) -> DomainResult<Todo> {
        let mut tables = self.tables.lock().await;
        let todo = tables.todo_row(todo_id)?;
        if todo.archived == archived {
            return Ok(todo.clone());
        }
        let column_id = todo.column_id.clone();
        let now = Utc::now();

        let append_at = tables.next_todo_position(&column_id);
        if let Some(todo) = tables.todos.get_mut(todo_id) {
            todo.archived = archived;
            todo.updated_at = Some(now);
            if !archived {
                todo.position = append_at;
            }
        }
        tables.reindex_todos(&column_id, now);

        info!("[Repo] {} {}", if archived { "archived" } else { "unarchived" }, todo_id);
        tables.todo_row(todo_id).cloned()
    }
}
