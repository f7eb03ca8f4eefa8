//! Board Transport
//!
//! Request shapes for the board API and the async seam the sync core
//! calls through, organized by domain.

mod column;
mod todo;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportResult;
use crate::models::{Board, BoardSummary, Column, Todo};

// Re-export all public items
pub use column::*;
pub use todo::*;

/// One `{id, position}` pair of a full-order payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionEntry {
    pub id: String,
    pub position: i32,
}

/// Positions `0..n-1` in the given order
pub fn positions_for(ids: &[String]) -> Vec<PositionEntry> {
    ids.iter()
        .enumerate()
        .map(|(index, id)| PositionEntry {
            id: id.clone(),
            position: index as i32,
        })
        .collect()
}

/// The board API as seen by the sync core.
///
/// Implementations own the wire (HTTP, IPC, in-memory). Every mutation is
/// sent as a complete final state, never a delta.
#[async_trait]
pub trait BoardTransport: Send + Sync {
    /// Move a todo to a column at a position; returns the updated todo
    async fn move_todo(&self, todo_id: &str, request: &MoveTodoRequest) -> TransportResult<Todo>;

    /// Replace the order of a column's todos
    async fn reorder_todos(&self, request: &ReorderTodosRequest) -> TransportResult<Vec<Todo>>;

    /// Replace the order of a board's columns
    async fn reorder_columns(&self, request: &ReorderColumnsRequest) -> TransportResult<Vec<Column>>;

    async fn archive_todo(&self, todo_id: &str, request: &ArchiveTodoRequest) -> TransportResult<Todo>;

    /// Authoritative board with visible todos
    async fn fetch_board(&self, board_id: &str) -> TransportResult<Board>;

    /// Board list with per-board counts
    async fn list_boards(&self) -> TransportResult<Vec<BoardSummary>>;
}

#[async_trait]
impl<T: BoardTransport + ?Sized> BoardTransport for Arc<T> {
    async fn move_todo(&self, todo_id: &str, request: &MoveTodoRequest) -> TransportResult<Todo> {
        (**self).move_todo(todo_id, request).await
    }

    async fn reorder_todos(&self, request: &ReorderTodosRequest) -> TransportResult<Vec<Todo>> {
        (**self).reorder_todos(request).await
    }

    async fn reorder_columns(&self, request: &ReorderColumnsRequest) -> TransportResult<Vec<Column>> {
        (**self).reorder_columns(request).await
    }

    async fn archive_todo(&self, todo_id: &str, request: &ArchiveTodoRequest) -> TransportResult<Todo> {
        (**self).archive_todo(todo_id, request).await
    }

    async fn fetch_board(&self, board_id: &str) -> TransportResult<Board> {
        (**self).fetch_board(board_id).await
    }

    async fn list_boards(&self) -> TransportResult<Vec<BoardSummary>> {
        (**self).list_boards().await
    }
}
