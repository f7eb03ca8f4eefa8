//! Todo Requests
//!
//! Payloads for todo move, reorder and archive calls.

use serde::{Deserialize, Serialize};

use super::{positions_for, PositionEntry};

/// Body of `PATCH /todos/{id}/move`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTodoRequest {
    pub column_id: String,
    /// Omitted = append to the end of the column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
}

/// Body of `PATCH /todos/reorder`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderTodosRequest {
    pub column_id: String,
    pub todos: Vec<PositionEntry>,
}

impl ReorderTodosRequest {
    pub fn from_ordered_ids(column_id: impl Into<String>, todo_ids: &[String]) -> Self {
        Self {
            column_id: column_id.into(),
            todos: positions_for(todo_ids),
        }
    }
}

/// Body of `PATCH /todos/{id}/archive`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveTodoRequest {
    pub archived: bool,
}
