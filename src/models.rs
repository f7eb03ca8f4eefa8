//! Board Models
//!
//! Data structures matching the board API contract (camelCase JSON).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OrderingViolation;
use crate::ordering::{check_contiguous, sorted_by_position};

/// Card priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// A card on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Rank among siblings of the same column
    pub position: i32,
    #[serde(default)]
    pub archived: bool,
    pub column_id: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Todo {
    pub fn new(id: impl Into<String>, title: impl Into<String>, column_id: impl Into<String>, position: i32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_date: None,
            position,
            archived: false,
            column_id: column_id.into(),
            labels: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// A column of cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rank among the board's columns
    pub position: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<u32>,
    pub board_id: String,
    #[serde(default)]
    pub todos: Vec<Todo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Column {
    pub fn new(id: impl Into<String>, name: impl Into<String>, board_id: impl Into<String>, position: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            position,
            wip_limit: None,
            board_id: board_id.into(),
            todos: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_todos(mut self, todos: Vec<Todo>) -> Self {
        self.todos = todos;
        self
    }

    /// Todo ids in display order
    pub fn todo_ids(&self) -> Vec<String> {
        sorted_by_position(&self.todos).into_iter().map(|t| t.id.clone()).collect()
    }
}

/// A board with its columns and cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Denormalized count of visible cards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Board {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            position: 0,
            columns: Vec::new(),
            todo_count: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn column_mut(&mut self, column_id: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == column_id)
    }

    /// Find a todo and its owning column
    pub fn find_todo(&self, todo_id: &str) -> Option<(&Todo, &Column)> {
        self.columns.iter().find_map(|column| {
            column.todos.iter().find(|t| t.id == todo_id).map(|todo| (todo, column))
        })
    }

    /// Column ids in display order
    pub fn column_ids(&self) -> Vec<String> {
        sorted_by_position(&self.columns).into_iter().map(|c| c.id.clone()).collect()
    }

    pub fn visible_todo_count(&self) -> u32 {
        self.columns
            .iter()
            .flat_map(|c| c.todos.iter())
            .filter(|t| !t.archived)
            .count() as u32
    }

    /// Verify positions are `0..n-1` for the columns and every column's todos
    pub fn check_ordering(&self) -> Result<(), OrderingViolation> {
        check_contiguous(&self.id, &self.columns)?;
        for column in &self.columns {
            check_contiguous(&column.id, &column.todos)?;
        }
        Ok(())
    }

    pub fn summary(&self) -> BoardSummary {
        BoardSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            position: self.position,
            todo_count: self.todo_count.unwrap_or_else(|| self.visible_todo_count()),
        }
    }
}

/// Board list entry (aggregate view)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSummary {
    pub id: String,
    pub name: String,
    pub position: i32,
    pub todo_count: u32,
}
