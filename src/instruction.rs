//! Mutation Instructions
//!
//! Immutable messages from the interaction layer to the sync layer.

use serde::{Deserialize, Serialize};

use crate::commands::{ArchiveTodoRequest, MoveTodoRequest, ReorderColumnsRequest, ReorderTodosRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MutationInstruction {
    /// Move a todo into another column at a position
    Move {
        id: String,
        board_id: String,
        column_id: String,
        position: i32,
    },
    /// Full new order of one column's todos
    ReorderTodos {
        board_id: String,
        column_id: String,
        todo_ids: Vec<String>,
    },
    /// Full new order of a board's columns
    ReorderColumns {
        board_id: String,
        column_ids: Vec<String>,
    },
    Archive {
        id: String,
        board_id: String,
        archived: bool,
    },
}

impl MutationInstruction {
    pub fn board_id(&self) -> &str {
        match self {
            MutationInstruction::Move { board_id, .. }
            | MutationInstruction::ReorderTodos { board_id, .. }
            | MutationInstruction::ReorderColumns { board_id, .. }
            | MutationInstruction::Archive { board_id, .. } => board_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MutationInstruction::Move { .. } => "move",
            MutationInstruction::ReorderTodos { .. } => "reorderTodos",
            MutationInstruction::ReorderColumns { .. } => "reorderColumns",
            MutationInstruction::Archive { .. } => "archive",
        }
    }

    /// Debounce key: later instructions for the same target replace earlier ones
    pub fn coalesce_key(&self) -> String {
        match self {
            MutationInstruction::Move { id, .. } => format!("move:{}", id),
            MutationInstruction::ReorderTodos { column_id, .. } => format!("reorderTodos:{}", column_id),
            MutationInstruction::ReorderColumns { board_id, .. } => format!("reorderColumns:{}", board_id),
            MutationInstruction::Archive { id, .. } => format!("archive:{}", id),
        }
    }

    /// Whether settling must also refresh the board list counts
    pub fn affects_board_list(&self) -> bool {
        matches!(self, MutationInstruction::Archive { .. })
    }

    /// Wire request for this instruction
    pub fn to_request(&self) -> MutationRequest {
        match self {
            MutationInstruction::Move { id, column_id, position, .. } => MutationRequest::MoveTodo {
                todo_id: id.clone(),
                body: MoveTodoRequest {
                    column_id: column_id.clone(),
                    position: Some(*position),
                },
            },
            MutationInstruction::ReorderTodos { column_id, todo_ids, .. } => {
                MutationRequest::ReorderTodos(ReorderTodosRequest::from_ordered_ids(column_id.clone(), todo_ids))
            }
            MutationInstruction::ReorderColumns { board_id, column_ids } => {
                MutationRequest::ReorderColumns(ReorderColumnsRequest::from_ordered_ids(board_id.clone(), column_ids))
            }
            MutationInstruction::Archive { id, archived, .. } => MutationRequest::ArchiveTodo {
                todo_id: id.clone(),
                body: ArchiveTodoRequest { archived: *archived },
            },
        }
    }
}

/// A request ready for the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRequest {
    MoveTodo { todo_id: String, body: MoveTodoRequest },
    ReorderTodos(ReorderTodosRequest),
    ReorderColumns(ReorderColumnsRequest),
    ArchiveTodo { todo_id: String, body: ArchiveTodoRequest },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::PositionEntry;

    #[test]
    fn test_move_serializes_with_type_tag() {
        let instruction = MutationInstruction::Move {
            id: "t1".to_string(),
            board_id: "board-1".to_string(),
            column_id: "col2".to_string(),
            position: 2,
        };
        assert_eq!(
            serde_json::to_value(&instruction).unwrap(),
            serde_json::json!({
                "type": "move",
                "id": "t1",
                "boardId": "board-1",
                "columnId": "col2",
                "position": 2
            })
        );
    }

    #[test]
    fn test_coalesce_keys() {
        let a = MutationInstruction::ReorderTodos {
            board_id: "b".to_string(),
            column_id: "col1".to_string(),
            todo_ids: vec!["t1".to_string()],
        };
        let b = MutationInstruction::ReorderTodos {
            board_id: "b".to_string(),
            column_id: "col1".to_string(),
            todo_ids: vec![],
        };
        assert_eq!(a.coalesce_key(), b.coalesce_key());
        assert_ne!(
            a.coalesce_key(),
            MutationInstruction::ReorderColumns { board_id: "b".to_string(), column_ids: vec![] }.coalesce_key()
        );
    }

    #[test]
    fn test_reorder_columns_request() {
        let instruction = MutationInstruction::ReorderColumns {
            board_id: "board-1".to_string(),
            column_ids: vec!["b".to_string(), "a".to_string()],
        };
        match instruction.to_request() {
            MutationRequest::ReorderColumns(request) => {
                assert_eq!(request.board_id, "board-1");
                assert_eq!(
                    request.columns,
                    vec![
                        PositionEntry { id: "b".to_string(), position: 0 },
                        PositionEntry { id: "a".to_string(), position: 1 },
                    ]
                );
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }
}
