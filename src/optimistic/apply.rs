//! Optimistic Apply
//!
//! The expected effect of each instruction on a cached board. Every function
//! returns whether its target was found; a stale reference leaves the board
//! untouched.

use crate::instruction::MutationInstruction;
use crate::models::Board;
use crate::ordering::{renumber, reorder_by_ids, sort_by_position};

pub fn apply_instruction(board: &mut Board, instruction: &MutationInstruction) -> bool {
    match instruction {
        MutationInstruction::Move { id, column_id, position, .. } => apply_move(board, id, column_id, *position),
        MutationInstruction::ReorderTodos { column_id, todo_ids, .. } => apply_reorder_todos(board, column_id, todo_ids),
        MutationInstruction::ReorderColumns { column_ids, .. } => apply_reorder_columns(board, column_ids),
        MutationInstruction::Archive { id, archived, .. } => apply_archive(board, id, *archived),
    }
}

/// Move a todo into `column_id` at `position` (clamped to the end).
/// Both source and target columns are renumbered.
pub fn apply_move(board: &mut Board, todo_id: &str, column_id: &str, position: i32) -> bool {
    if board.column(column_id).is_none() {
        return false;
    }
    let Some(source_id) = board.find_todo(todo_id).map(|(_, column)| column.id.clone()) else {
        return false;
    };

    let Some(source) = board.column_mut(&source_id) else {
        return false;
    };
    sort_by_position(&mut source.todos);
    let Some(index) = source.todos.iter().position(|t| t.id == todo_id) else {
        return false;
    };
    let mut todo = source.todos.remove(index);
    renumber(&mut source.todos);

    let Some(target) = board.column_mut(column_id) else {
        return false;
    };
    sort_by_position(&mut target.todos);
    let insert_at = (position.max(0) as usize).min(target.todos.len());
    todo.column_id = column_id.to_string();
    target.todos.insert(insert_at, todo);
    renumber(&mut target.todos);
    true
}

pub fn apply_reorder_todos(board: &mut Board, column_id: &str, todo_ids: &[String]) -> bool {
    let Some(column) = board.column_mut(column_id) else {
        return false;
    };
    let todos = std::mem::take(&mut column.todos);
    column.todos = reorder_by_ids(todos, todo_ids);
    true
}

pub fn apply_reorder_columns(board: &mut Board, column_ids: &[String]) -> bool {
    let columns = std::mem::take(&mut board.columns);
    board.columns = reorder_by_ids(columns, column_ids);
    true
}

/// Archiving hides the todo from the board and drops the visible count;
/// unarchiving only flips the flag of a todo still present.
pub fn apply_archive(board: &mut Board, todo_id: &str, archived: bool) -> bool {
    let Some(column_id) = board.find_todo(todo_id).map(|(_, column)| column.id.clone()) else {
        return false;
    };

    if !archived {
        let todo = board
            .column_mut(&column_id)
            .and_then(|column| column.todos.iter_mut().find(|t| t.id == todo_id));
        return match todo {
            Some(todo) => {
                todo.archived = false;
                true
            }
            None => false,
        };
    }

    let Some(column) = board.column_mut(&column_id) else {
        return false;
    };
    column.todos.retain(|t| t.id != todo_id);
    sort_by_position(&mut column.todos);
    renumber(&mut column.todos);
    board.todo_count = Some(board.todo_count.unwrap_or(0).saturating_sub(1));
    true
}
