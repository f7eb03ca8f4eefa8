//! Reorder Computation
//!
//! Pure functions turning a finished drag gesture (active id, drop target id)
//! into a mutation instruction. No side effects: identical inputs always give
//! identical outputs, and `None` means the gesture is a no-op.

use std::collections::HashMap;

use board_dnd::{strip_column_prefix, DragId};

use crate::instruction::MutationInstruction;
use crate::models::Board;
use crate::ordering::{sorted_by_position, splice_move};

/// Where a todo lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoLocation {
    pub column_id: String,
    pub position: i32,
}

/// Resolves a todo id to its owning column
pub trait TodoLookup {
    fn locate(&self, todo_id: &str) -> Option<TodoLocation>;
}

impl TodoLookup for Board {
    fn locate(&self, todo_id: &str) -> Option<TodoLocation> {
        self.find_todo(todo_id).map(|(todo, column)| TodoLocation {
            column_id: column.id.clone(),
            position: todo.position,
        })
    }
}

impl<F> TodoLookup for F
where
    F: Fn(&str) -> Option<TodoLocation>,
{
    fn locate(&self, todo_id: &str) -> Option<TodoLocation> {
        self(todo_id)
    }
}

/// Prebuilt todo id index for a board snapshot
#[derive(Debug, Clone, Default)]
pub struct TodoIndex {
    locations: HashMap<String, TodoLocation>,
}

impl TodoIndex {
    pub fn build(board: &Board) -> Self {
        let locations = board
            .columns
            .iter()
            .flat_map(|column| {
                column.todos.iter().map(move |todo| {
                    (
                        todo.id.clone(),
                        TodoLocation {
                            column_id: column.id.clone(),
                            position: todo.position,
                        },
                    )
                })
            })
            .collect();
        Self { locations }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl TodoLookup for TodoIndex {
    fn locate(&self, todo_id: &str) -> Option<TodoLocation> {
        self.locations.get(todo_id).cloned()
    }
}

/// Column drag: full new column order, or `None`.
///
/// `active_id` is the column drag id (`column-<id>`). `over_id` is either a
/// column drag id or a todo id, in which case the todo's column is the target.
pub fn compute_column_reorder<L>(
    board: &Board,
    board_id: &str,
    active_id: &str,
    over_id: &str,
    lookup: &L,
) -> Option<MutationInstruction>
where
    L: TodoLookup + ?Sized,
{
    let target_column_id = match DragId::classify(over_id) {
        DragId::Column(column_id) => column_id.to_string(),
        DragId::Todo(todo_id) => lookup.locate(todo_id)?.column_id,
    };

    let active_column_id = strip_column_prefix(active_id);
    if active_column_id == target_column_id {
        return None;
    }

    let mut order = sorted_by_position(&board.columns);
    let active_index = order.iter().position(|c| c.id == active_column_id)?;
    let over_index = order.iter().position(|c| c.id == target_column_id)?;

    splice_move(&mut order, active_index, over_index);
    Some(MutationInstruction::ReorderColumns {
        board_id: board_id.to_string(),
        column_ids: order.iter().map(|c| c.id.clone()).collect(),
    })
}

/// Todo drag: a cross-column move, a same-column reorder, or `None`.
///
/// The drop target is resolved in priority order: `over_id` naming a column
/// appends to it; otherwise `over_id` must resolve through the lookup to a
/// todo, whose position becomes the insertion point.
pub fn compute_todo_drop<L>(
    board: &Board,
    board_id: &str,
    active_id: &str,
    over_id: &str,
    lookup: &L,
) -> Option<MutationInstruction>
where
    L: TodoLookup + ?Sized,
{
    // Deleted mid-drag
    let active = lookup.locate(active_id)?;
    let source_column = board.column(&active.column_id)?;

    let (target_column, position) = match board.column(over_id) {
        Some(column) => (column, column.todos.len() as i32),
        None => {
            let over = lookup.locate(over_id)?;
            (board.column(&over.column_id)?, over.position)
        }
    };

    if source_column.id != target_column.id {
        return Some(MutationInstruction::Move {
            id: active_id.to_string(),
            board_id: board_id.to_string(),
            column_id: target_column.id.clone(),
            position,
        });
    }

    // Same column: only a drop on a sibling card reorders
    let over_in_source = lookup
        .locate(over_id)
        .is_some_and(|over| over.column_id == source_column.id);
    if !over_in_source {
        return None;
    }

    let mut order = sorted_by_position(&source_column.todos);
    let old_index = order.iter().position(|t| t.id == active_id)?;
    let new_index = order.iter().position(|t| t.id == over_id)?;
    if old_index == new_index {
        return None;
    }

    splice_move(&mut order, old_index, new_index);
    Some(MutationInstruction::ReorderTodos {
        board_id: board_id.to_string(),
        column_id: source_column.id.clone(),
        todo_ids: order.iter().map(|t| t.id.clone()).collect(),
    })
}
