//! Board Drag Interaction
//!
//! Wires the drag session state machine to the reorder computation for a
//! loaded board, and hands resulting instructions to the sync layer.

use board_dnd::{ContainerLookup, DragKind, DragSession, DragState, DropHandler, NoContainers};
use tracing::debug;

use crate::instruction::MutationInstruction;
use crate::models::Board;
use crate::reorder::{compute_column_reorder, compute_todo_drop};

impl ContainerLookup for Board {
    fn column_of_todo(&self, todo_id: &str) -> Option<String> {
        self.find_todo(todo_id).map(|(_, column)| column.id.clone())
    }

    fn has_column(&self, column_id: &str) -> bool {
        self.column(column_id).is_some()
    }
}

/// Receives instructions produced by finished gestures
pub trait InstructionSink {
    fn submit(&mut self, instruction: MutationInstruction);
}

impl<F> InstructionSink for F
where
    F: FnMut(MutationInstruction),
{
    fn submit(&mut self, instruction: MutationInstruction) {
        self(instruction)
    }
}

/// Resolves a drop against the current board snapshot.
///
/// Without a board or a board id the drop is discarded: dragging before data
/// has loaded is a no-op, not a failure.
pub struct BoardDropHandler<'a> {
    board: Option<&'a Board>,
    board_id: Option<&'a str>,
}

impl<'a> BoardDropHandler<'a> {
    pub fn new(board: Option<&'a Board>, board_id: Option<&'a str>) -> Self {
        Self { board, board_id }
    }
}

impl DropHandler for BoardDropHandler<'_> {
    type Output = MutationInstruction;

    fn on_drop(&mut self, kind: DragKind, active_id: &str, over_id: &str) -> Option<MutationInstruction> {
        let (Some(board), Some(board_id)) = (self.board, self.board_id) else {
            debug!("[DND] board not loaded, discarding drop of {}", active_id);
            return None;
        };
        let instruction = match kind {
            DragKind::Column => compute_column_reorder(board, board_id, active_id, over_id, board),
            DragKind::Todo => compute_todo_drop(board, board_id, active_id, over_id, board),
        };
        if instruction.is_none() {
            debug!("[DND] drop of {} on {} resolved to no mutation", active_id, over_id);
        }
        instruction
    }
}

/// Session-scoped tracker for drag gestures on one board view
#[derive(Debug, Default)]
pub struct BoardDragTracker {
    session: DragSession,
}

impl BoardDragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        self.session.state()
    }

    /// Column currently under the pointer (for highlighting)
    pub fn hover_column_id(&self) -> Option<&str> {
        self.session.state().hover_column_id()
    }

    /// Card currently under the pointer (for the insertion line)
    pub fn hover_todo_id(&self) -> Option<&str> {
        self.session.state().hover_todo_id()
    }

    pub fn start(&mut self, id: &str) {
        self.session.start(id);
    }

    pub fn over(&mut self, board: Option<&Board>, over: Option<&str>) {
        match board {
            Some(board) => self.session.over(over, board),
            None => self.session.over(over, &NoContainers),
        }
    }

    pub fn cancel(&mut self) {
        self.session.cancel();
    }

    /// Finish the gesture and compute its instruction. State is always cleared.
    pub fn end(&mut self, board: Option<&Board>, board_id: Option<&str>, over: Option<&str>) -> Option<MutationInstruction> {
        let mut handler = BoardDropHandler::new(board, board_id);
        self.session.end(over, &mut handler)
    }

    /// Finish the gesture and forward any instruction to `sink`.
    /// Returns whether an instruction was submitted.
    pub fn end_into<S>(&mut self, board: Option<&Board>, board_id: Option<&str>, over: Option<&str>, sink: &mut S) -> bool
    where
        S: InstructionSink + ?Sized,
    {
        match self.end(board, board_id, over) {
            Some(instruction) => {
                sink.submit(instruction);
                true
            }
            None => false,
        }
    }
}
