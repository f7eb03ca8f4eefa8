//! Kanban Board Sync Core
//!
//! Turns drag-and-drop gestures into ordering mutations and keeps a local
//! board cache in step with the server:
//! - reorder / interaction: gesture to instruction
//! - debounce: coalescing of rapid same-target instructions
//! - optimistic: local apply, commit and rollback
//! - commands: the board API seam

pub mod commands;
pub mod config;
pub mod debounce;
pub mod error;
pub mod instruction;
pub mod interaction;
pub mod models;
pub mod optimistic;
pub mod ordering;
pub mod reorder;
pub mod store;

pub use board_dnd::{column_drag_id, DragKind, DragState, COLUMN_PREFIX};
pub use commands::BoardTransport;
pub use config::{SyncConfig, TeardownPolicy};
pub use debounce::DebounceCoalescer;
pub use error::{ConfigError, OrderingViolation, TransportError, TransportResult};
pub use instruction::{MutationInstruction, MutationRequest};
pub use interaction::{BoardDragTracker, BoardDropHandler, InstructionSink};
pub use models::{Board, BoardSummary, Column, Label, Priority, Todo};
pub use optimistic::{
    DebouncedMutations, MutationOutcome, OptimisticMutationCoordinator, PendingMutation, Rollback, SyncState,
    SyncStatus, Transaction,
};
pub use reorder::{compute_column_reorder, compute_todo_drop, TodoIndex, TodoLocation, TodoLookup};
pub use store::{lock_cache, shared_cache, BoardCache, SharedBoardCache};
