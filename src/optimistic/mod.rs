//! Optimistic Synchronization
//!
//! Local-first mutation of the board cache, reconciled with the server:
//! - apply: expected effect of each instruction on a board
//! - transaction: snapshot / apply / commit / rollback
//! - coordinator: drives transactions through the transport
//! - status: idle / syncing / synced indicator over in-flight requests

mod apply;
mod coordinator;
mod status;
mod transaction;

// Re-export all public items
pub use apply::*;
pub use coordinator::*;
pub use status::*;
pub use transaction::*;
