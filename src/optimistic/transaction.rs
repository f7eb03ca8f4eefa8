//! Optimistic Transaction
//!
//! Snapshot, apply, then either commit or roll back. Consuming `commit` and
//! `rollback` by value makes a double settle impossible.

use tracing::debug;

use super::apply::apply_instruction;
use crate::instruction::MutationInstruction;
use crate::models::Board;
use crate::store::BoardCache;

/// What a rollback did to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollback {
    /// The snapshot was written back exactly
    Restored,
    /// A later write sits on top of ours, so the snapshot was not written
    /// back. The failed effect stays in the cache, marked stale, until the
    /// board is refetched; with `refetch_on_settle` off that is up to the caller.
    Superseded,
    /// Nothing was applied, so nothing needed restoring
    NothingApplied,
}

#[must_use = "a transaction must be committed or rolled back"]
#[derive(Debug)]
pub struct Transaction {
    board_id: String,
    snapshot: Option<Board>,
    /// Cache version written by our own apply
    applied_version: Option<u64>,
}

impl Transaction {
    /// Retain the cached board verbatim. A cache miss yields a transaction
    /// whose apply is skipped.
    pub fn snapshot(cache: &BoardCache, board_id: &str) -> Self {
        Self {
            board_id: board_id.to_string(),
            snapshot: cache.snapshot(board_id),
            applied_version: None,
        }
    }

    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Rewrite the cached board with the instruction's expected effect.
    /// Returns whether the cache was written.
    pub fn apply(&mut self, cache: &mut BoardCache, instruction: &MutationInstruction) -> bool {
        if self.snapshot.is_none() {
            return false;
        }
        self.applied_version = cache.update(&self.board_id, |board| apply_instruction(board, instruction));
        self.applied_version.is_some()
    }

    /// Fold a later transaction on the same board into this one. The result
    /// rolls back to our snapshot and owns the later apply's version.
    pub fn absorb(self, later: Transaction) -> Transaction {
        Transaction {
            board_id: self.board_id,
            snapshot: self.snapshot.or(later.snapshot),
            applied_version: later.applied_version.or(self.applied_version),
        }
    }

    /// Success: the server is now the truth, so mark our belief stale
    pub fn commit(self, cache: &mut BoardCache, invalidate_board_list: bool) {
        cache.invalidate(&self.board_id);
        if invalidate_board_list {
            cache.invalidate_board_list();
        }
    }

    /// Failure: put the snapshot back unless a later write would be lost
    pub fn rollback(self, cache: &mut BoardCache, invalidate_board_list: bool) -> Rollback {
        let Transaction {
            board_id,
            snapshot,
            applied_version,
        } = self;

        let outcome = match (snapshot, applied_version) {
            (Some(snapshot), Some(version)) if cache.version(&board_id) == Some(version) => {
                cache.set(snapshot);
                Rollback::Restored
            }
            (Some(_), Some(version)) => {
                debug!("board {} changed after version {}, skipping restore", board_id, version);
                Rollback::Superseded
            }
            _ => Rollback::NothingApplied,
        };

        cache.invalidate(&board_id);
        if invalidate_board_list {
            cache.invalidate_board_list();
        }
        outcome
    }
}
