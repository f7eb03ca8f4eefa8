//! Local Board Cache
//!
//! The client's belief about server state: one board snapshot per board id
//! plus the board list. Always subordinate to the server's next response.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::models::{Board, BoardSummary};

/// Type alias for the shared cache
pub type SharedBoardCache = Arc<Mutex<BoardCache>>;

/// Create an empty shared cache
pub fn shared_cache() -> SharedBoardCache {
    Arc::new(Mutex::new(BoardCache::new()))
}

/// Lock the cache. The cache holds plain data, so a poisoned lock is still usable.
pub fn lock_cache(cache: &Mutex<BoardCache>) -> MutexGuard<'_, BoardCache> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
struct CacheEntry {
    board: Board,
    /// Stamp of the last write to this entry
    version: u64,
}

/// Proof that a fetch was started; stale tickets are refused on completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    board_id: String,
    generation: u64,
}

impl FetchTicket {
    pub fn board_id(&self) -> &str {
        &self.board_id
    }
}

#[derive(Debug, Default)]
pub struct BoardCache {
    boards: HashMap<String, CacheEntry>,
    stale: HashSet<String>,
    fetch_generations: HashMap<String, u64>,
    /// Optimistic writes applied locally but not yet settled, per board
    pending_writes: HashMap<String, usize>,
    board_list: Option<Vec<BoardSummary>>,
    board_list_stale: bool,
    /// Monotonic write counter; versions never repeat
    last_version: u64,
}

impl BoardCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&mut self) -> u64 {
        self.last_version += 1;
        self.last_version
    }

    // ========================
    // Board Detail
    // ========================

    pub fn get(&self, board_id: &str) -> Option<&Board> {
        self.boards.get(board_id).map(|entry| &entry.board)
    }

    /// Copy of the cached board
    pub fn snapshot(&self, board_id: &str) -> Option<Board> {
        self.get(board_id).cloned()
    }

    pub fn version(&self, board_id: &str) -> Option<u64> {
        self.boards.get(board_id).map(|entry| entry.version)
    }

    /// Replace the cached board wholesale. Returns the new version.
    pub fn set(&mut self, board: Board) -> u64 {
        let version = self.next_version();
        self.stale.remove(&board.id);
        self.boards.insert(board.id.clone(), CacheEntry { board, version });
        version
    }

    /// Read-modify-write a cached board. `f` reports whether it changed
    /// anything; only changes are stamped. Cache miss returns `None`.
    pub fn update<F>(&mut self, board_id: &str, f: F) -> Option<u64>
    where
        F: FnOnce(&mut Board) -> bool,
    {
        let version = self.last_version + 1;
        let entry = self.boards.get_mut(board_id)?;
        if !f(&mut entry.board) {
            return None;
        }
        entry.version = version;
        self.last_version = version;
        Some(version)
    }

    /// Mark a board as needing a refetch. Cached data stays readable.
    pub fn invalidate(&mut self, board_id: &str) {
        debug!("invalidate board {}", board_id);
        self.stale.insert(board_id.to_string());
    }

    pub fn is_stale(&self, board_id: &str) -> bool {
        self.stale.contains(board_id)
    }

    // ========================
    // Fetch Tracking
    // ========================

    /// Suppress the effect of any fetch already in flight for this board
    pub fn cancel_queries(&mut self, board_id: &str) {
        *self.fetch_generations.entry(board_id.to_string()).or_default() += 1;
    }

    pub fn begin_fetch(&self, board_id: &str) -> FetchTicket {
        FetchTicket {
            board_id: board_id.to_string(),
            generation: self.fetch_generations.get(board_id).copied().unwrap_or(0),
        }
    }

    /// Install a fetched board unless the fetch was cancelled meanwhile or
    /// an unsettled optimistic write would be overwritten
    pub fn complete_fetch(&mut self, ticket: &FetchTicket, board: Board) -> bool {
        let current = self.fetch_generations.get(&ticket.board_id).copied().unwrap_or(0);
        if current != ticket.generation {
            debug!("dropping stale fetch of board {}", ticket.board_id);
            return false;
        }
        if self.has_pending_writes(&ticket.board_id) {
            debug!("dropping fetch of board {}: writes pending", ticket.board_id);
            return false;
        }
        self.set(board);
        true
    }

    /// Register an optimistic write that has not settled yet
    pub fn begin_write(&mut self, board_id: &str) {
        *self.pending_writes.entry(board_id.to_string()).or_default() += 1;
    }

    /// Settle one pending write. Fetches started while it was pending are
    /// cancelled since they may predate it on the server.
    pub fn end_write(&mut self, board_id: &str) {
        if let Some(count) = self.pending_writes.get_mut(board_id) {
            *count -= 1;
            if *count == 0 {
                self.pending_writes.remove(board_id);
            }
        }
        self.cancel_queries(board_id);
    }

    pub fn has_pending_writes(&self, board_id: &str) -> bool {
        self.pending_writes.contains_key(board_id)
    }

    // ========================
    // Board List
    // ========================

    pub fn board_list(&self) -> Option<&[BoardSummary]> {
        self.board_list.as_deref()
    }

    pub fn set_board_list(&mut self, boards: Vec<BoardSummary>) {
        self.board_list = Some(boards);
        self.board_list_stale = false;
    }

    pub fn invalidate_board_list(&mut self) {
        self.board_list_stale = true;
    }

    pub fn is_board_list_stale(&self) -> bool {
        self.board_list_stale
    }

    /// Mark every board and the board list stale
    pub fn invalidate_all(&mut self) {
        let ids: Vec<String> = self.boards.keys().cloned().collect();
        self.stale.extend(ids);
        self.board_list_stale = true;
    }
}
