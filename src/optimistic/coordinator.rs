//! Optimistic Mutation Coordinator
//!
//! Runs each instruction through the transaction protocol against the
//! shared cache and the board transport, then refetches the authoritative
//! board so the cache converges on server state.
//!
//! A mutation has two halves: [`begin`](OptimisticMutationCoordinator::begin)
//! applies it to the cache synchronously, [`settle`](OptimisticMutationCoordinator::settle)
//! sends it and commits or rolls back. The debounced path runs the first half
//! per gesture and the second half once per burst.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::status::{SyncStatus, SyncStatusTracker};
use super::transaction::{Rollback, Transaction};
use crate::commands::BoardTransport;
use crate::config::SyncConfig;
use crate::debounce::DebounceCoalescer;
use crate::error::{TransportError, TransportResult};
use crate::instruction::{MutationInstruction, MutationRequest};
use crate::interaction::InstructionSink;
use crate::models::{Board, BoardSummary};
use crate::store::{lock_cache, SharedBoardCache};

/// How a mutation settled. Transport errors end here; they never propagate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Committed,
    RolledBack {
        error: TransportError,
        /// Whether the pre-mutation snapshot was written back
        restored: bool,
    },
}

impl MutationOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, MutationOutcome::Committed)
    }
}

/// An instruction already applied to the cache and not yet sent
#[must_use = "a pending mutation must be settled or abandoned"]
#[derive(Debug)]
pub struct PendingMutation {
    instruction: MutationInstruction,
    transaction: Transaction,
}

impl PendingMutation {
    pub fn instruction(&self) -> &MutationInstruction {
        &self.instruction
    }

    pub fn board_id(&self) -> &str {
        self.transaction.board_id()
    }
}

pub struct OptimisticMutationCoordinator<T> {
    transport: T,
    cache: SharedBoardCache,
    config: SyncConfig,
    status: SyncStatusTracker,
}

impl<T: BoardTransport> OptimisticMutationCoordinator<T> {
    pub fn new(transport: T, cache: SharedBoardCache, config: SyncConfig) -> Self {
        let status = SyncStatusTracker::new(config.synced_duration());
        Self {
            transport,
            cache,
            config,
            status,
        }
    }

    pub fn cache(&self) -> &SharedBoardCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.status.current()
    }

    pub fn subscribe_sync_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Fetch a board and install it. Returns `false` when the result was
    /// refused: a mutation cancelled the fetch or is still unsettled.
    pub async fn load_board(&self, board_id: &str) -> TransportResult<bool> {
        let ticket = lock_cache(&self.cache).begin_fetch(board_id);
        let board = self.transport.fetch_board(board_id).await?;
        Ok(lock_cache(&self.cache).complete_fetch(&ticket, board))
    }

    /// Fetch the board list and install it
    pub async fn load_boards(&self) -> TransportResult<Vec<BoardSummary>> {
        let boards = self.transport.list_boards().await?;
        lock_cache(&self.cache).set_board_list(boards.clone());
        Ok(boards)
    }

    /// Apply optimistically, send, then commit or roll back
    pub async fn execute(&self, instruction: MutationInstruction) -> MutationOutcome {
        let pending = self.begin(instruction);
        self.settle(pending).await
    }

    /// Cancel in-flight fetches, snapshot and apply. The cache shows the
    /// instruction's effect as soon as this returns.
    pub fn begin(&self, instruction: MutationInstruction) -> PendingMutation {
        let board_id = instruction.board_id().to_string();
        let mut cache = lock_cache(&self.cache);
        cache.cancel_queries(&board_id);
        cache.begin_write(&board_id);

        let mut transaction = Transaction::snapshot(&cache, &board_id);
        if !transaction.has_snapshot() {
            debug!("board {} not cached, sending {} without optimistic update", board_id, instruction.kind());
        } else if !transaction.apply(&mut cache, &instruction) {
            debug!("{} on board {} matched nothing locally", instruction.kind(), board_id);
        }
        if cfg!(debug_assertions) {
            if let Some(Err(violation)) = cache.get(&board_id).map(Board::check_ordering) {
                warn!("{} broke ordering on board {}: {}", instruction.kind(), board_id, violation);
            }
        }
        PendingMutation { instruction, transaction }
    }

    /// Fold a later same-target mutation into an earlier one. The later
    /// instruction is sent; a failure restores the earlier snapshot.
    pub fn supersede(&self, earlier: PendingMutation, later: PendingMutation) -> PendingMutation {
        lock_cache(&self.cache).end_write(earlier.board_id());
        PendingMutation {
            instruction: later.instruction,
            transaction: earlier.transaction.absorb(later.transaction),
        }
    }

    /// Send a begun mutation and settle it against the cache
    pub async fn settle(&self, pending: PendingMutation) -> MutationOutcome {
        let PendingMutation { instruction, transaction } = pending;
        let board_id = transaction.board_id().to_string();
        let invalidate_board_list = instruction.affects_board_list();

        let in_flight = self.status.track();
        let result = self.send(&instruction).await;

        let outcome = {
            let mut cache = lock_cache(&self.cache);
            cache.end_write(&board_id);
            match result {
                Ok(()) => {
                    transaction.commit(&mut cache, invalidate_board_list);
                    in_flight.succeed();
                    info!("{} on board {} committed", instruction.kind(), board_id);
                    MutationOutcome::Committed
                }
                Err(error) => {
                    let rollback = transaction.rollback(&mut cache, invalidate_board_list);
                    drop(in_flight);
                    warn!("{} on board {} failed ({}), rollback: {:?}", instruction.kind(), board_id, error, rollback);
                    MutationOutcome::RolledBack {
                        error,
                        restored: rollback == Rollback::Restored,
                    }
                }
            }
        };

        if self.config.refetch_on_settle {
            self.refetch(&board_id, invalidate_board_list).await;
        }
        outcome
    }

    /// Undo a begun mutation that will never be sent
    pub fn abandon(&self, pending: PendingMutation) -> Rollback {
        let PendingMutation { instruction, transaction } = pending;
        let mut cache = lock_cache(&self.cache);
        cache.end_write(transaction.board_id());
        let rollback = transaction.rollback(&mut cache, instruction.affects_board_list());
        debug!("{} on board {} abandoned, rollback: {:?}", instruction.kind(), instruction.board_id(), rollback);
        rollback
    }

    pub async fn move_todo(&self, board_id: &str, todo_id: &str, column_id: &str, position: i32) -> MutationOutcome {
        self.execute(MutationInstruction::Move {
            id: todo_id.to_string(),
            board_id: board_id.to_string(),
            column_id: column_id.to_string(),
            position,
        })
        .await
    }

    pub async fn reorder_todos(&self, board_id: &str, column_id: &str, todo_ids: Vec<String>) -> MutationOutcome {
        self.execute(MutationInstruction::ReorderTodos {
            board_id: board_id.to_string(),
            column_id: column_id.to_string(),
            todo_ids,
        })
        .await
    }

    pub async fn reorder_columns(&self, board_id: &str, column_ids: Vec<String>) -> MutationOutcome {
        self.execute(MutationInstruction::ReorderColumns {
            board_id: board_id.to_string(),
            column_ids,
        })
        .await
    }

    pub async fn archive_todo(&self, board_id: &str, todo_id: &str, archived: bool) -> MutationOutcome {
        self.execute(MutationInstruction::Archive {
            id: todo_id.to_string(),
            board_id: board_id.to_string(),
            archived,
        })
        .await
    }

    /// Debounced front end: each instruction is applied at once, and each
    /// burst of same-target instructions is sent once on its own task.
    pub fn debounced(self: &Arc<Self>) -> DebouncedMutations<T>
    where
        T: 'static,
    {
        let settler = Arc::clone(self);
        let merger = Arc::clone(self);
        let discarder = Arc::clone(self);
        let coalescer = DebounceCoalescer::from_config(
            move |pending: PendingMutation| match Handle::try_current() {
                Ok(handle) => {
                    let coordinator = Arc::clone(&settler);
                    handle.spawn(async move {
                        coordinator.settle(pending).await;
                    });
                }
                Err(_) => {
                    warn!("no runtime to send {}, rolling back", pending.instruction().kind());
                    settler.abandon(pending);
                }
            },
            |pending: &PendingMutation| pending.instruction().coalesce_key(),
            &self.config,
        )
        .with_merge(move |earlier, later| merger.supersede(earlier, later))
        .with_discard(move |pending| {
            discarder.abandon(pending);
        });

        DebouncedMutations {
            coordinator: Arc::clone(self),
            coalescer,
        }
    }

    async fn send(&self, instruction: &MutationInstruction) -> TransportResult<()> {
        match instruction.to_request() {
            MutationRequest::MoveTodo { todo_id, body } => self.transport.move_todo(&todo_id, &body).await.map(drop),
            MutationRequest::ReorderTodos(body) => self.transport.reorder_todos(&body).await.map(drop),
            MutationRequest::ReorderColumns(body) => self.transport.reorder_columns(&body).await.map(drop),
            MutationRequest::ArchiveTodo { todo_id, body } => self.transport.archive_todo(&todo_id, &body).await.map(drop),
        }
    }

    async fn refetch(&self, board_id: &str, board_list: bool) {
        match self.load_board(board_id).await {
            Ok(true) => {}
            Ok(false) => debug!("refetch of board {} refused, later writes pending", board_id),
            Err(error) => warn!("refetch of board {} failed: {}", board_id, error),
        }
        if board_list {
            if let Err(error) = self.load_boards().await {
                warn!("refetch of board list failed: {}", error);
            }
        }
    }
}

/// Debounced mutations over a shared coordinator.
///
/// Timers run as Tokio tasks, so `schedule` must be called from within a
/// runtime. Dropping it applies the configured teardown policy: discarded
/// mutations are rolled back, flushed ones are sent.
pub struct DebouncedMutations<T: BoardTransport + 'static> {
    coordinator: Arc<OptimisticMutationCoordinator<T>>,
    coalescer: DebounceCoalescer<PendingMutation>,
}

impl<T: BoardTransport + 'static> DebouncedMutations<T> {
    pub fn coordinator(&self) -> &Arc<OptimisticMutationCoordinator<T>> {
        &self.coordinator
    }

    /// Apply now, send after the quiet period
    pub fn schedule(&self, instruction: MutationInstruction) {
        self.coalescer.schedule(self.coordinator.begin(instruction));
    }

    /// Send every pending burst now. Returns how many were sent.
    pub fn flush(&self) -> usize {
        self.coalescer.flush()
    }

    /// Roll back every pending burst without sending. Returns how many.
    pub fn cancel_all(&self) -> usize {
        self.coalescer.cancel_all()
    }

    pub fn pending_len(&self) -> usize {
        self.coalescer.pending_len()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.coalescer.is_pending(key)
    }
}

impl<T: BoardTransport + 'static> InstructionSink for DebouncedMutations<T> {
    fn submit(&mut self, instruction: MutationInstruction) {
        self.schedule(instruction);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::commands::{ArchiveTodoRequest, MoveTodoRequest, ReorderColumnsRequest, ReorderTodosRequest};
    use crate::config::TeardownPolicy;
    use crate::models::{Board, Column, Todo};
    use crate::optimistic::SyncState;
    use crate::store::shared_cache;

    /// Records requests; fails every mutation while `failure` is set
    #[derive(Default)]
    struct FakeTransport {
        requests: Mutex<Vec<MutationRequest>>,
        failure: Mutex<Option<TransportError>>,
        server_board: Mutex<Option<Board>>,
        fetches: Mutex<usize>,
    }

    impl FakeTransport {
        fn failing(error: TransportError) -> Self {
            let transport = Self::default();
            *transport.failure.lock().unwrap() = Some(error);
            transport
        }

        fn record(&self, request: MutationRequest) -> TransportResult<()> {
            self.requests.lock().unwrap().push(request);
            match self.failure.lock().unwrap().clone() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        }

        fn requests(&self) -> Vec<MutationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BoardTransport for FakeTransport {
        async fn move_todo(&self, todo_id: &str, request: &MoveTodoRequest) -> TransportResult<Todo> {
            self.record(MutationRequest::MoveTodo {
                todo_id: todo_id.to_string(),
                body: request.clone(),
            })?;
            Ok(Todo::new(todo_id, "Todo", request.column_id.clone(), request.position.unwrap_or(0)))
        }

        async fn reorder_todos(&self, request: &ReorderTodosRequest) -> TransportResult<Vec<Todo>> {
            self.record(MutationRequest::ReorderTodos(request.clone()))?;
            Ok(Vec::new())
        }

        async fn reorder_columns(&self, request: &ReorderColumnsRequest) -> TransportResult<Vec<Column>> {
            self.record(MutationRequest::ReorderColumns(request.clone()))?;
            Ok(Vec::new())
        }

        async fn archive_todo(&self, todo_id: &str, request: &ArchiveTodoRequest) -> TransportResult<Todo> {
            self.record(MutationRequest::ArchiveTodo {
                todo_id: todo_id.to_string(),
                body: *request,
            })?;
            Ok(Todo::new(todo_id, "Todo", "col", 0))
        }

        async fn fetch_board(&self, board_id: &str) -> TransportResult<Board> {
            *self.fetches.lock().unwrap() += 1;
            self.server_board
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| TransportError::NotFound(board_id.to_string()))
        }

        async fn list_boards(&self) -> TransportResult<Vec<BoardSummary>> {
            Ok(self.server_board.lock().unwrap().iter().map(Board::summary).collect())
        }
    }

    fn board() -> Board {
        Board::new("board-1", "Board").with_columns(vec![
            Column::new("col-todo", "Todo", "board-1", 0).with_todos(vec![
                Todo::new("A", "A", "col-todo", 0),
                Todo::new("B", "B", "col-todo", 1),
            ]),
            Column::new("col-progress", "In Progress", "board-1", 1),
        ])
    }

    fn no_refetch() -> SyncConfig {
        SyncConfig {
            refetch_on_settle: false,
            ..SyncConfig::default()
        }
    }

    fn coordinator(transport: FakeTransport, config: SyncConfig) -> OptimisticMutationCoordinator<FakeTransport> {
        let cache = shared_cache();
        lock_cache(&cache).set(board());
        OptimisticMutationCoordinator::new(transport, cache, config)
    }

    fn cached(coordinator: &OptimisticMutationCoordinator<FakeTransport>) -> Board {
        lock_cache(coordinator.cache()).snapshot("board-1").unwrap()
    }

    #[tokio::test]
    async fn test_move_applies_and_commits() {
        let coordinator = coordinator(FakeTransport::default(), no_refetch());

        let outcome = coordinator.move_todo("board-1", "A", "col-progress", 0).await;
        assert!(outcome.is_committed());

        let board = cached(&coordinator);
        assert_eq!(board.column("col-todo").unwrap().todo_ids(), vec!["B"]);
        assert_eq!(board.column("col-progress").unwrap().todo_ids(), vec!["A"]);
        assert!(lock_cache(coordinator.cache()).is_stale("board-1"));

        assert_eq!(
            coordinator.transport().requests(),
            vec![MutationRequest::MoveTodo {
                todo_id: "A".to_string(),
                body: MoveTodoRequest { column_id: "col-progress".to_string(), position: Some(0) },
            }]
        );
    }

    #[tokio::test]
    async fn test_failure_rolls_back_exactly() {
        let transport = FakeTransport::failing(TransportError::rejected(500, "boom"));
        let coordinator = coordinator(transport, no_refetch());

        let outcome = coordinator.move_todo("board-1", "A", "col-progress", 0).await;
        assert_eq!(
            outcome,
            MutationOutcome::RolledBack { error: TransportError::rejected(500, "boom"), restored: true }
        );
        assert_eq!(cached(&coordinator), board());
        assert!(lock_cache(coordinator.cache()).is_stale("board-1"));
    }

    #[tokio::test]
    async fn test_archive_invalidates_board_list() {
        let coordinator = coordinator(FakeTransport::default(), no_refetch());

        let outcome = coordinator.archive_todo("board-1", "B", true).await;
        assert!(outcome.is_committed());
        assert!(cached(&coordinator).find_todo("B").is_none());
        assert!(lock_cache(coordinator.cache()).is_board_list_stale());
    }

    #[tokio::test]
    async fn test_cache_miss_still_sends() {
        let coordinator = OptimisticMutationCoordinator::new(FakeTransport::default(), shared_cache(), no_refetch());

        let outcome = coordinator.reorder_columns("board-9", vec!["b".to_string(), "a".to_string()]).await;
        assert!(outcome.is_committed());
        assert_eq!(coordinator.transport().requests().len(), 1);
        assert!(lock_cache(coordinator.cache()).get("board-9").is_none());
    }

    #[tokio::test]
    async fn test_refetch_installs_server_board() {
        let transport = FakeTransport::default();
        let mut server = board();
        server.name = "From Server".to_string();
        *transport.server_board.lock().unwrap() = Some(server.clone());

        let coordinator = coordinator(transport, SyncConfig::default());
        let outcome = coordinator.reorder_todos("board-1", "col-todo", vec!["B".to_string(), "A".to_string()]).await;

        assert!(outcome.is_committed());
        assert_eq!(*coordinator.transport().fetches.lock().unwrap(), 1);
        assert_eq!(cached(&coordinator), server);
        assert!(!lock_cache(coordinator.cache()).is_stale("board-1"));
    }

    #[tokio::test]
    async fn test_refetch_failure_keeps_optimistic_state() {
        let coordinator = coordinator(FakeTransport::default(), SyncConfig::default());

        let outcome = coordinator.reorder_todos("board-1", "col-todo", vec!["B".to_string(), "A".to_string()]).await;
        assert!(outcome.is_committed());
        assert_eq!(cached(&coordinator).column("col-todo").unwrap().todo_ids(), vec!["B", "A"]);
        assert!(lock_cache(coordinator.cache()).is_stale("board-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_sends_last_order_once() {
        let coordinator = Arc::new(coordinator(FakeTransport::default(), no_refetch()));
        let debounced = coordinator.debounced();

        for order in [["B", "A"], ["A", "B"], ["B", "A"]] {
            debounced.schedule(MutationInstruction::ReorderTodos {
                board_id: "board-1".to_string(),
                column_id: "col-todo".to_string(),
                todo_ids: order.iter().map(|s| s.to_string()).collect(),
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(coordinator.transport().requests().is_empty());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(
            coordinator.transport().requests(),
            vec![MutationRequest::ReorderTodos(ReorderTodosRequest::from_ordered_ids(
                "col-todo",
                &["B".to_string(), "A".to_string()],
            ))]
        );
        assert_eq!(cached(&coordinator).column("col-todo").unwrap().todo_ids(), vec!["B", "A"]);
    }

    fn reorder(order: [&str; 2]) -> MutationInstruction {
        MutationInstruction::ReorderTodos {
            board_id: "board-1".to_string(),
            column_id: "col-todo".to_string(),
            todo_ids: order.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_applies_before_sending() {
        let coordinator = Arc::new(coordinator(FakeTransport::default(), no_refetch()));
        let debounced = coordinator.debounced();

        debounced.schedule(reorder(["B", "A"]));
        assert_eq!(cached(&coordinator).column("col-todo").unwrap().todo_ids(), vec!["B", "A"]);
        assert!(coordinator.transport().requests().is_empty());
        assert!(lock_cache(coordinator.cache()).has_pending_writes("board-1"));

        assert_eq!(debounced.flush(), 1);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(coordinator.transport().requests().len(), 1);
        assert!(!lock_cache(coordinator.cache()).has_pending_writes("board-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_burst_restores_state_before_burst() {
        let transport = FakeTransport::failing(TransportError::Network("offline".to_string()));
        let coordinator = Arc::new(coordinator(transport, no_refetch()));
        let debounced = coordinator.debounced();

        debounced.schedule(reorder(["B", "A"]));
        debounced.schedule(reorder(["A", "B"]));
        debounced.schedule(reorder(["B", "A"]));
        assert_eq!(debounced.pending_len(), 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(coordinator.transport().requests().len(), 1);
        assert_eq!(cached(&coordinator), board());
        assert!(!lock_cache(coordinator.cache()).has_pending_writes("board-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_burst_rolls_back() {
        let coordinator = Arc::new(coordinator(FakeTransport::default(), no_refetch()));
        let debounced = coordinator.debounced();

        debounced.schedule(MutationInstruction::Move {
            id: "A".to_string(),
            board_id: "board-1".to_string(),
            column_id: "col-progress".to_string(),
            position: 0,
        });
        assert_eq!(cached(&coordinator).column("col-progress").unwrap().todo_ids(), vec!["A"]);

        assert_eq!(debounced.cancel_all(), 1);
        assert_eq!(cached(&coordinator), board());

        debounced.schedule(reorder(["B", "A"]));
        drop(debounced);
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(cached(&coordinator), board());
        assert!(coordinator.transport().requests().is_empty());
        assert!(!lock_cache(coordinator.cache()).has_pending_writes("board-1"));
    }

    #[test]
    fn test_flush_teardown_without_runtime_rolls_back() {
        let config = SyncConfig {
            teardown: TeardownPolicy::Flush,
            ..no_refetch()
        };
        let coordinator = Arc::new(coordinator(FakeTransport::default(), config));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let debounced = runtime.block_on(async {
            let debounced = coordinator.debounced();
            debounced.schedule(reorder(["B", "A"]));
            debounced
        });
        drop(runtime);

        drop(debounced);
        assert_eq!(cached(&coordinator), board());
        assert!(coordinator.transport().requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_status_follows_requests() {
        let coordinator = coordinator(FakeTransport::default(), no_refetch());
        assert_eq!(coordinator.sync_status().state, SyncState::Idle);

        let outcome = coordinator.reorder_todos("board-1", "col-todo", vec!["B".to_string(), "A".to_string()]).await;
        assert!(outcome.is_committed());
        assert_eq!(coordinator.sync_status(), SyncStatus { state: SyncState::Synced, pending: 0 });

        tokio::time::sleep(Duration::from_millis(2001)).await;
        assert_eq!(coordinator.sync_status().state, SyncState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_status_reports_failure() {
        let transport = FakeTransport::failing(TransportError::rejected(500, "boom"));
        let coordinator = coordinator(transport, no_refetch());
        let mut status = coordinator.subscribe_sync_status();

        let outcome = coordinator.move_todo("board-1", "A", "col-progress", 0).await;
        assert!(!outcome.is_committed());
        assert!(status.has_changed().unwrap());
        assert_eq!(*status.borrow_and_update(), SyncStatus { state: SyncState::Error, pending: 0 });
    }
}
