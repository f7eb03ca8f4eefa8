//! Board Service
//!
//! Exposes the repository through the board API seam. Domain errors are
//! converted to transport errors here and nowhere else.

use async_trait::async_trait;
use kanban_board::commands::{ArchiveTodoRequest, MoveTodoRequest, ReorderColumnsRequest, ReorderTodosRequest};
use kanban_board::{Board, BoardSummary, BoardTransport, Column, Todo, TransportResult};

use crate::domain::DomainResult;
use crate::repository::BoardRepository;

#[derive(Debug, Clone, Default)]
pub struct BoardService {
    repo: BoardRepository,
}

impl BoardService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository(repo: BoardRepository) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &BoardRepository {
        &self.repo
    }

    // ========================
    // Seeding
    // ========================

    pub async fn create_board(&self, name: &str) -> DomainResult<Board> {
        self.repo.create_board(name).await
    }

    pub async fn create_column(&self, board_id: &str, name: &str) -> DomainResult<Column> {
        self.repo.create_column(board_id, name).await
    }

    pub async fn create_todo(&self, column_id: &str, title: &str) -> DomainResult<Todo> {
        self.repo.create_todo(column_id, title).await
    }
}

#[async_trait]
impl BoardTransport for BoardService {
    async fn move_todo(&self, todo_id: &str, request: &MoveTodoRequest) -> TransportResult<Todo> {
        Ok(self.repo.move_todo(todo_id, &request.column_id, request.position).await?)
    }

    async fn reorder_todos(&self, request: &ReorderTodosRequest) -> TransportResult<Vec<Todo>> {
        Ok(self.repo.reorder_todos(&request.column_id, &request.todos).await?)
    }

    async fn reorder_columns(&self, request: &ReorderColumnsRequest) -> TransportResult<Vec<Column>> {
        Ok(self.repo.reorder_columns(&request.board_id, &request.columns).await?)
    }

    async fn archive_todo(&self, todo_id: &str, request: &ArchiveTodoRequest) -> TransportResult<Todo> {
        Ok(self.repo.archive_todo(todo_id, request.archived).await?)
    }

    async fn fetch_board(&self, board_id: &str) -> TransportResult<Board> {
        Ok(self.repo.find_board(board_id).await?)
    }

    async fn list_boards(&self) -> TransportResult<Vec<BoardSummary>> {
        Ok(self.repo.list_boards().await?)
    }
}
