//! Kanban Board Server
//!
//! In-memory reference implementation of the board API.
//!
//! Layered architecture:
//! - domain: Error taxonomy
//! - repository: Board storage and position management
//! - service: `BoardTransport` implementation over the repository

use tracing_subscriber::EnvFilter;

mod domain;
mod repository;
mod service;

pub use domain::{DomainError, DomainResult};
pub use repository::BoardRepository;
pub use service::BoardService;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter`. Returns `false` if a subscriber was already set.
pub fn init_logging(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok()
}
