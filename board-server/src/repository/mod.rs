//! Repository Layer
//!
//! In-memory board storage with position management.

mod board_repo;
mod positioning;


pub use board_repo::BoardRepository;
