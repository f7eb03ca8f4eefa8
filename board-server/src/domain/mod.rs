//! Domain Layer
//!
//! Error taxonomy for board operations and its mapping onto the transport.

mod error;

pub use error::{DomainError, DomainResult};
