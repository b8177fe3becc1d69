//! Journal Backend Module
//!
//! Private journal posts. Each request runs inside one row-scoped database
//! session opened by the auth crate's scope layer; the `posts` row policy
//! keeps every account to its own rows.
//!
//! Clean Architecture structure:
//! - `domain/` - Post entity, validation, repository trait
//! - `application/` - Use cases
//! - `infra/` - Scoped Postgres session and in-memory implementations
//! - `presentation/` - HTTP handlers, DTOs, router

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use error::{JournalError, JournalResult};
pub use infra::MemoryPostStore;
pub use presentation::router::posts_router;

#[cfg(test)]
mod tests;
