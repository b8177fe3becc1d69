//! Infrastructure Layer
//!
//! `PostRepository` for the Postgres scoped session, plus an in-memory
//! scope binder that applies the same row policy in process.

pub mod memory;
pub mod postgres;

pub use memory::{MemoryPostStore, MemoryScopedPosts};
