//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Account entity, verification state machine, repository trait
//! - `application/` - Use cases, token issuing, verification email
//! - `infra/` - PostgreSQL and in-memory repositories
//! - `presentation/` - HTTP handlers, DTOs, router, auth and scope layers
//!
//! ## Features
//! - Registration with email verification (15 minute links, 3 resends)
//! - Login by username or email, HS256 session tokens via bearer or cookie
//! - Password reset with a one-time-shown recovery key
//! - Per-request row-scoped database sessions for downstream crates
//!
//! ## Security Model
//! - Passwords hashed with Argon2id plus optional pepper
//! - Recovery keys stored only as SHA-256 digests
//! - Unverified accounts cannot log in and are indistinguishable from a
//!   wrong password

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::{InMemoryAccountRepository, PgAccountRepository};
pub use presentation::handlers::AuthAppState;
pub use presentation::router::{auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::account::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod store {
    pub use crate::infra::memory::InMemoryAccountRepository as MemoryStore;
    pub use crate::infra::postgres::PgAccountRepository as AccountStore;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
    pub use crate::presentation::scope::*;
}
