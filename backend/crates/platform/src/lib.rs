//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations used by the bounded contexts:
//! - Environment configuration helpers
//! - Cryptographic utilities (CSPRNG tokens, SHA-256)
//! - Password hashing (Argon2id, NIST SP 800-63B policy)
//! - Cookie and bearer credential handling
//! - Fixed-window quotas
//! - Outbound email with a background dispatch queue
//! - Row-scoped database sessions for row-level security

pub mod config;
pub mod cookie;
pub mod crypto;
pub mod mail;
pub mod password;
pub mod quota;
pub mod scope;
