//! Shared kernel for the journal backend.
//!
//! Holds the vocabulary every bounded context agrees on:
//! - the unified [`error::app_error::AppError`] and its [`error::kind::ErrorKind`]
//! - typed identifiers ([`id::AccountId`], [`id::PostId`])
//!
//! Anything that only one context cares about belongs in that context's crate.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
