//! Value Objects
//!
//! Validated, immutable building blocks of the [`Account`](super::entity::account::Account).

pub mod email;
pub mod password;
pub mod secret_token;
pub mod username;

pub use email::Email;
pub use kernel::id::AccountId;
pub use password::{RawPassword, UserPassword};
pub use secret_token::{RecoveryKey, RecoveryKeyHash, VerificationToken};
pub use username::Username;
