//! Application Layer
//!
//! Use cases and application services.

pub mod authenticate;
pub mod change_email;
pub mod change_username;
pub mod config;
pub mod notification;
pub mod register;
pub mod resend_verification;
pub mod reset_password;
pub mod sign_in;
pub mod token_issuer;
pub mod verify_email;

// Re-exports
pub use authenticate::AuthenticateUseCase;
pub use change_email::ChangeEmailUseCase;
pub use change_username::ChangeUsernameUseCase;
pub use config::AuthConfig;
pub use notification::VerificationMailer;
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use resend_verification::{ResendVerificationOutput, ResendVerificationUseCase};
pub use reset_password::{ResetPasswordInput, ResetPasswordUseCase};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use token_issuer::{IssuedSession, SessionTokenIssuer, TokenError};
pub use verify_email::VerifyEmailUseCase;
