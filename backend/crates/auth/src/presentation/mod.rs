//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod scope;

pub use handlers::AuthAppState;
pub use middleware::{AuthMiddlewareState, CurrentAccount, require_auth};
pub use router::{auth_router, auth_router_generic};
pub use scope::{AccessScope, bind_access_scope};
