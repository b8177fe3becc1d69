//! Auth Router

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::{self, Next},
    routing::{get, post, put},
};

use crate::domain::repository::AccountRepository;
use crate::infra::postgres::PgAccountRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_auth;

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(state: AuthAppState<PgAccountRepository>) -> Router {
    auth_router_generic(state)
}

/// Create a generic Auth router for any repository implementation
pub fn auth_router_generic<R>(state: AuthAppState<R>) -> Router
where
    R: AccountRepository + Clone + Send + Sync + 'static,
{
    let guard = state.middleware_state();

    let protected = Router::new()
        .route("/user", get(handlers::current_user))
        .route("/account/change-username", put(handlers::change_username::<R>))
        .route("/account/change-email", put(handlers::change_email::<R>))
        .route_layer(middleware::from_fn(move |req: Request<Body>, next: Next| {
            require_auth(guard.clone(), req, next)
        }));

    Router::new()
        .route("/register", post(handlers::register::<R>))
        .route("/login", post(handlers::login::<R>))
        .route("/logout", post(handlers::logout::<R>))
        .route("/verify", get(handlers::verify_email::<R>))
        .route("/resend-verification", post(handlers::resend_verification::<R>))
        .route("/reset-password", post(handlers::reset_password::<R>))
        .merge(protected)
        .with_state(state)
}
