//! Posts Router

use auth::domain::repository::AccountRepository;
use auth::middleware::{AuthMiddlewareState, bind_access_scope, require_auth};
use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::{self, Next},
    routing::get,
};
use platform::scope::ScopeBinder;

use crate::domain::repository::PostRepository;
use crate::presentation::handlers;

/// Post routes behind authentication and a per-request scoped session.
///
/// Layer order matters: `require_auth` is outermost, so the binder always
/// sees a `CurrentAccount`.
pub fn posts_router<R, B>(auth: AuthMiddlewareState<R>, binder: B) -> Router
where
    R: AccountRepository + Clone + Send + Sync + 'static,
    B: ScopeBinder,
    B::Handle: PostRepository,
{
    Router::new()
        .route(
            "/posts",
            get(handlers::list_posts::<B::Handle>).post(handlers::create_post::<B::Handle>),
        )
        .route(
            "/posts/{id}",
            get(handlers::show_post::<B::Handle>)
                .put(handlers::update_post::<B::Handle>)
                .delete(handlers::delete_post::<B::Handle>),
        )
        .route_layer(middleware::from_fn(move |req: Request<Body>, next: Next| {
            bind_access_scope(binder.clone(), req, next)
        }))
        .route_layer(middleware::from_fn(move |req: Request<Body>, next: Next| {
            require_auth(auth.clone(), req, next)
        }))
}
