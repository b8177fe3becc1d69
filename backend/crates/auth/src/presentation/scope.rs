//! Access scope layer.
//!
//! Opens one row-scoped session per authenticated request, hands it to the
//! handler as [`AccessScope`], and finishes it from the response status:
//! commit on success or redirect, rollback otherwise.

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::Request;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::scope::{ScopeBinder, ScopedHandle};

use crate::error::{AuthError, UnauthenticatedReason};
use crate::presentation::middleware::CurrentAccount;

/// The request's scoped session.
#[derive(Debug, Clone)]
pub struct AccessScope<H>(pub H);

/// Must run inside [`require_auth`](crate::presentation::middleware::require_auth).
pub async fn bind_access_scope<B>(binder: B, mut req: Request<Body>, next: Next) -> Response
where
    B: ScopeBinder,
{
    let Some(owner) = req.extensions().get::<CurrentAccount>().map(|c| c.id) else {
        return AuthError::Unauthenticated(UnauthenticatedReason::MissingIdentity).into_response();
    };

    let handle = match binder.bind(owner.into_uuid()).await {
        Ok(handle) => handle,
        Err(e) => return AuthError::from(e).into_response(),
    };
    req.extensions_mut().insert(AccessScope(handle.clone()));

    let response = next.run(req).await;

    let status = response.status();
    if status.is_success() || status.is_redirection() {
        if let Err(e) = handle.commit().await {
            tracing::error!(account_id = %owner, error = %e, "Scoped session commit failed");
            return AuthError::from(e).into_response();
        }
    } else if let Err(e) = handle.rollback().await {
        tracing::warn!(account_id = %owner, error = %e, "Scoped session rollback failed");
    }

    response
}

impl<H, S> FromRequestParts<S> for AccessScope<H>
where
    H: Clone + Send + Sync + 'static,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessScope<H>>()
            .cloned()
            .ok_or_else(|| AuthError::Internal("access scope layer is not installed".to_string()))
    }
}
