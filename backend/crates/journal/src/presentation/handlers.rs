//! HTTP Handlers
//!
//! Every handler gets its database access from [`AccessScope`] alone.

use auth::middleware::AccessScope;
use axum::Json;
use axum::extract::Path;
use axum::http::StatusCode;
use kernel::id::PostId;
use platform::scope::ScopedHandle;

use crate::application::{
    CreatePostUseCase, DeletePostUseCase, ListPostsUseCase, ShowPostUseCase, UpdatePostUseCase,
};
use crate::domain::repository::PostRepository;
use crate::error::JournalResult;
use crate::presentation::dto::{PostRequest, PostResponse};

/// GET /api/posts
pub async fn list_posts<H>(
    AccessScope(scope): AccessScope<H>,
) -> JournalResult<Json<Vec<PostResponse>>>
where
    H: PostRepository + ScopedHandle,
{
    let posts = ListPostsUseCase::new(scope).execute().await?;
    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

/// POST /api/posts
pub async fn create_post<H>(
    AccessScope(scope): AccessScope<H>,
    Json(req): Json<PostRequest>,
) -> JournalResult<(StatusCode, Json<PostResponse>)>
where
    H: PostRepository + ScopedHandle,
{
    let post = CreatePostUseCase::new(scope).execute(req.into()).await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

/// GET /api/posts/{id}
pub async fn show_post<H>(
    AccessScope(scope): AccessScope<H>,
    Path(id): Path<PostId>,
) -> JournalResult<Json<PostResponse>>
where
    H: PostRepository + ScopedHandle,
{
    let post = ShowPostUseCase::new(scope).execute(id).await?;
    Ok(Json(post.into()))
}

/// PUT /api/posts/{id}
pub async fn update_post<H>(
    AccessScope(scope): AccessScope<H>,
    Path(id): Path<PostId>,
    Json(req): Json<PostRequest>,
) -> JournalResult<Json<PostResponse>>
where
    H: PostRepository + ScopedHandle,
{
    let post = UpdatePostUseCase::new(scope).execute(id, req.into()).await?;
    Ok(Json(post.into()))
}

/// DELETE /api/posts/{id}
pub async fn delete_post<H>(
    AccessScope(scope): AccessScope<H>,
    Path(id): Path<PostId>,
) -> JournalResult<StatusCode>
where
    H: PostRepository + ScopedHandle,
{
    DeletePostUseCase::new(scope).execute(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
