//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::PostInput;
use crate::domain::entities::Post;

/// Create and update share one body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl From<PostRequest> for PostInput {
    fn from(req: PostRequest) -> Self {
        PostInput {
            title: req.title,
            body: req.body,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.into_uuid(),
            user_id: post.user_id.into_uuid(),
            title: post.title.as_str().to_string(),
            body: post.body.as_str().to_string(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}
