//! Create Post Use Case

use chrono::{DateTime, Utc};
use platform::scope::ScopedHandle;

use crate::application::scope_owner;
use crate::domain::entities::Post;
use crate::domain::repository::PostRepository;
use crate::domain::value_objects::{PostBody, PostTitle};
use crate::error::JournalResult;

/// Title and body as submitted, shared by create and update.
pub struct PostInput {
    pub title: String,
    pub body: String,
}

impl PostInput {
    pub(crate) fn validate(self) -> JournalResult<(PostTitle, PostBody)> {
        Ok((PostTitle::new(&self.title)?, PostBody::new(self.body)?))
    }
}

pub struct CreatePostUseCase<H>
where
    H: PostRepository + ScopedHandle,
{
    scope: H,
}

impl<H> CreatePostUseCase<H>
where
    H: PostRepository + ScopedHandle,
{
    pub fn new(scope: H) -> Self {
        Self { scope }
    }

    pub async fn execute(&self, input: PostInput) -> JournalResult<Post> {
        self.execute_at(input, Utc::now()).await
    }

    pub async fn execute_at(&self, input: PostInput, now: DateTime<Utc>) -> JournalResult<Post> {
        let (title, body) = input.validate()?;
        let post = Post::new(scope_owner(&self.scope), title, body, now);

        self.scope.insert(&post).await?;

        tracing::info!(post_id = %post.id, account_id = %post.user_id, "Post created");
        Ok(post)
    }
}
