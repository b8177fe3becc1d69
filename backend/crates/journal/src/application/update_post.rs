//! Update Post Use Case

use chrono::{DateTime, Utc};
use kernel::id::PostId;
use platform::scope::ScopedHandle;

use crate::application::create_post::PostInput;
use crate::application::load_owned;
use crate::domain::entities::Post;
use crate::domain::repository::PostRepository;
use crate::error::{JournalError, JournalResult};

pub struct UpdatePostUseCase<H>
where
    H: PostRepository + ScopedHandle,
{
    scope: H,
}

impl<H> UpdatePostUseCase<H>
where
    H: PostRepository + ScopedHandle,
{
    pub fn new(scope: H) -> Self {
        Self { scope }
    }

    pub async fn execute(&self, id: PostId, input: PostInput) -> JournalResult<Post> {
        self.execute_at(id, input, Utc::now()).await
    }

    pub async fn execute_at(
        &self,
        id: PostId,
        input: PostInput,
        now: DateTime<Utc>,
    ) -> JournalResult<Post> {
        let (title, body) = input.validate()?;
        let mut post = load_owned(&self.scope, id).await?;

        post.edit(title, body, now);
        if !self.scope.update(&post).await? {
            return Err(JournalError::PostNotFound);
        }

        tracing::info!(post_id = %post.id, "Post updated");
        Ok(post)
    }
}
