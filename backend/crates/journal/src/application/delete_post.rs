//! Delete Post Use Case

use kernel::id::PostId;
use platform::scope::ScopedHandle;

use crate::application::load_owned;
use crate::domain::repository::PostRepository;
use crate::error::{JournalError, JournalResult};

pub struct DeletePostUseCase<H>
where
    H: PostRepository + ScopedHandle,
{
    scope: H,
}

impl<H> DeletePostUseCase<H>
where
    H: PostRepository + ScopedHandle,
{
    pub fn new(scope: H) -> Self {
        Self { scope }
    }

    pub async fn execute(&self, id: PostId) -> JournalResult<()> {
        load_owned(&self.scope, id).await?;

        if !self.scope.delete(id).await? {
            return Err(JournalError::PostNotFound);
        }

        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }
}
