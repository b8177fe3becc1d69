//! Show Post Use Case

use kernel::id::PostId;
use platform::scope::ScopedHandle;

use crate::domain::entities::Post;
use crate::domain::repository::PostRepository;
use crate::error::{JournalError, JournalResult};

pub struct ShowPostUseCase<H>
where
    H: PostRepository + ScopedHandle,
{
    scope: H,
}

impl<H> ShowPostUseCase<H>
where
    H: PostRepository + ScopedHandle,
{
    pub fn new(scope: H) -> Self {
        Self { scope }
    }

    pub async fn execute(&self, id: PostId) -> JournalResult<Post> {
        self.scope.find(id).await?.ok_or(JournalError::PostNotFound)
    }
}
