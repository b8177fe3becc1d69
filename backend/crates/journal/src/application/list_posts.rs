//! List Posts Use Case

use platform::scope::ScopedHandle;

use crate::domain::entities::Post;
use crate::domain::repository::PostRepository;
use crate::error::JournalResult;

pub struct ListPostsUseCase<H>
where
    H: PostRepository + ScopedHandle,
{
    scope: H,
}

impl<H> ListPostsUseCase<H>
where
    H: PostRepository + ScopedHandle,
{
    pub fn new(scope: H) -> Self {
        Self { scope }
    }

    pub async fn execute(&self) -> JournalResult<Vec<Post>> {
        self.scope.list().await
    }
}
