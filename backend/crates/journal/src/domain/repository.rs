//! Repository Traits
//!
//! Post storage as seen through one scoped session. Implementations never
//! filter by owner themselves: the scope decides which rows exist.

use kernel::id::PostId;

use crate::domain::entities::Post;
use crate::error::JournalResult;

#[trait_variant::make(PostRepository: Send)]
pub trait LocalPostRepository {
    /// Writing a row for another owner fails with `JournalError::Forbidden`.
    async fn insert(&self, post: &Post) -> JournalResult<()>;

    /// Visible posts, newest first.
    async fn list(&self) -> JournalResult<Vec<Post>>;

    async fn find(&self, id: PostId) -> JournalResult<Option<Post>>;

    /// `false` if the post is not visible.
    async fn update(&self, post: &Post) -> JournalResult<bool>;

    /// `false` if the post is not visible.
    async fn delete(&self, id: PostId) -> JournalResult<bool>;
}
