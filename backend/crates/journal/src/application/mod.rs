//! Application Layer
//!
//! Post use cases. Each runs against the request's scoped handle and
//! nothing else.

pub mod create_post;
pub mod delete_post;
pub mod list_posts;
pub mod show_post;
pub mod update_post;

pub use create_post::{CreatePostUseCase, PostInput};
pub use delete_post::DeletePostUseCase;
pub use list_posts::ListPostsUseCase;
pub use show_post::ShowPostUseCase;
pub use update_post::UpdatePostUseCase;

use kernel::id::{AccountId, PostId};
use platform::scope::ScopedHandle;

use crate::domain::entities::Post;
use crate::domain::repository::PostRepository;
use crate::error::{JournalError, JournalResult};

fn scope_owner<H: ScopedHandle>(scope: &H) -> AccountId {
    AccountId::from_uuid(scope.owner())
}

/// Loads a post the scope owner may modify: invisible is `PostNotFound`,
/// visible but foreign is `Forbidden`.
async fn load_owned<H>(scope: &H, id: PostId) -> JournalResult<Post>
where
    H: PostRepository + ScopedHandle,
{
    let post = scope.find(id).await?.ok_or(JournalError::PostNotFound)?;
    if !post.is_owned_by(scope_owner(scope)) {
        return Err(JournalError::Forbidden);
    }
    Ok(post)
}
