//! In-memory posts behind an emulated row policy.
//!
//! [`MemoryPostStore`] is a [`ScopeBinder`]. Each bound handle sees only
//! rows whose `user_id` equals its owner, rejects writes for other owners,
//! and stages its changes until commit, so a rolled-back request leaves
//! nothing behind.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use kernel::id::{AccountId, PostId};
use platform::scope::{ScopeBinder, ScopeError, ScopedHandle};
use uuid::Uuid;

use crate::domain::entities::Post;
use crate::domain::repository::PostRepository;
use crate::error::{JournalError, JournalResult};

type Rows = HashMap<PostId, Post>;
/// `None` marks a staged delete.
type Staged = HashMap<PostId, Option<Post>>;

#[derive(Clone, Default)]
pub struct MemoryPostStore {
    rows: Arc<Mutex<Rows>>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every committed row, ignoring the policy.
    pub fn all_rows(&self) -> Vec<Post> {
        self.rows
            .lock()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl ScopeBinder for MemoryPostStore {
    type Handle = MemoryScopedPosts;

    async fn bind(&self, owner: Uuid) -> Result<MemoryScopedPosts, ScopeError> {
        Ok(MemoryScopedPosts {
            owner: AccountId::from_uuid(owner),
            store: self.clone(),
            staged: Arc::new(Mutex::new(Some(Staged::new()))),
        })
    }
}

/// One request's view of a [`MemoryPostStore`].
#[derive(Clone)]
pub struct MemoryScopedPosts {
    owner: AccountId,
    store: MemoryPostStore,
    staged: Arc<Mutex<Option<Staged>>>,
}

impl MemoryScopedPosts {
    /// Runs `f` over the committed rows and this handle's staged changes.
    fn with_view<T>(&self, f: impl FnOnce(&Rows, &mut Staged) -> T) -> JournalResult<T> {
        let mut staged = self.staged.lock().map_err(|_| poisoned())?;
        let staged = staged.as_mut().ok_or(ScopeError::Closed)?;
        let rows = self.store.rows.lock().map_err(|_| poisoned())?;
        Ok(f(&rows, staged))
    }

    fn visible(&self, rows: &Rows, staged: &Staged, id: PostId) -> Option<Post> {
        let post = match staged.get(&id) {
            Some(change) => change.clone(),
            None => rows.get(&id).cloned(),
        };
        post.filter(|p| p.user_id == self.owner)
    }

    fn take_staged(&self) -> Result<Staged, ScopeError> {
        self.staged
            .lock()
            .map_err(|_| ScopeError::Closed)?
            .take()
            .ok_or(ScopeError::Closed)
    }
}

fn poisoned() -> JournalError {
    JournalError::Internal("post store lock poisoned".to_string())
}

impl PostRepository for MemoryScopedPosts {
    async fn insert(&self, post: &Post) -> JournalResult<()> {
        if post.user_id != self.owner {
            return Err(JournalError::Forbidden);
        }
        self.with_view(|_, staged| {
            staged.insert(post.id, Some(post.clone()));
        })
    }

    async fn list(&self) -> JournalResult<Vec<Post>> {
        self.with_view(|rows, staged| {
            let mut posts: Vec<Post> = rows
                .keys()
                .chain(staged.keys())
                .collect::<HashSet<_>>()
                .into_iter()
                .filter_map(|id| self.visible(rows, staged, *id))
                .collect();
            posts.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.into_uuid().cmp(&a.id.into_uuid()))
            });
            posts
        })
    }

    async fn find(&self, id: PostId) -> JournalResult<Option<Post>> {
        self.with_view(|rows, staged| self.visible(rows, staged, id))
    }

    async fn update(&self, post: &Post) -> JournalResult<bool> {
        if post.user_id != self.owner {
            return Err(JournalError::Forbidden);
        }
        self.with_view(|rows, staged| {
            if self.visible(rows, staged, post.id).is_none() {
                return false;
            }
            staged.insert(post.id, Some(post.clone()));
            true
        })
    }

    async fn delete(&self, id: PostId) -> JournalResult<bool> {
        self.with_view(|rows, staged| {
            if self.visible(rows, staged, id).is_none() {
                return false;
            }
            staged.insert(id, None);
            true
        })
    }
}

impl ScopedHandle for MemoryScopedPosts {
    fn owner(&self) -> Uuid {
        self.owner.into_uuid()
    }

    async fn commit(&self) -> Result<(), ScopeError> {
        let staged = self.take_staged()?;
        let mut rows = self.store.rows.lock().map_err(|_| ScopeError::Closed)?;
        for (id, change) in staged {
            match change {
                Some(post) => {
                    rows.insert(id, post);
                }
                None => {
                    rows.remove(&id);
                }
            }
        }
        Ok(())
    }

    async fn rollback(&self) -> Result<(), ScopeError> {
        self.take_staged().map(drop)
    }
}
