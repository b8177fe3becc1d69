//! Domain Entities

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, PostId};

use crate::domain::value_objects::{PostBody, PostTitle};

/// A journal entry. `user_id` is the owning account and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub user_id: AccountId,
    pub title: PostTitle,
    pub body: PostBody,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(owner: AccountId, title: PostTitle, body: PostBody, now: DateTime<Utc>) -> Self {
        Self {
            id: PostId::new(),
            user_id: owner,
            title,
            body,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn edit(&mut self, title: PostTitle, body: PostBody, now: DateTime<Utc>) {
        self.title = title;
        self.body = body;
        self.updated_at = now;
    }

    pub fn is_owned_by(&self, account: AccountId) -> bool {
        self.user_id == account
    }
}
