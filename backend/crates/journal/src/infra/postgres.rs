//! PostgreSQL Repository Implementation
//!
//! Queries carry no owner filter. The `posts` row-security policy, keyed on
//! the session's `app.current_user_id`, is what hides other accounts' rows.

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, PostId};
use platform::scope::PgScopedSession;
use uuid::Uuid;

use crate::domain::entities::Post;
use crate::domain::repository::PostRepository;
use crate::domain::value_objects::{PostBody, PostTitle};
use crate::error::JournalResult;

impl PostRepository for PgScopedSession {
    async fn insert(&self, post: &Post) -> JournalResult<()> {
        let mut conn = self.acquire().await?;
        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, title, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(post.id.into_uuid())
        .bind(post.user_id.into_uuid())
        .bind(post.title.as_str())
        .bind(post.body.as_str())
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    async fn list(&self) -> JournalResult<Vec<Post>> {
        let mut conn = self.acquire().await?;
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, user_id, title, body, created_at, updated_at
            FROM posts
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(PostRow::into_post).collect())
    }

    async fn find(&self, id: PostId) -> JournalResult<Option<Post>> {
        let mut conn = self.acquire().await?;
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, user_id, title, body, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id.into_uuid())
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(PostRow::into_post))
    }

    async fn update(&self, post: &Post) -> JournalResult<bool> {
        let mut conn = self.acquire().await?;
        let updated = sqlx::query(
            r#"
            UPDATE posts
            SET title = $2, body = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(post.id.into_uuid())
        .bind(post.title.as_str())
        .bind(post.body.as_str())
        .bind(post.updated_at)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }

    async fn delete(&self, id: PostId) -> JournalResult<bool> {
        let mut conn = self.acquire().await?;
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id.into_uuid())
            .execute(&mut *conn)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self) -> Post {
        Post {
            id: PostId::from_uuid(self.id),
            user_id: AccountId::from_uuid(self.user_id),
            title: PostTitle::from_db(self.title),
            body: PostBody::from_db(self.body),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
