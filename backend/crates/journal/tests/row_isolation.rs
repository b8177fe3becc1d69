//! Row-level security against a real PostgreSQL.
//!
//! Runs only when `JOURNAL_TEST_DATABASE_URL` points at a database whose
//! role is neither superuser nor BYPASSRLS. Otherwise every test returns
//! early.

use chrono::Utc;
use journal::JournalError;
use journal::domain::entities::Post;
use journal::domain::repository::PostRepository;
use journal::domain::value_objects::{PostBody, PostTitle};
use kernel::id::AccountId;
use platform::scope::{PgScopeBinder, ScopeBinder, ScopedHandle};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("JOURNAL_TEST_DATABASE_URL") else {
        eprintln!("JOURNAL_TEST_DATABASE_URL not set; skipping");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("connect to test database");
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    Some(pool)
}

async fn seed_account(pool: &PgPool) -> AccountId {
    let id = AccountId::new();
    let name = format!("rls_{}", Uuid::new_v4().simple());
    sqlx::query(
        r#"
        INSERT INTO accounts (
            id, username, username_canonical, email, password_hash,
            recovery_key_hash, is_verified
        ) VALUES ($1, $2, $2, $3, 'unused', 'unused', TRUE)
        "#,
    )
    .bind(id.into_uuid())
    .bind(&name)
    .bind(format!("{name}@example.com"))
    .execute(pool)
    .await
    .expect("seed account");
    id
}

fn post(owner: AccountId, title: &str) -> Post {
    Post::new(
        owner,
        PostTitle::new(title).unwrap(),
        PostBody::new("body".to_string()).unwrap(),
        Utc::now(),
    )
}

#[tokio::test]
async fn other_accounts_rows_are_invisible() {
    let Some(pool) = pool().await else { return };
    let binder = PgScopeBinder::new(pool.clone());
    let alice = seed_account(&pool).await;
    let bob = seed_account(&pool).await;

    let scope = binder.bind(alice.into_uuid()).await.unwrap();
    let note = post(alice, "alice only");
    PostRepository::insert(&scope, &note).await.unwrap();
    ScopedHandle::commit(&scope).await.unwrap();

    let scope = binder.bind(bob.into_uuid()).await.unwrap();
    assert!(PostRepository::find(&scope, note.id).await.unwrap().is_none());
    assert!(
        PostRepository::list(&scope)
            .await
            .unwrap()
            .iter()
            .all(|p| p.user_id == bob)
    );
    assert!(!PostRepository::delete(&scope, note.id).await.unwrap());
    ScopedHandle::rollback(&scope).await.unwrap();

    let scope = binder.bind(alice.into_uuid()).await.unwrap();
    let stored = PostRepository::find(&scope, note.id).await.unwrap().unwrap();
    assert_eq!(stored.user_id, alice);
    assert_eq!(stored.title, note.title);
    ScopedHandle::rollback(&scope).await.unwrap();
}

#[tokio::test]
async fn writing_a_row_for_someone_else_is_refused() {
    let Some(pool) = pool().await else { return };
    let binder = PgScopeBinder::new(pool.clone());
    let alice = seed_account(&pool).await;
    let bob = seed_account(&pool).await;

    let scope = binder.bind(bob.into_uuid()).await.unwrap();
    let err = PostRepository::insert(&scope, &post(alice, "forged"))
        .await
        .unwrap_err();
    assert!(matches!(err, JournalError::Forbidden), "{err:?}");
}

#[tokio::test]
async fn unscoped_connections_see_nothing() {
    let Some(pool) = pool().await else { return };
    let binder = PgScopeBinder::new(pool.clone());
    let alice = seed_account(&pool).await;

    let scope = binder.bind(alice.into_uuid()).await.unwrap();
    PostRepository::insert(&scope, &post(alice, "hidden"))
        .await
        .unwrap();
    ScopedHandle::commit(&scope).await.unwrap();

    // Setting was transaction-local, so pooled connections carry nothing.
    let visible: i64 = sqlx::query_scalar("SELECT count(*) FROM posts")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(visible, 0);
}

#[tokio::test]
async fn rolled_back_scope_leaves_no_rows() {
    let Some(pool) = pool().await else { return };
    let binder = PgScopeBinder::new(pool.clone());
    let alice = seed_account(&pool).await;

    let scope = binder.bind(alice.into_uuid()).await.unwrap();
    let draft = post(alice, "draft");
    PostRepository::insert(&scope, &draft).await.unwrap();
    ScopedHandle::rollback(&scope).await.unwrap();

    let scope = binder.bind(alice.into_uuid()).await.unwrap();
    assert!(PostRepository::find(&scope, draft.id).await.unwrap().is_none());
    ScopedHandle::rollback(&scope).await.unwrap();
}

#[tokio::test]
async fn one_connection_serving_both_accounts_keeps_them_apart() {
    let Some(pool) = pool().await else { return };
    let alice = seed_account(&pool).await;
    let bob = seed_account(&pool).await;

    let url = std::env::var("JOURNAL_TEST_DATABASE_URL").unwrap();
    let single = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .expect("connect single-connection pool");
    let binder = PgScopeBinder::new(single.clone());

    for round in 0..4 {
        for owner in [alice, bob] {
            let scope = binder.bind(owner.into_uuid()).await.unwrap();
            PostRepository::insert(&scope, &post(owner, &format!("round {round}")))
                .await
                .unwrap();
            let listed = PostRepository::list(&scope).await.unwrap();
            assert_eq!(listed.len(), round + 1);
            assert!(listed.iter().all(|p| p.user_id == owner));
            ScopedHandle::commit(&scope).await.unwrap();

            // Same physical connection, no scope: the previous owner is gone.
            let visible: i64 = sqlx::query_scalar("SELECT count(*) FROM posts")
                .fetch_one(&single)
                .await
                .unwrap();
            assert_eq!(visible, 0);
        }
    }
}
