//! Router-level tests for the journal crate
//!
//! Auth and posts routers share one in-memory account repository; posts
//! live in a `MemoryPostStore` behind the emulated row policy.

#[cfg(test)]
mod support {
    use auth::application::config::AuthConfig;
    use auth::{AuthAppState, InMemoryAccountRepository, auth_router_generic};
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use platform::mail::{MailQueue, MailQueueConfig, OutboxEmailSender};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::infra::memory::MemoryPostStore;
    use crate::presentation::router::posts_router;

    pub struct Harness {
        pub app: Router,
        pub repo: InMemoryAccountRepository,
        pub posts: MemoryPostStore,
    }

    pub fn harness() -> Harness {
        let repo = InMemoryAccountRepository::new();
        let posts = MemoryPostStore::new();
        let (queue, _worker) =
            MailQueue::start(OutboxEmailSender::new(), MailQueueConfig::default());
        let state = AuthAppState::new(repo.clone(), AuthConfig::development(), queue);

        let app = Router::new()
            .merge(posts_router(state.middleware_state(), posts.clone()))
            .merge(auth_router_generic(state));

        Harness { app, repo, posts }
    }

    pub async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    impl Harness {
        /// Register, verify and log in. Returns the session token.
        pub async fn account(&self, username: &str) -> String {
            let (status, _) = call(
                &self.app,
                Method::POST,
                "/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "river-stone-42",
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);

            let token = self
                .repo
                .accounts()
                .into_iter()
                .find(|a| a.username.original() == username)
                .and_then(|a| a.verification_token().map(|t| t.as_str().to_string()))
                .unwrap();
            let (status, _) = call(
                &self.app,
                Method::GET,
                &format!("/verify?token={token}"),
                None,
                None,
            )
            .await;
            assert_eq!(status, StatusCode::OK);

            let (status, body) = call(
                &self.app,
                Method::POST,
                "/login",
                None,
                Some(json!({ "identifier": username, "password": "river-stone-42" })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            body["token"].as_str().unwrap().to_string()
        }

        pub async fn write(&self, token: &str, title: &str) -> String {
            let (status, body) = call(
                &self.app,
                Method::POST,
                "/posts",
                Some(token),
                Some(json!({ "title": title, "body": "..." })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["id"].as_str().unwrap().to_string()
        }
    }
}

#[cfg(test)]
mod isolation_tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::support::*;

    #[tokio::test]
    async fn test_alice_and_bob_only_see_their_own_posts() {
        let h = harness();

        // Wrong token before verifying does not verify anything.
        let (status, _) = call(&h.app, Method::GET, "/verify?token=nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let alice = h.account("alice").await;
        let bob = h.account("bob").await;

        h.write(&alice, "alice one").await;
        h.write(&alice, "alice two").await;
        h.write(&bob, "bob one").await;

        let (status, body) = call(&h.app, Method::GET, "/posts", Some(alice.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.iter().all(|t| t.starts_with("alice")));

        let (_, body) = call(&h.app, Method::GET, "/posts", Some(bob.as_str()), None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["title"], "bob one");

        assert_eq!(h.posts.all_rows().len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_interleaved_writers_never_see_each_other() {
        let h = harness();
        let alice = h.account("alice").await;
        let bob = h.account("bob").await;

        let mut tasks = tokio::task::JoinSet::new();
        for round in 0..8 {
            for (owner, token) in [("alice", alice.clone()), ("bob", bob.clone())] {
                let app = h.app.clone();
                tasks.spawn(async move {
                    let (status, _) = call(
                        &app,
                        Method::POST,
                        "/posts",
                        Some(token.as_str()),
                        Some(json!({ "title": format!("{owner} {round}"), "body": "" })),
                    )
                    .await;
                    assert_eq!(status, StatusCode::CREATED);

                    let (status, body) =
                        call(&app, Method::GET, "/posts", Some(token.as_str()), None).await;
                    assert_eq!(status, StatusCode::OK);
                    for post in body.as_array().unwrap() {
                        let title = post["title"].as_str().unwrap();
                        assert!(title.starts_with(owner), "{owner} saw {title}");
                    }
                });
            }
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap();
        }

        for (owner, token) in [("alice", &alice), ("bob", &bob)] {
            let (_, body) = call(&h.app, Method::GET, "/posts", Some(token.as_str()), None).await;
            let posts = body.as_array().unwrap();
            assert_eq!(posts.len(), 8, "{owner}");
            assert!(posts.iter().all(|p| p["title"].as_str().unwrap().starts_with(owner)));
        }
        assert_eq!(h.posts.all_rows().len(), 16);
    }

    #[tokio::test]
    async fn test_foreign_post_is_not_found_for_every_verb() {
        let h = harness();
        let alice = h.account("alice").await;
        let bob = h.account("bob").await;
        let id = h.write(&alice, "private").await;
        let uri = format!("/posts/{id}");

        let (status, _) = call(&h.app, Method::GET, &uri, Some(bob.as_str()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(
            &h.app,
            Method::PUT,
            &uri,
            Some(bob.as_str()),
            Some(json!({ "title": "defaced", "body": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&h.app, Method::DELETE, &uri, Some(bob.as_str()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = call(&h.app, Method::GET, &uri, Some(alice.as_str()), None).await;
        assert_eq!(body["title"], "private");
    }

    #[tokio::test]
    async fn test_posts_require_authentication() {
        let h = harness();
        let (status, _) = call(&h.app, Method::GET, "/posts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(
            &h.app,
            Method::POST,
            "/posts",
            Some("not.a.token"),
            Some(json!({ "title": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(h.posts.all_rows().is_empty());
    }
}

#[cfg(test)]
mod crud_tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::support::*;

    #[tokio::test]
    async fn test_update_then_delete() {
        let h = harness();
        let alice = h.account("alice").await;
        let id = h.write(&alice, "draft").await;
        let uri = format!("/posts/{id}");

        let (status, body) = call(
            &h.app,
            Method::PUT,
            &uri,
            Some(alice.as_str()),
            Some(json!({ "title": "  final  ", "body": "done" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "final");
        assert_eq!(body["body"], "done");

        let (status, body) = call(&h.app, Method::DELETE, &uri, Some(alice.as_str()), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, serde_json::Value::Null);

        let (status, _) = call(&h.app, Method::GET, &uri, Some(alice.as_str()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_post_is_rejected_and_nothing_is_stored() {
        let h = harness();
        let alice = h.account("alice").await;

        let (status, body) = call(
            &h.app,
            Method::POST,
            "/posts",
            Some(alice.as_str()),
            Some(json!({ "title": "   ", "body": "text" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Title is required");

        let (status, _) = call(
            &h.app,
            Method::POST,
            "/posts",
            Some(alice.as_str()),
            Some(json!({ "title": "t".repeat(201), "body": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(h.posts.all_rows().is_empty());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let h = harness();
        let alice = h.account("alice").await;
        h.write(&alice, "first").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        h.write(&alice, "second").await;

        let (_, body) = call(&h.app, Method::GET, "/posts", Some(alice.as_str()), None).await;
        assert_eq!(body[0]["title"], "second");
        assert_eq!(body[1]["title"], "first");
    }
}

#[cfg(test)]
mod ownership_tests {
    use chrono::Utc;
    use kernel::id::{AccountId, PostId};
    use platform::scope::{ScopeError, ScopedHandle};
    use uuid::Uuid;

    use crate::application::{DeletePostUseCase, PostInput, UpdatePostUseCase};
    use crate::domain::entities::Post;
    use crate::domain::repository::PostRepository;
    use crate::domain::value_objects::{PostBody, PostTitle};
    use crate::error::{JournalError, JournalResult};

    /// A handle whose visibility is wider than its owner, as a permissive
    /// row policy would be.
    #[derive(Clone)]
    struct LeakyScope {
        owner: Uuid,
        foreign: Post,
    }

    impl PostRepository for LeakyScope {
        async fn insert(&self, _post: &Post) -> JournalResult<()> {
            Ok(())
        }

        async fn list(&self) -> JournalResult<Vec<Post>> {
            Ok(vec![self.foreign.clone()])
        }

        async fn find(&self, id: PostId) -> JournalResult<Option<Post>> {
            Ok((id == self.foreign.id).then(|| self.foreign.clone()))
        }

        async fn update(&self, _post: &Post) -> JournalResult<bool> {
            panic!("update must not be reached");
        }

        async fn delete(&self, _id: PostId) -> JournalResult<bool> {
            panic!("delete must not be reached");
        }
    }

    impl ScopedHandle for LeakyScope {
        fn owner(&self) -> Uuid {
            self.owner
        }

        async fn commit(&self) -> Result<(), ScopeError> {
            Ok(())
        }

        async fn rollback(&self) -> Result<(), ScopeError> {
            Ok(())
        }
    }

    fn leaky() -> LeakyScope {
        LeakyScope {
            owner: Uuid::new_v4(),
            foreign: Post::new(
                AccountId::new(),
                PostTitle::new("not yours").unwrap(),
                PostBody::new(String::new()).unwrap(),
                Utc::now(),
            ),
        }
    }

    #[tokio::test]
    async fn test_visible_foreign_post_cannot_be_updated() {
        let scope = leaky();
        let id = scope.foreign.id;
        let err = UpdatePostUseCase::new(scope)
            .execute(
                id,
                PostInput {
                    title: "mine now".to_string(),
                    body: String::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::Forbidden));
    }

    #[tokio::test]
    async fn test_visible_foreign_post_cannot_be_deleted() {
        let scope = leaky();
        let id = scope.foreign.id;
        let err = DeletePostUseCase::new(scope).execute(id).await.unwrap_err();
        assert!(matches!(err, JournalError::Forbidden));
    }
}
