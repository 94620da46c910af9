//! HTTP server for commitboard.
//!
//! Exposes the board operations as JSON endpoints under `/v1` and runs the
//! retention sweep in the background. The acting user is named by the
//! `x-actor` header; verifying that claim is left to whatever sits in front.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{Acting, ActorSource, HeaderActorSource, ACTOR_HEADER};
pub use config::{ServerConfig, StorageConfig};
pub use error::{ServerError, ServerResult};
pub use server::BoardServer;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    async fn app() -> Router {
        let config = ServerConfig {
            storage: StorageConfig::Memory,
            admins: vec!["root".into()],
            ..Default::default()
        };
        BoardServer::open(config).await.unwrap().router()
    }

    async fn call(app: &Router, method: Method, uri: &str, actor: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder.header(ACTOR_HEADER, actor);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn seeded() -> (Router, String) {
        let app = app().await;
        for name in ["alice", "bob", "root"] {
            let (status, _) = call(
                &app,
                Method::POST,
                "/v1/users",
                None,
                Some(json!({"username": name, "passwordHash": "h", "email": format!("{name}@example.com")})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }
        let (status, _) = call(
            &app,
            Method::POST,
            "/v1/communities",
            Some("alice"),
            Some(json!({"name": "gaming", "description": "games"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, post) = call(
            &app,
            Method::POST,
            "/v1/posts",
            Some("alice"),
            Some(json!({"community": "gaming", "title": "Hello World", "content": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        (app, post["id"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = call(&app().await, Method::GET, "/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn user_responses_hide_password_hash() {
        let (app, _) = seeded().await;
        let (status, user) = call(&app, Method::GET, "/v1/users/alice", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["username"], "alice");
        assert!(user.get("passwordHash").is_none());

        let (status, _) = call(
            &app,
            Method::POST,
            "/v1/users",
            None,
            Some(json!({"username": "alice", "passwordHash": "h", "email": "a@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn voting_over_http() {
        let (app, id) = seeded().await;
        let uri = format!("/v1/posts/{id}/vote");

        let (status, tally) = call(&app, Method::POST, &uri, Some("alice"), Some(json!({"value": -1}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tally, json!({"upvotes": 0, "downvotes": 1, "score": -1}));

        let (_, tally) = call(
            &app,
            Method::POST,
            &uri,
            Some("alice"),
            Some(json!({"value": -1, "mode": "toggle"})),
        )
        .await;
        assert_eq!(tally["score"], 1);

        let (status, _) = call(&app, Method::POST, &uri, Some("bob"), Some(json!({"value": 2}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, Method::POST, &uri, None, Some(json!({"value": 1}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn comments_and_listing() {
        let (app, id) = seeded().await;
        let uri = format!("/v1/posts/{id}/comments");
        let (status, top) = call(&app, Method::POST, &uri, Some("bob"), Some(json!({"content": "first"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = call(
            &app,
            Method::POST,
            &uri,
            Some("alice"),
            Some(json!({"content": "reply", "parentId": top["id"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = call(
            &app,
            Method::POST,
            &uri,
            Some("alice"),
            Some(json!({"content": "orphan", "parentId": "missing"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, comments) = call(&app, Method::GET, &uri, None, None).await;
        assert_eq!(comments[0]["replies"][0]["content"], "reply");

        let (status, posts) = call(&app, Method::GET, "/v1/posts?scope=community&name=gaming&sort=top", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(posts.as_array().unwrap().len(), 1);

        let (status, _) = call(&app, Method::GET, "/v1/posts?scope=user", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_requires_author_or_admin() {
        let (app, id) = seeded().await;
        let uri = format!("/v1/posts/{id}");
        let (status, _) = call(&app, Method::DELETE, &uri, Some("bob"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&app, Method::DELETE, &uri, Some("root"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, post) = call(&app, Method::GET, &uri, None, None).await;
        assert_eq!(post["deleted"], true);
        assert_eq!(post["title"], "[deleted]");
    }

    #[tokio::test]
    async fn profile_edits_are_self_only() {
        let (app, _) = seeded().await;
        let update = json!({"about": "hello"});
        let (status, _) = call(&app, Method::PATCH, "/v1/users/alice", Some("bob"), Some(update.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, user) = call(&app, Method::PATCH, "/v1/users/alice", Some("alice"), Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["about"], "hello");
    }

    #[tokio::test]
    async fn membership_endpoints() {
        let (app, _) = seeded().await;
        let (_, joined) = call(&app, Method::POST, "/v1/communities/gaming/join", Some("bob"), None).await;
        assert_eq!(joined["memberCount"], 2);
        let (_, left) = call(&app, Method::POST, "/v1/communities/gaming/leave", Some("bob"), None).await;
        assert_eq!(left["memberCount"], 1);
        let (status, _) = call(&app, Method::POST, "/v1/communities/gaming/leave", Some("alice"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn retention_admin_endpoints() {
        let (app, _) = seeded().await;
        let (status, config) = call(&app, Method::GET, "/v1/admin/retention", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(config["retentionDays"], 30);

        let body = json!({"retentionDays": 20});
        let (status, _) = call(&app, Method::PUT, "/v1/admin/retention", Some("alice"), Some(body.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&app, Method::PUT, "/v1/admin/retention", Some("root"), Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(
            &app,
            Method::PUT,
            "/v1/admin/retention",
            Some("root"),
            Some(json!({"retentionDays": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, Method::POST, "/v1/admin/retention/run", Some("alice"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, report) = call(&app, Method::POST, "/v1/admin/retention/run", Some("root"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["deleted"], json!([]));
    }
}
