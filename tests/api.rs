use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use basket_buddy::api::{AppState, router};
use basket_buddy::auth::TokenKeys;
use basket_buddy::config::database::create_tables;
use chrono::Duration;
use sea_orm::{ConnectOptions, Database};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const PASSWORD: &str = "correct-horse-battery";

struct TestApp {
    app: Router,
}

impl TestApp {
    async fn new(expose_basket_directory: bool) -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        create_tables(&db).await.unwrap();

        let state = AppState {
            db,
            tokens: Arc::new(TokenKeys::new(
                "integration-secret",
                Duration::minutes(5),
                Duration::days(1),
            )),
            expose_basket_directory,
        };
        Self { app: router(state) }
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Signs up `username` and returns `(user id, access token)`.
    async fn register(&self, username: &str) -> (i64, String) {
        let (status, user) = self
            .request(
                Method::POST,
                "/users/sign-up",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": PASSWORD,
                    "confirm_password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "sign-up failed: {user}");

        let (status, tokens) = self
            .request(
                Method::POST,
                "/users/sign-in",
                None,
                Some(json!({ "username": username, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        (
            user["id"].as_i64().unwrap(),
            tokens["access"].as_str().unwrap().to_string(),
        )
    }
}

#[tokio::test]
async fn test_basket_sharing_lifecycle() {
    let app = TestApp::new(true).await;
    let (alice_id, alice) = app.register("alice").await;
    let (bob_id, bob) = app.register("bob").await;

    let (status, basket) = app
        .request(
            Method::POST,
            "/baskets",
            Some(&alice),
            Some(json!({ "name": "Groceries", "owner": bob_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(basket["owner_id"], alice_id);
    assert_eq!(basket["status"], "pending");
    let uri = format!("/baskets/{}", basket["id"]);

    let (status, _) = app.request(Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.request(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, shared) = app
        .request(Method::PUT, &uri, Some(&alice), Some(json!({ "shared_with": [bob_id] })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shared["shared_with"][0]["username"], "bob");

    let (status, updated) = app
        .request(Method::PUT, &uri, Some(&bob), Some(json!({ "status": "open" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "open");
    assert_eq!(updated["owner_id"], alice_id);

    let (status, mine) = app.request(Method::GET, "/baskets", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, _) = app.request(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.request(Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = app.request(Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["msg"].is_string());
}

#[tokio::test]
async fn test_shared_user_deletes_item() {
    let app = TestApp::new(true).await;
    let (_, alice) = app.register("alice").await;
    let (bob_id, bob) = app.register("bob").await;

    let (_, basket) = app
        .request(
            Method::POST,
            "/baskets",
            Some(&alice),
            Some(json!({ "name": "Groceries", "shared_with": [bob_id] })),
        )
        .await;
    let items_uri = format!("/baskets/{}/items", basket["id"]);

    let (status, item) = app
        .request(Method::POST, &items_uri, Some(&bob), Some(json!({ "name": "Milk", "basket": 999 })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["creator_id"], bob_id);
    assert_eq!(item["basket_id"], basket["id"]);
    assert_eq!(item["status"], "active");
    let item_uri = format!("/items/{}", item["id"]);

    let (status, view) = app.request(Method::GET, &item_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["creator"]["username"], "bob");
    assert_eq!(view["basket"]["name"], "Groceries");

    let (status, _) = app.request(Method::DELETE, &item_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.request(Method::GET, &item_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, listed) = app.request(Method::GET, &items_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_deleting_basket_removes_items() {
    let app = TestApp::new(true).await;
    let (_, alice) = app.register("alice").await;
    let (_, basket) = app
        .request(Method::POST, "/baskets", Some(&alice), Some(json!({ "name": "Hardware" })))
        .await;
    let items_uri = format!("/baskets/{}/items", basket["id"]);

    let mut item_uris = Vec::new();
    for name in ["Nails", "Glue"] {
        let (_, item) = app
            .request(Method::POST, &items_uri, Some(&alice), Some(json!({ "name": name })))
            .await;
        item_uris.push(format!("/items/{}", item["id"]));
    }

    let (status, _) = app
        .request(Method::DELETE, &format!("/baskets/{}", basket["id"]), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    for uri in &item_uris {
        let (status, _) = app.request(Method::GET, uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_authentication_required() {
    let app = TestApp::new(true).await;

    let (status, body) = app.request(Method::GET, "/baskets", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["msg"].is_string());

    let (status, _) = app.request(Method::GET, "/baskets/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request(Method::GET, "/users", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_up_validation() {
    let app = TestApp::new(true).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/users/sign-up",
            None,
            Some(json!({
                "username": "carol",
                "email": "carol@example.com",
                "password": PASSWORD,
                "confirm_password": "something-else",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "confirm_password");

    // Nothing was stored
    let (status, _) = app
        .request(
            Method::POST,
            "/users/sign-in",
            None,
            Some(json!({ "username": "carol", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_never_serialized() {
    let app = TestApp::new(true).await;
    let (alice_id, alice) = app.register("alice").await;

    let (status, me) = app
        .request(Method::GET, &format!("/users/{alice_id}"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice");
    assert!(me.get("password_hash").is_none());
    assert!(me.get("password").is_none());

    let (status, body) = app
        .request(
            Method::PATCH,
            "/users/password-reset/alice",
            None,
            Some(json!({
                "current_password": PASSWORD,
                "new_password": "a-new-password",
                "confirm_password": "a-new-password",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_users_are_self_only() {
    let app = TestApp::new(true).await;
    let (alice_id, alice) = app.register("alice").await;
    let (bob_id, bob) = app.register("bob").await;

    let (status, users) = app.request(Method::GET, "/users", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let (status, _) = app
        .request(Method::DELETE, &format!("/users/{alice_id}"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, view) = app
        .request(
            Method::POST,
            &format!("/users/{alice_id}/connections/{bob_id}"),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["connections"][0]["id"], bob_id);

    let (status, _) = app
        .request(Method::DELETE, &format!("/users/{bob_id}"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The deleted account's token no longer authenticates
    let (status, _) = app.request(Method::GET, "/baskets", Some(&bob), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_refresh() {
    let app = TestApp::new(true).await;
    app.register("alice").await;
    let (_, tokens) = app
        .request(
            Method::POST,
            "/users/sign-in",
            None,
            Some(json!({ "username": "alice", "password": PASSWORD })),
        )
        .await;

    let (status, refreshed) = app
        .request(
            Method::POST,
            "/users/token-refresh",
            None,
            Some(json!({ "refresh": tokens["refresh"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(refreshed["access"].is_string());

    let (status, _) = app
        .request(
            Method::POST,
            "/users/token-refresh",
            None,
            Some(json!({ "refresh": tokens["access"] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let refresh = tokens["refresh"].as_str().unwrap();
    let (status, _) = app.request(Method::GET, "/baskets", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_input_is_400_and_unknown_route_404() {
    let app = TestApp::new(true).await;
    let (_, alice) = app.register("alice").await;

    let (status, _) = app
        .request(
            Method::POST,
            "/baskets",
            Some(&alice),
            Some(json!({ "name": "Groceries", "status": "archived" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.request(Method::GET, "/baskets/abc", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.request(Method::GET, "/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "not found");
}

#[tokio::test]
async fn test_basket_directory_toggle() {
    let open = TestApp::new(true).await;
    let (_, alice) = open.register("alice").await;
    let (_, bob) = open.register("bob").await;
    open.request(Method::POST, "/baskets", Some(&alice), Some(json!({ "name": "Private" })))
        .await;

    let (status, all) = open.request(Method::GET, "/baskets/all", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);
    let (_, mine) = open.request(Method::GET, "/baskets", Some(&bob), None).await;
    assert!(mine.as_array().unwrap().is_empty());

    let closed = TestApp::new(false).await;
    let (_, carol) = closed.register("carol").await;
    let (status, _) = closed.request(Method::GET, "/baskets/all", Some(&carol), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
