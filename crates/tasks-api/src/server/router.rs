//! Axum router construction.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{
    handlers::{self, auth, tasks, users},
    middleware,
    state::AppState,
};

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth", post(auth::register))
        .route("/auth/token", post(auth::token))
        .route("/", get(users::list_users))
        .route(
            "/:user_id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/tasks", post(tasks::create_task).get(tasks::list_tasks))
        .route(
            "/tasks/:task_id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(middleware::MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use common::protocol::{
        ErrorResponse, HealthResponse, TaskResponse, TasksResponse, TokenResponse, UserResponse,
    };
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::store::audit::list_entries;

    async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(v) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(req).await.unwrap()
    }

    async fn json_body<T: DeserializeOwned>(resp: Response) -> T {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn registration(username: &str) -> Value {
        json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "full_name": "Test User",
            "password": "hunter22",
            "phone_number": "555-0100",
        })
    }

    /// Register `username` and return (user id, bearer token).
    async fn sign_up(app: &Router, username: &str) -> (i64, String) {
        let resp = send(app, Method::POST, "/auth", None, Some(registration(username))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let user: UserResponse = json_body(resp).await;

        let resp = send(
            app,
            Method::POST,
            "/auth/token",
            None,
            Some(json!({ "username": username, "password": "hunter22" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let token: TokenResponse = json_body(resp).await;
        assert_eq!(token.token_type, "bearer");
        (user.id, token.access_token)
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = build(AppState::for_tests().await);
        let resp = send(&app, Method::GET, "/no/such/route", None, None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = json_body(resp).await;
        assert_eq!(body.code, "not_found");
    }

    #[tokio::test]
    async fn health_reports_database_ready() {
        let app = build(AppState::for_tests().await);
        let resp = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: HealthResponse = json_body(resp).await;
        assert_eq!(body.status, "ok");
        assert!(body.database_ready);
    }

    #[tokio::test]
    async fn task_description_is_stored_encrypted() {
        let state = AppState::for_tests().await;
        let app = build(state.clone());
        let (user_id, token) = sign_up(&app, "alice").await;

        let resp = send(
            &app,
            Method::POST,
            "/tasks",
            Some(&token),
            Some(json!({ "title": "shopping", "description": "buy milk" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: TaskResponse = json_body(resp).await;
        assert_eq!(created.description.as_deref(), Some("buy milk"));
        assert_eq!(created.user_id, user_id);

        let stored: String = sqlx::query_scalar("SELECT encrypted_description FROM tasks WHERE id = ?")
            .bind(created.id)
            .fetch_one(state.store.pool())
            .await
            .unwrap();
        assert_eq!(stored, "0GmjdgqBJqc=");

        let resp = send(&app, Method::GET, "/tasks", Some(&token), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let listed: TasksResponse = json_body(resp).await;
        assert_eq!(listed.tasks, vec![created.clone()]);

        let resp = send(&app, Method::GET, &format!("/tasks/{}", created.id), Some(&token), None).await;
        let fetched: TaskResponse = json_body(resp).await;
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn task_update_and_delete() {
        let app = build(AppState::for_tests().await);
        let (_, token) = sign_up(&app, "alice").await;

        let resp = send(
            &app,
            Method::POST,
            "/tasks",
            Some(&token),
            Some(json!({ "title": "shopping", "description": "buy milk" })),
        )
        .await;
        let created: TaskResponse = json_body(resp).await;
        let uri = format!("/tasks/{}", created.id);

        let resp = send(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "title": "shopping", "description": "buy oat milk" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(&app, Method::GET, &uri, Some(&token), None).await;
        let fetched: TaskResponse = json_body(resp).await;
        assert_eq!(fetched.description.as_deref(), Some("buy oat milk"));

        let resp = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let resp = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn tasks_require_a_valid_token() {
        let app = build(AppState::for_tests().await);
        let resp = send(&app, Method::GET, "/tasks", None, None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = send(&app, Method::GET, "/tasks", Some("not-a-jwt"), None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = json_body(resp).await;
        assert_eq!(body.code, "unauthorized");
    }

    #[tokio::test]
    async fn tasks_are_invisible_to_other_users() {
        let app = build(AppState::for_tests().await);
        let (_, alice) = sign_up(&app, "alice").await;
        let (_, bob) = sign_up(&app, "bob").await;

        let resp = send(
            &app,
            Method::POST,
            "/tasks",
            Some(&alice),
            Some(json!({ "title": "secret", "description": "alice only" })),
        )
        .await;
        let created: TaskResponse = json_body(resp).await;

        let resp = send(&app, Method::GET, &format!("/tasks/{}", created.id), Some(&bob), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = send(&app, Method::DELETE, &format!("/tasks/{}", created.id), Some(&bob), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&app, Method::GET, "/tasks", Some(&bob), None).await;
        let listed: TasksResponse = json_body(resp).await;
        assert!(listed.tasks.is_empty());
    }

    #[tokio::test]
    async fn overlong_title_is_rejected() {
        let app = build(AppState::for_tests().await);
        let (_, token) = sign_up(&app, "alice").await;
        let resp = send(
            &app,
            Method::POST,
            "/tasks",
            Some(&token),
            Some(json!({ "title": "x".repeat(121), "description": "d" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn corrupt_envelope_reports_decryption_failure() {
        let state = AppState::for_tests().await;
        let app = build(state.clone());
        let (user_id, token) = sign_up(&app, "alice").await;

        sqlx::query("INSERT INTO tasks (title, encrypted_description, user_id) VALUES ('bad', '!!!', ?)")
            .bind(user_id)
            .execute(state.store.pool())
            .await
            .unwrap();

        let resp = send(&app, Method::GET, "/tasks", Some(&token), None).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = json_body(resp).await;
        assert_eq!(body.code, "decryption_failed");
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let app = build(AppState::for_tests().await);
        sign_up(&app, "alice").await;
        let resp = send(&app, Method::POST, "/auth", None, Some(registration("alice"))).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected() {
        let app = build(AppState::for_tests().await);
        sign_up(&app, "alice").await;

        let resp = send(
            &app,
            Method::POST,
            "/auth/token",
            None,
            Some(json!({ "username": "alice", "password": "wrong" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = send(
            &app,
            Method::POST,
            "/auth/token",
            None,
            Some(json!({ "username": "nobody", "password": "hunter22" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn profile_update_is_audited() {
        let state = AppState::for_tests().await;
        let app = build(state.clone());
        let (user_id, token) = sign_up(&app, "alice").await;

        let resp = send(
            &app,
            Method::PUT,
            &format!("/{user_id}"),
            Some(&token),
            Some(json!({
                "username": "alice",
                "email": "alice@example.org",
                "full_name": "Alice Liddell",
                "phone_number": "555-0199",
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(&app, Method::GET, &format!("/{user_id}"), Some(&token), None).await;
        let user: UserResponse = json_body(resp).await;
        assert_eq!(user.email, "alice@example.org");

        let mut conn = state.store.pool().acquire().await.unwrap();
        let entries = list_entries(&mut conn).await.unwrap();
        let ops: Vec<_> = entries.iter().map(|e| e.operation.as_str()).collect();
        assert_eq!(ops, ["CREATE", "UPDATE"]);
        // Payloads are ciphertext.
        assert!(entries.iter().all(|e| !e.data.contains("alice")));
    }

    #[tokio::test]
    async fn users_may_only_modify_themselves() {
        let app = build(AppState::for_tests().await);
        let (alice_id, _) = sign_up(&app, "alice").await;
        let (_, bob) = sign_up(&app, "bob").await;

        let resp = send(
            &app,
            Method::PUT,
            &format!("/{alice_id}"),
            Some(&bob),
            Some(json!({
                "username": "mallory",
                "email": "mallory@example.com",
                "full_name": "Mallory",
                "phone_number": "555-0666",
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = send(&app, Method::DELETE, &format!("/{alice_id}"), Some(&bob), None).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = send(&app, Method::DELETE, "/9999", Some(&bob), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn account_deletion_removes_user() {
        let app = build(AppState::for_tests().await);
        let (alice_id, alice) = sign_up(&app, "alice").await;
        let (_, bob) = sign_up(&app, "bob").await;

        let resp = send(&app, Method::GET, "/", Some(&bob), None).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(&app, Method::DELETE, &format!("/{alice_id}"), Some(&alice), None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = send(&app, Method::GET, &format!("/{alice_id}"), Some(&bob), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn token_of_deleted_account_is_rejected() {
        let app = build(AppState::for_tests().await);
        let (alice_id, alice) = sign_up(&app, "alice").await;

        let resp = send(&app, Method::DELETE, &format!("/{alice_id}"), Some(&alice), None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = send(
            &app,
            Method::POST,
            "/tasks",
            Some(&alice),
            Some(json!({ "title": "ghost", "description": "should not land" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = json_body(resp).await;
        assert_eq!(body.code, "unauthorized");
    }

    #[tokio::test]
    async fn malformed_requests_get_json_errors() {
        let app = build(AppState::for_tests().await);
        let (_, token) = sign_up(&app, "alice").await;

        let req = Request::builder()
            .method(Method::POST)
            .uri("/tasks")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = json_body(resp).await;
        assert_eq!(body.code, "bad_request");

        let resp = send(&app, Method::GET, "/tasks/abc", Some(&token), None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = json_body(resp).await;
        assert_eq!(body.code, "bad_request");

        let resp = send(&app, Method::POST, "/auth", None, Some(json!({ "username": "bob" }))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = json_body(resp).await;
        assert_eq!(body.code, "bad_request");
    }

    #[tokio::test]
    async fn profile_update_rejects_blank_identity() {
        let app = build(AppState::for_tests().await);
        let (alice_id, alice) = sign_up(&app, "alice").await;

        let resp = send(
            &app,
            Method::PUT,
            &format!("/{alice_id}"),
            Some(&alice),
            Some(json!({
                "username": "alice",
                "email": " ",
                "full_name": "Alice",
                "phone_number": "555-0100",
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = send(&app, Method::GET, &format!("/{alice_id}"), Some(&alice), None).await;
        let user: UserResponse = json_body(resp).await;
        assert_eq!(user.email, "alice@example.com");
    }
}
