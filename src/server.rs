use anyhow::Context;
use axum::{
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::{any::Any, net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, signal, sync::Notify};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::auth::{JwtError, TokenService};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::Repositories;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, trace};
use crate::services::{AuthService, MessageService, RoomService};

/// Shared, immutable request state.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub rooms: Arc<RoomService>,
    pub messages: Arc<MessageService>,
    pub tokens: Arc<TokenService>,
    /// `None` when running on repositories that are not backed by Postgres.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(security: &SecurityConfig, repositories: Repositories, pool: Option<PgPool>) -> Result<Self, JwtError> {
        let tokens = Arc::new(TokenService::from_config(security)?);
        Ok(Self::with_tokens(tokens, repositories, security.bcrypt_cost, pool))
    }

    pub fn with_tokens(
        tokens: Arc<TokenService>,
        repositories: Repositories,
        bcrypt_cost: u32,
        pool: Option<PgPool>,
    ) -> Self {
        let Repositories { users, rooms, messages } = repositories;
        Self {
            auth: Arc::new(AuthService::new(users.clone(), tokens.clone(), bcrypt_cost)),
            rooms: Arc::new(RoomService::new(rooms.clone())),
            messages: Arc::new(MessageService::new(messages, rooms, users)),
            tokens,
            pool,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/healthz", get(public::healthz))
        .route("/login", post(public::login))
        .route("/register", post(public::register))
        .route("/rooms/list", get(public::room_list))
        .route("/rooms/:id", get(public::room_get));

    let protected_routes = Router::new()
        .route("/rooms/create", post(protected::room_create))
        .route("/rooms/update/:id", patch(protected::room_update))
        .route("/rooms/delete/:id", delete(protected::room_delete))
        .route("/messages/create", post(protected::message_create))
        .route("/messages/update/:id", patch(protected::message_update))
        .route("/messages/delete/:id", delete(protected::message_delete))
        .route("/messages/list", get(protected::message_list))
        .route("/messages/:id", get(protected::message_get))
        .route_layer(from_fn_with_state(state.tokens.clone(), jwt_auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::make_span)
                .on_response(trace::on_response),
        )
        .layer(CorsLayer::permissive())
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "Handler panicked");
    ApiError::internal().into_response()
}

/// Bind, serve until SIGINT/SIGTERM, then drain in-flight requests for at
/// most the configured shutdown timeout.
pub async fn serve(config: &AppConfig, state: AppState) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, environment = ?config.environment, "Chat API listening");

    let shutdown = Arc::new(Notify::new());
    let trigger = shutdown.clone();
    let server = axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move { trigger.notified().await });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        joined = &mut server => return Ok(joined??),
        _ = shutdown_signal() => {}
    }

    info!(timeout_secs = config.server.shutdown_timeout_secs, "Shutting down");
    shutdown.notify_one();
    match tokio::time::timeout(config.server.shutdown_timeout(), server).await {
        Ok(joined) => joined??,
        Err(_) => warn!("Shutdown timeout elapsed with requests still in flight"),
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::auth::AuthUser;
    use crate::testing::{self, MemoryStore, TEST_BCRYPT_COST};

    struct TestApp {
        router: Router,
        store: Arc<MemoryStore>,
        tokens: Arc<TokenService>,
    }

    impl TestApp {
        fn new() -> Self {
            let store = testing::store();
            let tokens = Arc::new(testing::token_service());
            let state = AppState::with_tokens(tokens.clone(), testing::repositories(&store), TEST_BCRYPT_COST, None);
            Self {
                router: app(state),
                store,
                tokens,
            }
        }

        /// Seed a user and hand back a bearer token for it.
        async fn user(&self, username: &str) -> (i64, String) {
            let id = self.store.insert_user(username, &format!("{username}@example.com")).await;
            (id, self.tokens.issue(id).unwrap())
        }

        async fn raw(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let body = match body {
                Some(value) => {
                    request = request.header(header::CONTENT_TYPE, "application/json");
                    Body::from(value.to_string())
                }
                None => Body::empty(),
            };
            self.router.clone().oneshot(request.body(body).unwrap()).await.unwrap()
        }

        async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
            let response = self.raw(method, uri, token, body).await;
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let app = TestApp::new();
        let (status, user) = app
            .send(
                Method::POST,
                "/register",
                None,
                Some(json!({ "email": "Alice@Example.com", "password": "Abcdef12!", "username": "alice1" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user["email"], "alice@example.com");
        assert_eq!(user["username"], "alice1");
        assert!(user["id"].is_i64());
        assert!(user.get("password").is_none());
        assert!(user.get("password_hash").is_none());
        assert!(user.get("token").is_none());

        let (status, body) = app
            .send(
                Method::POST,
                "/login",
                None,
                Some(json!({ "email": "alice@example.com", "password": "Abcdef12!" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap();
        assert!(!token.is_empty());
        assert_eq!(app.tokens.verify(token).unwrap().user_id, user["id"].as_i64().unwrap());
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let app = TestApp::new();
        let body = json!({ "email": "dup@example.com", "password": "Abcdef12!", "username": "dupuser" });
        let (status, _) = app.send(Method::POST, "/register", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, err) = app.send(Method::POST, "/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err, json!({ "error": "email already in use" }));
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let app = TestApp::new();
        let (status, err) = app
            .send(
                Method::POST,
                "/login",
                None,
                Some(json!({ "email": "nobody@example.com", "password": "Abcdef12!" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(err, json!({ "error": "invalid credentials" }));
    }

    #[tokio::test]
    async fn weak_password_is_rejected_with_field_message() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                "/register",
                None,
                Some(json!({ "email": "weak@example.com", "password": "Abcdefg12", "username": "weakling" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(
            body["errors"]["password"],
            "password must contain at least one special character (!@#$%^&*)"
        );
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_bearer_token() {
        let app = TestApp::new();
        let (status, err) = app.send(Method::GET, "/messages/list?room_id=1", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(err["error"], "Missing Authorization header");

        let request = Request::builder()
            .uri("/messages/1")
            .header(header::AUTHORIZATION, "Token abc")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let (status, err) = app.send(Method::GET, "/messages/1", Some("not.a.jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(err["error"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn principal_is_exposed_to_the_request_logger() {
        let app = TestApp::new();
        let (alice, token) = app.user("alice").await;
        let response = app.raw(Method::GET, "/rooms/list", None, None).await;
        assert!(response.extensions().get::<AuthUser>().is_none());

        let response = app
            .raw(Method::POST, "/rooms/create", Some(&token), Some(json!({ "name": "general" })))
            .await;
        assert_eq!(response.extensions().get::<AuthUser>(), Some(&AuthUser::new(alice)));
    }

    #[tokio::test]
    async fn room_lifecycle_respects_ownership() {
        let app = TestApp::new();
        let (alice, alice_token) = app.user("alice").await;
        let (_, bob_token) = app.user("bobby").await;

        let (status, room) = app
            .send(
                Method::POST,
                "/rooms/create",
                Some(&alice_token),
                Some(json!({ "name": "general", "private": false })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(room["created_by"], alice);
        assert_eq!(room["is_private"], false);
        let uri = |action: &str| format!("/rooms/{action}/{}", room["id"]);

        let (status, err) = app
            .send(Method::PATCH, &uri("update"), Some(&bob_token), Some(json!({ "name": "mine now" })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(err["error"], "You do not own this room");

        let (status, body) = app
            .send(
                Method::PATCH,
                &uri("update"),
                Some(&alice_token),
                Some(json!({ "name": "renamed", "private": true })),
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, fetched) = app.send(Method::GET, &format!("/rooms/{}", room["id"]), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "renamed");
        assert_eq!(fetched["is_private"], true);

        let (status, list) = app.send(Method::GET, "/rooms/list", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, _) = app.send(Method::DELETE, &uri("delete"), Some(&bob_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.send(Method::DELETE, &uri("delete"), Some(&alice_token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, err) = app.send(Method::GET, &format!("/rooms/{}", room["id"]), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["error"], "Room not found");
    }

    #[tokio::test]
    async fn room_paths_and_bodies_are_validated() {
        let app = TestApp::new();
        let (_, token) = app.user("alice").await;

        let (status, err) = app.send(Method::GET, "/rooms/abc", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "Invalid room id");

        let (status, body) = app
            .send(Method::POST, "/rooms/create", Some(&token), Some(json!({ "name": "   " })))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["name"], "name is required");

        let request = Request::builder()
            .method(Method::POST)
            .uri("/rooms/create")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn null_fields_are_reported_as_missing() {
        let app = TestApp::new();
        let (_, token) = app.user("alice").await;

        let (status, body) = app
            .send(Method::POST, "/rooms/create", Some(&token), Some(json!({ "name": null })))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["name"], "name is required");

        let (status, body) = app
            .send(
                Method::POST,
                "/messages/create",
                Some(&token),
                Some(json!({ "room_id": 1, "content": null })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["content"], "content is required");

        let (status, body) = app
            .send(Method::POST, "/login", None, Some(json!({ "email": null, "password": null })))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["email"], "email is required");
        assert_eq!(body["errors"]["password"], "password is required");
    }

    #[tokio::test]
    async fn bad_path_id_wins_over_bad_body() {
        let app = TestApp::new();
        let (_, token) = app.user("alice").await;

        let (status, err) = app
            .send(Method::PATCH, "/rooms/update/abc", Some(&token), Some(json!({ "name": "" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "Invalid room id");

        let (status, err) = app
            .send(Method::PATCH, "/messages/update/abc", Some(&token), Some(json!({ "content": "x" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "Invalid message id");
    }

    #[tokio::test]
    async fn unicode_usernames_register() {
        let app = TestApp::new();
        let (status, user) = app
            .send(
                Method::POST,
                "/register",
                None,
                Some(json!({ "email": "zoe@example.com", "password": "Abcdef12!", "username": "Zoë42" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user["username"], "Zoë42");
    }

    #[tokio::test]
    async fn messages_flow() {
        let app = TestApp::new();
        let (alice, alice_token) = app.user("alice").await;
        let (bob, bob_token) = app.user("bobby").await;
        let (_, carol_token) = app.user("carol").await;

        let (_, room) = app
            .send(Method::POST, "/rooms/create", Some(&alice_token), Some(json!({ "name": "general" })))
            .await;

        let (status, msg) = app
            .send(
                Method::POST,
                "/messages/create",
                Some(&alice_token),
                Some(json!({ "room_id": room["id"], "content": "hello everyone" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(msg["sender_id"], alice);
        assert_eq!(msg["receiver_id"], Value::Null);

        let (status, body) = app
            .send(
                Method::POST,
                "/messages/create",
                Some(&alice_token),
                Some(json!({ "room_id": room["id"], "receiver_id": bob, "content": "both" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["errors"]["room_id"],
            "only one of room_id or receiver_id must be provided"
        );

        let (status, err) = app
            .send(
                Method::POST,
                "/messages/create",
                Some(&alice_token),
                Some(json!({ "room_id": 9999, "content": "anyone there" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["error"], "Room not found");

        let (status, dm) = app
            .send(
                Method::POST,
                "/messages/create",
                Some(&alice_token),
                Some(json!({ "receiver_id": bob, "content": "just for you" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let dm_uri = format!("/messages/{}", dm["id"]);

        let (status, _) = app.send(Method::GET, &dm_uri, Some(&bob_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, err) = app.send(Method::GET, &dm_uri, Some(&carol_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["error"], "Message not found");

        let (status, list) = app
            .send(Method::GET, &format!("/messages/list?receiver_id={alice}"), Some(&bob_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["content"], "just for you");

        let update_uri = format!("/messages/update/{}", msg["id"]);
        let (status, err) = app
            .send(Method::PATCH, &update_uri, Some(&bob_token), Some(json!({ "content": "hijack" })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(err["error"], "You are not the sender of this message");

        let (status, _) = app
            .send(Method::PATCH, &update_uri, Some(&alice_token), Some(json!({ "content": "hello all" })))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, list) = app
            .send(Method::GET, &format!("/messages/list?room_id={}", room["id"]), Some(&carol_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["content"], "hello all");

        let (status, _) = app
            .send(Method::DELETE, &format!("/messages/delete/{}", msg["id"]), Some(&alice_token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn message_list_query_is_checked() {
        let app = TestApp::new();
        let (_, token) = app.user("alice").await;

        let (status, body) = app.send(Method::GET, "/messages/list", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["room_id"], "either room_id or receiver_id must be provided");

        let (status, err) = app.send(Method::GET, "/messages/list?room_id=abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "Invalid room_id");

        let (status, err) = app.send(Method::GET, "/messages/x1", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "Invalid message id");
    }

    #[tokio::test]
    async fn health_and_fallback() {
        let app = TestApp::new();
        let (status, body) = app.send(Method::GET, "/healthz", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok", "database": "not configured" }));

        let (status, body) = app.send(Method::GET, "/nowhere", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not found" }));
    }
}
