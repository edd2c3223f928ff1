use std::collections::HashMap;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use chat_api::auth::TokenService;
use chat_api::config::AppConfig;
use chat_api::database::{manager, Repositories};
use chat_api::server::{app, AppState};

pub const SECRET: &str = "integration-secret";

pub struct TestServer {
    pub base_url: String,
    pub tokens: TokenService,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn token_for(&self, user_id: i64) -> String {
        self.tokens.issue(user_id).expect("issue token")
    }
}

/// Configuration pointing at a Postgres that is not there; nothing these
/// tests exercise should reach it.
pub fn config() -> Result<AppConfig> {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("APP_ENV", "development"),
        ("POSTGRES_USER", "chat"),
        ("POSTGRES_PASSWORD", "chat"),
        ("POSTGRES_HOST", "127.0.0.1"),
        ("POSTGRES_PORT", "1"),
        ("POSTGRES_DB", "chat"),
        ("DATABASE_CONNECTION_TIMEOUT", "1"),
        ("JWT_SECRET", SECRET),
        ("BCRYPT_COST", "4"),
    ]);
    Ok(AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))?)
}

/// Serve the real router over a lazily connecting pool on a free port.
pub async fn spawn_server() -> Result<TestServer> {
    let config = config()?;
    let pool = manager::connect_lazy(&config.database);
    let state = AppState::new(&config.security, Repositories::postgres(pool.clone()), Some(pool))?;

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    tokio::spawn(async move {
        let _ = axum_serve(listener, state).await;
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        tokens: TokenService::new(SECRET, config.security.jwt_expiry_hours)?,
        client: reqwest::Client::new(),
    })
}

async fn axum_serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>()).await
}
