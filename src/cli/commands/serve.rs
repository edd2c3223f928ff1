use anyhow::Context;
use tracing::info;

use crate::config::AppConfig;
use crate::database::{manager, Repositories};
use crate::server::{self, AppState};

pub async fn handle(migrate: bool) -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    info!(environment = ?config.environment, port = config.server.port, "Starting chat API");

    let pool = manager::connect(&config.database)
        .await
        .context("could not connect to Postgres")?;
    if migrate {
        manager::run_migrations(&pool).await.context("migrations failed")?;
    }

    let state = AppState::new(&config.security, Repositories::postgres(pool.clone()), Some(pool))
        .context("invalid security configuration")?;
    server::serve(&config, state).await
}
