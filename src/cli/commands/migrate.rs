use anyhow::Context;

use crate::config::AppConfig;
use crate::database::manager;

pub async fn handle() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    let pool = manager::connect(&config.database)
        .await
        .context("could not connect to Postgres")?;
    manager::run_migrations(&pool).await.context("migrations failed")?;
    pool.close().await;
    Ok(())
}
