use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::Config;
use crate::source::PgSource;
use crate::store::MongoStore;

/// Opens the relational source described by `[source]`.
pub async fn connect_source(config: &Config) -> Result<PgSource> {
    let url = config.source.url()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.source.max_connections)
        .connect(url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!(
        max_connections = config.source.max_connections,
        "Connected to PostgreSQL"
    );
    Ok(PgSource::new(pool))
}

/// Opens the document store described by `[store]`.
pub async fn connect_store(config: &Config) -> Result<MongoStore> {
    MongoStore::connect(config.store.url()?, &config.store.database).await
}
