pub mod db;
pub mod user;

use sqlx::PgPool;

use crate::config::config;
use crate::database::DatabaseManager;

/// CLI commands talk to the database directly and wait for a live connection
pub(crate) async fn connect() -> anyhow::Result<PgPool> {
    Ok(DatabaseManager::connect(&config().database).await?)
}
