use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::info;

use crate::engine::PlanStrategy;

pub type DbPool = SqlitePool;

const MAX_CONNECTIONS: u32 = 5;

#[derive(Error, Debug)]
pub enum DbError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),
}

/// Application state shared by every command: one long-lived pool and the
/// plan strategy selected at startup
pub struct AppState {
  pub db: DbPool,
  pub strategy: PlanStrategy,
}

/// Open the connection pool and run migrations. Called once at startup.
pub async fn initialize_db(database_url: &str) -> Result<DbPool, DbError> {
  info!(database_url, "initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(MAX_CONNECTIONS)
    .connect(database_url)
    .await?;

  run_migrations(&pool).await?;

  info!("database initialized");
  Ok(pool)
}

/// Idempotent: every statement is `IF NOT EXISTS` and applied versions are tracked
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbError> {
  sqlx::migrate!("./migrations").run(pool).await?;
  Ok(())
}
