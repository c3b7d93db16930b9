use crate::error::DbError;
use dotenvy::dotenv;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;
use std::time::Duration;

/// Builds the shared connection pool for the ledger database.
///
/// `DATABASE_URL` comes from the environment (a `.env` file is honored when
/// present). One pool serves the whole application: the posting engine and
/// every analysis engine clone the same handle.
pub async fn connect() -> Result<PgPool, DbError> {
    dotenv().ok();

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| DbError::ConnectionConfigError("DATABASE_URL must be set.".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await?;

    Ok(pool)
}

/// Applies any pending migrations from `migrations/`.
///
/// The schema carries storage-level invariants the posting engine relies on
/// (the unique `(merchant_id, event_id)` index among them), so the binary
/// runs this at startup before accepting any posting.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
