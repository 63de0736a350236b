use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::config::DatabaseConfig;

/// Opens the Postgres pool and brings the schema up to date.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(cfg.acquire_timeout())
        .connect(&cfg.url)
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run database migrations")?;
    info!(max_connections = cfg.max_connections, "database ready");

    Ok(db)
}

/// Drops sub-microsecond digits. `timestamptz` keeps microseconds, so a finer
/// value would read back different from what was written.
pub fn to_db_precision(at: OffsetDateTime) -> OffsetDateTime {
    at - Duration::nanoseconds(i64::from(at.nanosecond() % 1_000))
}

/// Current UTC time at storage precision. Every persisted timestamp comes from here.
pub fn now() -> OffsetDateTime {
    to_db_precision(OffsetDateTime::now_utc())
}
