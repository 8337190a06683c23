//! # Durable External Log (Postgres)
//!
//! The governance core treats the decision/audit log as an external
//! append-only store. These modules are the Postgres implementation: the
//! API writes through to them when `DATABASE_URL` is configured, and the
//! in-process stores remain authoritative for request handling.
//!
//! Queries are runtime-checked (`sqlx::query`, not the compile-time
//! macros) so the crate builds without a live database.

pub mod audit;
pub mod decisions;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Initialize the Postgres pool from `DATABASE_URL`.
///
/// Returns `None` when the variable is unset — the server then runs with
/// in-memory stores only.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        tracing::info!("DATABASE_URL not set — durable decision log disabled");
        return Ok(None);
    };
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await?;
    tracing::info!("durable decision log connected");
    Ok(Some(pool))
}
