// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Schema bootstrap: creates the database file if missing and applies
//! pending migrations via `sqlx::migrate!`.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Runs every migration under `../migrations` relative to this crate.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("../migrations").run(pool).await.map_err(|e| sqlx::Error::Configuration(e.into()))
}

/// Creates the SQLite database file at `database_url` if it does not
/// already exist. A no-op for in-memory URLs.
pub async fn create_database_if_missing(database_url: &str) -> Result<(), sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    // Opening and immediately dropping a connection is enough to create
    // the file; sqlx does the file creation as part of connection setup.
    let pool = SqlitePoolOptions::new().max_connections(1).connect_with(options).await?;
    pool.close().await;
    Ok(())
}

/// Creates the database if needed, opens the real connection pool, and
/// applies migrations. The single entry point `main.rs` calls at startup.
pub async fn initialize_database(
    database_url: &str,
    max_connections: u32,
    command_timeout_secs: u64,
) -> Result<SqlitePool, sqlx::Error> {
    create_database_if_missing(database_url).await?;

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(std::time::Duration::from_secs(command_timeout_secs));

    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;

    ensure_schema(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initializes_an_in_memory_database() {
        let pool = initialize_database("sqlite::memory:", 1, 30).await.unwrap();
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM records").fetch_one(&pool).await.unwrap();
        assert_eq!(row.0, 0);
    }
}
