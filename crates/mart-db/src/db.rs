//! SQLite connection pool and transaction handles.

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::DbError;
use crate::schema;

/// Shared handle to the MartKit database.
///
/// Owns the connection pool. Each workflow operation calls [`Db::begin`]
/// once and passes the transaction handle down through every statement
/// of its sequence; an uncommitted handle rolls back on drop, so every
/// exit path releases the scope.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open (or create) a database file and bootstrap the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(DbError::Open)?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Open a fresh in-memory database. Used by tests and demos.
    pub async fn open_in_memory() -> Result<Self, DbError> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true)
            .foreign_keys(true);

        // One pinned connection: a recycled connection would drop the
        // in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(DbError::Open)?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply the schema DDL. Idempotent.
    pub async fn migrate(&self) -> Result<(), DbError> {
        for statement in schema::TABLES {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(DbError::Migrate)?;
        }
        debug!(statements = schema::TABLES.len(), "schema bootstrapped");
        Ok(())
    }

    /// Begin a transaction scope for one workflow operation.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, DbError> {
        Ok(self.pool.begin().await?)
    }

    /// Direct pool access for single-statement reads.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Encode a timestamp for a TEXT column.
pub fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

/// Decode a stored RFC 3339 timestamp.
pub fn decode_ts(column: &'static str, raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| DbError::Timestamp { column, source })
}
