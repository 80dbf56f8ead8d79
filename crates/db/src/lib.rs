//! SQLite database handle for Shelf.
//!
//! The [`Database`] is opened once during bootstrap and handed to every
//! module that needs persistence. Cloning it is cheap: clones share the
//! same connection pool.

use std::str::FromStr;

use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

mod migrations;

pub use migrations::{Migration, MIGRATIONS_TABLE};

/// Errors raised by the database layer.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration '{module}/{id}' failed: {source}")]
    Migration {
        module: String,
        id: String,
        #[source]
        source: sqlx::Error,
    },
}

impl DbError {
    /// Whether the underlying failure is a unique or primary key violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::Sqlx(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_url")]
    pub url: String,
    #[serde(default = "DatabaseSettings::default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseSettings {
    fn default_url() -> String {
        "sqlite://shelf.db".to_string()
    }

    fn default_max_connections() -> u32 {
        5
    }

    fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            max_connections: Self::default_max_connections(),
        }
    }
}

/// Pooled handle to the relational store.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a pool for the configured database, creating the file if needed.
    pub async fn open(settings: &DatabaseSettings) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(&settings.url)?.create_if_missing(true);

        // An in-memory database lives only as long as its connection, so the
        // pool must hold exactly one that never expires.
        let pool_options = if settings.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(settings.max_connections)
        };

        let pool = pool_options.connect_with(options).await?;

        tracing::info!(
            target: "shelf-db",
            url = %settings.url,
            "database pool opened"
        );

        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, DbError> {
        Self::open(&DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .await
    }

    /// Pool used to run parameterized queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip a trivial query to verify connectivity.
    pub async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Release every pooled connection. Pending queries are allowed to finish.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(target: "shelf-db", "database pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url_points_at_local_file() {
        let settings = DatabaseSettings::default();
        assert_eq!(settings.url, "sqlite://shelf.db");
        assert!(!settings.is_in_memory());
    }

    #[tokio::test]
    async fn in_memory_database_round_trips() {
        let db = Database::open_in_memory().await.unwrap();
        db.ping().await.unwrap();

        sqlx::query("CREATE TABLE t (k TEXT PRIMARY KEY)")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO t (k) VALUES (?)")
            .bind("a")
            .execute(db.pool())
            .await
            .unwrap();

        let err = sqlx::query("INSERT INTO t (k) VALUES (?)")
            .bind("a")
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn close_releases_the_pool() {
        let db = Database::open_in_memory().await.unwrap();
        db.close().await;
        assert!(db.is_closed());
        assert!(db.ping().await.is_err());
    }
}
