use sqlx::Row;

use crate::{Database, DbError};

/// Bookkeeping table recording which module migrations have run.
pub const MIGRATIONS_TABLE: &str = "_shelf_migrations";

/// Migration definition contributed by a module
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

impl Database {
    /// Apply every migration not yet recorded, in the order given.
    ///
    /// Each migration runs in its own transaction together with its
    /// bookkeeping row. Returns the number of migrations applied.
    pub async fn apply_migrations(
        &self,
        migrations: &[(String, Migration)],
    ) -> Result<usize, DbError> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
                module     TEXT NOT NULL,
                id         TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (module, id)
            )"
        ))
        .execute(self.pool())
        .await?;

        let mut applied = 0;
        for (module, migration) in migrations {
            let exists = sqlx::query(&format!(
                "SELECT 1 FROM {MIGRATIONS_TABLE} WHERE module = ? AND id = ?"
            ))
            .bind(module)
            .bind(migration.id)
            .fetch_optional(self.pool())
            .await?
            .is_some();

            if exists {
                tracing::debug!(module = %module, migration = migration.id, "migration already applied");
                continue;
            }

            let wrap = |source: sqlx::Error| DbError::Migration {
                module: module.clone(),
                id: migration.id.to_string(),
                source,
            };

            let mut tx = self.pool().begin().await?;
            sqlx::raw_sql(migration.up)
                .execute(&mut *tx)
                .await
                .map_err(wrap)?;
            sqlx::query(&format!(
                "INSERT INTO {MIGRATIONS_TABLE} (module, id) VALUES (?, ?)"
            ))
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;

            tracing::info!(module = %module, migration = migration.id, "migration applied");
            applied += 1;
        }

        Ok(applied)
    }

    /// Migrations recorded as applied, as `(module, id)` pairs.
    pub async fn applied_migrations(&self) -> Result<Vec<(String, String)>, DbError> {
        let rows = sqlx::query(&format!(
            "SELECT module, id FROM {MIGRATIONS_TABLE} ORDER BY module, id"
        ))
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| Ok((row.try_get("module")?, row.try_get("id")?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widgets() -> Vec<(String, Migration)> {
        vec![
            (
                "widgets".to_string(),
                Migration {
                    id: "001_init",
                    up: "CREATE TABLE widgets (id TEXT PRIMARY KEY);",
                },
            ),
            (
                "widgets".to_string(),
                Migration {
                    id: "002_name",
                    up: "ALTER TABLE widgets ADD COLUMN name TEXT;
                         CREATE INDEX widgets_name ON widgets (name);",
                },
            ),
        ]
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let db = Database::open_in_memory().await.unwrap();

        assert_eq!(db.apply_migrations(&widgets()).await.unwrap(), 2);
        assert_eq!(db.apply_migrations(&widgets()).await.unwrap(), 0);

        let applied = db.applied_migrations().await.unwrap();
        assert_eq!(
            applied,
            vec![
                ("widgets".to_string(), "001_init".to_string()),
                ("widgets".to_string(), "002_name".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn failed_migration_is_not_recorded() {
        let db = Database::open_in_memory().await.unwrap();
        let broken = vec![(
            "broken".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE oops (",
            },
        )];

        let err = db.apply_migrations(&broken).await.unwrap_err();
        assert!(matches!(err, DbError::Migration { .. }));
        assert!(db.applied_migrations().await.unwrap().is_empty());
    }
}
