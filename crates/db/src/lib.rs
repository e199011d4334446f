//! SQLite connection factory and migration runner.

use std::str::FromStr;

use anyhow::Context;
use bookshelf_kernel::settings::DatabaseSettings;
use bookshelf_kernel::Migration;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const LEDGER_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (module, id)
    )
"#;

/// Handle to the relational store.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a pool against `settings.endpoint`.
    pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(&settings.endpoint)
            .with_context(|| format!("invalid database endpoint '{}'", settings.endpoint))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database sees its own empty database,
        // so those pools are pinned to a single connection that never expires.
        let pool_options = if is_in_memory(&settings.endpoint) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(settings.max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("failed to connect to '{}'", settings.endpoint))?;

        tracing::info!(
            target: "bookshelf-db",
            endpoint = %settings.endpoint,
            "database pool ready"
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply every migration not yet recorded in the ledger.
    ///
    /// Returns the number of migrations applied by this call.
    pub async fn apply_migrations(&self, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
        sqlx::raw_sql(LEDGER_DDL)
            .execute(&self.pool)
            .await
            .context("failed to create migration ledger")?;

        let mut applied = 0;
        for (module, migration) in migrations {
            let already: Option<(String,)> =
                sqlx::query_as("SELECT id FROM _migrations WHERE module = ? AND id = ?")
                    .bind(module)
                    .bind(migration.id)
                    .fetch_optional(&self.pool)
                    .await
                    .context("failed to read migration ledger")?;

            if already.is_some() {
                tracing::debug!(target: "bookshelf-db", %module, id = migration.id, "migration already applied");
                continue;
            }

            let mut tx = self.pool.begin().await.context("failed to open migration transaction")?;
            sqlx::raw_sql(migration.up)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
            sqlx::query("INSERT INTO _migrations (module, id) VALUES (?, ?)")
                .bind(module)
                .bind(migration.id)
                .execute(&mut *tx)
                .await
                .context("failed to record migration")?;
            tx.commit().await.context("failed to commit migration")?;

            tracing::info!(target: "bookshelf-db", %module, id = migration.id, "migration applied");
            applied += 1;
        }

        Ok(applied)
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_in_memory(endpoint: &str) -> bool {
    endpoint.contains(":memory:") || endpoint.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_settings() -> DatabaseSettings {
        DatabaseSettings {
            endpoint: "sqlite::memory:".to_string(),
            ..DatabaseSettings::default()
        }
    }

    fn migrations() -> Vec<(String, Migration)> {
        vec![(
            "books".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE shelf (id INTEGER PRIMARY KEY); CREATE INDEX shelf_id ON shelf (id);",
            },
        )]
    }

    #[test]
    fn detects_in_memory_endpoints() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://bookshelf.db"));
    }

    #[tokio::test]
    async fn migrations_are_applied_once() {
        let db = Database::connect(&memory_settings()).await.unwrap();

        assert_eq!(db.apply_migrations(&migrations()).await.unwrap(), 1);
        assert_eq!(db.apply_migrations(&migrations()).await.unwrap(), 0);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn failed_migration_is_not_recorded() {
        let db = Database::connect(&memory_settings()).await.unwrap();
        let broken = vec![(
            "books".to_string(),
            Migration {
                id: "001_broken",
                up: "CREATE TABLE",
            },
        )];

        let err = db.apply_migrations(&broken).await.unwrap_err();
        assert_eq!(err.to_string(), "migration books/001_broken failed");

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn pool_is_unusable_after_close() {
        let db = Database::connect(&memory_settings()).await.unwrap();
        db.close().await;
        assert!(db.apply_migrations(&migrations()).await.is_err());
        assert!(db.pool().is_closed());
    }
}
