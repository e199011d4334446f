//! Application bootstrap: storage, module lifecycle, and serving.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use bookshelf_db::Database;
use bookshelf_kernel::settings::{DatabaseSettings, Settings, StoreBackend};
use bookshelf_kernel::{InitCtx, ModuleRegistry};

use crate::modules;
use crate::modules::books::repository::{
    BookRepository, InMemoryBookRepository, SqlBookRepository,
};

/// A bootstrapped application: store open, migrations applied, modules started.
pub struct Application {
    settings: Settings,
    registry: ModuleRegistry,
    database: Option<Database>,
}

/// Open the store selected by `database.backend`.
///
/// The relational handle is returned alongside so migrations can run against it.
pub async fn open_store(
    settings: &DatabaseSettings,
) -> anyhow::Result<(Arc<dyn BookRepository>, Option<Database>)> {
    match settings.backend {
        StoreBackend::Memory => {
            tracing::info!("using in-memory book store");
            Ok((Arc::new(InMemoryBookRepository::new()), None))
        }
        StoreBackend::Sqlite => {
            let database = Database::connect(settings)
                .await
                .context("failed to open book store")?;
            let repository = SqlBookRepository::new(database.pool().clone());
            Ok((Arc::new(repository), Some(database)))
        }
    }
}

impl Application {
    /// Prepare everything that must happen before the first request is served.
    pub async fn bootstrap(settings: Settings) -> anyhow::Result<Self> {
        let (repository, database) = open_store(&settings.database).await?;

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, repository);

        let ctx = InitCtx {
            settings: &settings,
        };
        registry.init_modules(&ctx).await?;

        if let Some(database) = &database {
            apply_migrations(&registry, database).await?;
        }

        registry.start_modules(&ctx).await?;

        Ok(Self {
            settings,
            registry,
            database,
        })
    }

    /// The full HTTP router, middleware included.
    pub fn router(&self) -> Router {
        bookshelf_http::build_router(&self.registry, &self.settings)
    }

    /// Serve until `shutdown` resolves, then stop modules and close the store.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let served = bookshelf_http::start_server(&self.registry, &self.settings, shutdown).await;
        self.shutdown().await?;
        served
    }

    /// Stop modules in reverse order and release the store.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.registry.stop_modules().await?;
        if let Some(database) = &self.database {
            database.close().await;
        }
        Ok(())
    }
}

async fn apply_migrations(registry: &ModuleRegistry, database: &Database) -> anyhow::Result<usize> {
    let migrations = registry.collect_migrations();
    let applied = database
        .apply_migrations(&migrations)
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, total = migrations.len(), "migrations complete");
    Ok(applied)
}

/// Apply pending migrations to the configured store without starting modules.
///
/// Returns `None` for the memory backend, which has no schema.
pub async fn migrate(settings: &Settings) -> anyhow::Result<Option<usize>> {
    let (repository, database) = open_store(&settings.database).await?;
    let Some(database) = database else {
        return Ok(None);
    };

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, repository);
    let applied = apply_migrations(&registry, &database).await;
    database.close().await;
    applied.map(Some)
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
