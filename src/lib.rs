//! Shelf book catalog application.
//!
//! Hosts the application modules and the bootstrap sequence shared by the
//! `shelf-app` binary and the `shelf-cli` tool.

pub mod modules;

use std::future::Future;

use anyhow::Context;
use shelf_db::Database;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Initialize every module and apply pending migrations.
pub async fn prepare(settings: &Settings, db: &Database) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, db);

    let ctx = InitCtx { settings, db };
    registry.init_modules(&ctx).await?;
    registry.run_migrations(&ctx).await?;

    Ok(registry)
}

/// Open the database and apply pending migrations without serving.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let db = Database::open(&settings.database)
        .await
        .context("failed to open database")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &db);
    let applied = registry
        .run_migrations(&InitCtx {
            settings,
            db: &db,
        })
        .await;

    db.close().await;
    applied
}

/// Run the service until Ctrl-C.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "shelf bootstrap starting"
    );

    let db = Database::open(&settings.database)
        .await
        .context("failed to open database")?;

    serve(&settings, &db, shutdown_signal()).await
}

/// Bootstrap the modules on `db` and serve until `shutdown` resolves.
///
/// The database is closed on every exit path, and modules that were
/// initialized are stopped.
pub async fn serve<F>(settings: &Settings, db: &Database, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let registry = match prepare(settings, db).await {
        Ok(registry) => registry,
        Err(e) => {
            db.close().await;
            return Err(e);
        }
    };

    let ctx = InitCtx { settings, db };
    let served = match registry.start_modules(&ctx).await {
        Ok(()) => {
            tracing::info!(modules = registry.module_count(), "shelf bootstrap complete");
            shelf_http::start_server(&registry, settings, shutdown).await
        }
        Err(e) => Err(e),
    };

    // Tear down even when startup or the server failed
    let stopped = registry.stop_modules().await;
    db.close().await;

    served?;
    stopped
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await
        }
    }
}
