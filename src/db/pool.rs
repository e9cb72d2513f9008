//! Async database connection pool implementation.
//!
//! Uses bb8 connection pool manager with diesel_async for PostgreSQL connections.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};

use crate::config::DatabaseConfig;
use crate::error::AppError;

/// Async connection pool type alias.
///
/// bb8::Pool internally uses Arc, so Clone is cheap.
pub type AsyncDbPool = Pool<AsyncPgConnection>;

/// SQL migrations compiled into the binary from `migrations/`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Creates an async database connection pool sized from configuration.
///
/// # Errors
///
/// Returns `AppError::ConnectionPool` when the pool cannot reach the database
/// within the configured timeout.
pub async fn establish_async_connection_pool(
    config: &DatabaseConfig,
) -> Result<AsyncDbPool, AppError> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.as_str());
    Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(Duration::from_secs(config.connection_timeout))
        .build(manager)
        .await
        .map_err(|e| AppError::ConnectionPool {
            source: anyhow::Error::new(e).context("Failed to build database connection pool"),
        })
}

fn migration_error(operation: &str, e: impl std::fmt::Display) -> AppError {
    AppError::persistence(operation, anyhow::anyhow!("Migration error: {}", e))
}

/// What a migration run did, as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPlan {
    /// List the pending migrations without applying them
    Pending,
    /// Apply every pending migration
    Apply,
    /// Revert this many of the most recently applied migrations
    Revert(u32),
}

/// Runs `plan` against the database at `url` on a blocking thread.
///
/// Migrations use a synchronous connection, separate from the async pool.
///
/// # Returns
/// Names of the migrations that are pending, were applied or were reverted.
pub async fn run_migrations(url: &str, plan: MigrationPlan) -> Result<Vec<String>, AppError> {
    let url = url.to_string();
    tokio::task::spawn_blocking(move || {
        use diesel::Connection;
        use diesel::pg::PgConnection;
        use diesel_migrations::MigrationHarness;

        let mut conn = PgConnection::establish(&url)
            .map_err(|e| migration_error("establish connection for migrations", e))?;

        match plan {
            MigrationPlan::Pending => Ok(conn
                .pending_migrations(MIGRATIONS)
                .map_err(|e| migration_error("check pending migrations", e))?
                .iter()
                .map(|m| m.name().to_string())
                .collect()),
            MigrationPlan::Apply => Ok(conn
                .run_pending_migrations(MIGRATIONS)
                .map_err(|e| migration_error("run pending migrations", e))?
                .iter()
                .map(|v| v.to_string())
                .collect()),
            MigrationPlan::Revert(steps) => {
                let applied = conn
                    .applied_migrations()
                    .map_err(|e| migration_error("get applied migrations", e))?;
                if applied.len() < steps as usize {
                    return Err(AppError::invalid_input(
                        "rollback",
                        format!(
                            "Cannot rollback {} migrations - only {} applied migrations available",
                            steps,
                            applied.len()
                        ),
                    ));
                }

                let mut reverted = Vec::with_capacity(steps as usize);
                for _ in 0..steps {
                    let version = conn
                        .revert_last_migration(MIGRATIONS)
                        .map_err(|e| migration_error("revert migration", e))?;
                    reverted.push(version.to_string());
                }
                Ok(reverted)
            }
        }
    })
    .await
    .map_err(|e| AppError::Internal {
        source: anyhow::Error::from(e),
    })?
}
