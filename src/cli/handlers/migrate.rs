//! Migrate command handler

use crate::config::DatabaseBackend;
use crate::config::settings::Settings;
use crate::db::{MigrationPlan, run_migrations};
use crate::error::{AppError, AppResult};

pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Plan requested on the command line
    pub fn plan(dry_run: bool, rollback: Option<u32>) -> AppResult<MigrationPlan> {
        match (dry_run, rollback) {
            (true, None) => Ok(MigrationPlan::Pending),
            (false, None) => Ok(MigrationPlan::Apply),
            (false, Some(0)) => Err(AppError::invalid_input(
                "rollback",
                "Number of rollback steps must be greater than 0",
            )),
            (false, Some(steps)) => Ok(MigrationPlan::Revert(steps)),
            (true, Some(_)) => Err(AppError::invalid_input(
                "rollback",
                "Cannot use --dry-run and --rollback together",
            )),
        }
    }

    /// Executes the migrate command
    ///
    /// # Errors
    /// - The in-memory backend is configured, so there is no schema to migrate
    /// - Database connection or migration errors
    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        let plan = Self::plan(dry_run, rollback)?;

        if self.config.database.backend == DatabaseBackend::Memory {
            return Err(AppError::Configuration {
                key: "database.backend".to_string(),
                source: anyhow::anyhow!("The memory backend has no schema to migrate"),
            });
        }
        self.config.database.validate()?;

        let names = run_migrations(&self.config.database.url, plan).await?;
        match plan {
            MigrationPlan::Pending if names.is_empty() => {
                println!("✓ No pending migrations found - database is up to date")
            }
            MigrationPlan::Pending => {
                println!("Found {} pending migration(s):", names.len());
                print_names(&names);
                println!("\nRun without --dry-run to apply these migrations");
            }
            MigrationPlan::Apply if names.is_empty() => {
                println!("✓ No migrations to apply - database is already up to date")
            }
            MigrationPlan::Apply => {
                println!("✓ Applied {} migration(s):", names.len());
                print_names(&names);
            }
            MigrationPlan::Revert(_) => {
                println!("✓ Rolled back {} migration(s):", names.len());
                print_names(&names);
            }
        }

        Ok(())
    }
}

fn print_names(names: &[String]) {
    for name in names {
        println!("  - {}", name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_from_flags() {
        assert_eq!(MigrateCommandHandler::plan(true, None).unwrap(), MigrationPlan::Pending);
        assert_eq!(MigrateCommandHandler::plan(false, None).unwrap(), MigrationPlan::Apply);
        assert_eq!(
            MigrateCommandHandler::plan(false, Some(2)).unwrap(),
            MigrationPlan::Revert(2)
        );
        assert!(MigrateCommandHandler::plan(false, Some(0)).is_err());
        assert!(MigrateCommandHandler::plan(true, Some(1)).is_err());
    }

    #[tokio::test]
    async fn test_memory_backend_has_nothing_to_migrate() {
        let mut config = Settings::default();
        config.database.backend = DatabaseBackend::Memory;

        let result = MigrateCommandHandler::new(config).execute(false, None).await;
        assert!(matches!(result, Err(AppError::Configuration { ref key, .. }) if key == "database.backend"));
    }
}
