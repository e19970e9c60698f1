use color_eyre::{Result, eyre::Context};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection};
use std::path::Path;
use std::time::Duration;

pub struct Database {
    pub conn: DatabaseConnection,
}

impl Database {
    /// Open or create a database at the given path. Does not touch the schema.
    pub async fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening database at: {}", path.display());

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).wrap_err_with(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        // Create SQLite connection URL
        let url = format!("sqlite://{}?mode=rwc", path.display());

        // Configure connection options
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(16)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .idle_timeout(Duration::from_secs(60))
            .sqlx_logging(false);

        let conn = SeaDatabase::connect(opt)
            .await
            .wrap_err_with(|| format!("Failed to open database: {}", path.display()))?;

        // Join rows rely on ON DELETE CASCADE
        conn.execute_unprepared("PRAGMA foreign_keys = ON")
            .await
            .wrap_err("Failed to enable foreign keys")?;

        log::info!("Database ready at: {}", path.display());
        Ok(Database { conn })
    }

    /// Apply every pending migration.
    pub async fn migrate(&self) -> Result<()> {
        log::debug!("Running database migrations");
        migration::Migrator::up(&self.conn, None)
            .await
            .wrap_err("Failed to run database migrations")?;
        Ok(())
    }

    /// Number of migrations that have not been applied yet.
    pub async fn pending_migrations(&self) -> Result<usize> {
        let pending = migration::Migrator::get_pending_migrations(&self.conn)
            .await
            .wrap_err("Failed to read migration status")?;
        Ok(pending.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_then_migrate() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("nested").join("test.db"))
            .await
            .unwrap();

        assert!(db.pending_migrations().await.unwrap() > 0);

        db.migrate().await.unwrap();

        assert_eq!(db.pending_migrations().await.unwrap(), 0);
    }
}
