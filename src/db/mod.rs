use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::domain::{FeatureRepository, TokenRepository};

pub mod migrator;
pub mod repositories;

pub use repositories::{SeaOrmFeatureRepository, SeaOrmTokenRepository};

/// Shared handle on the connection pool. Cloning is cheap.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let file_path = sqlite_file_path(db_url);

        // Every pooled connection to an in-memory database sees its own empty database.
        let (max_connections, min_connections) = if file_path.is_none() {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        if let Some(path) = file_path.map(Path::new) {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
            if !path.exists() {
                std::fs::File::create(path).with_context(|| {
                    format!("Failed to create database file: {}", path.display())
                })?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn feature_repo(&self) -> Arc<dyn FeatureRepository> {
        Arc::new(SeaOrmFeatureRepository::new(self.conn.clone()))
    }

    #[must_use]
    pub fn token_repo(&self) -> Arc<dyn TokenRepository> {
        Arc::new(SeaOrmTokenRepository::new(self.conn.clone()))
    }
}

/// File behind a `sqlite:` URL, or `None` for in-memory databases.
fn sqlite_file_path(db_url: &str) -> Option<&str> {
    let rest = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))
        .unwrap_or(db_url);
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);

    if path.is_empty() || path == ":memory:" || db_url.contains("mode=memory") {
        None
    } else {
        Some(path)
    }
}
