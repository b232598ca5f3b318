#![cfg(test)]
use configs::DatabaseConfig;
use migration::MigratorTrait;
use models::db::connect_with_config;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

use crate::repository::Repository;
use crate::storage::JsonDocumentStore;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

fn test_db_config() -> DatabaseConfig {
    DatabaseConfig {
        url: models::db::DATABASE_URL.clone(),
        max_connections: 10,
        min_connections: 1,
        connect_timeout_secs: 10,
        acquire_timeout_secs: 10,
        sqlx_logging: false,
    }
}

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let cfg = test_db_config();
    MIGRATED
        .get_or_try_init(|| async {
            let db = connect_with_config(&cfg).await?;
            migration::Migrator::up(&db, None).await?;
            Ok::<(), anyhow::Error>(())
        })
        .await?;
    connect_with_config(&cfg).await
}

/// Repository over a fresh in-memory store.
pub fn memory_repo() -> Repository {
    Repository::new(JsonDocumentStore::in_memory())
}

