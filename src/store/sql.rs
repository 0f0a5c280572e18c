use super::{LookupStore, SharedLookupStore};
use crate::config::StoreConfig;
use crate::error::AppResult;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub type DbPool = Pool<Sqlite>;

/// Address/balance table reached through sqlx.
#[derive(Debug, Clone)]
pub struct SqlLookupStore {
    pool: DbPool,
}

impl SqlLookupStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open a read-only pool; fails if the database does not exist yet.
    pub async fn connect(config: &StoreConfig) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?.read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl LookupStore for SqlLookupStore {
    async fn balance(&self, address: &str) -> AppResult<Option<i64>> {
        let balance = sqlx::query_scalar::<_, i64>("SELECT balance FROM addresses WHERE address = ?")
            .bind(address)
            .fetch_optional(&self.pool)
            .await?;

        Ok(balance)
    }
}

/// Create the addresses table for a fresh database.
///
/// For the loader that fills the store and for tests. The scanner itself
/// opens the store read-only and never calls this.
pub async fn ensure_schema(pool: &DbPool) -> AppResult<()> {
    info!("Ensuring addresses schema");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS addresses (
            address TEXT PRIMARY KEY NOT NULL,
            balance INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Keep trying to connect, attaching the store to `shared` once reachable.
pub fn connect_store_in_background(
    shared: Arc<SharedLookupStore>,
    config: StoreConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match SqlLookupStore::connect(&config).await {
                Ok(store) => {
                    shared.attach(Arc::new(store)).await;
                    info!("Lookup store connected: {}", config.url);
                    return;
                }
                Err(e) => {
                    warn!(
                        "Lookup store not available (attempt {}): {}. Lookups report not found until connected.",
                        attempt, e
                    );
                    tokio::time::sleep(config.retry_delay()).await;
                }
            }
        }
    })
}
