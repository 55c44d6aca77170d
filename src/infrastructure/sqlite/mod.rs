pub mod inventory_queries;
pub mod inventory_store;
pub mod schema;

use std::str::FromStr;
use std::time::Duration;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};
use crate::domain::error::StoreError;

pub use inventory_queries::SqliteInventoryQueries;
pub use inventory_store::SqliteInventoryStore;

/// How long a unit of work waits for another unit's write lock.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens the pool and brings the schema up to date.
///
/// In-memory URLs get a single connection that is never recycled, otherwise
/// each new connection would see an empty database.
pub async fn connect(database_url: &str) -> Result<SqlitePool, StoreError> {
    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = if in_memory {
        debug!("Opening in-memory SQLite database");
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        if let Some(parent) = options.get_filename().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Database(sqlx::Error::Io(e)))?;
        }
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options.journal_mode(SqliteJournalMode::Wal))
            .await?
    };

    schema::init_schema(&pool).await?;
    info!("Connected to {}", database_url);
    Ok(pool)
}
