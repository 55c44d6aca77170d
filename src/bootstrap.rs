//! Wires adapters into the application from [`Settings`].

use std::sync::Arc;
use tracing::{debug, info};
use crate::application::ingestion_service::IngestionService;
use crate::config::{Settings, StorageBackend};
use crate::domain::ports::{BlobFetcher, InventoryQueries};
use crate::infrastructure::{
    http::AppState,
    sqlite::{self, SqliteInventoryQueries, SqliteInventoryStore},
    storage::{GcsFetcher, S3Fetcher},
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub async fn build_fetcher(settings: &Settings) -> Result<Arc<dyn BlobFetcher>, BoxError> {
    info!("Using storage backend: {}", settings.storage_backend);
    let fetcher: Arc<dyn BlobFetcher> = match settings.storage_backend {
        StorageBackend::Gcs => {
            Arc::new(GcsFetcher::new(settings.storage_emulator_host.as_deref()).await?)
        }
        StorageBackend::S3 => {
            Arc::new(S3Fetcher::from_env(settings.aws_endpoint_url.as_deref()).await)
        }
    };
    Ok(fetcher)
}

/// Opens the database and assembles the service and query side around `fetcher`.
pub async fn build_state(
    settings: &Settings,
    fetcher: Arc<dyn BlobFetcher>,
) -> Result<AppState, BoxError> {
    debug!("Connecting to {}", settings.database_url);
    let pool = sqlite::connect(&settings.database_url).await?;

    let store = Arc::new(SqliteInventoryStore::new(pool.clone()));
    let queries: Arc<dyn InventoryQueries> = Arc::new(SqliteInventoryQueries::new(pool));
    let service = Arc::new(IngestionService::new(fetcher, store));
    debug!("Application state assembled");

    Ok(AppState { service, queries })
}

pub async fn sqs_client(settings: &Settings) -> aws_sdk_sqs::Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(endpoint_url) = &settings.aws_endpoint_url {
        info!("Using custom AWS endpoint: {}", endpoint_url);
        loader = loader.endpoint_url(endpoint_url);
    }
    let aws_config = loader.load().await;
    debug!("AWS region: {:?}", aws_config.region());
    aws_sdk_sqs::Client::new(&aws_config)
}
