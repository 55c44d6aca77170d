//! Google Cloud Storage fetcher.
//!
//! Credentials come from the environment (GOOGLE_APPLICATION_CREDENTIALS or
//! workload identity). When an emulator host is configured the client talks
//! to it anonymously.

use async_trait::async_trait;
use gcloud_storage::client::{Client, ClientConfig};
use gcloud_storage::http::objects::download::Range;
use gcloud_storage::http::objects::get::GetObjectRequest;
use tracing::{debug, error, info};
use crate::domain::{error::FetchError, ports::BlobFetcher};
use super::into_text;

pub struct GcsFetcher {
    client: Client,
}

impl GcsFetcher {
    pub async fn new(emulator_host: Option<&str>) -> Result<Self, FetchError> {
        let config = match emulator_host {
            Some(host) => {
                info!("Using GCS emulator at {}", host);
                let mut config = ClientConfig::default().anonymous();
                config.storage_endpoint = emulator_endpoint(host);
                config
            }
            None => ClientConfig::default().with_auth().await.map_err(|e| {
                error!("GCS auth failed: {}", e);
                FetchError::Transport(format!("GCS auth failed: {}", e))
            })?,
        };

        Ok(Self::with_client(Client::new(config)))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn emulator_endpoint(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", host.trim_end_matches('/'))
    }
}

/// Maps a download failure onto the fetch taxonomy by its rendered status.
fn classify(message: String, bucket: &str, key: &str) -> FetchError {
    if message.contains("404") || message.contains("Not Found") {
        FetchError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    } else if message.contains("403") || message.contains("Forbidden") {
        FetchError::PermissionDenied {
            bucket: bucket.to_string(),
            key: key.to_string(),
            cause: message,
        }
    } else {
        FetchError::Transport(format!("GCS download failed: {}", message))
    }
}

#[async_trait]
impl BlobFetcher for GcsFetcher {
    async fn fetch_text(&self, bucket: &str, key: &str) -> Result<String, FetchError> {
        debug!("Downloading gs://{}/{}", bucket, key);
        let bytes = self
            .client
            .download_object(
                &GetObjectRequest {
                    bucket: bucket.to_string(),
                    object: key.to_string(),
                    ..Default::default()
                },
                &Range::default(),
            )
            .await
            .map_err(|e| {
                error!("Failed to download gs://{}/{}: {}", bucket, key, e);
                classify(e.to_string(), bucket, key)
            })?;

        debug!("Downloaded {} bytes from gs://{}/{}", bytes.len(), bucket, key);
        into_text(bytes, bucket, key)
    }
}
