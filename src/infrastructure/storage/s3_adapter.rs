use async_trait::async_trait;
use aws_sdk_s3::{error::DisplayErrorContext, Client};
use tracing::{debug, error};
use crate::domain::{error::FetchError, ports::BlobFetcher};
use super::into_text;

pub struct S3Fetcher {
    client: Client,
}

impl S3Fetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the ambient AWS configuration. A custom endpoint
    /// (LocalStack, MinIO) switches to path-style addressing.
    pub async fn from_env(endpoint_url: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(endpoint_url) = endpoint_url {
            debug!("Using custom S3 endpoint: {}", endpoint_url);
            loader = loader.endpoint_url(endpoint_url);
        }
        let aws_config = loader.load().await;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&aws_config);
        if endpoint_url.is_some() {
            s3_config = s3_config.force_path_style(true);
        }
        Self::new(Client::from_conf(s3_config.build()))
    }
}

fn classify(message: String, bucket: &str, key: &str) -> FetchError {
    if message.contains("NoSuchKey") || message.contains("404") {
        FetchError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    } else if message.contains("AccessDenied") || message.contains("403") {
        FetchError::PermissionDenied {
            bucket: bucket.to_string(),
            key: key.to_string(),
            cause: message,
        }
    } else {
        FetchError::Transport(format!("S3 download failed: {}", message))
    }
}

#[async_trait]
impl BlobFetcher for S3Fetcher {
    async fn fetch_text(&self, bucket: &str, key: &str) -> Result<String, FetchError> {
        debug!("Step 1: Fetching s3://{}/{}", bucket, key);
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                error!("Failed to get s3://{}/{}: {}", bucket, key, message);
                classify(message, bucket, key)
            })?;

        debug!("Step 2: Reading object body");
        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| {
                error!("Failed to read body of s3://{}/{}: {}", bucket, key, e);
                FetchError::Transport(format!("S3 body read failed: {}", e))
            })?
            .into_bytes()
            .to_vec();

        debug!("Step 3: Read {} bytes", bytes.len());
        into_text(bytes, bucket, key)
    }
}
