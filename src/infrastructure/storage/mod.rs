pub mod gcs_adapter;
pub mod s3_adapter;

pub use gcs_adapter::GcsFetcher;
pub use s3_adapter::S3Fetcher;

use crate::domain::error::FetchError;

/// Turns downloaded bytes into text, reporting the object on invalid UTF-8.
pub(crate) fn into_text(bytes: Vec<u8>, bucket: &str, key: &str) -> Result<String, FetchError> {
    String::from_utf8(bytes).map_err(|_| FetchError::InvalidText {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}
