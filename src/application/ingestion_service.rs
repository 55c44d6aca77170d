use std::sync::Arc;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use crate::application::{csv_reconciler::CsvReconciler, message_decoder::decode_envelope};
use crate::domain::{
    error::{DecodeError, ReconciliationError},
    models::{FileToProcess, ReconcileReport},
    ports::{BlobFetcher, InventoryStore},
};

/// Outcome classification shared by every trigger (HTTP push, SQS pull).
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Reconcile(#[from] ReconciliationError),
    #[error("{0}")]
    Unexpected(String),
}

pub struct IngestionService {
    reconciler: CsvReconciler,
}

impl IngestionService {
    pub fn new(file_fetcher: Arc<dyn BlobFetcher>, store: Arc<dyn InventoryStore>) -> Self {
        Self {
            reconciler: CsvReconciler::new(file_fetcher, store),
        }
    }

    /// Handles a raw request/message body: empty means no envelope, non-JSON is unexpected.
    pub async fn handle_body(&self, body: &[u8]) -> Result<ReconcileReport, TriggerError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            debug!("Received empty body");
            return self.handle_envelope(None).await;
        }

        let envelope: Value = serde_json::from_slice(body).map_err(|e| {
            error!("Failed to parse envelope JSON: {}", e);
            TriggerError::Unexpected(e.to_string())
        })?;
        self.handle_envelope(Some(&envelope)).await
    }

    pub async fn handle_envelope(&self, envelope: Option<&Value>) -> Result<ReconcileReport, TriggerError> {
        debug!("Decoding notification envelope");
        let file = decode_envelope(envelope).map_err(|e| {
            warn!("Rejected envelope: {}", e);
            e
        })?;
        info!("Processing file: {}/{}", file.bucket, file.filename);

        Ok(self.process_file(&file).await?)
    }

    pub async fn process_file(&self, file: &FileToProcess) -> Result<ReconcileReport, ReconciliationError> {
        self.reconciler.reconcile(file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::csv_reconciler::tests::{RecordingStore, StubFetcher, SAMPLE_CSV};
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde_json::json;

    fn body_for(payload: Value) -> Vec<u8> {
        json!({"message": {"data": STANDARD.encode(payload.to_string())}})
            .to_string()
            .into_bytes()
    }

    fn service(fetcher: StubFetcher) -> (IngestionService, Arc<RecordingStore>) {
        let store = Arc::new(RecordingStore::default());
        (IngestionService::new(Arc::new(fetcher), store.clone()), store)
    }

    #[tokio::test]
    async fn reconciles_decoded_file() {
        let (service, store) = service(StubFetcher::ok(SAMPLE_CSV));
        let body = body_for(json!({"bucket": "test-bucket", "filename": "test-file.csv"}));

        let report = service.handle_body(&body).await.unwrap();
        assert_eq!(report.rows, 2);
        assert_eq!(store.state.lock().unwrap().commits, 1);
    }

    #[tokio::test]
    async fn empty_body_is_missing_message() {
        let (service, store) = service(StubFetcher::ok(SAMPLE_CSV));
        let err = service.handle_body(b"  ").await.unwrap_err();

        assert!(matches!(err, TriggerError::Decode(DecodeError::MissingMessage)));
        assert_eq!(store.state.lock().unwrap().commits, 0);
    }

    #[tokio::test]
    async fn non_json_body_is_unexpected() {
        let (service, _) = service(StubFetcher::ok(SAMPLE_CSV));
        let err = service.handle_body(b"<xml/>").await.unwrap_err();
        assert!(matches!(err, TriggerError::Unexpected(_)));
    }

    #[tokio::test]
    async fn decode_errors_never_touch_the_store() {
        let (service, store) = service(StubFetcher::ok(SAMPLE_CSV));
        let body = body_for(json!({"filename": "f.csv"}));

        let err = service.handle_body(&body).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: bucket");
        let state = store.state.lock().unwrap();
        assert_eq!(state.commits + state.rollbacks, 0);
    }

    #[tokio::test]
    async fn reconcile_failures_are_classified() {
        let (service, _) = service(StubFetcher::failing("boom"));
        let body = body_for(json!({"bucket": "b", "filename": "f.csv"}));

        let err = service.handle_body(&body).await.unwrap_err();
        assert!(matches!(err, TriggerError::Reconcile(_)));
        assert_eq!(err.to_string(), "Error procesando el archivo: boom");
    }
}
