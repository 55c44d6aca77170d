use std::sync::Arc;
use aws_sdk_sqs::Client as SqsClient;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use crate::application::ingestion_service::{IngestionService, TriggerError};
use crate::domain::models::ReconcileReport;

/// What happens to a queue message once it has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Delete,
    /// Left in flight; the queue's redrive policy decides on redelivery.
    Keep,
}

/// Successes and client-caused decode failures are deleted; decode failures
/// would never succeed on redelivery.
pub fn disposition(outcome: &Result<ReconcileReport, TriggerError>) -> Disposition {
    match outcome {
        Ok(_) | Err(TriggerError::Decode(_)) => Disposition::Delete,
        Err(TriggerError::Reconcile(_)) | Err(TriggerError::Unexpected(_)) => Disposition::Keep,
    }
}

pub struct SqsWorker {
    service: Arc<IngestionService>,
    sqs_client: SqsClient,
    queue_url: String,
}

impl SqsWorker {
    pub fn new(service: Arc<IngestionService>, sqs_client: SqsClient, queue_url: String) -> Self {
        Self {
            service,
            sqs_client,
            queue_url,
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Starting SQS worker, polling queue: {}", self.queue_url);

        let mut poll_count: u64 = 0;
        loop {
            poll_count += 1;
            debug!("Polling SQS queue (attempt {})", poll_count);

            let response = self
                .sqs_client
                .receive_message()
                .queue_url(&self.queue_url)
                .max_number_of_messages(10)
                .wait_time_seconds(20)
                .send()
                .await
                .map_err(|e| {
                    error!("Failed to receive messages from SQS: {}", e);
                    e
                })?;

            let Some(messages) = response.messages else {
                debug!("No messages received from SQS");
                continue;
            };
            info!("Received {} messages from SQS", messages.len());

            for (i, message) in messages.iter().enumerate() {
                debug!("Processing message {} of {}", i + 1, messages.len());
                let outcome = self.process_message(message.body.as_deref()).await;

                match disposition(&outcome) {
                    Disposition::Keep => {
                        warn!("Leaving message {} in the queue for redelivery", i + 1);
                    }
                    Disposition::Delete => {
                        if let Some(receipt_handle) = &message.receipt_handle {
                            self.sqs_client
                                .delete_message()
                                .queue_url(&self.queue_url)
                                .receipt_handle(receipt_handle)
                                .send()
                                .await
                                .map_err(|e| {
                                    error!("Failed to delete message from SQS: {}", e);
                                    e
                                })?;
                            debug!("Message {} deleted from queue", i + 1);
                        }
                    }
                }
            }
        }
    }

    /// A body that is missing or not JSON is treated as an absent envelope.
    pub async fn process_message(&self, body: Option<&str>) -> Result<ReconcileReport, TriggerError> {
        let envelope = body.and_then(|body| {
            serde_json::from_str::<Value>(body)
                .map_err(|e| {
                    warn!("Message body is not JSON: {}", e);
                    e
                })
                .ok()
        });

        let outcome = self.service.handle_envelope(envelope.as_ref()).await;
        match &outcome {
            Ok(report) => info!("Processed message: {} rows", report.rows),
            Err(e) => error!("Failed to process message: {}", e),
        }
        outcome
    }
}
