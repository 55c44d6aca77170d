pub mod csv_reconciler;
pub mod ingestion_service;
pub mod message_decoder;
