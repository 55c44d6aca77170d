//! Inventory CSV ingestion.
//!
//! A storage notification names an uploaded CSV; the file is fetched and its
//! rows are reconciled into products and per-warehouse inventory items inside
//! a single transaction. Triggers arrive over HTTP (push) or from an SQS queue
//! (pull).

pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod sqs_worker;
