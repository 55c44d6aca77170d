use std::sync::Arc;
use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use crate::domain::{
    error::ReconciliationError,
    models::{FileToProcess, InventoryRecord, NewInventoryItem, NewProduct, ReconcileReport},
    ports::{BlobFetcher, InventoryStore, UnitOfWork},
};
use crate::infrastructure::parsers::csv_parser::parse_inventory_csv;

/// Brings stored products and inventory items into agreement with a CSV snapshot.
///
/// One file is one unit of work: either every row's effect is committed, or
/// the unit is rolled back and nothing changes.
pub struct CsvReconciler {
    file_fetcher: Arc<dyn BlobFetcher>,
    store: Arc<dyn InventoryStore>,
}

impl CsvReconciler {
    pub fn new(file_fetcher: Arc<dyn BlobFetcher>, store: Arc<dyn InventoryStore>) -> Self {
        Self {
            file_fetcher,
            store,
        }
    }

    pub async fn reconcile(&self, file: &FileToProcess) -> Result<ReconcileReport, ReconciliationError> {
        let run_id = Uuid::new_v4();
        info!(%run_id, "Starting reconciliation of {}/{}", file.bucket, file.filename);

        let mut unit = self.store.begin().await.map_err(|e| {
            error!(%run_id, "Failed to open unit of work: {}", e);
            ReconciliationError::from(e)
        })?;

        match self.run(unit.as_mut(), file).await {
            Ok(report) => {
                info!(
                    %run_id,
                    "✅ Reconciled {}/{} - {} rows, {} products created, {} items created, {} items updated",
                    file.bucket,
                    file.filename,
                    report.rows,
                    report.products_created,
                    report.items_created,
                    report.items_updated
                );
                Ok(report)
            }
            Err(e) => {
                error!(%run_id, "Reconciliation of {}/{} failed: {}", file.bucket, file.filename, e);
                if let Err(rollback_err) = unit.rollback().await {
                    warn!(%run_id, "Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        unit: &mut dyn UnitOfWork,
        file: &FileToProcess,
    ) -> Result<ReconcileReport, ReconciliationError> {
        debug!("Step 1: Fetching {}/{}", file.bucket, file.filename);
        let content = self
            .file_fetcher
            .fetch_text(&file.bucket, &file.filename)
            .await?;
        info!("Fetched file, size: {} bytes", content.len());

        debug!("Step 2: Applying rows");
        let report = apply_csv(unit, &content).await?;

        debug!("Step 3: Committing {} rows", report.rows);
        unit.commit().await?;
        Ok(report)
    }
}

/// Applies every row of `content` to an open unit of work. Does not commit.
pub async fn apply_csv(
    unit: &mut dyn UnitOfWork,
    content: &str,
) -> Result<ReconcileReport, ReconciliationError> {
    let mut report = ReconcileReport::default();
    for record in parse_inventory_csv(content)? {
        apply_record(unit, &record?, &mut report).await?;
        report.rows += 1;
    }
    Ok(report)
}

async fn apply_record(
    unit: &mut dyn UnitOfWork,
    record: &InventoryRecord,
    report: &mut ReconcileReport,
) -> Result<(), ReconciliationError> {
    let now = Utc::now().timestamp();

    let product = match unit.find_product_by_sku(&record.sku).await? {
        Some(product) => product,
        None => {
            debug!("Creating product {}", record.sku);
            report.products_created += 1;
            unit.insert_product(NewProduct::from_record(record, now)).await?
        }
    };

    match unit
        .find_inventory_item(product.id, record.warehouse_id)
        .await?
    {
        Some(mut item) => {
            debug!(
                "Updating inventory item {} ({} @ warehouse {})",
                item.id, record.sku, record.warehouse_id
            );
            item.apply_record(record, now);
            unit.update_inventory_item(&item).await?;
            report.items_updated += 1;
        }
        None => {
            debug!(
                "Creating inventory item for {} @ warehouse {}",
                record.sku, record.warehouse_id
            );
            unit.insert_inventory_item(NewInventoryItem::from_record(product.id, record, now))
                .await?;
            report.items_created += 1;
        }
    }
    Ok(())
}
