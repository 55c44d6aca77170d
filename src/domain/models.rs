use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Instruction decoded from a notification envelope: which object to reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileToProcess {
    pub bucket: String,
    pub filename: String,
}

/// One typed CSV row. Produced by the CSV parser, consumed by the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRecord {
    pub sku: String,
    pub manufacturer_id: i64,
    pub name: String,
    pub description: String,
    pub unit_price: Decimal,
    pub storage_conditions: String,
    pub delivery_time: i64,
    pub warehouse_id: i64,
    pub quantity: i64,
    pub location: String,
    pub expiry_date: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub manufacturer_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub storage_conditions: Option<String>,
    pub delivery_time: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A product that has not been stored yet. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub manufacturer_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub unit_price: Decimal,
    pub storage_conditions: Option<String>,
    pub delivery_time: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl NewProduct {
    pub fn from_record(record: &InventoryRecord, now: i64) -> Self {
        Self {
            manufacturer_id: record.manufacturer_id,
            name: record.name.clone(),
            description: Some(record.description.clone()),
            sku: record.sku.clone(),
            unit_price: record.unit_price,
            storage_conditions: Some(record.storage_conditions.clone()),
            delivery_time: Some(record.delivery_time),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub product_id: i64,
    pub warehouse_id: i64,
    pub quantity: i64,
    pub location: Option<String>,
    pub expiry_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl InventoryItem {
    /// Overwrites the snapshot fields from a CSV row. Quantity is replaced, not added to.
    pub fn apply_record(&mut self, record: &InventoryRecord, now: i64) {
        self.quantity = record.quantity;
        self.location = Some(record.location.clone());
        self.expiry_date = Some(record.expiry_date);
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInventoryItem {
    pub product_id: i64,
    pub warehouse_id: i64,
    pub quantity: i64,
    pub location: Option<String>,
    pub expiry_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl NewInventoryItem {
    pub fn from_record(product_id: i64, record: &InventoryRecord, now: i64) -> Self {
        Self {
            product_id,
            warehouse_id: record.warehouse_id,
            quantity: record.quantity,
            location: Some(record.location.clone()),
            expiry_date: Some(record.expiry_date),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Counters returned by a successful reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub rows: usize,
    pub products_created: usize,
    pub items_created: usize,
    pub items_updated: usize,
}

impl ReconcileReport {
    pub const SUCCESS_MESSAGE: &'static str = "Archivo procesado exitosamente";

    pub fn message(&self) -> &'static str {
        Self::SUCCESS_MESSAGE
    }
}

/// Closed set of product-name filters accepted by the inventory queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductNameFilter {
    Exact(String),
    /// Case-insensitive substring match.
    Contains(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: i64 = 250;

    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset: offset.max(0),
            limit: limit.max(0),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_LIMIT)
    }
}

/// An inventory item joined with its product.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryListing {
    pub item: InventoryItem,
    pub product: Product,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InventoryPage {
    pub listings: Vec<InventoryListing>,
    pub total: i64,
}
