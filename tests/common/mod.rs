#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use inventory_ingestion::domain::{error::FetchError, ports::BlobFetcher};
use inventory_ingestion::infrastructure::sqlite::connect;
use serde_json::{json, Value};
use sqlx::SqlitePool;

pub const HEADER: &str = "sku,manufacturer_id,name,description,unit_price,storage_conditions,delivery_time,warehouse_id,quantity,location,expiry_date";

pub fn csv(rows: &[&str]) -> String {
    let mut content = String::from(HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    content
}

/// Serves objects from memory; unknown keys are reported as not found.
#[derive(Default)]
pub struct MemoryBucket {
    objects: Mutex<HashMap<(String, String), String>>,
}

impl MemoryBucket {
    pub fn put(&self, bucket: &str, key: &str, content: impl Into<String>) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), content.into());
    }
}

#[async_trait]
impl BlobFetcher for MemoryBucket {
    async fn fetch_text(&self, bucket: &str, key: &str) -> Result<String, FetchError> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

/// In-memory database with manufacturers 1-2 and warehouses 1-2.
pub async fn seeded_pool() -> SqlitePool {
    let pool = connect("sqlite::memory:").await.unwrap();
    for id in 1..=2 {
        sqlx::query("INSERT INTO manufacturers (id, name, email, country, created_at, updated_at) VALUES (?, ?, ?, 'ES', 0, 0)")
            .bind(id)
            .bind(format!("Manufacturer {}", id))
            .bind(format!("m{}@example.com", id))
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO warehouses (id, name, address, country, capacity, created_at, updated_at) VALUES (?, ?, 'Street 1', 'ES', 1000, 0, 0)")
            .bind(id)
            .bind(format!("Warehouse {}", id))
            .execute(&pool)
            .await
            .unwrap();
    }
    pool
}

pub fn envelope(bucket: &str, filename: &str) -> Value {
    let payload = json!({"bucket": bucket, "filename": filename});
    json!({"message": {"data": STANDARD.encode(payload.to_string())}})
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn quantity(pool: &SqlitePool, sku: &str, warehouse_id: i64) -> Option<i64> {
    sqlx::query_scalar(
        "SELECT i.quantity FROM inventory_items i JOIN products p ON p.id = i.product_id WHERE p.sku = ? AND i.warehouse_id = ?",
    )
    .bind(sku)
    .bind(warehouse_id)
    .fetch_optional(pool)
    .await
    .unwrap()
}
