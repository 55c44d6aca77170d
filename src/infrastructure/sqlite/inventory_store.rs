use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{pool::PoolConnection, sqlite::SqliteRow, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::{debug, error, warn};
use crate::domain::{
    error::StoreError,
    models::{InventoryItem, NewInventoryItem, NewProduct, Product},
    ports::{InventoryStore, UnitOfWork},
};

pub(crate) const PRODUCT_COLUMNS: &str = "id, manufacturer_id, name, description, sku, unit_price, storage_conditions, delivery_time, created_at, updated_at";
pub(crate) const ITEM_COLUMNS: &str = "id, product_id, warehouse_id, quantity, location, expiry_date, created_at, updated_at";

pub struct SqliteInventoryStore {
    pool: SqlitePool,
}

impl SqliteInventoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for SqliteInventoryStore {
    /// Takes the write lock up front with `BEGIN IMMEDIATE`; a deferred
    /// transaction that read before another unit committed could never
    /// upgrade to a writer.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            error!("Failed to acquire connection: {}", e);
            StoreError::from(e)
        })?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                error!("Failed to begin transaction: {}", e);
                StoreError::from(e)
            })?;
        debug!("Transaction started");
        Ok(Box::new(SqliteUnitOfWork { conn: Some(conn) }))
    }
}

/// A connection holding an open `BEGIN IMMEDIATE` transaction.
///
/// Dropping it unfinished rolls the transaction back before the connection
/// goes back to the pool.
pub struct SqliteUnitOfWork {
    conn: Option<PoolConnection<Sqlite>>,
}

impl SqliteUnitOfWork {
    fn conn(&mut self) -> Result<&mut PoolConnection<Sqlite>, StoreError> {
        self.conn.as_mut().ok_or(StoreError::Finished)
    }

    /// Ends the transaction with `statement`. A connection whose transaction
    /// could not be ended is closed instead of being reused.
    async fn finish(&mut self, statement: &'static str) -> Result<bool, StoreError> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(false);
        };
        if let Err(e) = sqlx::query(statement).execute(&mut *conn).await {
            error!("{} failed: {}", statement, e);
            if statement == "COMMIT" {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
            }
            conn.close_on_drop();
            return Err(e.into());
        }
        Ok(true)
    }
}

impl Drop for SqliteUnitOfWork {
    fn drop(&mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };
        warn!("Unit of work dropped unfinished, rolling back");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                        error!("Rollback of dropped unit failed: {}", e);
                        conn.close_on_drop();
                    }
                });
            }
            Err(_) => conn.close_on_drop(),
        }
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    async fn find_product_by_sku(&mut self, sku: &str) -> Result<Option<Product>, StoreError> {
        let conn = self.conn()?;
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?"))
            .bind(sku)
            .fetch_optional(&mut **conn)
            .await?;
        row.as_ref().map(|row| product_from_row(row, "")).transpose()
    }

    async fn insert_product(&mut self, product: NewProduct) -> Result<Product, StoreError> {
        let conn = self.conn()?;
        let result = sqlx::query(
            r#"
            INSERT INTO products
                (manufacturer_id, name, description, sku, unit_price, storage_conditions,
                 delivery_time, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(product.manufacturer_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.sku)
        .bind(product.unit_price.to_string())
        .bind(&product.storage_conditions)
        .bind(product.delivery_time)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut **conn)
        .await
        .map_err(|e| {
            error!("Failed to insert product {}: {}", product.sku, e);
            e
        })?;

        Ok(Product {
            id: result.last_insert_rowid(),
            manufacturer_id: product.manufacturer_id,
            name: product.name,
            description: product.description,
            sku: product.sku,
            unit_price: product.unit_price,
            storage_conditions: product.storage_conditions,
            delivery_time: product.delivery_time,
            created_at: product.created_at,
            updated_at: product.updated_at,
        })
    }

    async fn find_inventory_item(
        &mut self,
        product_id: i64,
        warehouse_id: i64,
    ) -> Result<Option<InventoryItem>, StoreError> {
        let conn = self.conn()?;
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE product_id = ? AND warehouse_id = ?"
        ))
        .bind(product_id)
        .bind(warehouse_id)
        .fetch_optional(&mut **conn)
        .await?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn insert_inventory_item(
        &mut self,
        item: NewInventoryItem,
    ) -> Result<InventoryItem, StoreError> {
        let conn = self.conn()?;
        let result = sqlx::query(
            r#"
            INSERT INTO inventory_items
                (product_id, warehouse_id, quantity, location, expiry_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.product_id)
        .bind(item.warehouse_id)
        .bind(item.quantity)
        .bind(&item.location)
        .bind(item.expiry_date)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut **conn)
        .await
        .map_err(|e| {
            error!(
                "Failed to insert inventory item for product {} @ warehouse {}: {}",
                item.product_id, item.warehouse_id, e
            );
            e
        })?;

        Ok(InventoryItem {
            id: result.last_insert_rowid(),
            product_id: item.product_id,
            warehouse_id: item.warehouse_id,
            quantity: item.quantity,
            location: item.location,
            expiry_date: item.expiry_date,
            created_at: item.created_at,
            updated_at: item.updated_at,
        })
    }

    async fn update_inventory_item(&mut self, item: &InventoryItem) -> Result<(), StoreError> {
        let conn = self.conn()?;
        sqlx::query(
            "UPDATE inventory_items SET quantity = ?, location = ?, expiry_date = ?, updated_at = ? WHERE id = ?",
        )
        .bind(item.quantity)
        .bind(&item.location)
        .bind(item.expiry_date)
        .bind(item.updated_at)
        .bind(item.id)
        .execute(&mut **conn)
        .await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        if !self.finish("COMMIT").await? {
            return Err(StoreError::Finished);
        }
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        if self.finish("ROLLBACK").await? {
            debug!("Transaction rolled back");
        } else {
            debug!("Rollback requested after the transaction finished");
        }
        Ok(())
    }
}

/// Reads a product from `row`, whose product columns may carry a `prefix` (for joins).
pub(crate) fn product_from_row(row: &SqliteRow, prefix: &str) -> Result<Product, StoreError> {
    let column = |name: &str| format!("{prefix}{name}");
    let unit_price: String = row.try_get(column("unit_price").as_str())?;
    Ok(Product {
        id: row.try_get(column("id").as_str())?,
        manufacturer_id: row.try_get(column("manufacturer_id").as_str())?,
        name: row.try_get(column("name").as_str())?,
        description: row.try_get(column("description").as_str())?,
        sku: row.try_get(column("sku").as_str())?,
        unit_price: Decimal::from_str(&unit_price)
            .map_err(|e| StoreError::Corrupt(format!("unit_price '{}': {}", unit_price, e)))?,
        storage_conditions: row.try_get(column("storage_conditions").as_str())?,
        delivery_time: row.try_get(column("delivery_time").as_str())?,
        created_at: row.try_get(column("created_at").as_str())?,
        updated_at: row.try_get(column("updated_at").as_str())?,
    })
}

pub(crate) fn item_from_row(row: &SqliteRow) -> Result<InventoryItem, StoreError> {
    Ok(InventoryItem {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        warehouse_id: row.try_get("warehouse_id")?,
        quantity: row.try_get("quantity")?,
        location: row.try_get("location")?,
        expiry_date: row.try_get("expiry_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
