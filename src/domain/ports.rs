use async_trait::async_trait;
use crate::domain::{
    error::{FetchError, StoreError},
    models::{
        InventoryItem, InventoryPage, NewInventoryItem, NewProduct, PageRequest, Product,
        ProductNameFilter,
    },
};

#[async_trait]
pub trait BlobFetcher: Send + Sync {
    async fn fetch_text(&self, bucket: &str, key: &str) -> Result<String, FetchError>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;
}

/// One open transaction. Lookups see rows inserted earlier in the same unit.
///
/// After `commit` or `rollback` the unit is finished; further calls fail with
/// [`StoreError::Finished`], except `rollback`, which is then a no-op.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn find_product_by_sku(&mut self, sku: &str) -> Result<Option<Product>, StoreError>;

    /// Stages the product and returns it with its generated id, without ending the transaction.
    async fn insert_product(&mut self, product: NewProduct) -> Result<Product, StoreError>;

    async fn find_inventory_item(
        &mut self,
        product_id: i64,
        warehouse_id: i64,
    ) -> Result<Option<InventoryItem>, StoreError>;

    async fn insert_inventory_item(
        &mut self,
        item: NewInventoryItem,
    ) -> Result<InventoryItem, StoreError>;

    async fn update_inventory_item(&mut self, item: &InventoryItem) -> Result<(), StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait InventoryQueries: Send + Sync {
    async fn list_inventory(
        &self,
        filter: Option<&ProductNameFilter>,
        page: PageRequest,
    ) -> Result<InventoryPage, StoreError>;
}
