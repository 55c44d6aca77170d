use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;
use crate::domain::{
    error::StoreError,
    models::{InventoryListing, InventoryPage, PageRequest, ProductNameFilter},
    ports::InventoryQueries,
};
use super::inventory_store::{item_from_row, product_from_row};

const LISTING_SELECT: &str = r#"
SELECT i.id, i.product_id, i.warehouse_id, i.quantity, i.location, i.expiry_date,
       i.created_at, i.updated_at,
       p.id AS p_id, p.manufacturer_id AS p_manufacturer_id, p.name AS p_name,
       p.description AS p_description, p.sku AS p_sku, p.unit_price AS p_unit_price,
       p.storage_conditions AS p_storage_conditions, p.delivery_time AS p_delivery_time,
       p.created_at AS p_created_at, p.updated_at AS p_updated_at
FROM inventory_items i
JOIN products p ON p.id = i.product_id
"#;

const LISTING_COUNT: &str = "SELECT COUNT(*) FROM inventory_items i JOIN products p ON p.id = i.product_id";

pub struct SqliteInventoryQueries {
    pool: SqlitePool,
}

impl SqliteInventoryQueries {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// WHERE clause and its single bound argument for a name filter.
fn filter_clause(filter: Option<&ProductNameFilter>) -> (&'static str, Option<String>) {
    match filter {
        None => ("", None),
        Some(ProductNameFilter::Exact(name)) => (" WHERE p.name = ?", Some(name.clone())),
        Some(ProductNameFilter::Contains(fragment)) => (
            " WHERE p.name LIKE ? ESCAPE '\\'",
            Some(format!("%{}%", escape_like(fragment))),
        ),
    }
}

fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl InventoryQueries for SqliteInventoryQueries {
    async fn list_inventory(
        &self,
        filter: Option<&ProductNameFilter>,
        page: PageRequest,
    ) -> Result<InventoryPage, StoreError> {
        let (clause, argument) = filter_clause(filter);
        debug!(?filter, offset = page.offset, limit = page.limit, "Listing inventory");

        let count_sql = format!("{LISTING_COUNT}{clause}");
        let mut count = sqlx::query_scalar::<Sqlite, i64>(&count_sql);
        if let Some(argument) = &argument {
            count = count.bind(argument);
        }
        let total = count.fetch_one(&self.pool).await?;

        let select_sql = format!("{LISTING_SELECT}{clause} ORDER BY i.id LIMIT ? OFFSET ?");
        let mut select = sqlx::query::<Sqlite>(&select_sql);
        if let Some(argument) = &argument {
            select = select.bind(argument);
        }
        let rows = select
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        let listings = rows
            .iter()
            .map(|row| {
                Ok(InventoryListing {
                    item: item_from_row(row)?,
                    product: product_from_row(row, "p_")?,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(InventoryPage { listings, total })
    }
}
