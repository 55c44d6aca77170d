//! Relational schema for the inventory database.
//!
//! Every statement is idempotent, so [`init_schema`] runs on each startup.
//! Timestamps are integer seconds since the epoch and are always supplied by
//! the caller; no column defaults to "now".

use sqlx::SqlitePool;
use tracing::debug;
use crate::domain::error::StoreError;

pub const CREATE_MANUFACTURERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS manufacturers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    contact_person TEXT,
    email TEXT NOT NULL,
    phone TEXT,
    address TEXT,
    country TEXT NOT NULL,
    payment_terms TEXT,
    delivery_conditions TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)
"#;

pub const CREATE_WAREHOUSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS warehouses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    address TEXT NOT NULL,
    country TEXT NOT NULL,
    capacity INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)
"#;

/// `unit_price` is kept as text with exactly two fractional digits.
pub const CREATE_PRODUCTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    manufacturer_id INTEGER NOT NULL REFERENCES manufacturers(id),
    name TEXT NOT NULL,
    description TEXT,
    sku TEXT NOT NULL UNIQUE,
    unit_price TEXT NOT NULL,
    storage_conditions TEXT,
    delivery_time INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)
"#;

pub const CREATE_INVENTORY_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS inventory_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id INTEGER NOT NULL REFERENCES products(id),
    warehouse_id INTEGER NOT NULL REFERENCES warehouses(id) ON DELETE CASCADE,
    quantity INTEGER NOT NULL CHECK (quantity >= 0),
    location TEXT,
    expiry_date INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE (product_id, warehouse_id)
)
"#;

pub const CREATE_INVENTORY_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS inventory_transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    inventory_item_id INTEGER NOT NULL REFERENCES inventory_items(id) ON DELETE CASCADE,
    transaction_type TEXT NOT NULL,
    quantity INTEGER NOT NULL,
    from_warehouse_id INTEGER,
    to_warehouse_id INTEGER,
    transaction_date INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    notes TEXT
)
"#;

pub const CREATE_PRODUCT_IMAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS product_images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id INTEGER NOT NULL REFERENCES products(id),
    image_url TEXT NOT NULL,
    is_primary INTEGER NOT NULL,
    created_at INTEGER NOT NULL
)
"#;

pub const CREATE_PRODUCT_COUNTRY_REGULATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS product_country_regulations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id INTEGER NOT NULL REFERENCES products(id),
    country TEXT NOT NULL,
    tax_rate TEXT NOT NULL,
    legal_restrictions TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)
"#;

const SCHEMA: [&str; 7] = [
    CREATE_MANUFACTURERS_TABLE,
    CREATE_WAREHOUSES_TABLE,
    CREATE_PRODUCTS_TABLE,
    CREATE_INVENTORY_ITEMS_TABLE,
    CREATE_INVENTORY_TRANSACTIONS_TABLE,
    CREATE_PRODUCT_IMAGES_TABLE,
    CREATE_PRODUCT_COUNTRY_REGULATIONS_TABLE,
];

const INDEXES: [&str; 2] = [
    "CREATE INDEX IF NOT EXISTS idx_products_name ON products(name)",
    "CREATE INDEX IF NOT EXISTS idx_inventory_items_product_id ON inventory_items(product_id)",
];

pub async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in SCHEMA.iter().chain(INDEXES.iter()) {
        sqlx::query(statement).execute(pool).await?;
    }
    debug!("Inventory schema is up to date");
    Ok(())
}
