mod common;

use std::sync::Arc;
use common::{count, csv, quantity, seeded_pool, MemoryBucket};
use inventory_ingestion::application::csv_reconciler::CsvReconciler;
use inventory_ingestion::domain::{
    error::{FetchError, ReconciliationError},
    models::FileToProcess,
};
use inventory_ingestion::infrastructure::sqlite::SqliteInventoryStore;
use sqlx::SqlitePool;

fn file(name: &str) -> FileToProcess {
    FileToProcess {
        bucket: "uploads".to_string(),
        filename: name.to_string(),
    }
}

async fn reconciler_with(objects: &[(&str, String)]) -> (CsvReconciler, SqlitePool) {
    let pool = seeded_pool().await;
    let bucket = MemoryBucket::default();
    for (key, content) in objects {
        bucket.put("uploads", key, content.clone());
    }
    let reconciler = CsvReconciler::new(
        Arc::new(bucket),
        Arc::new(SqliteInventoryStore::new(pool.clone())),
    );
    (reconciler, pool)
}

#[tokio::test]
async fn two_new_rows_create_products_and_items() {
    let content = csv(&[
        "SKU123,1,Test Product,This is a test product,10.99,Cool and dry,5,1,100,A1,1714974947",
        "SKU456,2,Another Product,This is another test product,20.50,Refrigerated,3,2,50,B2,1746510947",
    ]);
    let (reconciler, pool) = reconciler_with(&[("stock.csv", content)]).await;

    let report = reconciler.reconcile(&file("stock.csv")).await.unwrap();
    assert_eq!(report.message(), "Archivo procesado exitosamente");
    assert_eq!((report.products_created, report.items_created), (2, 2));

    assert_eq!(count(&pool, "products").await, 2);
    assert_eq!(count(&pool, "inventory_items").await, 2);
    assert_eq!(quantity(&pool, "SKU456", 2).await, Some(50));

    let price: String = sqlx::query_scalar("SELECT unit_price FROM products WHERE sku = 'SKU456'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(price, "20.50");
}

#[tokio::test]
async fn reprocessing_the_same_file_is_idempotent() {
    let content = csv(&[
        "SKU123,1,Test Product,desc,10.99,Cool,5,1,100,A1,1714974947",
        "SKU456,2,Another Product,desc,20.50,Cold,3,2,50,B2,1746510947",
    ]);
    let (reconciler, pool) = reconciler_with(&[("stock.csv", content)]).await;

    reconciler.reconcile(&file("stock.csv")).await.unwrap();
    let second = reconciler.reconcile(&file("stock.csv")).await.unwrap();

    assert_eq!((second.products_created, second.items_created, second.items_updated), (0, 0, 2));
    assert_eq!(count(&pool, "products").await, 2);
    assert_eq!(count(&pool, "inventory_items").await, 2);
    assert_eq!(quantity(&pool, "SKU123", 1).await, Some(100));
}

#[tokio::test]
async fn quantities_are_overwritten_and_products_kept() {
    let first = csv(&["SKU123,1,Original Name,desc,10.99,Cool,5,1,100,A1,1714974947"]);
    let second = csv(&["SKU123,1,Renamed,other,99.99,Warm,9,1,7,Z9,1800000000"]);
    let (reconciler, pool) =
        reconciler_with(&[("day1.csv", first), ("day2.csv", second)]).await;

    reconciler.reconcile(&file("day1.csv")).await.unwrap();
    reconciler.reconcile(&file("day2.csv")).await.unwrap();

    assert_eq!(quantity(&pool, "SKU123", 1).await, Some(7));
    let (name, price): (String, String) =
        sqlx::query_as("SELECT name, unit_price FROM products WHERE sku = 'SKU123'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(name, "Original Name");
    assert_eq!(price, "10.99");
    let location: String = sqlx::query_scalar("SELECT location FROM inventory_items")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(location, "Z9");
}

#[tokio::test]
async fn repeated_sku_in_one_file_shares_the_staged_product() {
    let content = csv(&[
        "SKU123,1,Test Product,desc,10.99,Cool,5,1,100,A1,1714974947",
        "SKU123,1,Test Product,desc,10.99,Cool,5,2,30,C3,1714974947",
    ]);
    let (reconciler, pool) = reconciler_with(&[("stock.csv", content)]).await;

    let report = reconciler.reconcile(&file("stock.csv")).await.unwrap();
    assert_eq!(report.products_created, 1);
    assert_eq!(count(&pool, "products").await, 1);
    assert_eq!(count(&pool, "inventory_items").await, 2);
    assert_eq!(quantity(&pool, "SKU123", 2).await, Some(30));
}

#[tokio::test]
async fn a_bad_row_rolls_back_the_whole_file() {
    let content = csv(&[
        "SKU123,1,Test Product,desc,10.99,Cool,5,1,100,A1,1714974947",
        "SKU456,2,Another Product,desc,abc,Cold,3,2,50,B2,1746510947",
    ]);
    let (reconciler, pool) = reconciler_with(&[("stock.csv", content)]).await;

    let err = reconciler.reconcile(&file("stock.csv")).await.unwrap_err();
    assert!(matches!(err, ReconciliationError::Parse(_)));
    assert_eq!(
        err.to_string(),
        "Error procesando el archivo: row 2: invalid unit_price 'abc'"
    );
    assert_eq!(count(&pool, "products").await, 0);
    assert_eq!(count(&pool, "inventory_items").await, 0);
}

#[tokio::test]
async fn unknown_warehouse_rolls_back_earlier_rows() {
    let content = csv(&[
        "SKU123,1,Test Product,desc,10.99,Cool,5,1,100,A1,1714974947",
        "SKU456,2,Another Product,desc,20.50,Cold,3,42,50,B2,1746510947",
    ]);
    let (reconciler, pool) = reconciler_with(&[("stock.csv", content)]).await;

    let err = reconciler.reconcile(&file("stock.csv")).await.unwrap_err();
    assert!(matches!(err, ReconciliationError::Store(_)));
    assert!(err.cause().contains("FOREIGN KEY"));
    assert_eq!(count(&pool, "products").await, 0);
}

#[tokio::test]
async fn missing_object_reports_the_fetch_cause() {
    let (reconciler, pool) = reconciler_with(&[]).await;

    let err = reconciler.reconcile(&file("absent.csv")).await.unwrap_err();
    assert!(matches!(err, ReconciliationError::Fetch(FetchError::NotFound { .. })));
    assert_eq!(
        err.to_string(),
        "Error procesando el archivo: object uploads/absent.csv not found"
    );
    assert_eq!(count(&pool, "products").await, 0);
}

#[tokio::test]
async fn existing_data_survives_a_failed_file() {
    let good = csv(&["SKU123,1,Test Product,desc,10.99,Cool,5,1,100,A1,1714974947"]);
    let bad = csv(&[
        "SKU123,1,Test Product,desc,10.99,Cool,5,1,1,A1,1714974947",
        "SKU999,1,Broken,desc,1.00,Cool,5,1,-3,A1,1714974947",
    ]);
    let (reconciler, pool) = reconciler_with(&[("good.csv", good), ("bad.csv", bad)]).await;

    reconciler.reconcile(&file("good.csv")).await.unwrap();
    reconciler.reconcile(&file("bad.csv")).await.unwrap_err();

    assert_eq!(quantity(&pool, "SKU123", 1).await, Some(100));
    assert_eq!(count(&pool, "products").await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_files_on_a_file_database_all_commit() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("inventory.db").display());
    let pool = inventory_ingestion::infrastructure::sqlite::connect(&url).await.unwrap();
    for id in 1..=2 {
        sqlx::query("INSERT INTO manufacturers (id, name, email, country, created_at, updated_at) VALUES (?, 'M', 'm@example.com', 'ES', 0, 0)")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO warehouses (id, name, address, country, capacity, created_at, updated_at) VALUES (?, 'W', 'Street 1', 'ES', 1000, 0, 0)")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
    }

    let bucket = MemoryBucket::default();
    for f in 0..4 {
        let rows: Vec<String> = (0..200)
            .map(|r| format!("F{f}-SKU{r},1,Product {f}-{r},desc,1.50,Cool,2,{},{r},A1,1714974947", 1 + r % 2))
            .collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        bucket.put("uploads", &format!("file{f}.csv"), csv(&rows));
    }
    let reconciler = Arc::new(CsvReconciler::new(
        Arc::new(bucket),
        Arc::new(SqliteInventoryStore::new(pool.clone())),
    ));

    let handles: Vec<_> = (0..4)
        .map(|f| {
            let reconciler = reconciler.clone();
            tokio::spawn(async move { reconciler.reconcile(&file(&format!("file{f}.csv"))).await })
        })
        .collect();
    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.rows, 200);
    }

    assert_eq!(count(&pool, "products").await, 800);
    assert_eq!(count(&pool, "inventory_items").await, 800);
}
