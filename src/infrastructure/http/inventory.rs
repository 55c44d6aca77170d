//! Read-only inventory endpoints rendered as JSON:API documents.

use std::collections::{HashMap, HashSet};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};
use crate::domain::models::{
    InventoryItem, InventoryPage, PageRequest, Product, ProductNameFilter,
};
use super::AppState;

const BASE_PATH: &str = "/api/inventory";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/all_items", get(all_items))
        .route("/search_by_product_name", get(search_by_product_name))
        .route(
            "/search_by_product_name_partial",
            get(search_by_product_name_partial),
        )
}

async fn all_items(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    list(&state, "all_items", None, &params).await
}

async fn search_by_product_name(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    match required_name(&params) {
        Ok(name) => {
            let filter = ProductNameFilter::Exact(name.to_string());
            list(&state, "search_by_product_name", Some(filter), &params).await
        }
        Err(response) => response,
    }
}

async fn search_by_product_name_partial(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    match required_name(&params) {
        Ok(name) => {
            let filter = ProductNameFilter::Contains(name.to_string());
            list(&state, "search_by_product_name_partial", Some(filter), &params).await
        }
        Err(response) => response,
    }
}

fn required_name(params: &HashMap<String, String>) -> Result<&str, Response> {
    match params.get("name").map(String::as_str) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Name parameter is required"})),
        )
            .into_response()),
    }
}

/// Reads `page[offset]`/`page[limit]`; anything unparseable falls back to the default.
pub fn page_request(params: &HashMap<String, String>) -> PageRequest {
    let read = |key: &str, default: i64| {
        params
            .get(key)
            .and_then(|value| value.trim().parse::<i64>().ok())
            .unwrap_or(default)
    };
    PageRequest::new(read("page[offset]", 0), read("page[limit]", PageRequest::DEFAULT_LIMIT))
}

async fn list(
    state: &AppState,
    endpoint: &str,
    filter: Option<ProductNameFilter>,
    params: &HashMap<String, String>,
) -> Response {
    let page = page_request(params);
    debug!("Listing {} with {:?}", endpoint, page);

    match state.queries.list_inventory(filter.as_ref(), page).await {
        Ok(result) => {
            let links = Links {
                self_link: self_link(endpoint, filter.as_ref(), page),
            };
            Json(Document::from_page(&result, page, links)).into_response()
        }
        Err(e) => {
            error!("Failed to list inventory for {}: {}", endpoint, e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response()
        }
    }
}

fn self_link(endpoint: &str, filter: Option<&ProductNameFilter>, page: PageRequest) -> String {
    let name = match filter {
        Some(ProductNameFilter::Exact(name)) | Some(ProductNameFilter::Contains(name)) => {
            format!("name={}&", name)
        }
        None => String::new(),
    };
    format!(
        "{BASE_PATH}/{endpoint}?{name}page[offset]={}&page[limit]={}",
        page.offset, page.limit
    )
}

#[derive(Debug, Serialize)]
pub struct Document<'a> {
    pub data: Vec<Resource<ItemAttributes<'a>>>,
    pub included: Vec<Resource<ProductAttributes<'a>>>,
    pub jsonapi: JsonApi,
    pub links: Links,
    pub meta: Meta,
}

#[derive(Debug, Serialize)]
pub struct Resource<A> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub attributes: A,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Relationships>,
}

#[derive(Debug, Serialize)]
pub struct ItemAttributes<'a> {
    pub product_id: i64,
    pub warehouse_id: i64,
    pub quantity: i64,
    pub location: Option<&'a str>,
    pub expiry_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub product_name: &'a str,
    pub product_sku: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ProductAttributes<'a> {
    pub name: &'a str,
    pub sku: &'a str,
    pub description: Option<&'a str>,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub storage_conditions: Option<&'a str>,
    pub delivery_time: Option<i64>,
    pub manufacturer_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Serialize)]
pub struct Relationships {
    pub product: RelationshipData,
}

#[derive(Debug, Serialize)]
pub struct RelationshipData {
    pub data: ResourceIdentifier,
}

#[derive(Debug, Serialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct JsonApi {
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub count: usize,
    pub limit: i64,
    pub total: i64,
}

impl<'a> Document<'a> {
    /// Each product appears once in `included`, however many items reference it.
    pub fn from_page(page: &'a InventoryPage, request: PageRequest, links: Links) -> Self {
        let mut seen = HashSet::new();
        let mut included = Vec::new();
        let data = page
            .listings
            .iter()
            .map(|listing| {
                if seen.insert(listing.product.id) {
                    included.push(product_resource(&listing.product));
                }
                item_resource(&listing.item, &listing.product)
            })
            .collect();

        Self {
            data,
            included,
            jsonapi: JsonApi { version: "1.0" },
            links,
            meta: Meta {
                count: page.listings.len(),
                limit: request.limit,
                total: page.total,
            },
        }
    }
}

fn item_resource<'a>(item: &'a InventoryItem, product: &'a Product) -> Resource<ItemAttributes<'a>> {
    Resource {
        kind: "InventoryItem",
        id: item.id.to_string(),
        attributes: ItemAttributes {
            product_id: item.product_id,
            warehouse_id: item.warehouse_id,
            quantity: item.quantity,
            location: item.location.as_deref(),
            expiry_date: item.expiry_date,
            created_at: item.created_at,
            updated_at: item.updated_at,
            product_name: &product.name,
            product_sku: &product.sku,
        },
        relationships: Some(Relationships {
            product: RelationshipData {
                data: ResourceIdentifier {
                    kind: "Product",
                    id: item.product_id.to_string(),
                },
            },
        }),
    }
}

fn product_resource(product: &Product) -> Resource<ProductAttributes<'_>> {
    Resource {
        kind: "Product",
        id: product.id.to_string(),
        attributes: ProductAttributes {
            name: &product.name,
            sku: &product.sku,
            description: product.description.as_deref(),
            unit_price: product.unit_price,
            storage_conditions: product.storage_conditions.as_deref(),
            delivery_time: product.delivery_time,
            manufacturer_id: product.manufacturer_id,
            created_at: product.created_at,
            updated_at: product.updated_at,
        },
        relationships: None,
    }
}
