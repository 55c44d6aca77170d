use csv::{DeserializeRecordsIntoIter, ReaderBuilder, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, error, info};
use crate::domain::{error::ParseError, models::InventoryRecord};

pub const REQUIRED_COLUMNS: [&str; 11] = [
    "sku",
    "manufacturer_id",
    "name",
    "description",
    "unit_price",
    "storage_conditions",
    "delivery_time",
    "warehouse_id",
    "quantity",
    "location",
    "expiry_date",
];

#[derive(Debug, Deserialize)]
struct CsvRow {
    sku: String,
    manufacturer_id: i64,
    name: String,
    description: String,
    unit_price: String,
    storage_conditions: String,
    delivery_time: i64,
    warehouse_id: i64,
    quantity: i64,
    location: String,
    expiry_date: i64,
}

/// Lazily yields typed rows so a bad row surfaces only when it is reached.
pub struct InventoryRecords<'a> {
    rows: DeserializeRecordsIntoIter<&'a [u8], CsvRow>,
    row: usize,
}

impl Iterator for InventoryRecords<'_> {
    type Item = Result<InventoryRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.rows.next()?;
        self.row += 1;
        let row = self.row;

        let result = raw
            .map_err(ParseError::from)
            .and_then(|raw| into_record(row, raw));

        match &result {
            Ok(_) if row % 1000 == 0 => debug!("Parsed {} CSV rows", row),
            Err(e) => error!("Failed to parse CSV row {}: {}", row, e),
            _ => {}
        }
        Some(result)
    }
}

/// Opens an inventory CSV and checks its header. Rows are parsed on iteration.
pub fn parse_inventory_csv(content: &str) -> Result<InventoryRecords<'_>, ParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    debug!("Creating CSV reader with headers enabled");
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| {
            error!("Failed to read CSV headers: {}", e);
            ParseError::Csv(e)
        })?
        .clone();
    debug!("CSV headers: {:?}", headers);

    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|column| !headers.iter().any(|h| h == **column))
    {
        error!("CSV header is missing column '{}'", missing);
        return Err(ParseError::MissingColumn(*missing));
    }
    info!("Found {} columns in CSV", headers.len());

    Ok(InventoryRecords {
        rows: reader.into_deserialize(),
        row: 0,
    })
}

fn into_record(row: usize, raw: CsvRow) -> Result<InventoryRecord, ParseError> {
    if raw.sku.is_empty() {
        return Err(ParseError::EmptySku { row });
    }
    if raw.quantity < 0 {
        return Err(ParseError::NegativeQuantity {
            row,
            quantity: raw.quantity,
        });
    }

    Ok(InventoryRecord {
        unit_price: parse_price(row, &raw.unit_price)?,
        sku: raw.sku,
        manufacturer_id: raw.manufacturer_id,
        name: raw.name,
        description: raw.description,
        storage_conditions: raw.storage_conditions,
        delivery_time: raw.delivery_time,
        warehouse_id: raw.warehouse_id,
        quantity: raw.quantity,
        location: raw.location,
        expiry_date: raw.expiry_date,
    })
}

/// Prices carry at most two significant fractional digits and are stored with exactly two.
fn parse_price(row: usize, value: &str) -> Result<Decimal, ParseError> {
    let invalid = || ParseError::InvalidPrice {
        row,
        value: value.to_string(),
    };
    let mut price = Decimal::from_str(value).map_err(|_| invalid())?.normalize();
    if price.scale() > 2 || price.is_sign_negative() {
        return Err(invalid());
    }
    price.rescale(2);
    Ok(price)
}
