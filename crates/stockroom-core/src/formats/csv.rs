//! # CSV Formats
//!
//! Spreadsheet-friendly export of items and history, and header-based
//! import of items.
//!
//! ## Item import columns
//!
//! Required: `name`, `quantity`. Optional: `category`, `unit`,
//! `min_stock`, `price_cents`. Column order does not matter and unknown
//! columns are ignored, so an exported file can be edited and re-imported.

use crate::primitives::MAX_IMPORT_ROWS;
use crate::{Item, ItemDraft, StockroomError, TransactionRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ItemRow<'a> {
    id: u64,
    name: &'a str,
    category: &'a str,
    unit: &'a str,
    quantity: u64,
    min_stock: u64,
    price_cents: u64,
    last_updated: String,
}

#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    id: u64,
    at: String,
    employee_name: &'a str,
    department: &'a str,
    item_id: u64,
    item_name: &'a str,
    quantity: u64,
    kind: &'static str,
    requisition_id: Option<u64>,
    note: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ImportRow {
    name: String,
    quantity: u64,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    min_stock: Option<u64>,
    #[serde(default)]
    price_cents: Option<u64>,
}

fn csv_error(e: csv::Error) -> StockroomError {
    StockroomError::SerializationError(format!("CSV: {}", e))
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, StockroomError> {
    writer
        .into_inner()
        .map_err(|e| StockroomError::SerializationError(format!("CSV: {}", e.error())))
}

/// Export items as CSV with a header row.
pub fn export_items_csv(items: &[Item]) -> Result<Vec<u8>, StockroomError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for item in items {
        writer
            .serialize(ItemRow {
                id: item.id.0,
                name: &item.name,
                category: &item.category,
                unit: &item.unit,
                quantity: item.quantity,
                min_stock: item.min_stock,
                price_cents: item.price_cents,
                last_updated: item.last_updated.to_rfc3339(),
            })
            .map_err(csv_error)?;
    }
    if items.is_empty() {
        writer
            .write_record([
                "id",
                "name",
                "category",
                "unit",
                "quantity",
                "min_stock",
                "price_cents",
                "last_updated",
            ])
            .map_err(csv_error)?;
    }
    finish(writer)
}

/// Export history records as CSV with a header row.
pub fn export_history_csv(records: &[TransactionRecord]) -> Result<Vec<u8>, StockroomError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer
            .serialize(HistoryRow {
                id: record.id.0,
                at: record.at.to_rfc3339(),
                employee_name: &record.employee_name,
                department: &record.department,
                item_id: record.item_id.0,
                item_name: &record.item_name,
                quantity: record.quantity,
                kind: record.kind.as_str(),
                requisition_id: record.requisition_id.map(|r| r.0),
                note: record.note.as_deref(),
            })
            .map_err(csv_error)?;
    }
    if records.is_empty() {
        writer
            .write_record([
                "id",
                "at",
                "employee_name",
                "department",
                "item_id",
                "item_name",
                "quantity",
                "kind",
                "requisition_id",
                "note",
            ])
            .map_err(csv_error)?;
    }
    finish(writer)
}

/// Parse an item import file into drafts.
///
/// Row errors name the 1-based line of the file (the header is line 1).
pub fn parse_items_csv(data: &[u8]) -> Result<Vec<ItemDraft>, StockroomError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut drafts = Vec::new();
    for (index, result) in reader.deserialize::<ImportRow>().enumerate() {
        if drafts.len() >= MAX_IMPORT_ROWS {
            return Err(StockroomError::InvalidInput(format!(
                "import exceeds maximum of {} rows",
                MAX_IMPORT_ROWS
            )));
        }
        let row = result.map_err(|e| {
            StockroomError::InvalidInput(format!("line {}: {}", index.saturating_add(2), e))
        })?;
        drafts.push(ItemDraft {
            name: row.name,
            category: row.category.filter(|c| !c.is_empty()),
            unit: row.unit.filter(|u| !u.is_empty()),
            quantity: row.quantity,
            min_stock: row.min_stock,
            price_cents: row.price_cents,
        });
    }
    Ok(drafts)
}

// =============================================================================
// TESTS
// =============================================================================
