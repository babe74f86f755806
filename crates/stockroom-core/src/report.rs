//! # Reports
//!
//! Read-only views over the ledger: low stock, dashboard summary,
//! history filtering and consumption per department or item.
//!
//! All aggregations use `BTreeMap` so output order is deterministic.

use crate::store::InventoryStore;
use crate::{
    Item, ItemId, RequisitionStatus, StockroomError, TransactionKind, TransactionRecord,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// LOW STOCK
// =============================================================================

/// A low-stock line: the item and how far below its minimum it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockEntry {
    pub item: Item,
    pub shortfall: u64,
}

/// Items at or below their minimum stock, largest shortfall first,
/// then by name.
#[must_use]
pub fn low_stock(items: &[Item]) -> Vec<LowStockEntry> {
    let mut low: Vec<LowStockEntry> = items
        .iter()
        .filter(|i| i.is_low_stock())
        .map(|i| LowStockEntry {
            item: i.clone(),
            shortfall: i.shortfall(),
        })
        .collect();
    low.sort_by(|a, b| {
        b.shortfall
            .cmp(&a.shortfall)
            .then_with(|| a.item.name.cmp(&b.item.name))
    });
    low
}

// =============================================================================
// SUMMARY
// =============================================================================

/// Dashboard numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub item_count: usize,
    pub total_units: u64,
    /// Stock value in minor currency units.
    pub inventory_value_cents: u64,
    pub low_stock_count: usize,
    pub employee_count: usize,
    pub pending_requisitions: usize,
    pub approved_requisitions: usize,
    pub rejected_requisitions: usize,
}

/// Compute the dashboard summary from the store.
pub fn summary<S: InventoryStore + ?Sized>(store: &S) -> Result<Summary, StockroomError> {
    let items = store.list_items()?;
    let mut summary = Summary {
        item_count: items.len(),
        employee_count: store.list_employees()?.len(),
        ..Summary::default()
    };

    for item in &items {
        summary.total_units = summary.total_units.saturating_add(item.quantity);
        summary.inventory_value_cents = summary
            .inventory_value_cents
            .saturating_add(item.stock_value_cents());
        if item.is_low_stock() {
            summary.low_stock_count += 1;
        }
    }

    for requisition in store.list_requisitions()? {
        let counter = match requisition.status {
            RequisitionStatus::Pending => &mut summary.pending_requisitions,
            RequisitionStatus::Approved => &mut summary.approved_requisitions,
            RequisitionStatus::Rejected => &mut summary.rejected_requisitions,
        };
        *counter += 1;
    }
    Ok(summary)
}

// =============================================================================
// HISTORY FILTER
// =============================================================================

/// Criteria for selecting history records. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFilter {
    /// Inclusive lower bound.
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    /// Department, case-insensitive.
    #[serde(default)]
    pub department: Option<String>,
    /// Substring of the employee name, case-insensitive.
    #[serde(default)]
    pub employee: Option<String>,
    #[serde(default)]
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub item_id: Option<ItemId>,
}

impl HistoryFilter {
    /// Whether a record satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        if self.from.is_some_and(|from| record.at < from) {
            return false;
        }
        if self.to.is_some_and(|to| record.at > to) {
            return false;
        }
        if let Some(department) = &self.department {
            if !record.department.eq_ignore_ascii_case(department.trim()) {
                return false;
            }
        }
        if let Some(employee) = &self.employee {
            let needle = employee.trim().to_lowercase();
            if !record.employee_name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if self.kind.is_some_and(|kind| record.kind != kind) {
            return false;
        }
        if self.item_id.is_some_and(|item| record.item_id != item) {
            return false;
        }
        true
    }
}

/// Parse a history range bound: RFC 3339, or a plain `YYYY-MM-DD` date.
///
/// A plain date covers the whole day: the start of it for a lower bound,
/// its last nanosecond for an upper bound, so `to=2024-03-31` includes the
/// whole of the 31st.
pub fn parse_date_bound(value: &str, end_of_day: bool) -> Result<DateTime<Utc>, StockroomError> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        StockroomError::InvalidInput(format!(
            "invalid date '{}': expected YYYY-MM-DD or RFC 3339",
            value
        ))
    })?;
    let time = if end_of_day {
        date.and_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc())
        .ok_or_else(|| StockroomError::InvalidInput(format!("invalid date '{}'", value)))
}

/// Records matching the filter, newest first.
#[must_use]
pub fn filter_history(records: &[TransactionRecord], filter: &HistoryFilter) -> Vec<TransactionRecord> {
    let mut selected: Vec<TransactionRecord> = records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.at.cmp(&a.at).then_with(|| b.id.cmp(&a.id)));
    selected
}

// =============================================================================
// CONSUMPTION
// =============================================================================

/// Units handed out to one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentUsage {
    pub department: String,
    pub approved_units: u64,
    pub approved_lines: usize,
}

/// Approved units per department, alphabetical by department.
#[must_use]
pub fn department_usage(records: &[TransactionRecord]) -> Vec<DepartmentUsage> {
    let mut by_department: BTreeMap<&str, (u64, usize)> = BTreeMap::new();
    for record in records.iter().filter(|r| r.kind == TransactionKind::Approved) {
        let entry = by_department.entry(record.department.as_str()).or_default();
        entry.0 = entry.0.saturating_add(record.quantity);
        entry.1 += 1;
    }
    by_department
        .into_iter()
        .map(|(department, (units, lines))| DepartmentUsage {
            department: department.to_string(),
            approved_units: units,
            approved_lines: lines,
        })
        .collect()
}

/// Units handed out for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUsage {
    pub item_id: ItemId,
    pub item_name: String,
    pub approved_units: u64,
}

/// The `limit` most-approved items by units, ties broken by item id.
#[must_use]
pub fn top_items(records: &[TransactionRecord], limit: usize) -> Vec<ItemUsage> {
    let mut by_item: BTreeMap<ItemId, ItemUsage> = BTreeMap::new();
    for record in records.iter().filter(|r| r.kind == TransactionKind::Approved) {
        let entry = by_item.entry(record.item_id).or_insert_with(|| ItemUsage {
            item_id: record.item_id,
            item_name: record.item_name.clone(),
            approved_units: 0,
        });
        entry.approved_units = entry.approved_units.saturating_add(record.quantity);
    }
    let mut ranked: Vec<ItemUsage> = by_item.into_values().collect();
    ranked.sort_by(|a, b| {
        b.approved_units
            .cmp(&a.approved_units)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    ranked.truncate(limit);
    ranked
}

// =============================================================================
// TESTS
// =============================================================================
