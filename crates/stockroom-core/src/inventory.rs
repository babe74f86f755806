//! # Inventory Administration
//!
//! Administrator operations on items and employees: catalogue changes,
//! restocking, stock-take corrections, CSV imports, and the employee
//! directory (including email login).

use crate::primitives::{ADMIN_ACTOR, ADMIN_DEPARTMENT};
use crate::store::InventoryStore;
use crate::validation::{self, normalize_key};
use crate::{
    Employee, EmployeeId, Item, ItemDraft, ItemId, ItemPatch, NewEmployee, StockAdjustment,
    StockroomError, TransactionDraft, TransactionKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// ITEMS
// =============================================================================

/// Validate a draft and add it to the catalogue.
pub fn add_item<S: InventoryStore + ?Sized>(
    store: &mut S,
    draft: &ItemDraft,
    at: DateTime<Utc>,
) -> Result<Item, StockroomError> {
    let item = validation::new_item(draft)?;
    store.insert_item(item, at)
}

/// Update an item's metadata (never its quantity).
pub fn update_item<S: InventoryStore + ?Sized>(
    store: &mut S,
    id: ItemId,
    patch: &ItemPatch,
    at: DateTime<Utc>,
) -> Result<Item, StockroomError> {
    let patch = validation::item_patch(patch)?;
    store.update_item(id, &patch, at)
}

/// Remove an item from the catalogue.
///
/// Refused while a pending requisition still asks for it.
pub fn remove_item<S: InventoryStore + ?Sized>(
    store: &mut S,
    id: ItemId,
) -> Result<Item, StockroomError> {
    let referenced = store
        .list_requisitions()?
        .iter()
        .any(|r| r.is_pending() && r.references(id));
    if referenced {
        return Err(StockroomError::ItemInUse(id));
    }
    store.remove_item(id)
}

/// Receive `quantity` units into stock.
pub fn restock<S: InventoryStore + ?Sized>(
    store: &mut S,
    id: ItemId,
    quantity: u64,
    note: Option<&str>,
    at: DateTime<Utc>,
) -> Result<Item, StockroomError> {
    let quantity = validation::quantity(quantity)?;
    let note = validation::note(note)?;
    let item = store
        .get_item(id)?
        .ok_or(StockroomError::ItemNotFound(id))?;
    let record = admin_record(&item, quantity, TransactionKind::Restock, note, at);
    store.adjust_stock(id, StockAdjustment::Add(quantity), record)
}

/// Set an item's stock to an absolute quantity after a stock take.
///
/// The history record carries the size of the change; the note says in
/// which direction it went.
pub fn correct_stock<S: InventoryStore + ?Sized>(
    store: &mut S,
    id: ItemId,
    quantity: u64,
    note: Option<&str>,
    at: DateTime<Utc>,
) -> Result<Item, StockroomError> {
    let quantity = validation::stock_level(quantity)?;
    let note = validation::note(note)?;
    let item = store
        .get_item(id)?
        .ok_or(StockroomError::ItemNotFound(id))?;

    let change = format!("{} -> {}", item.quantity, quantity);
    let note = Some(match note {
        Some(n) => format!("{} ({})", change, n),
        None => change,
    });
    let delta = item.quantity.abs_diff(quantity);
    let record = admin_record(&item, delta, TransactionKind::Correction, note, at);
    store.adjust_stock(id, StockAdjustment::Set(quantity), record)
}

fn admin_record(
    item: &Item,
    quantity: u64,
    kind: TransactionKind,
    note: Option<String>,
    at: DateTime<Utc>,
) -> TransactionDraft {
    TransactionDraft {
        at,
        employee_name: ADMIN_ACTOR.to_string(),
        department: ADMIN_DEPARTMENT.to_string(),
        item_id: item.id,
        item_name: item.name.clone(),
        quantity,
        kind,
        requisition_id: None,
        note,
    }
}

/// Outcome of an item import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Rows that created a new item.
    pub created: usize,
    /// Rows that updated an existing item (matched by name).
    pub updated: usize,
    /// Rows matching an existing item whose stock changed.
    pub stock_corrected: usize,
}

/// Upsert items by name.
///
/// Every row is validated before anything is written, so a bad row
/// rejects the whole import. Existing items get their metadata patched
/// with the fields the row provides, and their stock set to the row's
/// quantity (recorded as a correction).
pub fn import_items<S: InventoryStore + ?Sized>(
    store: &mut S,
    rows: &[ItemDraft],
    at: DateTime<Utc>,
) -> Result<ImportSummary, StockroomError> {
    let mut seen = BTreeSet::new();
    let mut validated = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let item = validation::new_item(row).map_err(|e| {
            StockroomError::InvalidInput(format!("row {}: {}", index.saturating_add(1), e))
        })?;
        if !seen.insert(normalize_key(&item.name)) {
            return Err(StockroomError::InvalidInput(format!(
                "row {}: item '{}' appears more than once",
                index.saturating_add(1),
                item.name
            )));
        }
        validated.push((row, item));
    }

    let mut summary = ImportSummary::default();
    for (row, item) in validated {
        match store.find_item_by_name(&item.name)? {
            None => {
                store.insert_item(item, at)?;
                summary.created = summary.created.saturating_add(1);
            }
            Some(existing) => {
                let patch = ItemPatch {
                    name: None,
                    category: row.category.as_ref().map(|_| item.category.clone()),
                    unit: row.unit.as_ref().map(|_| item.unit.clone()),
                    min_stock: row.min_stock,
                    price_cents: row.price_cents,
                };
                if !patch.is_empty() {
                    store.update_item(existing.id, &patch, at)?;
                }
                if existing.quantity != item.quantity {
                    correct_stock(&mut *store, existing.id, item.quantity, Some("import"), at)?;
                    summary.stock_corrected = summary.stock_corrected.saturating_add(1);
                }
                summary.updated = summary.updated.saturating_add(1);
            }
        }
    }
    Ok(summary)
}

/// Items an employee can currently ask for: anything with stock on hand.
pub fn requestable_items<S: InventoryStore + ?Sized>(
    store: &S,
) -> Result<Vec<Item>, StockroomError> {
    Ok(store
        .list_items()?
        .into_iter()
        .filter(|i| i.quantity > 0)
        .collect())
}

// =============================================================================
// EMPLOYEES
// =============================================================================

/// Validate and register an employee.
pub fn add_employee<S: InventoryStore + ?Sized>(
    store: &mut S,
    employee: &NewEmployee,
    at: DateTime<Utc>,
) -> Result<Employee, StockroomError> {
    let employee = validation::new_employee(employee)?;
    store.insert_employee(employee, at)
}

/// Remove an employee. Refused while they have pending requisitions.
pub fn remove_employee<S: InventoryStore + ?Sized>(
    store: &mut S,
    id: EmployeeId,
) -> Result<Employee, StockroomError> {
    let has_pending = store
        .list_requisitions()?
        .iter()
        .any(|r| r.is_pending() && r.employee_id == id);
    if has_pending {
        return Err(StockroomError::EmployeeHasPending(id));
    }
    store.remove_employee(id)
}

/// Identify an employee by email.
pub fn login<S: InventoryStore + ?Sized>(
    store: &S,
    email: &str,
) -> Result<Employee, StockroomError> {
    store
        .find_employee_by_email(email)?
        .ok_or_else(|| StockroomError::UnknownEmail(email.trim().to_string()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::workflow::submit_requisition;
    use crate::LineRequest;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 15, 14, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn draft(name: &str, quantity: u64) -> ItemDraft {
        ItemDraft {
            name: name.to_string(),
            category: None,
            unit: None,
            quantity,
            min_stock: None,
            price_cents: None,
        }
    }

    #[test]
    fn restock_adds_and_records() {
        let mut store = MemoryStore::new();
        let item = add_item(&mut store, &draft("Stapler", 20), at()).expect("add");
        let updated = restock(&mut store, item.id, 5, Some("supplier A"), at()).expect("restock");

        assert_eq!(updated.quantity, 25);
        let history = store.list_history().expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, TransactionKind::Restock);
        assert_eq!(history[0].employee_name, ADMIN_ACTOR);
        assert_eq!(history[0].quantity, 5);
    }

    #[test]
    fn restock_zero_is_rejected() {
        let mut store = MemoryStore::new();
        let item = add_item(&mut store, &draft("Stapler", 20), at()).expect("add");
        assert!(matches!(
            restock(&mut store, item.id, 0, None, at()),
            Err(StockroomError::InvalidInput(_))
        ));
    }

    #[test]
    fn correction_records_difference() {
        let mut store = MemoryStore::new();
        let item = add_item(&mut store, &draft("Envelope", 500), at()).expect("add");
        let updated =
            correct_stock(&mut store, item.id, 480, Some("stock take"), at()).expect("correct");

        assert_eq!(updated.quantity, 480);
        let history = store.list_history().expect("history");
        assert_eq!(history[0].quantity, 20);
        assert_eq!(history[0].note.as_deref(), Some("500 -> 480 (stock take)"));
    }

    #[test]
    fn item_in_pending_requisition_cannot_be_removed() {
        let mut store = MemoryStore::new();
        let item = add_item(&mut store, &draft("Marker", 60), at()).expect("add");
        let employee = add_employee(
            &mut store,
            &NewEmployee {
                name: "Jane Smith".to_string(),
                department: "HR".to_string(),
                email: "jane@company.com".to_string(),
            },
            at(),
        )
        .expect("employee");
        submit_requisition(
            &mut store,
            employee.id,
            &[LineRequest {
                item_id: item.id,
                quantity: 2,
            }],
            at(),
        )
        .expect("submit");

        assert!(matches!(
            remove_item(&mut store, item.id),
            Err(StockroomError::ItemInUse(_))
        ));
        assert!(matches!(
            remove_employee(&mut store, employee.id),
            Err(StockroomError::EmployeeHasPending(_))
        ));
    }

    #[test]
    fn login_by_email() {
        let mut store = MemoryStore::new();
        add_employee(
            &mut store,
            &NewEmployee {
                name: "Bob Johnson".to_string(),
                department: "Finance".to_string(),
                email: "Bob@Company.com".to_string(),
            },
            at(),
        )
        .expect("employee");

        let bob = login(&store, "bob@company.com").expect("login");
        assert_eq!(bob.department, "Finance");
        assert_eq!(bob.email, "bob@company.com");
        assert!(matches!(
            login(&store, "nobody@company.com"),
            Err(StockroomError::UnknownEmail(_))
        ));
    }

    #[test]
    fn import_upserts_by_name() {
        let mut store = MemoryStore::new();
        add_item(&mut store, &draft("Pen", 100), at()).expect("add");

        let rows = vec![
            ItemDraft {
                min_stock: Some(25),
                ..draft("pen", 90)
            },
            draft("Pencil", 150),
        ];
        let summary = import_items(&mut store, &rows, at()).expect("import");

        assert_eq!(
            summary,
            ImportSummary {
                created: 1,
                updated: 1,
                stock_corrected: 1
            }
        );
        let pen = store
            .find_item_by_name("Pen")
            .expect("find")
            .expect("present");
        assert_eq!(pen.quantity, 90);
        assert_eq!(pen.min_stock, 25);
        assert_eq!(pen.name, "Pen");
    }

    #[test]
    fn import_with_bad_row_writes_nothing() {
        let mut store = MemoryStore::new();
        let rows = vec![draft("Pen", 1), draft("  ", 1)];
        let result = import_items(&mut store, &rows, at());
        assert!(matches!(result, Err(StockroomError::InvalidInput(msg)) if msg.starts_with("row 2")));
        assert!(store.list_items().expect("list").is_empty());

        let rows = vec![draft("Pen", 1), draft("PEN", 2)];
        assert!(import_items(&mut store, &rows, at()).is_err());
        assert!(store.list_items().expect("list").is_empty());
    }
}
