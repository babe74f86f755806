//! # Sample Data
//!
//! A starter catalogue and staff list so a fresh stockroom is usable
//! before anyone has typed anything in.

use crate::store::InventoryStore;
use crate::{NewEmployee, NewItem, StockroomError};
use chrono::{DateTime, Utc};

/// (name, category, unit, quantity, min_stock, price_cents)
const SAMPLE_ITEMS: &[(&str, &str, &str, u64, u64, u64)] = &[
    ("Pen", "Stationery", "pcs", 100, 20, 150),
    ("Pencil", "Stationery", "pcs", 150, 30, 80),
    ("A4 Paper", "Paper", "ream", 50, 10, 4500),
    ("Stapler", "Office Supplies", "pcs", 20, 5, 2500),
    ("Eraser", "Stationery", "pcs", 80, 20, 50),
    ("Marker", "Stationery", "pcs", 60, 15, 300),
    ("Binder Clip", "Office Supplies", "pcs", 200, 50, 40),
    ("Post-it Notes", "Paper", "pack", 100, 20, 500),
    ("Envelope", "Paper", "pcs", 500, 100, 30),
    ("Folder", "Office Supplies", "pcs", 75, 15, 250),
];

/// (name, department, email)
const SAMPLE_EMPLOYEES: &[(&str, &str, &str)] = &[
    ("John Doe", "IT", "john@company.com"),
    ("Jane Smith", "HR", "jane@company.com"),
    ("Bob Johnson", "Finance", "bob@company.com"),
    ("Alice Brown", "Marketing", "alice@company.com"),
];

/// What `seed_if_empty` inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub items: usize,
    pub employees: usize,
}

/// Insert the sample items when the catalogue is empty and the sample
/// staff when no employee exists. Each half is checked on its own so a
/// partly filled store is never duplicated into.
pub fn seed_if_empty<S: InventoryStore + ?Sized>(
    store: &mut S,
    at: DateTime<Utc>,
) -> Result<SeedReport, StockroomError> {
    let mut report = SeedReport::default();

    if store.list_items()?.is_empty() {
        for &(name, category, unit, quantity, min_stock, price_cents) in SAMPLE_ITEMS {
            store.insert_item(
                NewItem {
                    name: name.to_string(),
                    category: category.to_string(),
                    unit: unit.to_string(),
                    quantity,
                    min_stock,
                    price_cents,
                },
                at,
            )?;
            report.items += 1;
        }
    }

    if store.list_employees()?.is_empty() {
        for &(name, department, email) in SAMPLE_EMPLOYEES {
            store.insert_employee(
                NewEmployee {
                    name: name.to_string(),
                    department: department.to_string(),
                    email: email.to_string(),
                },
                at,
            )?;
            report.employees += 1;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn seeds_once() {
        let mut store = MemoryStore::new();
        let first = seed_if_empty(&mut store, Utc::now()).expect("seed");
        assert_eq!(first, SeedReport { items: 10, employees: 4 });

        let second = seed_if_empty(&mut store, Utc::now()).expect("reseed");
        assert_eq!(second, SeedReport::default());
        assert_eq!(store.list_items().expect("items").len(), 10);

        let john = store
            .find_employee_by_email("JOHN@company.com")
            .expect("lookup")
            .expect("seeded");
        assert_eq!(john.department, "IT");
    }
}
