//! # Ledger Primitives
//!
//! Fixed limits and defaults for the stockroom ledger.
//!
//! These are compiled into the binary and are immutable at runtime.
//! Every user-supplied string and quantity is bounded by one of them
//! before it reaches a store.

// =============================================================================
// DEFAULTS
// =============================================================================

/// Low-stock threshold for items created without one.
pub const DEFAULT_MIN_STOCK: u64 = 10;

/// Unit assigned to items created without one.
pub const DEFAULT_UNIT: &str = "pcs";

/// Category assigned to items created without one.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Known item categories, in display order.
///
/// Other categories are accepted; this list only feeds pickers and reports.
pub const CATEGORIES: &[&str] = &[
    "Stationery",
    "Paper",
    "Office Supplies",
    "Electronics",
    "Other",
];

/// Known units of measure.
pub const UNITS: &[&str] = &["pcs", "box", "pack", "ream", "roll", "set", "unit"];

/// Name recorded in history for stock movements made by the administrator.
pub const ADMIN_ACTOR: &str = "Administrator";

/// Department recorded in history for stock movements made by the administrator.
pub const ADMIN_DEPARTMENT: &str = "Administration";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length in bytes for names (items, employees, departments).
pub const MAX_NAME_LENGTH: usize = 128;

/// Maximum length in bytes for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length in bytes for admin notes and history notes.
pub const MAX_NOTE_LENGTH: usize = 1024;

/// Maximum number of distinct lines in one requisition.
pub const MAX_LINES_PER_REQUISITION: usize = 50;

/// Maximum quantity in a single line, restock or correction.
pub const MAX_QUANTITY: u64 = 1_000_000;

/// Maximum number of data rows accepted by a CSV import.
pub const MAX_IMPORT_ROWS: usize = 10_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_listed() {
        assert!(UNITS.contains(&DEFAULT_UNIT));
        assert!(CATEGORIES.contains(&DEFAULT_CATEGORY));
    }
}
