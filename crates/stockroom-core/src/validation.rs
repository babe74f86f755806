//! # Input Validation
//!
//! Normalises and bounds every user-supplied value before it reaches a
//! store. All failures are `StockroomError::InvalidInput` carrying a
//! reason that can be shown to the user as-is.

use crate::primitives::{
    DEFAULT_CATEGORY, DEFAULT_MIN_STOCK, DEFAULT_UNIT, MAX_EMAIL_LENGTH,
    MAX_LINES_PER_REQUISITION, MAX_NAME_LENGTH, MAX_NOTE_LENGTH, MAX_QUANTITY,
};
use crate::{ItemDraft, ItemId, ItemPatch, LineRequest, NewEmployee, NewItem, StockroomError};

/// Lookup key used by the unique indexes on item names and emails.
#[must_use]
pub fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Trim and bound a name-like field.
pub fn name(field: &str, value: &str) -> Result<String, StockroomError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StockroomError::InvalidInput(format!(
            "{} must not be empty",
            field
        )));
    }
    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(StockroomError::InvalidInput(format!(
            "{} length {} exceeds maximum {} bytes",
            field,
            trimmed.len(),
            MAX_NAME_LENGTH
        )));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(StockroomError::InvalidInput(format!(
            "{} contains control characters",
            field
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate an email address and return its normalised (lowercase) form.
pub fn email(value: &str) -> Result<String, StockroomError> {
    let normalized = normalize_key(value);
    if normalized.len() > MAX_EMAIL_LENGTH {
        return Err(StockroomError::InvalidInput(format!(
            "email length {} exceeds maximum {} bytes",
            normalized.len(),
            MAX_EMAIL_LENGTH
        )));
    }
    let mut parts = normalized.split('@');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !normalized.chars().any(char::is_whitespace)
        }
        _ => false,
    };
    if !valid {
        return Err(StockroomError::InvalidInput(format!(
            "'{}' is not a valid email address",
            value.trim()
        )));
    }
    Ok(normalized)
}

/// Trim an optional note; blank notes become `None`.
pub fn note(value: Option<&str>) -> Result<Option<String>, StockroomError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.len() > MAX_NOTE_LENGTH {
        return Err(StockroomError::InvalidInput(format!(
            "note length {} exceeds maximum {} bytes",
            trimmed.len(),
            MAX_NOTE_LENGTH
        )));
    }
    Ok(Some(trimmed.to_string()))
}

/// A positive quantity within `MAX_QUANTITY`.
pub fn quantity(value: u64) -> Result<u64, StockroomError> {
    if value == 0 {
        return Err(StockroomError::InvalidInput(
            "quantity must be at least 1".to_string(),
        ));
    }
    stock_level(value)
}

/// A stock level (zero allowed) within `MAX_QUANTITY`.
pub fn stock_level(value: u64) -> Result<u64, StockroomError> {
    if value > MAX_QUANTITY {
        return Err(StockroomError::InvalidInput(format!(
            "quantity {} exceeds maximum {}",
            value, MAX_QUANTITY
        )));
    }
    Ok(value)
}

/// Turn a draft into a creation payload, filling in defaults.
pub fn new_item(draft: &ItemDraft) -> Result<NewItem, StockroomError> {
    Ok(NewItem {
        name: name("item name", &draft.name)?,
        category: optional_name("category", draft.category.as_deref(), DEFAULT_CATEGORY)?,
        unit: optional_name("unit", draft.unit.as_deref(), DEFAULT_UNIT)?,
        quantity: stock_level(draft.quantity)?,
        min_stock: stock_level(draft.min_stock.unwrap_or(DEFAULT_MIN_STOCK))?,
        price_cents: draft.price_cents.unwrap_or(0),
    })
}

fn optional_name(field: &str, value: Option<&str>, default: &str) -> Result<String, StockroomError> {
    match value {
        Some(v) if !v.trim().is_empty() => name(field, v),
        _ => Ok(default.to_string()),
    }
}

/// Normalise a metadata patch. Rejects patches that change nothing.
pub fn item_patch(patch: &ItemPatch) -> Result<ItemPatch, StockroomError> {
    if patch.is_empty() {
        return Err(StockroomError::InvalidInput(
            "update must change at least one field".to_string(),
        ));
    }
    Ok(ItemPatch {
        name: patch.name.as_deref().map(|n| name("item name", n)).transpose()?,
        category: patch
            .category
            .as_deref()
            .map(|c| name("category", c))
            .transpose()?,
        unit: patch.unit.as_deref().map(|u| name("unit", u)).transpose()?,
        min_stock: patch.min_stock.map(stock_level).transpose()?,
        price_cents: patch.price_cents,
    })
}

/// Validate an employee registration.
pub fn new_employee(employee: &NewEmployee) -> Result<NewEmployee, StockroomError> {
    Ok(NewEmployee {
        name: name("employee name", &employee.name)?,
        department: name("department", &employee.department)?,
        email: email(&employee.email)?,
    })
}

/// Validate requisition lines and merge lines naming the same item.
///
/// Order of first appearance is preserved.
pub fn lines(requested: &[LineRequest]) -> Result<Vec<(ItemId, u64)>, StockroomError> {
    if requested.is_empty() {
        return Err(StockroomError::InvalidInput(
            "a requisition needs at least one item".to_string(),
        ));
    }

    let mut merged: Vec<(ItemId, u64)> = Vec::with_capacity(requested.len());
    for line in requested {
        let qty = quantity(line.quantity)?;
        if let Some(existing) = merged.iter_mut().find(|(id, _)| *id == line.item_id) {
            existing.1 = quantity(existing.1.saturating_add(qty))?;
        } else {
            merged.push((line.item_id, qty));
        }
    }

    if merged.len() > MAX_LINES_PER_REQUISITION {
        return Err(StockroomError::InvalidInput(format!(
            "a requisition may name at most {} items, got {}",
            MAX_LINES_PER_REQUISITION,
            merged.len()
        )));
    }
    Ok(merged)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed_and_bounded() {
        assert_eq!(name("item name", "  Stapler ").expect("valid"), "Stapler");
        assert!(name("item name", "   ").is_err());
        assert!(name("item name", &"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
        assert!(name("item name", "tab\there").is_err());
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(
            email(" John@Company.com ").expect("valid"),
            "john@company.com"
        );
        for bad in ["", "john", "@company.com", "john@", "a@b@c", "jo hn@x.com", "a@.com"] {
            assert!(email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn blank_note_becomes_none() {
        assert_eq!(note(Some("   ")).expect("valid"), None);
        assert_eq!(note(None).expect("valid"), None);
        assert_eq!(
            note(Some(" ok ")).expect("valid"),
            Some("ok".to_string())
        );
        assert!(note(Some(&"n".repeat(MAX_NOTE_LENGTH + 1))).is_err());
    }

    #[test]
    fn quantity_bounds() {
        assert!(quantity(0).is_err());
        assert!(quantity(MAX_QUANTITY + 1).is_err());
        assert_eq!(quantity(3).expect("valid"), 3);
        assert_eq!(stock_level(0).expect("valid"), 0);
    }

    #[test]
    fn draft_gets_defaults() {
        let draft = ItemDraft {
            name: "Eraser".to_string(),
            category: Some("  ".to_string()),
            unit: None,
            quantity: 80,
            min_stock: None,
            price_cents: None,
        };
        let item = new_item(&draft).expect("valid");
        assert_eq!(item.category, DEFAULT_CATEGORY);
        assert_eq!(item.unit, DEFAULT_UNIT);
        assert_eq!(item.min_stock, DEFAULT_MIN_STOCK);
        assert_eq!(item.price_cents, 0);
    }

    #[test]
    fn empty_patch_rejected() {
        assert!(item_patch(&ItemPatch::default()).is_err());
    }

    #[test]
    fn duplicate_lines_are_merged() {
        let merged = lines(&[
            LineRequest {
                item_id: ItemId(2),
                quantity: 3,
            },
            LineRequest {
                item_id: ItemId(1),
                quantity: 1,
            },
            LineRequest {
                item_id: ItemId(2),
                quantity: 4,
            },
        ])
        .expect("valid");
        assert_eq!(merged, vec![(ItemId(2), 7), (ItemId(1), 1)]);
    }

    #[test]
    fn empty_or_zero_lines_rejected() {
        assert!(lines(&[]).is_err());
        assert!(
            lines(&[LineRequest {
                item_id: ItemId(1),
                quantity: 0
            }])
            .is_err()
        );
    }
}
