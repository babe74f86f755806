//! # Core Type Definitions
//!
//! This module contains all record types of the stockroom ledger:
//! - Identifiers (`ItemId`, `EmployeeId`, `RequisitionId`, `TransactionId`)
//! - Stock records (`Item`, `NewItem`, `ItemPatch`, `StockAdjustment`)
//! - People (`Employee`, `NewEmployee`)
//! - Requisitions (`Requisition`, `RequisitionLine`, `RequisitionStatus`, `Decision`)
//! - History (`TransactionRecord`, `TransactionDraft`, `TransactionKind`)
//! - Error types (`StockroomError`)
//!
//! ## Invariants
//!
//! - Quantities are `u64` and only change through checked arithmetic,
//!   so stock can never go negative.
//! - Money is integer minor units (`price_cents`); there are no floats.
//! - A requisition leaves `Pending` at most once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a stock item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// Identifier of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub u64);

/// Identifier of a requisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequisitionId(pub u64);

/// Identifier of a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RequisitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ITEMS
// =============================================================================

/// A stock item and its quantity on hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    pub unit: String,
    /// Stock on hand.
    pub quantity: u64,
    /// At or below this quantity the item is reported as low stock.
    pub min_stock: u64,
    /// Unit price in minor currency units.
    pub price_cents: u64,
    pub last_updated: DateTime<Utc>,
}

impl Item {
    /// Build an item from its validated creation payload.
    #[must_use]
    pub fn from_new(id: ItemId, new: NewItem, at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            category: new.category,
            unit: new.unit,
            quantity: new.quantity,
            min_stock: new.min_stock,
            price_cents: new.price_cents,
            last_updated: at,
        }
    }

    /// Whether the item is at or below its minimum stock.
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock
    }

    /// Units missing to get back above the minimum stock.
    #[must_use]
    pub fn shortfall(&self) -> u64 {
        self.min_stock.saturating_sub(self.quantity)
    }

    /// Stock value in minor currency units (saturating).
    #[must_use]
    pub fn stock_value_cents(&self) -> u64 {
        self.quantity.saturating_mul(self.price_cents)
    }

    /// Apply a stock adjustment with checked arithmetic.
    ///
    /// The item is left untouched when the adjustment fails.
    pub fn apply(
        &mut self,
        adjustment: StockAdjustment,
        at: DateTime<Utc>,
    ) -> Result<(), StockroomError> {
        let next = match adjustment {
            StockAdjustment::Add(n) => self.quantity.checked_add(n).ok_or_else(|| {
                StockroomError::InvalidInput(format!(
                    "Restocking {} by {} overflows the quantity",
                    self.name, n
                ))
            })?,
            StockAdjustment::Remove(n) => {
                self.quantity
                    .checked_sub(n)
                    .ok_or_else(|| StockroomError::InsufficientStock {
                        item: self.name.clone(),
                        requested: n,
                        available: self.quantity,
                    })?
            }
            StockAdjustment::Set(n) => n,
        };
        self.quantity = next;
        self.last_updated = at;
        Ok(())
    }

    /// Apply a metadata patch. Quantity is never touched by a patch.
    pub fn patch(&mut self, patch: &ItemPatch, at: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(category) = &patch.category {
            self.category.clone_from(category);
        }
        if let Some(unit) = &patch.unit {
            self.unit.clone_from(unit);
        }
        if let Some(min_stock) = patch.min_stock {
            self.min_stock = min_stock;
        }
        if let Some(price) = patch.price_cents {
            self.price_cents = price;
        }
        self.last_updated = at;
    }
}

/// Payload for creating an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub unit: String,
    pub quantity: u64,
    pub min_stock: u64,
    pub price_cents: u64,
}

/// Unvalidated item input, as it arrives from the API, the CLI or a CSV row.
///
/// Optional fields fall back to the ledger defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub quantity: u64,
    #[serde(default)]
    pub min_stock: Option<u64>,
    #[serde(default)]
    pub price_cents: Option<u64>,
}

/// Partial update of an item's metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub min_stock: Option<u64>,
    #[serde(default)]
    pub price_cents: Option<u64>,
}

impl ItemPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.unit.is_none()
            && self.min_stock.is_none()
            && self.price_cents.is_none()
    }
}

/// A change to an item's quantity on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockAdjustment {
    /// Add units (restock).
    Add(u64),
    /// Remove units; fails if fewer are on hand.
    Remove(u64),
    /// Overwrite the quantity (stock take correction).
    Set(u64),
}

// =============================================================================
// EMPLOYEES
// =============================================================================

/// An employee who may submit requisitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub department: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for registering an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub department: String,
    pub email: String,
}

// =============================================================================
// REQUISITIONS
// =============================================================================

/// Lifecycle state of a requisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequisitionStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequisitionStatus {
    /// Lowercase name as used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parse the wire name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for RequisitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated requisition line: which item and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub item_id: ItemId,
    pub quantity: u64,
}

/// One requested item within a requisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequisitionLine {
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity: u64,
}

/// An employee's request for one or more items.
///
/// Employee name and department are copied at submission time so that
/// history stays readable after the employee record changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requisition {
    pub id: RequisitionId,
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub department: String,
    pub status: RequisitionStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub lines: Vec<RequisitionLine>,
}

impl Requisition {
    /// Build a pending requisition from its validated payload.
    #[must_use]
    pub fn from_new(id: RequisitionId, new: NewRequisition) -> Self {
        Self {
            id,
            employee_id: new.employee_id,
            employee_name: new.employee_name,
            department: new.department,
            status: RequisitionStatus::Pending,
            admin_notes: None,
            created_at: new.created_at,
            processed_at: None,
            lines: new.lines,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == RequisitionStatus::Pending
    }

    /// Total units requested across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.lines
            .iter()
            .fold(0u64, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Whether any line refers to the given item.
    #[must_use]
    pub fn references(&self, item: ItemId) -> bool {
        self.lines.iter().any(|l| l.item_id == item)
    }

    /// Move the requisition out of `Pending` according to a decision.
    ///
    /// Fails with `AlreadyProcessed` if the requisition was decided before;
    /// the requisition is left untouched in that case.
    pub fn decide(&mut self, decision: &Decision) -> Result<(), StockroomError> {
        if !self.is_pending() {
            return Err(StockroomError::AlreadyProcessed {
                id: self.id,
                status: self.status,
            });
        }
        self.status = decision.outcome.status();
        self.admin_notes.clone_from(&decision.notes);
        self.processed_at = Some(decision.at);
        Ok(())
    }

    /// History records describing this requisition's decision, one per line.
    #[must_use]
    pub fn decision_records(&self, decision: &Decision) -> Vec<TransactionDraft> {
        let kind = match decision.outcome {
            DecisionOutcome::Approve => TransactionKind::Approved,
            DecisionOutcome::Reject => TransactionKind::Rejected,
        };
        self.lines
            .iter()
            .map(|line| TransactionDraft {
                at: decision.at,
                employee_name: self.employee_name.clone(),
                department: self.department.clone(),
                item_id: line.item_id,
                item_name: line.item_name.clone(),
                quantity: line.quantity,
                kind,
                requisition_id: Some(self.id),
                note: decision.notes.clone(),
            })
            .collect()
    }
}

/// Validated payload for a new requisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequisition {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub department: String,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<RequisitionLine>,
}

/// Approve or reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionOutcome {
    Approve,
    Reject,
}

impl DecisionOutcome {
    #[must_use]
    pub const fn status(self) -> RequisitionStatus {
        match self {
            Self::Approve => RequisitionStatus::Approved,
            Self::Reject => RequisitionStatus::Rejected,
        }
    }
}

/// An administrator's decision on a pending requisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub requisition_id: RequisitionId,
    pub outcome: DecisionOutcome,
    pub notes: Option<String>,
    pub at: DateTime<Utc>,
}

// =============================================================================
// TRANSACTION HISTORY
// =============================================================================

/// What a history record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Units handed out for an approved requisition.
    Approved,
    /// A requisition line that was turned down.
    Rejected,
    /// Units received into stock.
    Restock,
    /// Stock take correction to an absolute quantity.
    Correction,
}

impl TransactionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Restock => "restock",
            Self::Correction => "correction",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "restock" => Some(Self::Restock),
            "correction" => Some(Self::Correction),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A history record before the store assigns it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub at: DateTime<Utc>,
    pub employee_name: String,
    pub department: String,
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity: u64,
    pub kind: TransactionKind,
    pub requisition_id: Option<RequisitionId>,
    pub note: Option<String>,
}

impl TransactionDraft {
    #[must_use]
    pub fn into_record(self, id: TransactionId) -> TransactionRecord {
        TransactionRecord {
            id,
            at: self.at,
            employee_name: self.employee_name,
            department: self.department,
            item_id: self.item_id,
            item_name: self.item_name,
            quantity: self.quantity,
            kind: self.kind,
            requisition_id: self.requisition_id,
            note: self.note,
        }
    }
}

/// One line of the stock ledger's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub at: DateTime<Utc>,
    pub employee_name: String,
    pub department: String,
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity: u64,
    pub kind: TransactionKind,
    pub requisition_id: Option<RequisitionId>,
    pub note: Option<String>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the stockroom.
///
/// - No silent failures
/// - Use `Result<T, StockroomError>` for fallible operations
/// - The ledger never panics; every error is recoverable
#[derive(Debug, Error)]
pub enum StockroomError {
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Employee not found: {0}")]
    EmployeeNotFound(EmployeeId),

    #[error("Requisition not found: {0}")]
    RequisitionNotFound(RequisitionId),

    /// No employee is registered under this email.
    #[error("Email not registered: {0}")]
    UnknownEmail(String),

    #[error("An item named '{0}' already exists")]
    DuplicateItem(String),

    #[error("An employee with email '{0}' already exists")]
    DuplicateEmail(String),

    /// Not enough stock on hand to cover a request.
    #[error("Insufficient stock for {item}: requested {requested}, available {available}")]
    InsufficientStock {
        item: String,
        requested: u64,
        available: u64,
    },

    /// The requisition has already been approved or rejected.
    #[error("Requisition {id} is already {status}")]
    AlreadyProcessed {
        id: RequisitionId,
        status: RequisitionStatus,
    },

    /// The item is referenced by a pending requisition.
    #[error("Item {0} is referenced by a pending requisition")]
    ItemInUse(ItemId),

    /// The employee still has pending requisitions.
    #[error("Employee {0} has pending requisitions")]
    EmployeeHasPending(EmployeeId),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
