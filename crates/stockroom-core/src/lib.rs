//! # stockroom-core
//!
//! The stock ledger for an office-supplies stockroom.
//!
//! Employees file requisitions for items; an administrator approves or
//! rejects them. Approval deducts every line from stock in one atomic
//! step and writes the history that reports are built from.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Owns all state (items, employees, requisitions, history)
//! - Never lets stock go below zero; approval re-checks inside the store
//! - Uses integer quantities and money (minor units), no floats
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod formats;
pub mod inventory;
pub mod ledger;
pub mod primitives;
pub mod report;
pub mod seed;
pub mod storage;
pub mod store;
pub mod types;
pub mod validation;
pub mod workflow;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Decision, DecisionOutcome, Employee, EmployeeId, Item, ItemDraft, ItemId, ItemPatch,
    LineRequest, NewEmployee, NewItem, NewRequisition, Requisition, RequisitionId,
    RequisitionLine, RequisitionStatus, StockAdjustment, StockroomError, TransactionDraft,
    TransactionId, TransactionKind, TransactionRecord,
};

// =============================================================================
// RE-EXPORTS: Ledger
// =============================================================================

pub use inventory::ImportSummary;
pub use ledger::{Ledger, StorageBackend};
pub use report::{
    DepartmentUsage, HistoryFilter, ItemUsage, LowStockEntry, Summary, parse_date_bound,
};
pub use seed::SeedReport;
pub use storage::RedbStore;
pub use store::{InventoryStore, MemoryStore};
pub use workflow::Availability;

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{export_history_csv, export_items_csv, parse_items_csv};
