//! # Requisition Workflow
//!
//! Moves a requisition from `pending` to `approved` or `rejected` while
//! keeping the stock ledger consistent.
//!
//! ```text
//!   submit ──► Pending ──approve──► Approved   (stock decremented, history)
//!                 │
//!                 └─────reject────► Rejected   (stock untouched, history)
//! ```
//!
//! Checks here produce precise errors early (unknown item, which line is
//! short). The store repeats the pending and stock checks inside its own
//! atomic unit, so a decision computed against stale data can never
//! drive stock below zero.

use crate::store::InventoryStore;
use crate::validation;
use crate::{
    Decision, DecisionOutcome, EmployeeId, ItemId, LineRequest, NewRequisition, Requisition,
    RequisitionId, RequisitionLine, RequisitionStatus, StockroomError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stock availability for one requested line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub item_id: ItemId,
    pub item_name: String,
    pub requested: u64,
    pub available: u64,
    pub sufficient: bool,
}

impl Availability {
    /// Human-readable verdict for this line.
    #[must_use]
    pub fn message(&self) -> String {
        if self.sufficient {
            format!("{}: {} available", self.item_name, self.available)
        } else {
            format!(
                "{}: insufficient stock, requested {} but only {} available",
                self.item_name, self.requested, self.available
            )
        }
    }
}

/// Check requested lines against current stock without changing anything.
///
/// Lines naming the same item are merged first.
pub fn check_availability<S: InventoryStore + ?Sized>(
    store: &S,
    lines: &[LineRequest],
) -> Result<Vec<Availability>, StockroomError> {
    let merged = validation::lines(lines)?;
    let mut report = Vec::with_capacity(merged.len());
    for (item_id, requested) in merged {
        let item = store
            .get_item(item_id)?
            .ok_or(StockroomError::ItemNotFound(item_id))?;
        report.push(Availability {
            item_id,
            item_name: item.name,
            requested,
            available: item.quantity,
            sufficient: requested <= item.quantity,
        });
    }
    Ok(report)
}

/// Submit a new pending requisition on behalf of an employee.
///
/// Requested quantities must not exceed current stock. This is advisory:
/// stock is only reserved when the requisition is approved.
pub fn submit_requisition<S: InventoryStore + ?Sized>(
    store: &mut S,
    employee_id: EmployeeId,
    lines: &[LineRequest],
    at: DateTime<Utc>,
) -> Result<Requisition, StockroomError> {
    let employee = store
        .get_employee(employee_id)?
        .ok_or(StockroomError::EmployeeNotFound(employee_id))?;

    let mut requisition_lines = Vec::new();
    for line in check_availability(&*store, lines)? {
        if !line.sufficient {
            return Err(StockroomError::InsufficientStock {
                item: line.item_name,
                requested: line.requested,
                available: line.available,
            });
        }
        requisition_lines.push(RequisitionLine {
            item_id: line.item_id,
            item_name: line.item_name,
            quantity: line.requested,
        });
    }

    store.insert_requisition(NewRequisition {
        employee_id: employee.id,
        employee_name: employee.name,
        department: employee.department,
        created_at: at,
        lines: requisition_lines,
    })
}

/// Approve a pending requisition, decrementing stock for every line.
///
/// All-or-nothing: if any line is short, nothing changes.
pub fn approve_requisition<S: InventoryStore + ?Sized>(
    store: &mut S,
    id: RequisitionId,
    notes: Option<&str>,
    at: DateTime<Utc>,
) -> Result<Requisition, StockroomError> {
    let requisition = pending_requisition(&*store, id)?;
    let notes = validation::note(notes)?;

    for line in &requisition.lines {
        let item = store
            .get_item(line.item_id)?
            .ok_or(StockroomError::ItemNotFound(line.item_id))?;
        if item.quantity < line.quantity {
            return Err(StockroomError::InsufficientStock {
                item: item.name,
                requested: line.quantity,
                available: item.quantity,
            });
        }
    }

    store.apply_decision(&Decision {
        requisition_id: id,
        outcome: DecisionOutcome::Approve,
        notes,
        at,
    })
}

/// Reject a pending requisition. Stock is not touched.
pub fn reject_requisition<S: InventoryStore + ?Sized>(
    store: &mut S,
    id: RequisitionId,
    notes: Option<&str>,
    at: DateTime<Utc>,
) -> Result<Requisition, StockroomError> {
    pending_requisition(&*store, id)?;
    let notes = validation::note(notes)?;
    store.apply_decision(&Decision {
        requisition_id: id,
        outcome: DecisionOutcome::Reject,
        notes,
        at,
    })
}

fn pending_requisition<S: InventoryStore + ?Sized>(
    store: &S,
    id: RequisitionId,
) -> Result<Requisition, StockroomError> {
    let requisition = store
        .get_requisition(id)?
        .ok_or(StockroomError::RequisitionNotFound(id))?;
    if !requisition.is_pending() {
        return Err(StockroomError::AlreadyProcessed {
            id,
            status: requisition.status,
        });
    }
    Ok(requisition)
}

/// Requisitions, optionally filtered by status, oldest first.
///
/// With `Some(Pending)` this is the administrator's approval queue.
pub fn list_requisitions<S: InventoryStore + ?Sized>(
    store: &S,
    status: Option<RequisitionStatus>,
) -> Result<Vec<Requisition>, StockroomError> {
    let mut all = store.list_requisitions()?;
    if let Some(status) = status {
        all.retain(|r| r.status == status);
    }
    Ok(all)
}

/// One employee's requisitions, newest first.
pub fn employee_requisitions<S: InventoryStore + ?Sized>(
    store: &S,
    employee_id: EmployeeId,
) -> Result<Vec<Requisition>, StockroomError> {
    if store.get_employee(employee_id)?.is_none() {
        return Err(StockroomError::EmployeeNotFound(employee_id));
    }
    let mut mine: Vec<Requisition> = store
        .list_requisitions()?
        .into_iter()
        .filter(|r| r.employee_id == employee_id)
        .collect();
    mine.reverse();
    Ok(mine)
}

// =============================================================================
// TESTS
// =============================================================================
