//! # Inventory Store
//!
//! The storage seam of the ledger.
//!
//! This module defines the `InventoryStore` trait and `MemoryStore`, its
//! in-memory implementation. All data structures use `BTreeMap` for
//! deterministic ordering.
//!
//! Stores are deliberately dumb: they assign ids, enforce uniqueness of
//! item names and employee emails, and apply each mutation atomically.
//! Business rules (who may request what, when an item may be removed)
//! live in `workflow` and `inventory`.

use crate::validation::normalize_key;
use crate::{
    Decision, DecisionOutcome, Employee, EmployeeId, Item, ItemId, ItemPatch, NewEmployee,
    NewItem, NewRequisition, Requisition, RequisitionId, StockAdjustment, StockroomError,
    TransactionDraft, TransactionId, TransactionRecord,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

// =============================================================================
// INVENTORYSTORE TRAIT
// =============================================================================

/// Storage operations for items, employees, requisitions and history.
///
/// Every `&mut self` method is atomic: it either applies completely or
/// leaves the store unchanged.
pub trait InventoryStore {
    /// Insert an item. Fails with `DuplicateItem` if the name is taken
    /// (case-insensitive).
    fn insert_item(&mut self, item: NewItem, at: DateTime<Utc>) -> Result<Item, StockroomError>;

    /// Update an item's metadata. Renames are subject to name uniqueness.
    fn update_item(
        &mut self,
        id: ItemId,
        patch: &ItemPatch,
        at: DateTime<Utc>,
    ) -> Result<Item, StockroomError>;

    /// Remove an item and return it.
    fn remove_item(&mut self, id: ItemId) -> Result<Item, StockroomError>;

    fn get_item(&self, id: ItemId) -> Result<Option<Item>, StockroomError>;

    /// Find an item by name, case-insensitively.
    fn find_item_by_name(&self, name: &str) -> Result<Option<Item>, StockroomError>;

    /// All items, ordered by id.
    fn list_items(&self) -> Result<Vec<Item>, StockroomError>;

    /// Change an item's quantity and append `record` to the history,
    /// as one unit.
    fn adjust_stock(
        &mut self,
        id: ItemId,
        adjustment: StockAdjustment,
        record: TransactionDraft,
    ) -> Result<Item, StockroomError>;

    /// Register an employee. Fails with `DuplicateEmail` if the email is taken.
    fn insert_employee(
        &mut self,
        employee: NewEmployee,
        at: DateTime<Utc>,
    ) -> Result<Employee, StockroomError>;

    fn remove_employee(&mut self, id: EmployeeId) -> Result<Employee, StockroomError>;

    fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, StockroomError>;

    /// Find an employee by email, case-insensitively.
    fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>, StockroomError>;

    /// All employees, ordered by id.
    fn list_employees(&self) -> Result<Vec<Employee>, StockroomError>;

    /// Store a new pending requisition.
    fn insert_requisition(
        &mut self,
        requisition: NewRequisition,
    ) -> Result<Requisition, StockroomError>;

    fn get_requisition(&self, id: RequisitionId) -> Result<Option<Requisition>, StockroomError>;

    /// All requisitions, ordered by id.
    fn list_requisitions(&self) -> Result<Vec<Requisition>, StockroomError>;

    /// Apply a decision to a pending requisition, as one unit:
    /// - re-check that the requisition is still pending
    /// - for approvals, re-check and decrement stock for every line
    /// - stamp status, notes and processing time
    /// - append one history record per line
    fn apply_decision(&mut self, decision: &Decision) -> Result<Requisition, StockroomError>;

    /// The full history, ordered by id (oldest first).
    fn list_history(&self) -> Result<Vec<TransactionRecord>, StockroomError>;
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-memory store.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: BTreeMap<ItemId, Item>,
    /// Normalised item name -> ItemId
    item_names: BTreeMap<String, ItemId>,
    employees: BTreeMap<EmployeeId, Employee>,
    /// Normalised email -> EmployeeId
    emails: BTreeMap<String, EmployeeId>,
    requisitions: BTreeMap<RequisitionId, Requisition>,
    history: BTreeMap<TransactionId, TransactionRecord>,
    next_item_id: u64,
    next_employee_id: u64,
    next_requisition_id: u64,
    next_transaction_id: u64,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push_history(&mut self, draft: TransactionDraft) {
        self.next_transaction_id = self.next_transaction_id.saturating_add(1);
        let id = TransactionId(self.next_transaction_id);
        self.history.insert(id, draft.into_record(id));
    }
}

impl InventoryStore for MemoryStore {
    fn insert_item(&mut self, item: NewItem, at: DateTime<Utc>) -> Result<Item, StockroomError> {
        let key = normalize_key(&item.name);
        if self.item_names.contains_key(&key) {
            return Err(StockroomError::DuplicateItem(item.name));
        }
        self.next_item_id = self.next_item_id.saturating_add(1);
        let id = ItemId(self.next_item_id);
        let item = Item::from_new(id, item, at);
        self.item_names.insert(key, id);
        self.items.insert(id, item.clone());
        Ok(item)
    }

    fn update_item(
        &mut self,
        id: ItemId,
        patch: &ItemPatch,
        at: DateTime<Utc>,
    ) -> Result<Item, StockroomError> {
        let current = self
            .items
            .get(&id)
            .ok_or(StockroomError::ItemNotFound(id))?;
        let old_key = normalize_key(&current.name);

        if let Some(new_name) = &patch.name {
            let new_key = normalize_key(new_name);
            if new_key != old_key && self.item_names.contains_key(&new_key) {
                return Err(StockroomError::DuplicateItem(new_name.clone()));
            }
        }

        let item = self
            .items
            .get_mut(&id)
            .ok_or(StockroomError::ItemNotFound(id))?;
        item.patch(patch, at);
        let updated = item.clone();

        let new_key = normalize_key(&updated.name);
        if new_key != old_key {
            self.item_names.remove(&old_key);
            self.item_names.insert(new_key, id);
        }
        Ok(updated)
    }

    fn remove_item(&mut self, id: ItemId) -> Result<Item, StockroomError> {
        let item = self
            .items
            .remove(&id)
            .ok_or(StockroomError::ItemNotFound(id))?;
        self.item_names.remove(&normalize_key(&item.name));
        Ok(item)
    }

    fn get_item(&self, id: ItemId) -> Result<Option<Item>, StockroomError> {
        Ok(self.items.get(&id).cloned())
    }

    fn find_item_by_name(&self, name: &str) -> Result<Option<Item>, StockroomError> {
        Ok(self
            .item_names
            .get(&normalize_key(name))
            .and_then(|id| self.items.get(id))
            .cloned())
    }

    fn list_items(&self) -> Result<Vec<Item>, StockroomError> {
        Ok(self.items.values().cloned().collect())
    }

    fn adjust_stock(
        &mut self,
        id: ItemId,
        adjustment: StockAdjustment,
        record: TransactionDraft,
    ) -> Result<Item, StockroomError> {
        let item = self
            .items
            .get_mut(&id)
            .ok_or(StockroomError::ItemNotFound(id))?;
        item.apply(adjustment, record.at)?;
        let updated = item.clone();
        self.push_history(record);
        Ok(updated)
    }

    fn insert_employee(
        &mut self,
        employee: NewEmployee,
        at: DateTime<Utc>,
    ) -> Result<Employee, StockroomError> {
        let key = normalize_key(&employee.email);
        if self.emails.contains_key(&key) {
            return Err(StockroomError::DuplicateEmail(employee.email));
        }
        self.next_employee_id = self.next_employee_id.saturating_add(1);
        let id = EmployeeId(self.next_employee_id);
        let employee = Employee {
            id,
            name: employee.name,
            department: employee.department,
            email: employee.email,
            created_at: at,
        };
        self.emails.insert(key, id);
        self.employees.insert(id, employee.clone());
        Ok(employee)
    }

    fn remove_employee(&mut self, id: EmployeeId) -> Result<Employee, StockroomError> {
        let employee = self
            .employees
            .remove(&id)
            .ok_or(StockroomError::EmployeeNotFound(id))?;
        self.emails.remove(&normalize_key(&employee.email));
        Ok(employee)
    }

    fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, StockroomError> {
        Ok(self.employees.get(&id).cloned())
    }

    fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>, StockroomError> {
        Ok(self
            .emails
            .get(&normalize_key(email))
            .and_then(|id| self.employees.get(id))
            .cloned())
    }

    fn list_employees(&self) -> Result<Vec<Employee>, StockroomError> {
        Ok(self.employees.values().cloned().collect())
    }

    fn insert_requisition(
        &mut self,
        requisition: NewRequisition,
    ) -> Result<Requisition, StockroomError> {
        self.next_requisition_id = self.next_requisition_id.saturating_add(1);
        let id = RequisitionId(self.next_requisition_id);
        let requisition = Requisition::from_new(id, requisition);
        self.requisitions.insert(id, requisition.clone());
        Ok(requisition)
    }

    fn get_requisition(&self, id: RequisitionId) -> Result<Option<Requisition>, StockroomError> {
        Ok(self.requisitions.get(&id).cloned())
    }

    fn list_requisitions(&self) -> Result<Vec<Requisition>, StockroomError> {
        Ok(self.requisitions.values().cloned().collect())
    }

    fn apply_decision(&mut self, decision: &Decision) -> Result<Requisition, StockroomError> {
        let id = decision.requisition_id;
        let mut requisition = self
            .requisitions
            .get(&id)
            .cloned()
            .ok_or(StockroomError::RequisitionNotFound(id))?;
        requisition.decide(decision)?;

        // Stage every stock change before touching the maps.
        let mut staged: BTreeMap<ItemId, Item> = BTreeMap::new();
        if decision.outcome == DecisionOutcome::Approve {
            for line in &requisition.lines {
                let mut item = match staged.remove(&line.item_id) {
                    Some(item) => item,
                    None => self
                        .items
                        .get(&line.item_id)
                        .cloned()
                        .ok_or(StockroomError::ItemNotFound(line.item_id))?,
                };
                item.apply(StockAdjustment::Remove(line.quantity), decision.at)?;
                staged.insert(item.id, item);
            }
        }

        self.items.extend(staged);
        for draft in requisition.decision_records(decision) {
            self.push_history(draft);
        }
        self.requisitions.insert(id, requisition.clone());
        Ok(requisition)
    }

    fn list_history(&self) -> Result<Vec<TransactionRecord>, StockroomError> {
        Ok(self.history.values().cloned().collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================
