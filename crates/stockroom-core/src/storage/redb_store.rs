//! # redb-backed Inventory Storage
//!
//! A disk-backed store using the redb embedded database, providing:
//! - ACID transactions (every trait mutation is one write transaction)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Rows are postcard-encoded. Item names and employee emails have unique
//! secondary indexes keyed by their normalised form. Id counters live in
//! the metadata table.
//!
//! A check that fails halfway through a mutation returns early, which
//! drops the write transaction uncommitted; nothing becomes visible.

use crate::store::InventoryStore;
use crate::validation::normalize_key;
use crate::{
    Decision, DecisionOutcome, Employee, EmployeeId, Item, ItemId, ItemPatch, NewEmployee,
    NewItem, NewRequisition, Requisition, RequisitionId, StockAdjustment, StockroomError,
    TransactionDraft, TransactionId, TransactionRecord,
};
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Table for items: ItemId(u64) -> serialized Item bytes
const ITEMS: TableDefinition<u64, &[u8]> = TableDefinition::new("items");

/// Unique index: normalised item name -> ItemId(u64)
const ITEM_NAMES: TableDefinition<&str, u64> = TableDefinition::new("item_names");

/// Table for employees: EmployeeId(u64) -> serialized Employee bytes
const EMPLOYEES: TableDefinition<u64, &[u8]> = TableDefinition::new("employees");

/// Unique index: normalised email -> EmployeeId(u64)
const EMAILS: TableDefinition<&str, u64> = TableDefinition::new("employee_emails");

/// Table for requisitions (lines embedded): RequisitionId(u64) -> serialized bytes
const REQUISITIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("requisitions");

/// Append-only history: TransactionId(u64) -> serialized TransactionRecord bytes
const HISTORY: TableDefinition<u64, &[u8]> = TableDefinition::new("transaction_history");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const LAST_ITEM_ID: &str = "last_item_id";
const LAST_EMPLOYEE_ID: &str = "last_employee_id";
const LAST_REQUISITION_ID: &str = "last_requisition_id";
const LAST_TRANSACTION_ID: &str = "last_transaction_id";

// =============================================================================
// ENCODING HELPERS
// =============================================================================

fn storage<E: std::fmt::Display>(e: E) -> StockroomError {
    StockroomError::IoError(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StockroomError> {
    postcard::to_allocvec(value).map_err(|e| StockroomError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StockroomError> {
    postcard::from_bytes(bytes).map_err(|e| StockroomError::SerializationError(e.to_string()))
}

fn read_row<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> Result<Option<T>, StockroomError> {
    table
        .get(id)
        .map_err(storage)?
        .map(|guard| decode(guard.value()))
        .transpose()
}

fn read_all<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
) -> Result<Vec<T>, StockroomError> {
    let mut rows = Vec::new();
    for entry in table.iter().map_err(storage)? {
        let (_, value) = entry.map_err(storage)?;
        rows.push(decode(value.value())?);
    }
    Ok(rows)
}

/// Bump and return the counter stored under `key`. Ids start at 1.
fn next_id(txn: &WriteTransaction, key: &str) -> Result<u64, StockroomError> {
    let mut meta = txn.open_table(METADATA).map_err(storage)?;
    let last = meta.get(key).map_err(storage)?.map(|v| v.value()).unwrap_or(0);
    let next = last.saturating_add(1);
    meta.insert(key, next).map_err(storage)?;
    Ok(next)
}

fn append_history(txn: &WriteTransaction, draft: TransactionDraft) -> Result<(), StockroomError> {
    let id = TransactionId(next_id(txn, LAST_TRANSACTION_ID)?);
    let record = draft.into_record(id);
    let mut history = txn.open_table(HISTORY).map_err(storage)?;
    history
        .insert(id.0, encode(&record)?.as_slice())
        .map_err(storage)?;
    Ok(())
}

// =============================================================================
// REDB STORE
// =============================================================================

/// A disk-backed inventory store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a stockroom database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StockroomError> {
        let db = Database::create(path.as_ref()).map_err(storage)?;

        // Initialize tables if they don't exist, so readers never miss one.
        {
            let write_txn = db.begin_write().map_err(storage)?;
            let _ = write_txn.open_table(ITEMS).map_err(storage)?;
            let _ = write_txn.open_table(ITEM_NAMES).map_err(storage)?;
            let _ = write_txn.open_table(EMPLOYEES).map_err(storage)?;
            let _ = write_txn.open_table(EMAILS).map_err(storage)?;
            let _ = write_txn.open_table(REQUISITIONS).map_err(storage)?;
            let _ = write_txn.open_table(HISTORY).map_err(storage)?;
            let _ = write_txn.open_table(METADATA).map_err(storage)?;
            write_txn.commit().map_err(storage)?;
        }

        Ok(Self { db })
    }
}

// =============================================================================
// INVENTORYSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl InventoryStore for RedbStore {
    fn insert_item(&mut self, item: NewItem, at: DateTime<Utc>) -> Result<Item, StockroomError> {
        let write_txn = self.db.begin_write().map_err(storage)?;
        let item = {
            let key = normalize_key(&item.name);
            let mut names = write_txn.open_table(ITEM_NAMES).map_err(storage)?;
            if names.get(key.as_str()).map_err(storage)?.is_some() {
                return Err(StockroomError::DuplicateItem(item.name));
            }

            let id = ItemId(next_id(&write_txn, LAST_ITEM_ID)?);
            let item = Item::from_new(id, item, at);

            let mut items = write_txn.open_table(ITEMS).map_err(storage)?;
            items
                .insert(id.0, encode(&item)?.as_slice())
                .map_err(storage)?;
            names.insert(key.as_str(), id.0).map_err(storage)?;
            item
        };
        write_txn.commit().map_err(storage)?;
        Ok(item)
    }

    fn update_item(
        &mut self,
        id: ItemId,
        patch: &ItemPatch,
        at: DateTime<Utc>,
    ) -> Result<Item, StockroomError> {
        let write_txn = self.db.begin_write().map_err(storage)?;
        let item = {
            let mut items = write_txn.open_table(ITEMS).map_err(storage)?;
            let mut item: Item =
                read_row(&items, id.0)?.ok_or(StockroomError::ItemNotFound(id))?;
            let old_key = normalize_key(&item.name);
            item.patch(patch, at);
            let new_key = normalize_key(&item.name);

            if new_key != old_key {
                let mut names = write_txn.open_table(ITEM_NAMES).map_err(storage)?;
                if names.get(new_key.as_str()).map_err(storage)?.is_some() {
                    return Err(StockroomError::DuplicateItem(item.name));
                }
                names.remove(old_key.as_str()).map_err(storage)?;
                names.insert(new_key.as_str(), id.0).map_err(storage)?;
            }

            items
                .insert(id.0, encode(&item)?.as_slice())
                .map_err(storage)?;
            item
        };
        write_txn.commit().map_err(storage)?;
        Ok(item)
    }

    fn remove_item(&mut self, id: ItemId) -> Result<Item, StockroomError> {
        let write_txn = self.db.begin_write().map_err(storage)?;
        let item = {
            let mut items = write_txn.open_table(ITEMS).map_err(storage)?;
            let item: Item = items
                .remove(id.0)
                .map_err(storage)?
                .map(|guard| decode(guard.value()))
                .transpose()?
                .ok_or(StockroomError::ItemNotFound(id))?;
            let mut names = write_txn.open_table(ITEM_NAMES).map_err(storage)?;
            names
                .remove(normalize_key(&item.name).as_str())
                .map_err(storage)?;
            item
        };
        write_txn.commit().map_err(storage)?;
        Ok(item)
    }

    fn get_item(&self, id: ItemId) -> Result<Option<Item>, StockroomError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let items = read_txn.open_table(ITEMS).map_err(storage)?;
        read_row(&items, id.0)
    }

    fn find_item_by_name(&self, name: &str) -> Result<Option<Item>, StockroomError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let names = read_txn.open_table(ITEM_NAMES).map_err(storage)?;
        let Some(id) = names
            .get(normalize_key(name).as_str())
            .map_err(storage)?
            .map(|v| v.value())
        else {
            return Ok(None);
        };
        let items = read_txn.open_table(ITEMS).map_err(storage)?;
        read_row(&items, id)
    }

    fn list_items(&self) -> Result<Vec<Item>, StockroomError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let items = read_txn.open_table(ITEMS).map_err(storage)?;
        read_all(&items)
    }

    fn adjust_stock(
        &mut self,
        id: ItemId,
        adjustment: StockAdjustment,
        record: TransactionDraft,
    ) -> Result<Item, StockroomError> {
        let write_txn = self.db.begin_write().map_err(storage)?;
        let item = {
            let mut items = write_txn.open_table(ITEMS).map_err(storage)?;
            let mut item: Item =
                read_row(&items, id.0)?.ok_or(StockroomError::ItemNotFound(id))?;
            item.apply(adjustment, record.at)?;
            items
                .insert(id.0, encode(&item)?.as_slice())
                .map_err(storage)?;
            item
        };
        append_history(&write_txn, record)?;
        write_txn.commit().map_err(storage)?;
        Ok(item)
    }

    fn insert_employee(
        &mut self,
        employee: NewEmployee,
        at: DateTime<Utc>,
    ) -> Result<Employee, StockroomError> {
        let write_txn = self.db.begin_write().map_err(storage)?;
        let employee = {
            let key = normalize_key(&employee.email);
            let mut emails = write_txn.open_table(EMAILS).map_err(storage)?;
            if emails.get(key.as_str()).map_err(storage)?.is_some() {
                return Err(StockroomError::DuplicateEmail(employee.email));
            }

            let id = EmployeeId(next_id(&write_txn, LAST_EMPLOYEE_ID)?);
            let employee = Employee {
                id,
                name: employee.name,
                department: employee.department,
                email: employee.email,
                created_at: at,
            };

            let mut employees = write_txn.open_table(EMPLOYEES).map_err(storage)?;
            employees
                .insert(id.0, encode(&employee)?.as_slice())
                .map_err(storage)?;
            emails.insert(key.as_str(), id.0).map_err(storage)?;
            employee
        };
        write_txn.commit().map_err(storage)?;
        Ok(employee)
    }

    fn remove_employee(&mut self, id: EmployeeId) -> Result<Employee, StockroomError> {
        let write_txn = self.db.begin_write().map_err(storage)?;
        let employee = {
            let mut employees = write_txn.open_table(EMPLOYEES).map_err(storage)?;
            let employee: Employee = employees
                .remove(id.0)
                .map_err(storage)?
                .map(|guard| decode(guard.value()))
                .transpose()?
                .ok_or(StockroomError::EmployeeNotFound(id))?;
            let mut emails = write_txn.open_table(EMAILS).map_err(storage)?;
            emails
                .remove(normalize_key(&employee.email).as_str())
                .map_err(storage)?;
            employee
        };
        write_txn.commit().map_err(storage)?;
        Ok(employee)
    }

    fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, StockroomError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let employees = read_txn.open_table(EMPLOYEES).map_err(storage)?;
        read_row(&employees, id.0)
    }

    fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>, StockroomError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let emails = read_txn.open_table(EMAILS).map_err(storage)?;
        let Some(id) = emails
            .get(normalize_key(email).as_str())
            .map_err(storage)?
            .map(|v| v.value())
        else {
            return Ok(None);
        };
        let employees = read_txn.open_table(EMPLOYEES).map_err(storage)?;
        read_row(&employees, id)
    }

    fn list_employees(&self) -> Result<Vec<Employee>, StockroomError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let employees = read_txn.open_table(EMPLOYEES).map_err(storage)?;
        read_all(&employees)
    }

    fn insert_requisition(
        &mut self,
        requisition: NewRequisition,
    ) -> Result<Requisition, StockroomError> {
        let write_txn = self.db.begin_write().map_err(storage)?;
        let requisition = {
            let id = RequisitionId(next_id(&write_txn, LAST_REQUISITION_ID)?);
            let requisition = Requisition::from_new(id, requisition);
            let mut requisitions = write_txn.open_table(REQUISITIONS).map_err(storage)?;
            requisitions
                .insert(id.0, encode(&requisition)?.as_slice())
                .map_err(storage)?;
            requisition
        };
        write_txn.commit().map_err(storage)?;
        Ok(requisition)
    }

    fn get_requisition(&self, id: RequisitionId) -> Result<Option<Requisition>, StockroomError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let requisitions = read_txn.open_table(REQUISITIONS).map_err(storage)?;
        read_row(&requisitions, id.0)
    }

    fn list_requisitions(&self) -> Result<Vec<Requisition>, StockroomError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let requisitions = read_txn.open_table(REQUISITIONS).map_err(storage)?;
        read_all(&requisitions)
    }

    fn apply_decision(&mut self, decision: &Decision) -> Result<Requisition, StockroomError> {
        let id = decision.requisition_id;
        let write_txn = self.db.begin_write().map_err(storage)?;
        let requisition = {
            let mut requisitions = write_txn.open_table(REQUISITIONS).map_err(storage)?;
            let mut requisition: Requisition =
                read_row(&requisitions, id.0)?.ok_or(StockroomError::RequisitionNotFound(id))?;
            requisition.decide(decision)?;

            if decision.outcome == DecisionOutcome::Approve {
                let mut items = write_txn.open_table(ITEMS).map_err(storage)?;
                for line in &requisition.lines {
                    let mut item: Item = read_row(&items, line.item_id.0)?
                        .ok_or(StockroomError::ItemNotFound(line.item_id))?;
                    item.apply(StockAdjustment::Remove(line.quantity), decision.at)?;
                    items
                        .insert(item.id.0, encode(&item)?.as_slice())
                        .map_err(storage)?;
                }
            }

            for draft in requisition.decision_records(decision) {
                append_history(&write_txn, draft)?;
            }
            requisitions
                .insert(id.0, encode(&requisition)?.as_slice())
                .map_err(storage)?;
            requisition
        };
        write_txn.commit().map_err(storage)?;
        Ok(requisition)
    }

    fn list_history(&self) -> Result<Vec<TransactionRecord>, StockroomError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let history = read_txn.open_table(HISTORY).map_err(storage)?;
        read_all(&history)
    }
}

// =============================================================================
// TESTS
// =============================================================================
