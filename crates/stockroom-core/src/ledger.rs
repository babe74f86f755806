//! # Ledger Module
//!
//! The entry point used by the server and the CLI.
//!
//! A `Ledger` owns one storage backend and stamps every mutation with the
//! current time, so callers never pass timestamps around.
//!
//! ## Storage Backends
//!
//! - `InMemory`: uses `MemoryStore` (fast, volatile)
//! - `Persistent`: uses `RedbStore` for disk-backed ACID storage

use crate::formats::{export_history_csv, export_items_csv, parse_items_csv};
use crate::inventory::{self, ImportSummary};
use crate::report::{self, DepartmentUsage, HistoryFilter, ItemUsage, LowStockEntry, Summary};
use crate::seed::{self, SeedReport};
use crate::storage::RedbStore;
use crate::store::{InventoryStore, MemoryStore};
use crate::workflow::{self, Availability};
use crate::{
    Employee, EmployeeId, Item, ItemDraft, ItemId, ItemPatch, LineRequest, NewEmployee,
    Requisition, RequisitionId, RequisitionStatus, StockroomError, TransactionRecord,
};
use chrono::Utc;
use std::path::Path;

/// Storage backend for a Ledger.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory store (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

/// The stockroom ledger: inventory, staff, requisitions and history.
#[derive(Debug, Default)]
pub struct Ledger {
    backend: StorageBackend,
}

impl Ledger {
    /// Create an empty in-memory ledger.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open or create a redb-backed ledger at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StockroomError> {
        Ok(Self {
            backend: StorageBackend::Persistent(RedbStore::open(path)?),
        })
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// The active store.
    #[must_use]
    pub fn store(&self) -> &dyn InventoryStore {
        match &self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
        }
    }

    /// The active store, mutably.
    pub fn store_mut(&mut self) -> &mut dyn InventoryStore {
        match &mut self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
        }
    }

    // =========================================================================
    // ITEMS
    // =========================================================================

    pub fn items(&self) -> Result<Vec<Item>, StockroomError> {
        self.store().list_items()
    }

    /// Items an employee can currently request (in stock).
    pub fn requestable_items(&self) -> Result<Vec<Item>, StockroomError> {
        inventory::requestable_items(self.store())
    }

    pub fn item(&self, id: ItemId) -> Result<Item, StockroomError> {
        self.store()
            .get_item(id)?
            .ok_or(StockroomError::ItemNotFound(id))
    }

    pub fn add_item(&mut self, draft: &ItemDraft) -> Result<Item, StockroomError> {
        inventory::add_item(self.store_mut(), draft, Utc::now())
    }

    pub fn update_item(&mut self, id: ItemId, patch: &ItemPatch) -> Result<Item, StockroomError> {
        inventory::update_item(self.store_mut(), id, patch, Utc::now())
    }

    pub fn remove_item(&mut self, id: ItemId) -> Result<Item, StockroomError> {
        inventory::remove_item(self.store_mut(), id)
    }

    pub fn restock(
        &mut self,
        id: ItemId,
        quantity: u64,
        note: Option<&str>,
    ) -> Result<Item, StockroomError> {
        inventory::restock(self.store_mut(), id, quantity, note, Utc::now())
    }

    pub fn correct_stock(
        &mut self,
        id: ItemId,
        quantity: u64,
        note: Option<&str>,
    ) -> Result<Item, StockroomError> {
        inventory::correct_stock(self.store_mut(), id, quantity, note, Utc::now())
    }

    // =========================================================================
    // EMPLOYEES
    // =========================================================================

    pub fn employees(&self) -> Result<Vec<Employee>, StockroomError> {
        self.store().list_employees()
    }

    pub fn employee(&self, id: EmployeeId) -> Result<Employee, StockroomError> {
        self.store()
            .get_employee(id)?
            .ok_or(StockroomError::EmployeeNotFound(id))
    }

    pub fn add_employee(&mut self, employee: &NewEmployee) -> Result<Employee, StockroomError> {
        inventory::add_employee(self.store_mut(), employee, Utc::now())
    }

    pub fn remove_employee(&mut self, id: EmployeeId) -> Result<Employee, StockroomError> {
        inventory::remove_employee(self.store_mut(), id)
    }

    /// Identify an employee by email.
    pub fn login(&self, email: &str) -> Result<Employee, StockroomError> {
        inventory::login(self.store(), email)
    }

    // =========================================================================
    // REQUISITIONS
    // =========================================================================

    pub fn check_availability(
        &self,
        lines: &[LineRequest],
    ) -> Result<Vec<Availability>, StockroomError> {
        workflow::check_availability(self.store(), lines)
    }

    pub fn submit_requisition(
        &mut self,
        employee_id: EmployeeId,
        lines: &[LineRequest],
    ) -> Result<Requisition, StockroomError> {
        workflow::submit_requisition(self.store_mut(), employee_id, lines, Utc::now())
    }

    pub fn approve_requisition(
        &mut self,
        id: RequisitionId,
        notes: Option<&str>,
    ) -> Result<Requisition, StockroomError> {
        workflow::approve_requisition(self.store_mut(), id, notes, Utc::now())
    }

    pub fn reject_requisition(
        &mut self,
        id: RequisitionId,
        notes: Option<&str>,
    ) -> Result<Requisition, StockroomError> {
        workflow::reject_requisition(self.store_mut(), id, notes, Utc::now())
    }

    pub fn requisition(&self, id: RequisitionId) -> Result<Requisition, StockroomError> {
        self.store()
            .get_requisition(id)?
            .ok_or(StockroomError::RequisitionNotFound(id))
    }

    /// Requisitions, optionally by status, oldest first.
    pub fn requisitions(
        &self,
        status: Option<RequisitionStatus>,
    ) -> Result<Vec<Requisition>, StockroomError> {
        workflow::list_requisitions(self.store(), status)
    }

    /// One employee's requisitions, newest first.
    pub fn employee_requisitions(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<Requisition>, StockroomError> {
        workflow::employee_requisitions(self.store(), employee_id)
    }

    // =========================================================================
    // REPORTS
    // =========================================================================

    pub fn history(&self, filter: &HistoryFilter) -> Result<Vec<TransactionRecord>, StockroomError> {
        Ok(report::filter_history(&self.store().list_history()?, filter))
    }

    pub fn low_stock(&self) -> Result<Vec<LowStockEntry>, StockroomError> {
        Ok(report::low_stock(&self.store().list_items()?))
    }

    pub fn summary(&self) -> Result<Summary, StockroomError> {
        report::summary(self.store())
    }

    pub fn department_usage(
        &self,
        filter: &HistoryFilter,
    ) -> Result<Vec<DepartmentUsage>, StockroomError> {
        Ok(report::department_usage(&self.history(filter)?))
    }

    pub fn top_items(
        &self,
        filter: &HistoryFilter,
        limit: usize,
    ) -> Result<Vec<ItemUsage>, StockroomError> {
        Ok(report::top_items(&self.history(filter)?, limit))
    }

    // =========================================================================
    // IMPORT / EXPORT
    // =========================================================================

    pub fn export_items_csv(&self) -> Result<Vec<u8>, StockroomError> {
        export_items_csv(&self.store().list_items()?)
    }

    pub fn export_history_csv(&self, filter: &HistoryFilter) -> Result<Vec<u8>, StockroomError> {
        export_history_csv(&self.history(filter)?)
    }

    /// Create or update items from a CSV file.
    pub fn import_items_csv(&mut self, data: &[u8]) -> Result<ImportSummary, StockroomError> {
        let rows = parse_items_csv(data)?;
        inventory::import_items(self.store_mut(), &rows, Utc::now())
    }

    /// Load the sample catalogue and staff into empty tables.
    pub fn seed_if_empty(&mut self) -> Result<SeedReport, StockroomError> {
        seed::seed_if_empty(self.store_mut(), Utc::now())
    }
}

// =============================================================================
// TESTS
// =============================================================================
