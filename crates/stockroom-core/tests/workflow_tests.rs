//! # Requisition Workflow Tests
//!
//! End-to-end scenarios run against both store implementations.
//! The in-memory and redb stores must agree on every outcome.

use chrono::{DateTime, TimeZone, Utc};
use stockroom_core::{
    InventoryStore, ItemDraft, LineRequest, MemoryStore, NewEmployee, RedbStore,
    RequisitionStatus, StockroomError, TransactionKind, inventory, workflow,
};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn draft(name: &str, quantity: u64) -> ItemDraft {
    ItemDraft {
        name: name.to_string(),
        category: None,
        unit: None,
        quantity,
        min_stock: Some(5),
        price_cents: Some(100),
    }
}

fn employee(name: &str, department: &str, email: &str) -> NewEmployee {
    NewEmployee {
        name: name.to_string(),
        department: department.to_string(),
        email: email.to_string(),
    }
}

fn line(item: &stockroom_core::Item, quantity: u64) -> LineRequest {
    LineRequest {
        item_id: item.id,
        quantity,
    }
}

// =============================================================================
// SCENARIOS (generic over the store)
// =============================================================================

fn approve_decrements_every_line<S: InventoryStore>(store: &mut S) {
    let pen = inventory::add_item(store, &draft("Pen", 10), at(8)).expect("pen");
    let paper = inventory::add_item(store, &draft("A4 Paper", 4), at(8)).expect("paper");
    let john = inventory::add_employee(store, &employee("John Doe", "IT", "john@company.com"), at(8))
        .expect("john");

    let requisition = workflow::submit_requisition(
        store,
        john.id,
        &[line(&pen, 3), line(&paper, 4)],
        at(9),
    )
    .expect("submit");
    assert_eq!(requisition.status, RequisitionStatus::Pending);
    assert_eq!(requisition.department, "IT");

    let approved =
        workflow::approve_requisition(store, requisition.id, Some("enjoy"), at(10)).expect("approve");
    assert_eq!(approved.status, RequisitionStatus::Approved);
    assert_eq!(approved.admin_notes.as_deref(), Some("enjoy"));
    assert_eq!(approved.processed_at, Some(at(10)));

    assert_eq!(store.get_item(pen.id).expect("get").expect("pen").quantity, 7);
    assert_eq!(store.get_item(paper.id).expect("get").expect("paper").quantity, 0);

    let history = store.list_history().expect("history");
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|r| r.kind == TransactionKind::Approved));
    assert!(history.iter().all(|r| r.requisition_id == Some(requisition.id)));
}

fn short_line_blocks_whole_approval<S: InventoryStore>(store: &mut S) {
    let pen = inventory::add_item(store, &draft("Pen", 10), at(8)).expect("pen");
    let clip = inventory::add_item(store, &draft("Binder Clip", 5), at(8)).expect("clip");
    let jane = inventory::add_employee(store, &employee("Jane Smith", "HR", "jane@company.com"), at(8))
        .expect("jane");
    let bob = inventory::add_employee(store, &employee("Bob Johnson", "Finance", "bob@company.com"), at(8))
        .expect("bob");

    let first = workflow::submit_requisition(store, jane.id, &[line(&pen, 2), line(&clip, 5)], at(9))
        .expect("first");
    let second = workflow::submit_requisition(store, bob.id, &[line(&clip, 3)], at(9))
        .expect("second");

    workflow::approve_requisition(store, second.id, None, at(10)).expect("approve second");

    let err = workflow::approve_requisition(store, first.id, None, at(11)).expect_err("short");
    assert!(matches!(
        err,
        StockroomError::InsufficientStock { requested: 5, available: 2, .. }
    ));

    // Nothing moved for the failed approval.
    assert_eq!(store.get_item(pen.id).expect("get").expect("pen").quantity, 10);
    assert_eq!(store.get_item(clip.id).expect("get").expect("clip").quantity, 2);
    let first = store.get_requisition(first.id).expect("get").expect("first");
    assert!(first.is_pending());
    assert_eq!(store.list_history().expect("history").len(), 1);
}

fn decided_requisition_is_final<S: InventoryStore>(store: &mut S) {
    let pen = inventory::add_item(store, &draft("Pen", 10), at(8)).expect("pen");
    let alice = inventory::add_employee(
        store,
        &employee("Alice Brown", "Marketing", "alice@company.com"),
        at(8),
    )
    .expect("alice");

    let requisition =
        workflow::submit_requisition(store, alice.id, &[line(&pen, 1)], at(9)).expect("submit");
    workflow::reject_requisition(store, requisition.id, Some("not needed"), at(10)).expect("reject");

    let err = workflow::approve_requisition(store, requisition.id, None, at(11)).expect_err("final");
    assert!(matches!(
        err,
        StockroomError::AlreadyProcessed { status: RequisitionStatus::Rejected, .. }
    ));
    let err = workflow::reject_requisition(store, requisition.id, None, at(11)).expect_err("final");
    assert!(matches!(err, StockroomError::AlreadyProcessed { .. }));

    assert_eq!(store.get_item(pen.id).expect("get").expect("pen").quantity, 10);
    let history = store.list_history().expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, TransactionKind::Rejected);
    assert_eq!(history[0].note.as_deref(), Some("not needed"));
}

fn pending_references_guard_removal<S: InventoryStore>(store: &mut S) {
    let pen = inventory::add_item(store, &draft("Pen", 10), at(8)).expect("pen");
    let john = inventory::add_employee(store, &employee("John Doe", "IT", "john@company.com"), at(8))
        .expect("john");
    let requisition =
        workflow::submit_requisition(store, john.id, &[line(&pen, 1)], at(9)).expect("submit");

    assert!(matches!(
        inventory::remove_item(store, pen.id),
        Err(StockroomError::ItemInUse(_))
    ));
    assert!(matches!(
        inventory::remove_employee(store, john.id),
        Err(StockroomError::EmployeeHasPending(_))
    ));

    workflow::approve_requisition(store, requisition.id, None, at(10)).expect("approve");
    inventory::remove_item(store, pen.id).expect("remove item");
    inventory::remove_employee(store, john.id).expect("remove employee");

    // History keeps the names after the rows are gone.
    let history = store.list_history().expect("history");
    assert_eq!(history[0].item_name, "Pen");
    assert_eq!(history[0].employee_name, "John Doe");
}

fn queue_and_personal_history_order<S: InventoryStore>(store: &mut S) {
    let pen = inventory::add_item(store, &draft("Pen", 100), at(8)).expect("pen");
    let john = inventory::add_employee(store, &employee("John Doe", "IT", "john@company.com"), at(8))
        .expect("john");

    let first = workflow::submit_requisition(store, john.id, &[line(&pen, 1)], at(9)).expect("1");
    let second = workflow::submit_requisition(store, john.id, &[line(&pen, 2)], at(10)).expect("2");
    let third = workflow::submit_requisition(store, john.id, &[line(&pen, 3)], at(11)).expect("3");
    workflow::approve_requisition(store, second.id, None, at(12)).expect("approve");

    let queue = workflow::list_requisitions(&*store, Some(RequisitionStatus::Pending)).expect("queue");
    let queue: Vec<_> = queue.iter().map(|r| r.id).collect();
    assert_eq!(queue, vec![first.id, third.id]);

    let mine = workflow::employee_requisitions(&*store, john.id).expect("mine");
    let mine: Vec<_> = mine.iter().map(|r| r.id).collect();
    assert_eq!(mine, vec![third.id, second.id, first.id]);
}

// =============================================================================
// BACKENDS
// =============================================================================

macro_rules! on_both_stores {
    ($($scenario:ident),* $(,)?) => {
        mod memory {
            use super::*;
            $(
                #[test]
                fn $scenario() {
                    super::$scenario(&mut MemoryStore::new());
                }
            )*
        }

        mod redb {
            use super::*;
            $(
                #[test]
                fn $scenario() {
                    let dir = tempfile::tempdir().expect("tempdir");
                    let mut store = RedbStore::open(dir.path().join("stockroom.db")).expect("open");
                    super::$scenario(&mut store);
                }
            )*
        }
    };
}

on_both_stores!(
    approve_decrements_every_line,
    short_line_blocks_whole_approval,
    decided_requisition_is_final,
    pending_references_guard_removal,
    queue_and_personal_history_order,
);
