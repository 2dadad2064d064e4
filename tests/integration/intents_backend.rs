//! Commit intents dispatched against the in-memory workbook.

use crate::integration::test_utils::fixture;
use gatehouse::backend::{
    InMemorySheets, SheetBackend, SHEET_BLOCKLIST, SHEET_EXCEPTIONS, SHEET_MATERIALS,
};
use gatehouse::clock::Clock;
use gatehouse::intent::CommitIntent;
use gatehouse::queue::ApprovalOutcome;
use gatehouse::types::{Priority, RequestStatus};
use std::sync::Arc;

fn material() -> CommitIntent {
    CommitIntent::MaterialRemoval {
        person_name: "Lucas Pires".to_string(),
        material: "Copper cable".to_string(),
        quantity: 12,
        destination: "Site 4".to_string(),
    }
}

#[test]
fn approved_material_removal_writes_one_row() {
    let (clock, mut store) = fixture();
    let sheets = InMemorySheets::new();
    let intent = material();
    let id = store.submit(
        intent.kind(),
        Priority::High,
        intent.into_payload().unwrap(),
        Some(CommitIntent::commit_callback(
            Arc::new(sheets.clone()),
            Arc::new(clock.clone()),
        )),
    );

    assert_eq!(store.approve_detailed(&id, "admin"), ApprovalOutcome::Committed { attempts: 1 });
    let rows = sheets.rows(SHEET_MATERIALS);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1..], ["Lucas Pires", "Copper cable", "12", "Site 4"]);
    assert_eq!(sheets.connections_opened(), 1);
    assert_eq!(sheets.open_connections(), 0);
}

#[test]
fn transient_backend_outage_is_retried() {
    let (clock, mut store) = fixture();
    let sheets = InMemorySheets::new();
    sheets.fail_next_opens(2);
    let intent = material();
    let id = store.submit(
        intent.kind(),
        Priority::Normal,
        intent.into_payload().unwrap(),
        Some(CommitIntent::commit_callback(
            Arc::new(sheets.clone()),
            Arc::new(clock.clone()),
        )),
    );

    assert_eq!(store.approve_detailed(&id, "admin"), ApprovalOutcome::Committed { attempts: 3 });
    assert_eq!(sheets.rows(SHEET_MATERIALS).len(), 1);
    assert_eq!(sheets.open_connections(), 0);
}

#[test]
fn persistent_write_failure_records_backend_error() {
    let (clock, mut store) = fixture();
    let sheets = InMemorySheets::new();
    sheets.fail_next_writes(3);
    let intent = CommitIntent::AdminException {
        person_name: "Marta Leal".to_string(),
        justification: "escort unavailable".to_string(),
    };
    let id = store.submit(
        intent.kind(),
        Priority::High,
        intent.into_payload().unwrap(),
        Some(CommitIntent::commit_callback(
            Arc::new(sheets.clone()),
            Arc::new(clock.clone()),
        )),
    );

    assert!(!store.approve(&id, "admin"));
    let record = store.find(&id).unwrap();
    assert_eq!(record.status, RequestStatus::Error);
    let message = record.error_message.as_deref().unwrap();
    assert!(message.contains("appending to exceptions"));
    assert!(message.contains("rejected"));
    assert!(sheets.rows(SHEET_EXCEPTIONS).is_empty());
    assert_eq!(sheets.connections_opened(), 3);
    assert_eq!(sheets.open_connections(), 0);
}

#[test]
fn override_of_unlisted_person_declines() {
    let (clock, mut store) = fixture();
    let sheets = InMemorySheets::new();
    sheets
        .seed_row(SHEET_BLOCKLIST, vec!["Someone Else".to_string(), "111".to_string()])
        .unwrap();
    let intent = CommitIntent::BlockListOverride {
        person_name: "Nina Prata".to_string(),
        document: "222".to_string(),
        reason: "cleared".to_string(),
    };
    let id = store.submit(
        intent.kind(),
        intent.default_priority(),
        intent.into_payload().unwrap(),
        Some(CommitIntent::commit_callback(
            Arc::new(sheets.clone()),
            Arc::new(clock.clone()),
        )),
    );

    assert!(!store.approve(&id, "admin"));
    let record = store.find(&id).unwrap();
    assert_eq!(record.error_message.as_deref(), Some("callback declined"));
    assert_eq!(sheets.rows(SHEET_BLOCKLIST).len(), 1);
}

fn override_for(document: &str) -> CommitIntent {
    CommitIntent::BlockListOverride {
        person_name: "Bruno Teles".to_string(),
        document: document.to_string(),
        reason: "cleared by security".to_string(),
    }
}

#[test]
fn failed_override_record_keeps_person_listed() {
    let (clock, mut store) = fixture();
    let sheets = InMemorySheets::with_sheets(&[SHEET_BLOCKLIST]);
    sheets
        .seed_row(SHEET_BLOCKLIST, vec!["Bruno Teles".to_string(), "999".to_string()])
        .unwrap();
    let intent = override_for("999");
    let id = store.submit(
        intent.kind(),
        intent.default_priority(),
        intent.into_payload().unwrap(),
        Some(CommitIntent::commit_callback(
            Arc::new(sheets.clone()),
            Arc::new(clock.clone()),
        )),
    );

    assert!(!store.approve(&id, "admin"));
    let record = store.find(&id).unwrap();
    assert_eq!(record.status, RequestStatus::Error);
    let message = record.error_message.as_deref().unwrap();
    assert!(message.contains("appending to exceptions"), "{message}");
    assert_eq!(sheets.rows(SHEET_BLOCKLIST).len(), 1);
    assert_eq!(sheets.connections_opened(), 3);
}

#[test]
fn override_retried_after_rejected_write_commits_once() {
    let (clock, mut store) = fixture();
    let sheets = InMemorySheets::new();
    sheets
        .seed_row(SHEET_BLOCKLIST, vec!["Bruno Teles".to_string(), "999".to_string()])
        .unwrap();
    sheets.fail_next_writes(1);
    let intent = override_for("999");
    let id = store.submit(
        intent.kind(),
        intent.default_priority(),
        intent.into_payload().unwrap(),
        Some(CommitIntent::commit_callback(
            Arc::new(sheets.clone()),
            Arc::new(clock.clone()),
        )),
    );

    assert_eq!(store.approve_detailed(&id, "admin"), ApprovalOutcome::Committed { attempts: 2 });
    assert!(sheets.rows(SHEET_BLOCKLIST).is_empty());
    let exceptions = sheets.rows(SHEET_EXCEPTIONS);
    assert_eq!(exceptions.len(), 1);
    assert_eq!(exceptions[0][2], "block-list override: cleared by security");
}

#[test]
fn payload_without_intent_tag_raises() {
    let (clock, mut store) = fixture();
    let sheets = InMemorySheets::new();
    let mut payload = material().into_payload().unwrap();
    payload.remove("intent");
    let id = store.submit(
        gatehouse::types::RequestKind::MaterialRemoval,
        Priority::High,
        payload,
        Some(CommitIntent::commit_callback(
            Arc::new(sheets.clone()),
            Arc::new(clock.clone()),
        )),
    );

    assert!(!store.approve(&id, "admin"));
    let message = store.find(&id).unwrap().error_message.clone().unwrap();
    assert!(message.starts_with("Invalid payload"));
    assert_eq!(sheets.connections_opened(), 0);
}

#[test]
fn connection_is_scoped_to_its_holder() {
    let (clock, _store) = fixture();
    let sheets = InMemorySheets::new();
    let backend: Arc<dyn SheetBackend> = Arc::new(sheets.clone());
    let mut conn = backend.open().unwrap();
    material().apply(conn.as_mut(), clock.now()).unwrap();
    assert_eq!(sheets.open_connections(), 1);
    drop(conn);
    assert_eq!(sheets.open_connections(), 0);
}
