//! Record store integration tests
//!
//! Drives the store against the in-memory service emulation.

mod common;

use common::ServiceEmulator;
use fivewhy_core::sync::RequestKind;
use fivewhy_core::{
    Department, EquipmentType, Error, FiveWhy, IncidentRecord, RecordPatch, RecordStore,
    RequestState, SearchFilter, Severity, SyncCoordinator,
};
use serde_json::json;
use std::sync::Arc;

fn setup() -> (Arc<ServiceEmulator>, Arc<SyncCoordinator>, RecordStore) {
    let service = Arc::new(ServiceEmulator::new());
    let sync = Arc::new(SyncCoordinator::new(service.clone()));
    let store = RecordStore::new(sync.clone());
    (service, sync, store)
}

fn motor(id: &str) -> IncidentRecord {
    IncidentRecord::new(id, EquipmentType::Motor, Department::Maintenance, "Overheating", "Bearing wear")
        .with_severity(Severity::High)
}

#[tokio::test]
async fn test_add_update_delete_scenario() {
    let (_service, _sync, store) = setup();

    let list = store.add(motor("EQ-1")).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list.get("EQ-1").unwrap().severity, Severity::High);

    let patch = RecordPatch::default().severity(Severity::Critical);
    let list = store.update("EQ-1", patch).await.unwrap();
    let record = list.get("EQ-1").unwrap();
    assert_eq!(record.severity, Severity::Critical);
    assert_eq!(record.issue, "Overheating");

    let list = store.remove("EQ-1").await.unwrap();
    assert!(!list.contains("EQ-1"));
    assert!(store.list().is_empty());
}

#[tokio::test]
async fn test_duplicate_add_leaves_store_unchanged() {
    let (service, _sync, store) = setup();
    store.add(motor("EQ-1")).await.unwrap();
    let before = store.list();

    let err = store.add(motor("EQ-1")).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateKey(ref id) if id == "EQ-1"));
    assert_eq!(err.to_string(), "Equipment ID EQ-1 already exists");
    assert!(store.list().ptr_eq(&before));
    assert_eq!(service.record_count(), 1);
}

#[tokio::test]
async fn test_keyed_operations_on_missing_id() {
    let (_service, _sync, store) = setup();
    store.add(motor("EQ-1")).await.unwrap();
    let before = store.list();

    let patch = RecordPatch::default().severity(Severity::Low);
    assert!(matches!(store.update("EQ-9", patch).await, Err(Error::NotFound(ref id)) if id == "EQ-9"));
    assert!(matches!(store.remove("EQ-9").await, Err(Error::NotFound(_))));
    assert!(matches!(store.fetch("EQ-9").await, Err(Error::NotFound(_))));
    assert!(store.list().ptr_eq(&before));
}

#[tokio::test]
async fn test_store_mirrors_server_after_mutations() {
    let (service, _sync, store) = setup();
    service.seed(json!({
        "equipment_id": "EQ-0", "equipment_type": "Pump", "department": "Quality",
        "severity": "Low", "issue": "Leak", "root_cause": "Seal failure",
        "why1": "", "why2": "", "why3": "", "why4": "", "why5": "", "solution": "",
        "date_reported": "2024-01-15"
    }));

    let list = store.add(motor("EQ-1")).await.unwrap();
    let ids: Vec<_> = list.iter().map(|r| r.equipment_id.as_str()).collect();
    assert_eq!(ids, vec!["EQ-0", "EQ-1"]);
    assert_eq!(list.len(), service.record_count());
}

#[tokio::test]
async fn test_network_failure_keeps_store() {
    let (service, sync, store) = setup();
    store.add(motor("EQ-1")).await.unwrap();
    let before = store.list();

    service.set_offline(true);
    let err = store.add(motor("EQ-2")).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(err.is_retryable());
    assert!(store.list().ptr_eq(&before));
    assert!(matches!(sync.status(RequestKind::AddRecord), RequestState::Failed(_)));
    assert!(!sync.is_loading());
}

#[tokio::test]
async fn test_failed_refetch_after_mutation_is_stale_not_error() {
    let (service, sync, store) = setup();
    store.add(motor("EQ-1")).await.unwrap();

    service.fail_route("/all-data");
    let list = store.add(motor("EQ-2")).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(service.record_count(), 2);
    assert!(matches!(sync.status(RequestKind::ListRecords), RequestState::Failed(_)));

    service.clear_failures();
    assert_eq!(store.refresh().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_replace_rewrites_every_field() {
    let (_service, _sync, store) = setup();
    store.add(motor("EQ-1")).await.unwrap();

    let mut record = store.fetch("EQ-1").await.unwrap();
    record.root_cause = "Misalignment".to_string();
    record.chain = FiveWhy {
        why1: Some("Vibration".to_string()),
        solution: Some("Realign coupling".to_string()),
        ..FiveWhy::default()
    };
    let list = store.replace(&record).await.unwrap();
    assert_eq!(list.get("EQ-1"), Some(&record));
}

#[tokio::test]
async fn test_search_filters_server_side() {
    let (_service, _sync, store) = setup();
    store.add(motor("EQ-1")).await.unwrap();
    store
        .add(IncidentRecord::new("EQ-2", EquipmentType::Pump, Department::Production, "Leak", "Seal failure"))
        .await
        .unwrap();

    let filter = SearchFilter {
        root_cause: Some("SEAL".to_string()),
        ..SearchFilter::default()
    };
    let found = store.search(&filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].equipment_id, "EQ-2");
    assert_eq!(store.list().len(), 2);
}

#[tokio::test]
async fn test_ids_with_reserved_characters() {
    let (_service, _sync, store) = setup();
    store.add(motor("LINE 3/EQ#7")).await.unwrap();

    let record = store.fetch("LINE 3/EQ#7").await.unwrap();
    assert_eq!(record.equipment_id, "LINE 3/EQ#7");
    assert!(store.remove("LINE 3/EQ#7").await.unwrap().is_empty());
}

fn seed_unfamiliar_labels(service: &ServiceEmulator) {
    service.seed(json!({
        "equipment_id": "EQ-20", "equipment_type": "Valve", "department": "Safety",
        "severity": "Critical", "issue": "Pressure surge and valve rupture",
        "root_cause": "Component fatigue/corrosion",
        "why1": "", "why2": "", "why3": "", "why4": "", "why5": "", "solution": "",
        "date_reported": "2024-06-11"
    }));
    service.seed(json!({
        "equipment_id": "EQ-21", "equipment_type": "Heat Exchanger", "department": "Maintenance",
        "severity": "High", "issue": "Cooling system failure causing temp rise",
        "root_cause": "Lack of preventive maintenance",
        "why1": "", "why2": "", "why3": "", "why4": "", "why5": "", "solution": "",
        "date_reported": "2024-06-12"
    }));
}

#[tokio::test]
async fn test_listing_mirrors_server_labels() {
    let (service, _sync, store) = setup();
    seed_unfamiliar_labels(&service);
    store.add(motor("EQ-1")).await.unwrap();

    let list = store.list();
    assert_eq!(list.len(), service.record_count());
    let ids: Vec<_> = list.iter().map(|r| r.equipment_id.as_str()).collect();
    assert_eq!(ids, vec!["EQ-20", "EQ-21", "EQ-1"]);

    let valve = list.get("EQ-20").unwrap();
    assert_eq!(valve.equipment_type.as_str(), "Valve");
    assert_eq!(valve.department, Department::Unknown("Safety".to_string()));
    assert_eq!(valve.severity, Severity::Critical);
}

#[tokio::test]
async fn test_replace_keeps_unfamiliar_labels_on_server() {
    let (service, _sync, store) = setup();
    seed_unfamiliar_labels(&service);
    store.refresh().await.unwrap();

    let mut record = store.list().get("EQ-21").unwrap().clone();
    record.chain.solution = Some("Schedule descaling".to_string());
    let list = store.replace(&record).await.unwrap();

    let stored = service.document("EQ-21").unwrap();
    assert_eq!(stored["equipment_type"], json!("Heat Exchanger"));
    assert_eq!(stored["department"], json!("Maintenance"));
    assert_eq!(stored["solution"], json!("Schedule descaling"));
    assert_eq!(list.get("EQ-21"), Some(&record));

    store
        .update("EQ-20", RecordPatch::default().severity(Severity::High))
        .await
        .unwrap();
    let stored = service.document("EQ-20").unwrap();
    assert_eq!(stored["equipment_type"], json!("Valve"));
    assert_eq!(stored["department"], json!("Safety"));
    assert_eq!(stored["severity"], json!("High"));
}
