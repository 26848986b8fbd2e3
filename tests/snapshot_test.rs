//! Tests for the snapshot codec and local persistence.

use serde_json::json;

use shop_ledger::error::LedgerError;
use shop_ledger::models::{
    AuthorizedPerson, Calculator, FileAttachment, NewClient, NewEvent, NewJob, ReportKind,
    ReportRecord, Status,
};
use shop_ledger::snapshot::Snapshot;
use shop_ledger::storage::LocalStore;
use shop_ledger::store::EntityStore;

/// Build a store where every field of every record carries a value, so a
/// round trip cannot hide behind defaulting.
fn populated_store() -> EntityStore {
    let mut store = EntityStore::with_defaults();

    let client = store
        .add_client(NewClient {
            name: "Ana Solís".to_string(),
            phone: "8888-1111".to_string(),
            email: "ana@example.com".to_string(),
            address: "San José".to_string(),
            company: "Acrílicos CR".to_string(),
            status: Status::Seguimiento,
            avatar: Some("https://example.com/avatar.jpg".to_string()),
            authorized_persons: vec![AuthorizedPerson {
                name: "Luis".to_string(),
                phone: "7000-0000".to_string(),
                id: "1-2345-6789".to_string(),
                note: "<p>Retira los viernes</p>".to_string(),
            }],
        })
        .unwrap();

    let (job, _) = store
        .add_job(NewJob {
            client_id: client.id,
            name: "Rótulo acrílico".to_string(),
            material: "Acrílico".to_string(),
            measures: "120x60cm".to_string(),
            status: Status::Pendiente,
            details: "<p>Logo en relieve</p>".to_string(),
            follow_up_notes: "<p>Llamar el lunes</p>".to_string(),
            files: vec![FileAttachment {
                id: 77,
                name: "boceto.png".to_string(),
                mime_type: "image/png".to_string(),
                url: "data:image/png;base64,aW1n".to_string(),
                thumbnail: Some("data:image/png;base64,aW1n".to_string()),
                is_local: true,
            }],
        })
        .unwrap();

    store
        .persist_calculator(job.id, Calculator {
            publicity: 400.0,
            services: 200.0,
            transport: 1000.0,
            provider_cost: 1000.0,
            packaging_cost: 10.0,
            design_cost: 20.0,
            installation_cost: 30.0,
            profit_margin: 20.0,
            price_without_iva: 3192.0,
            iva: 13.0,
            final_price: 3606.96,
            total_cost: 2660.0,
        })
        .unwrap();

    store
        .add_event(NewEvent {
            title: "Entrega".to_string(),
            description: "Entrega del rótulo".to_string(),
            date: "2025-04-10".to_string(),
            time: "14:30".to_string(),
            client_id: Some(client.id),
        })
        .unwrap();

    store.record_report(ReportRecord {
        kind: ReportKind::ClientsByStatus,
        format: "json".to_string(),
        date: chrono::Utc::now(),
        data: json!({"title": "Clientes por Estado", "data": {"seguimiento": 1}, "total": 1}),
    });

    store
}

#[test]
fn test_round_trip_preserves_everything() {
    let store = populated_store();
    let snapshot = Snapshot::capture(&store);

    let encoded = snapshot.to_json().unwrap();
    let decoded = Snapshot::from_json(&encoded).unwrap();
    assert_eq!(decoded, snapshot);

    // And applying it to a fresh store captures back identically (except
    // the save stamp, which is taken at capture time).
    let mut restored = EntityStore::new();
    decoded.apply(&mut restored);
    let recaptured = Snapshot::capture(&restored);
    assert_eq!(recaptured.clients, snapshot.clients);
    assert_eq!(recaptured.jobs, snapshot.jobs);
    assert_eq!(recaptured.events, snapshot.events);
    assert_eq!(recaptured.filters, snapshot.filters);
    assert_eq!(recaptured.reports, snapshot.reports);
    assert_eq!(recaptured.reports_by_date, snapshot.reports_by_date);
}

#[test]
fn test_wire_format_field_names() {
    let store = populated_store();
    let encoded = Snapshot::capture(&store).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();

    assert!(value.get("clients").is_some());
    assert!(value.get("reportsByDate").is_some());
    assert!(value.get("lastSaved").is_some());

    let job = &value["jobs"][0];
    assert!(job.get("clientId").is_some());
    assert!(job.get("followUpNotes").is_some());
    assert!(job.get("createdAt").is_some());
    assert!(job.get("lastUpdated").is_some());

    let file = &job["files"][0];
    assert!(file.get("type").is_some());
    assert!(file.get("isLocal").is_some());

    let calc = &job["calculator"];
    assert!(calc.get("providerCost").is_some());
    assert!(calc.get("priceWithoutIva").is_some());
    assert!(calc.get("finalPrice").is_some());
    assert!(calc.get("totalCost").is_some());

    let report = &value["reports"][0];
    assert_eq!(report["type"], json!("clientsByStatus"));
}

#[test]
fn test_empty_document_yields_empty_store() {
    let snapshot = Snapshot::from_json("{}").unwrap();
    let mut store = EntityStore::with_defaults();
    snapshot.apply(&mut store);

    assert!(store.clients().is_empty());
    assert!(store.jobs().is_empty());
    assert!(store.events().is_empty());
    assert!(store.filters().materials.is_empty());
    assert!(store.filters().statuses.is_empty());
    assert!(store.filters().companies.is_empty());
    assert!(store.reports().is_empty());
    assert!(store.reports_by_date().is_empty());
}

#[test]
fn test_partial_document_defaults_missing_fields() {
    let snapshot = Snapshot::from_json(
        r#"{"clients": [{"id": 1, "name": "Ana", "createdAt": "2025-01-01T08:00:00Z"}]}"#,
    )
    .unwrap();

    assert_eq!(snapshot.clients.len(), 1);
    let client = &snapshot.clients[0];
    assert_eq!(client.name, "Ana");
    assert_eq!(client.phone, "");
    assert_eq!(client.status, Status::Seguimiento);
    assert!(client.authorized_persons.is_empty());
    assert!(client.last_updated.is_none());
    assert!(snapshot.jobs.is_empty());
}

#[test]
fn test_malformed_document_leaves_store_untouched() {
    let store = populated_store();
    let clients_before = store.clients().len();

    let result = Snapshot::from_json("{not json");
    assert!(matches!(result, Err(LedgerError::MalformedSnapshot(_))));

    // Nothing was applied.
    assert_eq!(store.clients().len(), clients_before);
}

#[test]
fn test_apply_replaces_instead_of_merging() {
    let mut store = populated_store();
    let replacement = Snapshot {
        clients: Vec::new(),
        ..Snapshot::default()
    };
    replacement.apply(&mut store);

    assert!(store.clients().is_empty());
    assert!(store.jobs().is_empty());
    assert!(store.events().is_empty());
}

#[test]
fn test_ids_stay_monotonic_after_import() {
    let mut store = EntityStore::new();
    let far_future_id = 9_999_999_999_999i64; // far beyond current clock millis
    Snapshot::from_json(&format!(
        r#"{{"clients": [{{"id": {far_future_id}, "name": "Ana", "createdAt": "2025-01-01T08:00:00Z"}}]}}"#
    ))
    .unwrap()
    .apply(&mut store);

    let created = store
        .add_client(NewClient {
            name: "Bruno".to_string(),
            ..NewClient::default()
        })
        .unwrap();
    assert!(created.id > far_future_id);
}

#[test]
fn test_local_store_persists_across_opens() {
    let dir = tempfile::tempdir().unwrap();

    let snapshot = Snapshot::capture(&populated_store());
    {
        let local = LocalStore::open(dir.path()).unwrap();
        local.save(&snapshot).unwrap();
    }

    let local = LocalStore::open(dir.path()).unwrap();
    let loaded = local.load().unwrap().unwrap();
    assert_eq!(loaded, snapshot);
}
