//! Tests for the client status propagation rule, at the pure-function level
//! and through the entity store.

use chrono::Utc;
use proptest::prelude::*;

use shop_ledger::models::{Job, NewClient, NewJob, Status};
use shop_ledger::status::derive_client_status;
use shop_ledger::store::EntityStore;

fn job_with_status(id: i64, status: &str) -> Job {
    Job {
        id,
        client_id: 1,
        name: format!("Trabajo {id}"),
        material: String::new(),
        measures: String::new(),
        status: Status::from(status),
        details: String::new(),
        follow_up_notes: String::new(),
        files: Vec::new(),
        calculator: None,
        created_at: Utc::now(),
        last_updated: None,
    }
}

fn derive(current: &str, statuses: &[&str]) -> Status {
    let jobs: Vec<Job> = statuses
        .iter()
        .enumerate()
        .map(|(i, status)| job_with_status(i as i64 + 1, status))
        .collect();
    let refs: Vec<&Job> = jobs.iter().collect();
    derive_client_status(&Status::from(current), &refs)
}

#[test]
fn test_empty_job_set_keeps_any_status() {
    for current in ["seguimiento", "cerrado", "pendiente", "facturado"] {
        assert_eq!(derive(current, &[]), Status::from(current));
    }
}

#[test]
fn test_pendiente_always_wins() {
    assert_eq!(derive("cerrado", &["pendiente"]), Status::Pendiente);
    assert_eq!(
        derive("seguimiento", &["cerrado", "cerrado", "pendiente"]),
        Status::Pendiente
    );
    assert_eq!(
        derive("cerrado", &["pendiente", "seguimiento"]),
        Status::Pendiente
    );
}

#[test]
fn test_all_cerrado_closes_the_client() {
    assert_eq!(derive("seguimiento", &["cerrado"]), Status::Cerrado);
    assert_eq!(
        derive("pendiente", &["cerrado", "cerrado", "cerrado"]),
        Status::Cerrado
    );
}

#[test]
fn test_seguimiento_when_open_work_remains() {
    assert_eq!(
        derive("pendiente", &["seguimiento", "cerrado"]),
        Status::Seguimiento
    );
}

#[test]
fn test_order_does_not_matter() {
    let forward = derive("cerrado", &["seguimiento", "cerrado", "pendiente"]);
    let backward = derive("cerrado", &["pendiente", "cerrado", "seguimiento"]);
    assert_eq!(forward, backward);
}

#[test]
fn test_store_propagates_on_job_mutations() {
    let mut store = EntityStore::new();
    let client = store
        .add_client(NewClient {
            name: "Carmen".to_string(),
            status: Status::Seguimiento,
            ..NewClient::default()
        })
        .unwrap();

    // Adding a pending job flips the client to pendiente.
    let (job, change) = store
        .add_job(NewJob {
            client_id: client.id,
            name: "Rótulo acrílico".to_string(),
            status: Status::Pendiente,
            ..NewJob::default()
        })
        .unwrap();
    let change = change.unwrap();
    assert_eq!(change.previous, Status::Seguimiento);
    assert_eq!(change.current, Status::Pendiente);
    assert_eq!(store.client(client.id).unwrap().status, Status::Pendiente);

    // Closing the only job closes the client.
    let (_, change) = store
        .update_job(job.id, shop_ledger::models::JobPatch {
            status: Some(Status::Cerrado),
            ..shop_ledger::models::JobPatch::default()
        })
        .unwrap();
    assert_eq!(change.unwrap().current, Status::Cerrado);

    // Deleting the job leaves the client at its last derived status.
    let change = store.delete_job(job.id).unwrap();
    assert!(change.is_none());
    assert_eq!(store.client(client.id).unwrap().status, Status::Cerrado);
}

#[test]
fn test_recompute_is_idempotent_through_the_store() {
    let mut store = EntityStore::new();
    let client = store
        .add_client(NewClient {
            name: "Carmen".to_string(),
            ..NewClient::default()
        })
        .unwrap();
    store
        .add_job(NewJob {
            client_id: client.id,
            name: "Letras corpóreas".to_string(),
            status: Status::Pendiente,
            ..NewJob::default()
        })
        .unwrap();

    let first = store.recompute_client_status(client.id).unwrap();
    let second = store.recompute_client_status(client.id).unwrap();
    assert!(first.is_none()); // already applied by add_job
    assert!(second.is_none());
    assert_eq!(store.client(client.id).unwrap().status, Status::Pendiente);
}

#[test]
fn test_recompute_unknown_client_is_not_found() {
    let mut store = EntityStore::new();
    assert!(store.recompute_client_status(404).is_err());
}

fn arbitrary_status() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["seguimiento", "cerrado", "pendiente", "facturado"])
}

proptest! {
    #[test]
    fn prop_derivation_is_idempotent(
        current in arbitrary_status(),
        statuses in prop::collection::vec(arbitrary_status(), 0..12)
    ) {
        let once = derive(current, &statuses);
        let jobs: Vec<Job> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| job_with_status(i as i64 + 1, status))
            .collect();
        let refs: Vec<&Job> = jobs.iter().collect();
        let twice = derive_client_status(&once, &refs);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_any_pendiente_forces_pendiente(
        current in arbitrary_status(),
        mut statuses in prop::collection::vec(arbitrary_status(), 0..12)
    ) {
        statuses.push("pendiente");
        prop_assert_eq!(derive(current, &statuses), Status::Pendiente);
    }

    #[test]
    fn prop_result_ignores_job_order(
        current in arbitrary_status(),
        statuses in prop::collection::vec(arbitrary_status(), 0..12)
    ) {
        let forward = derive(current, &statuses);
        let mut reversed = statuses.clone();
        reversed.reverse();
        prop_assert_eq!(forward, derive(current, &reversed));
    }
}
