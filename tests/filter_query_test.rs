//! Tests for the composable client list query.

use shop_ledger::models::{
    AuthorizedPerson, ClientQuery, NewClient, NewJob, SortOrder, Status,
};
use shop_ledger::store::EntityStore;

/// Build a small mixed client set: two companies, three statuses, jobs on
/// different materials and one searchable authorized person.
fn fixture() -> EntityStore {
    let mut store = EntityStore::new();

    let ana = store
        .add_client(NewClient {
            name: "Ana Solís".to_string(),
            phone: "8888-1111".to_string(),
            company: "Acrílicos CR".to_string(),
            status: Status::Seguimiento,
            ..NewClient::default()
        })
        .unwrap();
    let bruno = store
        .add_client(NewClient {
            name: "Bruno Mora".to_string(),
            phone: "8888-2222".to_string(),
            company: "Maderas Mora".to_string(),
            status: Status::Seguimiento,
            authorized_persons: vec![AuthorizedPerson {
                name: "Luis".to_string(),
                phone: String::new(),
                id: "1-2345-6789".to_string(),
                note: String::new(),
            }],
            ..NewClient::default()
        })
        .unwrap();
    let carla = store
        .add_client(NewClient {
            name: "Carla Rojas".to_string(),
            phone: "7000-3333".to_string(),
            company: "Acrílicos CR".to_string(),
            status: Status::Seguimiento,
            ..NewClient::default()
        })
        .unwrap();

    store
        .add_job(NewJob {
            client_id: ana.id,
            name: "Rótulo".to_string(),
            material: "Acrílico".to_string(),
            status: Status::Pendiente,
            ..NewJob::default()
        })
        .unwrap();
    store
        .add_job(NewJob {
            client_id: bruno.id,
            name: "Mueble".to_string(),
            material: "Madera".to_string(),
            status: Status::Cerrado,
            ..NewJob::default()
        })
        .unwrap();
    store
        .add_job(NewJob {
            client_id: carla.id,
            name: "Letrero".to_string(),
            material: "Acrílico".to_string(),
            status: Status::Cerrado,
            ..NewJob::default()
        })
        .unwrap();

    store
}

fn names(store: &EntityStore, query: &ClientQuery) -> Vec<String> {
    store
        .list_clients(query)
        .into_iter()
        .map(|client| client.name.clone())
        .collect()
}

#[test]
fn test_search_matches_name_phone_and_person_id() {
    let store = fixture();

    let mut by_name = ClientQuery::new();
    by_name.set_search("ana".to_string());
    assert_eq!(names(&store, &by_name), vec!["Ana Solís"]);

    let mut by_phone = ClientQuery::new();
    by_phone.set_search("7000".to_string());
    assert_eq!(names(&store, &by_phone), vec!["Carla Rojas"]);

    let mut by_person = ClientQuery::new();
    by_person.set_search("2345".to_string());
    assert_eq!(names(&store, &by_person), vec!["Bruno Mora"]);
}

#[test]
fn test_search_is_case_insensitive() {
    let store = fixture();
    let mut query = ClientQuery::new();
    query.set_search("BRUNO".to_string());
    assert_eq!(names(&store, &query), vec!["Bruno Mora"]);
}

#[test]
fn test_company_and_status_are_exact_matches() {
    let store = fixture();

    let mut by_company = ClientQuery::new();
    by_company.set_company("Acrílicos CR".to_string());
    by_company.set_sort(SortOrder::NameAsc);
    assert_eq!(names(&store, &by_company), vec!["Ana Solís", "Carla Rojas"]);

    // Propagation left Ana pendiente and the others cerrado.
    let mut by_status = ClientQuery::new();
    by_status.set_status(Status::Pendiente);
    assert_eq!(names(&store, &by_status), vec!["Ana Solís"]);

    // A partial company string matches nothing.
    let mut partial = ClientQuery::new();
    partial.set_company("Acrílicos".to_string());
    assert!(names(&store, &partial).is_empty());
}

#[test]
fn test_material_filter_follows_jobs() {
    let store = fixture();
    let mut query = ClientQuery::new();
    query.set_material("Acrílico".to_string());
    query.set_sort(SortOrder::NameAsc);
    assert_eq!(names(&store, &query), vec!["Ana Solís", "Carla Rojas"]);
}

#[test]
fn test_composed_filters_intersect() {
    let store = fixture();

    let mut composed = ClientQuery::new();
    composed.set_search("a".to_string()); // matches all three names
    composed.set_company("Acrílicos CR".to_string()); // drops Bruno
    composed.set_status(Status::Cerrado); // drops Ana (pendiente)
    composed.set_material("Acrílico".to_string());
    assert_eq!(names(&store, &composed), vec!["Carla Rojas"]);

    // The composition equals intersecting the individual filters.
    let mut only_status = ClientQuery::new();
    only_status.set_status(Status::Cerrado);
    let mut only_company = ClientQuery::new();
    only_company.set_company("Acrílicos CR".to_string());

    let status_set: std::collections::HashSet<i64> = store
        .list_clients(&only_status)
        .into_iter()
        .map(|c| c.id)
        .collect();
    let company_set: std::collections::HashSet<i64> = store
        .list_clients(&only_company)
        .into_iter()
        .map(|c| c.id)
        .collect();
    let composed_set: std::collections::HashSet<i64> = store
        .list_clients(&composed)
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert!(composed_set.is_subset(&status_set));
    assert!(composed_set.is_subset(&company_set));
}

#[test]
fn test_sort_orders() {
    let store = fixture();

    let mut asc = ClientQuery::new();
    asc.set_sort(SortOrder::NameAsc);
    assert_eq!(
        names(&store, &asc),
        vec!["Ana Solís", "Bruno Mora", "Carla Rojas"]
    );

    let mut desc = ClientQuery::new();
    desc.set_sort(SortOrder::NameDesc);
    assert_eq!(
        names(&store, &desc),
        vec!["Carla Rojas", "Bruno Mora", "Ana Solís"]
    );
}

#[test]
fn test_default_sort_is_most_recently_touched_first() {
    let mut store = fixture();
    let ana_id = store.list_clients(&{
        let mut q = ClientQuery::new();
        q.set_search("Ana".to_string());
        q
    })[0]
        .id;

    // Touch Ana so she floats to the top.
    store
        .update_client(ana_id, shop_ledger::models::ClientPatch {
            address: Some("San José".to_string()),
            ..shop_ledger::models::ClientPatch::default()
        })
        .unwrap();

    let ordered = names(&store, &ClientQuery::new());
    assert_eq!(ordered.first().map(String::as_str), Some("Ana Solís"));
}

#[test]
fn test_listing_does_not_reorder_the_store() {
    let store = fixture();
    let mut query = ClientQuery::new();
    query.set_sort(SortOrder::NameDesc);
    let _ = store.list_clients(&query);

    let raw: Vec<&str> = store.clients().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(raw, vec!["Ana Solís", "Bruno Mora", "Carla Rojas"]);
}
