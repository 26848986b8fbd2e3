//! In-memory entity store.
//!
//! Holds the four record collections (clients, jobs, events, filter catalogs)
//! plus generated report history, and exposes create/read/update/delete
//! operations with identity and referential rules. Every job mutation
//! triggers status propagation for the affected client.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::error::{LedgerError, Result};
use crate::models::{
    Calculator, Client, ClientPatch, ClientQuery, Event, EventPatch, FilterCatalog, FilterEntry,
    Job, JobPatch, NewClient, NewEvent, NewJob, ReportRecord, SortOrder,
};
use crate::status::{derive_client_status, StatusChange};

/// Issues unique, generation-order-monotonic record ids.
///
/// Ids are derived from the millisecond clock but never repeat or go
/// backwards within a session, even when two records are created inside the
/// same millisecond or ids were imported from a snapshot taken in the future.
#[derive(Debug, Default)]
struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    fn next(&mut self) -> i64 {
        let candidate = Utc::now().timestamp_millis();
        self.last = candidate.max(self.last + 1);
        self.last
    }

    /// Make sure future ids stay above everything already in the store.
    fn bump_past(&mut self, id: i64) {
        if id > self.last {
            self.last = id;
        }
    }
}

/// The in-memory object tree every other component reads from and writes to.
///
/// Owned by the service layer and passed explicitly; there is no global
/// instance.
#[derive(Debug, Default)]
pub struct EntityStore {
    clients: Vec<Client>,
    jobs: Vec<Job>,
    events: Vec<Event>,
    filters: FilterCatalog,
    reports: Vec<ReportRecord>,
    reports_by_date: BTreeMap<String, Vec<ReportRecord>>,
    ids: IdGenerator,
}

impl EntityStore {
    /// Create an empty store with no seeded data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the default filter catalogs and the three
    /// example events, as presented on a first run with no persisted data.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut store = Self::new();
        store.filters = default_filter_catalog();
        for event in sample_events(Utc::now()) {
            let id = store.ids.next();
            store.events.push(Event { id, ..event });
        }
        store
    }

    /// Reset to the first-run state: everything cleared, defaults reseeded.
    pub fn reset(&mut self) {
        self.clients.clear();
        self.jobs.clear();
        self.events.clear();
        self.filters = default_filter_catalog();
        self.reports.clear();
        self.reports_by_date.clear();
        for event in sample_events(Utc::now()) {
            let id = self.ids.next();
            self.events.push(Event { id, ..event });
        }
    }

    // ---- clients ----------------------------------------------------------

    /// Create a client, assigning a fresh id and creation timestamp.
    pub fn add_client(&mut self, new: NewClient) -> Result<Client> {
        if new.name.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Client name is required".to_string(),
            ));
        }

        let now = Utc::now();
        let client = Client {
            id: self.ids.next(),
            name: new.name,
            phone: new.phone,
            email: new.email,
            address: new.address,
            company: new.company,
            status: new.status,
            avatar: new.avatar,
            authorized_persons: new.authorized_persons,
            created_at: now,
            last_updated: Some(now),
        };

        self.register_company(&client.company);
        self.clients.push(client.clone());
        debug!(client_id = client.id, "client created");
        Ok(client)
    }

    /// Merge a partial update onto an existing client.
    ///
    /// Returns `NotFound` when the id does not match any client instead of
    /// silently ignoring the call.
    pub fn update_client(&mut self, id: i64, patch: ClientPatch) -> Result<Client> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(LedgerError::Validation(
                    "Client name is required".to_string(),
                ));
            }
        }

        let company_to_register = patch.company.clone();
        let client = self
            .clients
            .iter_mut()
            .find(|client| client.id == id)
            .ok_or(LedgerError::client_not_found(id))?;

        if let Some(name) = patch.name {
            client.name = name;
        }
        if let Some(phone) = patch.phone {
            client.phone = phone;
        }
        if let Some(email) = patch.email {
            client.email = email;
        }
        if let Some(address) = patch.address {
            client.address = address;
        }
        if let Some(company) = patch.company {
            client.company = company;
        }
        if let Some(status) = patch.status {
            client.status = status;
        }
        if let Some(avatar) = patch.avatar {
            client.avatar = avatar;
        }
        if let Some(persons) = patch.authorized_persons {
            client.authorized_persons = persons;
        }
        client.last_updated = Some(Utc::now());

        let updated = client.clone();
        if let Some(company) = company_to_register {
            self.register_company(&company);
        }
        Ok(updated)
    }

    /// Delete a client and, in the same operation, every job that belongs
    /// to it. Returns the number of jobs removed by the cascade.
    pub fn delete_client(&mut self, id: i64) -> Result<usize> {
        if !self.clients.iter().any(|client| client.id == id) {
            return Err(LedgerError::client_not_found(id));
        }

        let jobs_before = self.jobs.len();
        self.jobs.retain(|job| job.client_id != id);
        self.clients.retain(|client| client.id != id);

        let removed = jobs_before - self.jobs.len();
        info!(client_id = id, jobs_removed = removed, "client deleted");
        Ok(removed)
    }

    /// Look up a client by id.
    #[must_use]
    pub fn client(&self, id: i64) -> Option<&Client> {
        self.clients.iter().find(|client| client.id == id)
    }

    /// All clients in creation order.
    #[must_use]
    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    /// List clients matching a composed query, without mutating the
    /// underlying order.
    ///
    /// Filters apply in sequence: free-text search over name, phone and
    /// authorized persons' document ids; exact company; exact status; "has
    /// at least one job with this material"; then the sort step.
    #[must_use]
    pub fn list_clients(&self, query: &ClientQuery) -> Vec<&Client> {
        let mut matched: Vec<&Client> = self.clients.iter().collect();

        if let Some(term) = query.search.as_deref() {
            let term = term.to_lowercase();
            if !term.is_empty() {
                matched.retain(|client| {
                    client.name.to_lowercase().contains(&term)
                        || client.phone.to_lowercase().contains(&term)
                        || client
                            .authorized_persons
                            .iter()
                            .any(|person| person.id.to_lowercase().contains(&term))
                });
            }
        }

        if let Some(company) = query.company.as_deref() {
            matched.retain(|client| client.company == company);
        }

        if let Some(status) = &query.status {
            matched.retain(|client| client.status == *status);
        }

        if let Some(material) = query.material.as_deref() {
            matched.retain(|client| {
                self.jobs
                    .iter()
                    .any(|job| job.client_id == client.id && job.material == material)
            });
        }

        match query.sort {
            SortOrder::NameAsc => {
                matched.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
            }
            SortOrder::NameDesc => {
                matched.sort_by(|a, b| b.name.to_lowercase().cmp(&a.name.to_lowercase()));
            }
            SortOrder::Recent => {
                matched.sort_by(|a, b| b.recency().cmp(&a.recency()));
            }
        }

        matched
    }

    // ---- jobs -------------------------------------------------------------

    /// Create a job under an existing client, then repropagate that
    /// client's status.
    pub fn add_job(&mut self, new: NewJob) -> Result<(Job, Option<StatusChange>)> {
        if new.name.trim().is_empty() {
            return Err(LedgerError::Validation("Job name is required".to_string()));
        }
        if self.client(new.client_id).is_none() {
            return Err(LedgerError::client_not_found(new.client_id));
        }

        let now = Utc::now();
        let job = Job {
            id: self.ids.next(),
            client_id: new.client_id,
            name: new.name,
            material: new.material,
            measures: new.measures,
            status: new.status,
            details: new.details,
            follow_up_notes: new.follow_up_notes,
            files: new.files,
            calculator: None,
            created_at: now,
            last_updated: Some(now),
        };

        let client_id = job.client_id;
        self.jobs.push(job.clone());
        debug!(job_id = job.id, client_id, "job created");
        let change = self.propagate_status(client_id);
        Ok((job, change))
    }

    /// Merge a partial update onto an existing job, then repropagate the
    /// owning client's status.
    pub fn update_job(&mut self, id: i64, patch: JobPatch) -> Result<(Job, Option<StatusChange>)> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(LedgerError::Validation("Job name is required".to_string()));
            }
        }

        let job = self
            .jobs
            .iter_mut()
            .find(|job| job.id == id)
            .ok_or(LedgerError::job_not_found(id))?;

        if let Some(name) = patch.name {
            job.name = name;
        }
        if let Some(material) = patch.material {
            job.material = material;
        }
        if let Some(measures) = patch.measures {
            job.measures = measures;
        }
        if let Some(status) = patch.status {
            job.status = status;
        }
        if let Some(details) = patch.details {
            job.details = details;
        }
        if let Some(notes) = patch.follow_up_notes {
            job.follow_up_notes = notes;
        }
        if let Some(files) = patch.files {
            job.files = files;
        }
        job.last_updated = Some(Utc::now());

        let updated = job.clone();
        let change = self.propagate_status(updated.client_id);
        Ok((updated, change))
    }

    /// Delete a job, then repropagate the owning client's status.
    pub fn delete_job(&mut self, id: i64) -> Result<Option<StatusChange>> {
        let client_id = self
            .jobs
            .iter()
            .find(|job| job.id == id)
            .map(|job| job.client_id)
            .ok_or(LedgerError::job_not_found(id))?;

        self.jobs.retain(|job| job.id != id);
        info!(job_id = id, client_id, "job deleted");
        Ok(self.propagate_status(client_id))
    }

    /// Store computed pricing figures verbatim on a job.
    ///
    /// The calculator output is never recomputed when other job fields
    /// change, and saving it does not count as a job mutation for the
    /// purposes of `lastUpdated` or status propagation.
    pub fn persist_calculator(&mut self, job_id: i64, calculator: Calculator) -> Result<Job> {
        let job = self
            .jobs
            .iter_mut()
            .find(|job| job.id == job_id)
            .ok_or(LedgerError::job_not_found(job_id))?;

        job.calculator = Some(calculator);
        Ok(job.clone())
    }

    /// Look up a job by id.
    #[must_use]
    pub fn job(&self, id: i64) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == id)
    }

    /// All jobs in creation order.
    #[must_use]
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// All jobs belonging to one client.
    #[must_use]
    pub fn jobs_for_client(&self, client_id: i64) -> Vec<&Job> {
        self.jobs
            .iter()
            .filter(|job| job.client_id == client_id)
            .collect()
    }

    // ---- status propagation -----------------------------------------------

    /// Recompute a client's status from its jobs and apply the result.
    ///
    /// Public entry point for callers that changed job data out of band;
    /// job mutations through this store call it automatically.
    pub fn recompute_client_status(&mut self, client_id: i64) -> Result<Option<StatusChange>> {
        if self.client(client_id).is_none() {
            return Err(LedgerError::client_not_found(client_id));
        }
        Ok(self.propagate_status(client_id))
    }

    /// Apply the propagation rule; returns the change when the stored
    /// status was overwritten. A missing client is defensively a no-op.
    fn propagate_status(&mut self, client_id: i64) -> Option<StatusChange> {
        let current = self.client(client_id)?.status.clone();
        let jobs = self.jobs_for_client(client_id);
        let derived = derive_client_status(&current, &jobs);
        if derived == current {
            return None;
        }

        let client = self.clients.iter_mut().find(|c| c.id == client_id)?;
        client.status = derived.clone();
        client.last_updated = Some(Utc::now());
        info!(
            client_id,
            status = %derived,
            "client status updated from jobs"
        );
        Some(StatusChange {
            client_id,
            previous: current,
            current: derived,
        })
    }

    // ---- events -----------------------------------------------------------

    /// Create a calendar event.
    pub fn add_event(&mut self, new: NewEvent) -> Result<Event> {
        if new.title.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Event title is required".to_string(),
            ));
        }
        if new.date.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Event date is required".to_string(),
            ));
        }

        let now = Utc::now();
        let event = Event {
            id: self.ids.next(),
            title: new.title,
            description: new.description,
            date: new.date,
            time: new.time,
            client_id: new.client_id,
            created_at: now,
            last_updated: Some(now),
        };

        self.events.push(event.clone());
        debug!(event_id = event.id, "event created");
        Ok(event)
    }

    /// Merge a partial update onto an existing event.
    pub fn update_event(&mut self, id: i64, patch: EventPatch) -> Result<Event> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(LedgerError::Validation(
                    "Event title is required".to_string(),
                ));
            }
        }
        if let Some(date) = &patch.date {
            if date.trim().is_empty() {
                return Err(LedgerError::Validation(
                    "Event date is required".to_string(),
                ));
            }
        }

        let event = self
            .events
            .iter_mut()
            .find(|event| event.id == id)
            .ok_or(LedgerError::event_not_found(id))?;

        if let Some(title) = patch.title {
            event.title = title;
        }
        if let Some(description) = patch.description {
            event.description = description;
        }
        if let Some(date) = patch.date {
            event.date = date;
        }
        if let Some(time) = patch.time {
            event.time = time;
        }
        if let Some(client_id) = patch.client_id {
            event.client_id = client_id;
        }
        event.last_updated = Some(Utc::now());

        Ok(event.clone())
    }

    /// Delete an event.
    pub fn delete_event(&mut self, id: i64) -> Result<()> {
        if !self.events.iter().any(|event| event.id == id) {
            return Err(LedgerError::event_not_found(id));
        }
        self.events.retain(|event| event.id != id);
        Ok(())
    }

    /// Look up an event by id.
    #[must_use]
    pub fn event(&self, id: i64) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    /// All events in creation order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events on one calendar date, sorted by time (untimed events first).
    #[must_use]
    pub fn events_on(&self, date: &str) -> Vec<&Event> {
        let mut matched: Vec<&Event> = self
            .events
            .iter()
            .filter(|event| event.date == date)
            .collect();
        matched.sort_by(|a, b| a.time.cmp(&b.time));
        matched
    }

    /// Events within one calendar month (`YYYY-MM` prefix), sorted by date
    /// and time, for the calendar view.
    #[must_use]
    pub fn events_in_month(&self, year: i32, month: u32) -> Vec<&Event> {
        let prefix = format!("{year:04}-{month:02}");
        let mut matched: Vec<&Event> = self
            .events
            .iter()
            .filter(|event| event.date.starts_with(&prefix))
            .collect();
        matched.sort_by(|a, b| (&a.date, &a.time).cmp(&(&b.date, &b.time)));
        matched
    }

    // ---- filter catalogs --------------------------------------------------

    /// The current filter catalogs.
    #[must_use]
    pub fn filters(&self) -> &FilterCatalog {
        &self.filters
    }

    /// Replace the filter catalogs, pruning blank entries as the save
    /// cycle does.
    pub fn set_filters(&mut self, mut catalog: FilterCatalog) {
        catalog.prune_blank();
        self.filters = catalog;
    }

    /// Add a company to the catalog if it is non-empty and not already
    /// present; client saves feed the derived company list through here.
    pub fn register_company(&mut self, name: &str) {
        if name.is_empty() || self.filters.has_company(name) {
            return;
        }
        let entry = FilterEntry {
            id: self.ids.next(),
            name: name.to_string(),
        };
        self.filters.companies.push(entry);
    }

    // ---- reports ----------------------------------------------------------

    /// Append a generated report to the history, both to the flat list and
    /// grouped under its generation date.
    pub fn record_report(&mut self, record: ReportRecord) {
        let date_key = record.date.format("%Y-%m-%d").to_string();
        self.reports.push(record.clone());
        self.reports_by_date.entry(date_key).or_default().push(record);
    }

    /// All generated reports, in generation order.
    #[must_use]
    pub fn reports(&self) -> &[ReportRecord] {
        &self.reports
    }

    /// Generated reports grouped by the calendar date they were produced on.
    #[must_use]
    pub fn reports_by_date(&self) -> &BTreeMap<String, Vec<ReportRecord>> {
        &self.reports_by_date
    }

    // ---- wholesale replacement (snapshot load) ----------------------------

    /// Replace the entire store contents; used by the snapshot codec.
    ///
    /// The id generator is bumped past every imported id so identities
    /// stay monotonic within the session.
    pub fn replace_all(
        &mut self,
        clients: Vec<Client>,
        jobs: Vec<Job>,
        events: Vec<Event>,
        filters: FilterCatalog,
        reports: Vec<ReportRecord>,
        reports_by_date: BTreeMap<String, Vec<ReportRecord>>,
    ) {
        for id in clients
            .iter()
            .map(|c| c.id)
            .chain(jobs.iter().map(|j| j.id))
            .chain(events.iter().map(|e| e.id))
        {
            self.ids.bump_past(id);
        }

        self.clients = clients;
        self.jobs = jobs;
        self.events = events;
        self.filters = filters;
        self.reports = reports;
        self.reports_by_date = reports_by_date;
    }
}

/// The five default materials and three default statuses seeded on first run.
#[must_use]
pub fn default_filter_catalog() -> FilterCatalog {
    FilterCatalog {
        materials: vec![
            FilterEntry { id: 1, name: "Acrílico".to_string() },
            FilterEntry { id: 2, name: "Madera".to_string() },
            FilterEntry { id: 3, name: "Rotulación".to_string() },
            FilterEntry { id: 4, name: "Sublimación".to_string() },
            FilterEntry { id: 5, name: "Impresión".to_string() },
        ],
        statuses: vec![
            FilterEntry { id: 1, name: "seguimiento".to_string() },
            FilterEntry { id: 2, name: "cerrado".to_string() },
            FilterEntry { id: 3, name: "pendiente".to_string() },
        ],
        companies: Vec::new(),
    }
}

/// The three example events presented on a first run, placed a few days out
/// from `now`.
fn sample_events(now: DateTime<Utc>) -> Vec<Event> {
    let event = |title: &str, description: &str, days: i64, time: &str| Event {
        id: 0,
        title: title.to_string(),
        description: description.to_string(),
        date: (now + Duration::days(days)).format("%Y-%m-%d").to_string(),
        time: time.to_string(),
        client_id: None,
        created_at: now,
        last_updated: Some(now),
    };

    vec![
        event(
            "Reunión con cliente",
            "Reunión para discutir nuevos proyectos",
            2,
            "10:00",
        ),
        event(
            "Entrega de proyecto",
            "Entrega del proyecto de rotulación",
            5,
            "14:00",
        ),
        event("Visita técnica", "Visita técnica para medición", 7, "09:00"),
    ]
}
