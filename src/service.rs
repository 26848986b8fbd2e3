//! Application service layer.
//!
//! Owns the entity store and its persistence, and wraps every mutation so
//! the snapshot is written through to the local store afterwards — the same
//! save-after-every-change behavior the original application had. Read
//! queries go straight to the store.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use tracing::info;

use crate::attachments::{AttachmentLoader, FileKind, FsSource};
use crate::calculator;
use crate::config::AppConfig;
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::models::{
    Calculator, Client, ClientPatch, Event, EventPatch, FilterCatalog, Job, JobPatch, NewClient,
    NewEvent, NewJob, ReportKind, ReportRecord,
};
use crate::report_writer::{self, ReportFormat};
use crate::reports::{self, ReportData, Statistics};
use crate::snapshot::Snapshot;
use crate::status::StatusChange;
use crate::storage::{self, LocalStore};
use crate::store::EntityStore;

/// Ties the store, local persistence, reporting and attachment loading
/// together behind one API the CLI (or any other front end) drives.
pub struct LedgerService {
    store: EntityStore,
    local: LocalStore,
    config: AppConfig,
    metrics: MetricsCollector,
    loader: AttachmentLoader<FsSource>,
}

impl LedgerService {
    /// Open the service: load the persisted snapshot if one exists,
    /// otherwise start from the seeded first-run state.
    pub fn open(config: AppConfig) -> Result<Self> {
        let local = LocalStore::open(Path::new(&config.storage.data_dir))?;
        let metrics = MetricsCollector;

        let mut store;
        match local.load()? {
            Some(snapshot) => {
                store = EntityStore::new();
                snapshot.apply(&mut store);
                metrics.record_snapshot_load("local");
                info!(
                    clients = store.clients().len(),
                    jobs = store.jobs().len(),
                    "database loaded from local store"
                );
            }
            None => {
                store = EntityStore::with_defaults();
                info!("no saved database, starting with defaults");
            }
        }

        Ok(Self {
            store,
            local,
            config,
            metrics,
            loader: AttachmentLoader::default(),
        })
    }

    /// Read-only access to the entity store for queries and aggregations.
    #[must_use]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Write the current state through to the local store.
    pub fn save(&self) -> Result<()> {
        let started = Instant::now();
        let snapshot = Snapshot::capture(&self.store);
        let encoded_len = snapshot.to_json()?.len();
        self.local.save(&snapshot)?;
        self.metrics.record_snapshot_save(encoded_len, started.elapsed());
        self.metrics.record_store_sizes(
            self.store.clients().len(),
            self.store.jobs().len(),
            self.store.events().len(),
        );
        Ok(())
    }

    // ---- clients ----------------------------------------------------------

    /// Create a client and persist.
    pub fn add_client(&mut self, new: NewClient) -> Result<Client> {
        let client = self.store.add_client(new)?;
        self.metrics.record_entity_operation("client", "create");
        self.save()?;
        Ok(client)
    }

    /// Update a client and persist.
    pub fn update_client(&mut self, id: i64, patch: ClientPatch) -> Result<Client> {
        let client = self.store.update_client(id, patch)?;
        self.metrics.record_entity_operation("client", "update");
        self.save()?;
        Ok(client)
    }

    /// Delete a client (cascading its jobs) and persist. Returns the number
    /// of jobs removed by the cascade.
    pub fn delete_client(&mut self, id: i64) -> Result<usize> {
        let removed_jobs = self.store.delete_client(id)?;
        self.metrics.record_entity_operation("client", "delete");
        self.save()?;
        Ok(removed_jobs)
    }

    // ---- jobs -------------------------------------------------------------

    /// Create a job and persist; surfaces the owner's status change, if
    /// propagation produced one.
    pub fn add_job(&mut self, new: NewJob) -> Result<(Job, Option<StatusChange>)> {
        let (job, change) = self.store.add_job(new)?;
        self.metrics.record_entity_operation("job", "create");
        if change.is_some() {
            self.metrics.record_status_change();
        }
        self.save()?;
        Ok((job, change))
    }

    /// Update a job and persist; surfaces the owner's status change.
    pub fn update_job(&mut self, id: i64, patch: JobPatch) -> Result<(Job, Option<StatusChange>)> {
        let (job, change) = self.store.update_job(id, patch)?;
        self.metrics.record_entity_operation("job", "update");
        if change.is_some() {
            self.metrics.record_status_change();
        }
        self.save()?;
        Ok((job, change))
    }

    /// Delete a job and persist; surfaces the owner's status change.
    pub fn delete_job(&mut self, id: i64) -> Result<Option<StatusChange>> {
        let change = self.store.delete_job(id)?;
        self.metrics.record_entity_operation("job", "delete");
        if change.is_some() {
            self.metrics.record_status_change();
        }
        self.save()?;
        Ok(change)
    }

    /// Recompute a client's status from its jobs, persisting when it
    /// changed. Job mutations through this service already do this; the
    /// entry point exists for callers that changed job data out of band.
    pub fn recompute_client_status(&mut self, client_id: i64) -> Result<Option<StatusChange>> {
        let change = self.store.recompute_client_status(client_id)?;
        if change.is_some() {
            self.metrics.record_status_change();
            self.save()?;
        }
        Ok(change)
    }

    /// Compute totals for the given calculator inputs and store the result
    /// verbatim on the job.
    pub fn save_calculator(&mut self, job_id: i64, inputs: &Calculator) -> Result<Job> {
        let computed = calculator::compute_totals(inputs);
        let job = self.store.persist_calculator(job_id, computed)?;
        self.metrics.record_entity_operation("job", "calculator");
        self.save()?;
        Ok(job)
    }

    /// Starting calculator inputs for a job: its saved figures, or the
    /// configured defaults when it has none.
    #[must_use]
    pub fn calculator_defaults(&self, job_id: i64) -> Calculator {
        if let Some(saved) = self
            .store
            .job(job_id)
            .and_then(|job| job.calculator.clone())
        {
            return saved;
        }

        let defaults = &self.config.calculator;
        Calculator {
            publicity: defaults.publicity,
            services: defaults.services,
            transport: defaults.transport,
            profit_margin: defaults.profit_margin,
            iva: defaults.iva,
            ..Calculator::default()
        }
    }

    // ---- events -----------------------------------------------------------

    /// Create an event and persist.
    pub fn add_event(&mut self, new: NewEvent) -> Result<Event> {
        let event = self.store.add_event(new)?;
        self.metrics.record_entity_operation("event", "create");
        self.save()?;
        Ok(event)
    }

    /// Update an event and persist.
    pub fn update_event(&mut self, id: i64, patch: EventPatch) -> Result<Event> {
        let event = self.store.update_event(id, patch)?;
        self.metrics.record_entity_operation("event", "update");
        self.save()?;
        Ok(event)
    }

    /// Delete an event and persist.
    pub fn delete_event(&mut self, id: i64) -> Result<()> {
        self.store.delete_event(id)?;
        self.metrics.record_entity_operation("event", "delete");
        self.save()
    }

    // ---- filters ----------------------------------------------------------

    /// Replace the filter catalogs (pruning blanks) and persist.
    pub fn set_filters(&mut self, catalog: FilterCatalog) -> Result<()> {
        self.store.set_filters(catalog);
        self.save()
    }

    // ---- attachments ------------------------------------------------------

    /// Ingest a local file onto a job as a data-URI attachment.
    ///
    /// The read is cancellable and keyed to the job; if the context moved on
    /// before it finished, nothing is attached and `Ok(None)` is returned.
    pub async fn attach_local_file(
        &mut self,
        job_id: i64,
        path: &Path,
    ) -> Result<Option<Job>> {
        self.loader.focus(job_id);
        let attachment = self
            .loader
            .ingest(job_id, Utc::now().timestamp_millis(), path)
            .await?;

        let Some(attachment) = attachment else {
            return Ok(None);
        };

        let mut files = self
            .store
            .job(job_id)
            .map(|job| job.files.clone())
            .unwrap_or_default();
        files.push(attachment);

        let (job, _) = self.update_job(job_id, JobPatch {
            files: Some(files),
            ..JobPatch::default()
        })?;
        Ok(Some(job))
    }

    /// Link an external URL onto a job as an attachment.
    pub fn attach_url(&mut self, job_id: i64, url: &str, kind: FileKind) -> Result<Job> {
        let attachment =
            crate::attachments::linked_attachment(Utc::now().timestamp_millis(), url, kind);

        let mut files = self
            .store
            .job(job_id)
            .map(|job| job.files.clone())
            .unwrap_or_default();
        files.push(attachment);

        let (job, _) = self.update_job(job_id, JobPatch {
            files: Some(files),
            ..JobPatch::default()
        })?;
        Ok(job)
    }

    /// Drop the attachment context (e.g. the job editor closed), aborting
    /// any in-flight reads.
    pub fn detach_context(&self) {
        self.loader.blur();
    }

    // ---- reports ----------------------------------------------------------

    /// Generate one report, record it in the history (flat list and by
    /// date), persist, and write it to the output directory.
    pub fn generate_report(
        &mut self,
        kind: ReportKind,
        format: ReportFormat,
        output_dir: Option<&Path>,
    ) -> Result<(ReportData, PathBuf)> {
        let report = reports::get_report(&self.store, kind);
        let now = Utc::now();

        self.store.record_report(ReportRecord {
            kind,
            format: format.as_str().to_string(),
            date: now,
            data: serde_json::to_value(&report)?,
        });
        self.metrics.record_report(kind.as_str(), format.as_str());
        self.save()?;

        let directory = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.config.export.output_directory));
        let path = report_writer::write_report_to_dir(&report, kind, format, &directory, now)?;
        Ok((report, path))
    }

    /// The headline statistics panel.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        reports::statistics(&self.store)
    }

    // ---- snapshot import/export and reset ---------------------------------

    /// Export the whole database to a JSON file. With no path, writes
    /// `database_YYYY-MM-DD.json` into the configured output directory.
    pub fn export_snapshot(&self, path: Option<&Path>) -> Result<PathBuf> {
        let snapshot = Snapshot::capture(&self.store);
        let target = match path {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(&self.config.export.output_directory)
                .join(storage::default_export_name(Utc::now())),
        };
        storage::export_to_file(&snapshot, &target)
    }

    /// Import a JSON snapshot file, replacing the store wholesale and
    /// writing through to the local store. A malformed file changes
    /// nothing.
    pub fn import_snapshot(&mut self, path: &Path) -> Result<()> {
        let snapshot = storage::import_from_file(path)?;
        snapshot.apply(&mut self.store);
        self.metrics.record_snapshot_load("file");
        self.save()
    }

    /// Discard everything and return to the seeded first-run state.
    pub fn new_database(&mut self) -> Result<()> {
        self.store.reset();
        self.local.clear()?;
        info!("database reset to first-run state");
        Ok(())
    }
}
