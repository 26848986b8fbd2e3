//! Snapshot codec.
//!
//! Serializes the entire store (plus generated report history) to a single
//! JSON document and back. Every top-level field defaults independently so a
//! partial or legacy document degrades to empty collections instead of
//! failing the whole load.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Client, Event, FilterCatalog, Job, ReportRecord};
use crate::store::EntityStore;

/// The persisted document: everything the application knows, wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    /// All client records
    pub clients: Vec<Client>,
    /// All job records
    pub jobs: Vec<Job>,
    /// All calendar events
    pub events: Vec<Event>,
    /// The filter catalogs
    pub filters: FilterCatalog,
    /// Generated reports, in generation order
    pub reports: Vec<ReportRecord>,
    /// Generated reports grouped by generation date
    pub reports_by_date: BTreeMap<String, Vec<ReportRecord>>,
    /// When this snapshot was produced
    pub last_saved: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Capture the store's current contents, stamping `last_saved`.
    #[must_use]
    pub fn capture(store: &EntityStore) -> Self {
        Self {
            clients: store.clients().to_vec(),
            jobs: store.jobs().to_vec(),
            events: store.events().to_vec(),
            filters: store.filters().clone(),
            reports: store.reports().to_vec(),
            reports_by_date: store.reports_by_date().clone(),
            last_saved: Some(Utc::now()),
        }
    }

    /// Replace the store's contents with this snapshot. Not a merge: the
    /// previous contents are discarded entirely.
    pub fn apply(self, store: &mut EntityStore) {
        store.replace_all(
            self.clients,
            self.jobs,
            self.events,
            self.filters,
            self.reports,
            self.reports_by_date,
        );
    }

    /// Encode as a pretty-printed JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from a JSON document.
    ///
    /// Missing fields default; an unparseable document is an error and the
    /// caller's store is left untouched.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }
}
