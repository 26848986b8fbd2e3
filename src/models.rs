//! Data models for the shop ledger
//!
//! This module contains all record types held by the entity store: clients,
//! jobs, calendar events, filter catalogs and generated report records, plus
//! the patch and query types used by the store's mutation and listing
//! operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a client or a job.
///
/// Three values are built in and drive status propagation and reporting;
/// anything else entered through the status catalog is carried verbatim as
/// `Other` and ignored by the derivation logic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    /// Follow-up in progress
    Seguimiento,
    /// Closed
    Cerrado,
    /// Pending work outstanding
    Pendiente,
    /// Catalog-defined status outside the built-in set
    Other(String),
}

impl Status {
    /// The status value as stored and displayed
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Seguimiento => "seguimiento",
            Self::Cerrado => "cerrado",
            Self::Pendiente => "pendiente",
            Self::Other(name) => name,
        }
    }

    /// True for the three built-in values recognized by propagation and
    /// reporting
    #[must_use]
    pub const fn is_builtin(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        match value.as_str() {
            "seguimiento" => Self::Seguimiento,
            "cerrado" => Self::Cerrado,
            "pendiente" => Self::Pendiente,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Status {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        value.as_str().to_string()
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Seguimiento
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person authorized to act on a client's behalf
///
/// Owned exclusively by one client; `id` is the person's document number,
/// not a record identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorizedPerson {
    /// Person's display name
    pub name: String,
    /// Contact phone number
    #[serde(default)]
    pub phone: String,
    /// Identity document number
    #[serde(default)]
    pub id: String,
    /// Free-form note, stored as opaque markup
    #[serde(default)]
    pub note: String,
}

/// A customer record with contact info and a lifecycle status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Unique, immutable, generation-order-monotonic identity
    pub id: i64,
    /// Display name (required)
    pub name: String,
    /// Contact phone number
    #[serde(default)]
    pub phone: String,
    /// Contact email address
    #[serde(default)]
    pub email: String,
    /// Street address
    #[serde(default)]
    pub address: String,
    /// Company name; also feeds the derived company catalog
    #[serde(default)]
    pub company: String,
    /// Lifecycle status, user-set or derived from the client's jobs
    #[serde(default)]
    pub status: Status,
    /// Opaque avatar reference or URI
    #[serde(default)]
    pub avatar: Option<String>,
    /// Ordered list of authorized persons, owned by this client
    #[serde(default)]
    pub authorized_persons: Vec<AuthorizedPerson>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent mutation
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Client {
    /// Sort key for the default "newest first" client ordering
    #[must_use]
    pub fn recency(&self) -> DateTime<Utc> {
        self.last_updated.unwrap_or(self.created_at)
    }
}

/// A file attached to a job
///
/// `url` is either a self-contained `data:` URI for locally ingested bytes
/// or an external network URL; `is_local` records which.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    /// Attachment identity, unique within the owning job
    pub id: i64,
    /// Original file name or URL basename
    pub name: String,
    /// MIME type
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Data URI or external URL
    pub url: String,
    /// Optional preview reference
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// True when the bytes were ingested locally rather than linked
    #[serde(default)]
    pub is_local: bool,
}

/// Cost and pricing figures for one job
///
/// Doubles as calculator input and stored output: the derivation fills
/// `total_cost` and, when unset, `price_without_iva` and `final_price`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Calculator {
    /// Publicity cost
    pub publicity: f64,
    /// Services cost
    pub services: f64,
    /// Transport cost
    pub transport: f64,
    /// Provider/materials cost
    pub provider_cost: f64,
    /// Packaging cost
    pub packaging_cost: f64,
    /// Design cost
    pub design_cost: f64,
    /// Installation cost
    pub installation_cost: f64,
    /// Profit margin percentage applied over total cost
    pub profit_margin: f64,
    /// Price before tax; derived when zero
    pub price_without_iva: f64,
    /// Tax percentage
    pub iva: f64,
    /// Final price including tax; derived when zero
    pub final_price: f64,
    /// Sum of all seven cost inputs
    pub total_cost: f64,
}

/// A work order belonging to one client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique identity
    pub id: i64,
    /// Owning client; a job with no owning client is invalid
    pub client_id: i64,
    /// Job name (required)
    pub name: String,
    /// Material, expected to match a catalog entry but not enforced
    #[serde(default)]
    pub material: String,
    /// Free-text measurements
    #[serde(default)]
    pub measures: String,
    /// Lifecycle status; feeds client status propagation
    #[serde(default)]
    pub status: Status,
    /// Rich-text details, stored as opaque markup
    #[serde(default)]
    pub details: String,
    /// Rich-text follow-up notes, stored as opaque markup
    #[serde(default)]
    pub follow_up_notes: String,
    /// Attached files
    #[serde(default)]
    pub files: Vec<FileAttachment>,
    /// Saved pricing figures; absent until first computed and saved
    #[serde(default)]
    pub calculator: Option<Calculator>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent mutation
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// A calendar event, optionally tied to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique identity
    pub id: i64,
    /// Event title (required)
    pub title: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Calendar date in `YYYY-MM-DD` form (required)
    pub date: String,
    /// Optional clock time in `HH:MM` form, empty when unset
    #[serde(default)]
    pub time: String,
    /// Associated client, if any
    #[serde(default)]
    pub client_id: Option<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent mutation
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// One entry in a filter catalog list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    /// Entry identity
    pub id: i64,
    /// Entry name, unique by intent
    pub name: String,
}

/// User-editable catalogs of material, status and company values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCatalog {
    /// Material names offered for jobs
    pub materials: Vec<FilterEntry>,
    /// Status names offered for clients and jobs
    pub statuses: Vec<FilterEntry>,
    /// Company names, derived from clients and user-extendable
    pub companies: Vec<FilterEntry>,
}

impl FilterCatalog {
    /// Drop entries whose trimmed name is empty; blank entries never
    /// survive a save cycle.
    pub fn prune_blank(&mut self) {
        self.materials.retain(|entry| !entry.name.trim().is_empty());
        self.statuses.retain(|entry| !entry.name.trim().is_empty());
        self.companies.retain(|entry| !entry.name.trim().is_empty());
    }

    /// True if the company list contains an entry with this exact name
    #[must_use]
    pub fn has_company(&self, name: &str) -> bool {
        self.companies.iter().any(|entry| entry.name == name)
    }
}

/// Kind of aggregation a report was generated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportKind {
    /// Client count per status
    ClientsByStatus,
    /// Job count per material
    JobsByMaterial,
    /// Income summed per creation month
    MonthlyIncome,
    /// Job count per profit-percentage bucket
    Profits,
}

impl ReportKind {
    /// The wire name of this report kind
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ClientsByStatus => "clientsByStatus",
            Self::JobsByMaterial => "jobsByMaterial",
            Self::MonthlyIncome => "monthlyIncome",
            Self::Profits => "profits",
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time snapshot of one aggregation's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Which aggregation produced this report
    #[serde(rename = "type")]
    pub kind: ReportKind,
    /// Output format it was exported in (csv, json, ...)
    pub format: String,
    /// Generation timestamp
    pub date: DateTime<Utc>,
    /// The aggregation payload as generated
    pub data: serde_json::Value,
}

/// Data for creating a new client
#[derive(Debug, Clone, Default)]
pub struct NewClient {
    /// Display name (required)
    pub name: String,
    /// Contact phone number
    pub phone: String,
    /// Contact email address
    pub email: String,
    /// Street address
    pub address: String,
    /// Company name
    pub company: String,
    /// Initial status
    pub status: Status,
    /// Avatar reference
    pub avatar: Option<String>,
    /// Authorized persons
    pub authorized_persons: Vec<AuthorizedPerson>,
}

/// Partial update for a client; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct ClientPatch {
    /// New display name
    pub name: Option<String>,
    /// New phone number
    pub phone: Option<String>,
    /// New email address
    pub email: Option<String>,
    /// New street address
    pub address: Option<String>,
    /// New company name
    pub company: Option<String>,
    /// New status
    pub status: Option<Status>,
    /// New avatar reference
    pub avatar: Option<Option<String>>,
    /// Replacement authorized-persons list
    pub authorized_persons: Option<Vec<AuthorizedPerson>>,
}

/// Data for creating a new job
#[derive(Debug, Clone, Default)]
pub struct NewJob {
    /// Owning client (required)
    pub client_id: i64,
    /// Job name (required)
    pub name: String,
    /// Material name
    pub material: String,
    /// Measurements
    pub measures: String,
    /// Initial status
    pub status: Status,
    /// Rich-text details
    pub details: String,
    /// Rich-text follow-up notes
    pub follow_up_notes: String,
    /// Attached files
    pub files: Vec<FileAttachment>,
}

/// Partial update for a job; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    /// New job name
    pub name: Option<String>,
    /// New material name
    pub material: Option<String>,
    /// New measurements
    pub measures: Option<String>,
    /// New status
    pub status: Option<Status>,
    /// New details markup
    pub details: Option<String>,
    /// New follow-up notes markup
    pub follow_up_notes: Option<String>,
    /// Replacement file list
    pub files: Option<Vec<FileAttachment>>,
}

/// Data for creating a new event
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    /// Event title (required)
    pub title: String,
    /// Description
    pub description: String,
    /// Calendar date, `YYYY-MM-DD` (required)
    pub date: String,
    /// Clock time, `HH:MM`, empty when unset
    pub time: String,
    /// Associated client, if any
    pub client_id: Option<i64>,
}

/// Partial update for an event; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New date
    pub date: Option<String>,
    /// New time
    pub time: Option<String>,
    /// New client association
    pub client_id: Option<Option<i64>>,
}

/// Sort order for the client list view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Alphabetical by name, A to Z
    NameAsc,
    /// Alphabetical by name, Z to A
    NameDesc,
    /// Newest first by last update (falling back to creation time)
    #[default]
    Recent,
}

/// Composable filter set for the client list view
///
/// Filters apply in sequence: free-text search, exact company, exact status,
/// "has a job with this material", then the sort step.
#[derive(Debug, Default)]
pub struct ClientQuery {
    /// Case-insensitive substring matched against name, phone and any
    /// authorized person's document id
    pub search: Option<String>,
    /// Exact company name
    pub company: Option<String>,
    /// Exact status value
    pub status: Option<Status>,
    /// Material that at least one of the client's jobs must use
    pub material: Option<String>,
    /// Final ordering
    pub sort: SortOrder,
}

impl ClientQuery {
    /// Create an empty query matching all clients in default order
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text search term
    pub fn set_search(&mut self, term: String) {
        self.search = Some(term);
    }

    /// Set the exact company filter
    pub fn set_company(&mut self, company: String) {
        self.company = Some(company);
    }

    /// Set the exact status filter
    pub fn set_status(&mut self, status: Status) {
        self.status = Some(status);
    }

    /// Set the job-material filter
    pub fn set_material(&mut self, material: String) {
        self.material = Some(material);
    }

    /// Set the sort order
    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
    }
}
