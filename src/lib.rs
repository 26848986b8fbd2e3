//! Shop Ledger - Client, Job and Event Record-Keeping
//!
//! A Rust library for managing a small fabrication/printing shop's records:
//! clients, work orders, calendar events, classification catalogs, per-job
//! pricing and derived reports.
//!
//! # Features
//!
//! - In-memory entity store with cascade rules and monotonic ids
//! - Automatic client status propagation from job statuses
//! - Pricing calculator with derived prices and profit figures
//! - Chart-ready reporting aggregations and headline statistics
//! - Whole-database JSON snapshots, persisted locally and file-portable

/// Job file attachments and the cancellable attachment loader
pub mod attachments;
/// Pricing calculator arithmetic
pub mod calculator;
/// Configuration management
pub mod config;
/// Error types
pub mod error;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Report file export
pub mod report_writer;
/// Reporting aggregations
pub mod reports;
/// Application service layer
pub mod service;
/// Snapshot codec
pub mod snapshot;
/// Client status propagation
pub mod status;
/// Local snapshot persistence
pub mod storage;
/// In-memory entity store
pub mod store;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use error::{LedgerError, Result};
pub use models::{Client, ClientQuery, Event, Job, ReportKind, Status};
pub use service::LedgerService;
pub use snapshot::Snapshot;
pub use store::EntityStore;
