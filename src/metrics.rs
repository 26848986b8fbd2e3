use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Metrics collection and management
///
/// Thin wrapper over the `metrics` facade; without an installed recorder
/// every call is a no-op, so the library can emit unconditionally.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    /// Record one entity store operation
    pub fn record_entity_operation(&self, entity: &'static str, operation: &'static str) {
        counter!(
            "shop_ledger_entity_operations_total",
            "entity" => entity,
            "operation" => operation
        )
        .increment(1);
    }

    /// Record a propagated client status change
    pub fn record_status_change(&self) {
        counter!("shop_ledger_status_changes_total").increment(1);
    }

    /// Record a snapshot save and its encoded size
    pub fn record_snapshot_save(&self, bytes: usize, duration: Duration) {
        counter!("shop_ledger_snapshot_saves_total").increment(1);
        histogram!("shop_ledger_snapshot_bytes").record(bytes as f64);
        histogram!("shop_ledger_snapshot_save_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a snapshot load or import
    pub fn record_snapshot_load(&self, source: &'static str) {
        counter!("shop_ledger_snapshot_loads_total", "source" => source).increment(1);
    }

    /// Record a generated report
    pub fn record_report(&self, kind: &'static str, format: &'static str) {
        counter!(
            "shop_ledger_reports_generated_total",
            "kind" => kind,
            "format" => format
        )
        .increment(1);
    }

    /// Record current collection sizes after a mutation
    pub fn record_store_sizes(&self, clients: usize, jobs: usize, events: usize) {
        gauge!("shop_ledger_clients").set(clients as f64);
        gauge!("shop_ledger_jobs").set(jobs as f64);
        gauge!("shop_ledger_events").set(events as f64);
    }

    /// Record an error by category
    pub fn record_error(&self, error_type: &'static str, operation: &'static str) {
        counter!(
            "shop_ledger_errors_total",
            "type" => error_type,
            "operation" => operation
        )
        .increment(1);
    }
}
