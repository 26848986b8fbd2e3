//! Reporting aggregations.
//!
//! Four stateless aggregations over the entity store — status distribution,
//! material distribution, monthly income and profit buckets — plus the
//! headline statistics panel. Each is a full scan of the current
//! collections; nothing is maintained incrementally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::{Calculator, ReportKind, Status};
use crate::store::EntityStore;

/// Client counts per built-in status value.
///
/// Clients carrying a catalog-extension status are dropped from the tally
/// (but of course not from the collection).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Clients in follow-up
    pub seguimiento: u64,
    /// Closed clients
    pub cerrado: u64,
    /// Pending clients
    pub pendiente: u64,
}

/// Job counts per profit-percentage bucket, `[low, high)` intervals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitBuckets {
    /// Jobs sold below cost
    #[serde(rename = "Negativa")]
    pub negative: u64,
    /// Profit percentage in `[0, 10)`
    #[serde(rename = "0-10%")]
    pub low: u64,
    /// Profit percentage in `[10, 25)`
    #[serde(rename = "10-25%")]
    pub medium: u64,
    /// Profit percentage in `[25, 50)`
    #[serde(rename = "25-50%")]
    pub high: u64,
    /// Profit percentage of 50 or more
    #[serde(rename = "50%+")]
    pub top: u64,
}

/// Headline figures shown alongside the charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// All clients
    pub total_clients: u64,
    /// Clients currently in follow-up
    pub active_clients: u64,
    /// All jobs
    pub total_jobs: u64,
    /// Closed jobs
    pub completed_jobs: u64,
    /// Final prices summed over priced jobs
    pub total_income: f64,
    /// Report-facing costs summed over priced jobs
    pub total_cost: f64,
    /// Income minus cost over priced jobs
    pub total_profit: f64,
    /// Income averaged over every job, priced or not
    pub average_income: f64,
    /// Overall profit margin as a percentage of income
    pub profit_margin: f64,
}

/// One aggregation's chart-ready output: a title, the data payload and a
/// headline total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    /// Human-readable report title
    pub title: String,
    /// The aggregation payload
    pub data: serde_json::Value,
    /// Headline total for the report footer
    pub total: serde_json::Value,
}

/// The cost figure reporting uses: every cost input except design.
///
/// The pricing calculator's `total_cost` additionally includes
/// `design_cost`; reporting has always excluded it, so the two figures can
/// disagree for jobs with a design cost.
#[must_use]
pub fn report_cost(calc: &Calculator) -> f64 {
    calc.provider_cost
        + calc.packaging_cost
        + calc.publicity
        + calc.services
        + calc.installation_cost
        + calc.transport
}

/// True when a job's saved calculator carries a usable final price.
fn priced(calc: &Option<Calculator>) -> Option<&Calculator> {
    calc.as_ref().filter(|calc| calc.final_price != 0.0)
}

/// Count clients per built-in status.
#[must_use]
pub fn clients_by_status(store: &EntityStore) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for client in store.clients() {
        match client.status {
            Status::Seguimiento => counts.seguimiento += 1,
            Status::Cerrado => counts.cerrado += 1,
            Status::Pendiente => counts.pendiente += 1,
            Status::Other(_) => {}
        }
    }
    counts
}

/// Count jobs per material string.
///
/// Keys are emitted only for jobs with a non-empty material, with no
/// normalization; consistent casing is the filter catalog's job.
#[must_use]
pub fn jobs_by_material(store: &EntityStore) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for job in store.jobs() {
        if !job.material.is_empty() {
            *counts.entry(job.material.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Sum final prices per creation month (`YYYY-MM` keys, ascending).
///
/// Grouping is by the job's creation date, not any payment date.
#[must_use]
pub fn monthly_income(store: &EntityStore) -> BTreeMap<String, f64> {
    let mut income = BTreeMap::new();
    for job in store.jobs() {
        if let Some(calc) = priced(&job.calculator) {
            let month = job.created_at.format("%Y-%m").to_string();
            *income.entry(month).or_insert(0.0) += calc.final_price;
        }
    }
    income
}

/// Bucket priced jobs by profit percentage of the final price.
#[must_use]
pub fn profit_distribution(store: &EntityStore) -> ProfitBuckets {
    let mut buckets = ProfitBuckets::default();
    for job in store.jobs() {
        let Some(calc) = priced(&job.calculator) else {
            continue;
        };

        let cost = report_cost(calc);
        let profit = calc.final_price - cost;
        let profit_pct = if calc.final_price > 0.0 {
            profit / calc.final_price * 100.0
        } else {
            0.0
        };

        if profit < 0.0 {
            buckets.negative += 1;
        } else if profit_pct < 10.0 {
            buckets.low += 1;
        } else if profit_pct < 25.0 {
            buckets.medium += 1;
        } else if profit_pct < 50.0 {
            buckets.high += 1;
        } else {
            buckets.top += 1;
        }
    }
    buckets
}

/// Compute the headline statistics panel.
#[must_use]
pub fn statistics(store: &EntityStore) -> Statistics {
    let mut stats = Statistics {
        total_clients: store.clients().len() as u64,
        total_jobs: store.jobs().len() as u64,
        ..Statistics::default()
    };

    stats.active_clients = store
        .clients()
        .iter()
        .filter(|client| client.status == Status::Seguimiento)
        .count() as u64;
    stats.completed_jobs = store
        .jobs()
        .iter()
        .filter(|job| job.status == Status::Cerrado)
        .count() as u64;

    for job in store.jobs() {
        if let Some(calc) = priced(&job.calculator) {
            let cost = report_cost(calc);
            stats.total_income += calc.final_price;
            stats.total_cost += cost;
            stats.total_profit += calc.final_price - cost;
        }
    }

    stats.average_income = if stats.total_jobs > 0 {
        stats.total_income / stats.total_jobs as f64
    } else {
        0.0
    };
    stats.profit_margin = if stats.total_income > 0.0 {
        stats.total_profit / stats.total_income * 100.0
    } else {
        0.0
    };

    stats
}

/// Produce one report's chart-ready payload with its title and total.
#[must_use]
pub fn get_report(store: &EntityStore, kind: ReportKind) -> ReportData {
    match kind {
        ReportKind::ClientsByStatus => ReportData {
            title: "Clientes por Estado".to_string(),
            data: json!(clients_by_status(store)),
            total: json!(store.clients().len()),
        },
        ReportKind::JobsByMaterial => ReportData {
            title: "Trabajos por Material".to_string(),
            data: json!(jobs_by_material(store)),
            total: json!(store.jobs().len()),
        },
        ReportKind::MonthlyIncome => {
            let income = monthly_income(store);
            let total: f64 = income.values().sum();
            ReportData {
                title: "Ingresos Mensuales".to_string(),
                data: json!(income),
                total: json!(total),
            }
        }
        ReportKind::Profits => ReportData {
            title: "Distribución de Ganancias".to_string(),
            data: json!(profit_distribution(store)),
            total: json!(store.jobs().len()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewClient, NewJob};

    fn store_with_priced_job(final_price: f64, calc: Calculator) -> EntityStore {
        let mut store = EntityStore::new();
        let client = store
            .add_client(NewClient {
                name: "Ana".to_string(),
                ..NewClient::default()
            })
            .unwrap();
        let (job, _) = store
            .add_job(NewJob {
                client_id: client.id,
                name: "Letrero".to_string(),
                ..NewJob::default()
            })
            .unwrap();
        store
            .persist_calculator(job.id, Calculator { final_price, ..calc })
            .unwrap();
        store
    }

    #[test]
    fn test_report_cost_excludes_design() {
        let calc = Calculator {
            provider_cost: 100.0,
            design_cost: 50.0,
            transport: 25.0,
            ..Calculator::default()
        };
        assert_eq!(report_cost(&calc), 125.0);
    }

    #[test]
    fn test_profit_bucket_boundaries() {
        // 1000 income over 700 cost: 30% margin lands in 25-50%.
        let store = store_with_priced_job(
            1000.0,
            Calculator {
                provider_cost: 400.0,
                publicity: 200.0,
                transport: 100.0,
                ..Calculator::default()
            },
        );
        let buckets = profit_distribution(&store);
        assert_eq!(buckets.high, 1);
        assert_eq!(buckets.negative + buckets.low + buckets.medium + buckets.top, 0);
    }

    #[test]
    fn test_unpriced_jobs_are_skipped() {
        let mut store = EntityStore::new();
        let client = store
            .add_client(NewClient {
                name: "Ana".to_string(),
                ..NewClient::default()
            })
            .unwrap();
        store
            .add_job(NewJob {
                client_id: client.id,
                name: "Letrero".to_string(),
                ..NewJob::default()
            })
            .unwrap();

        assert!(monthly_income(&store).is_empty());
        assert_eq!(profit_distribution(&store), ProfitBuckets::default());
    }

    #[test]
    fn test_statistics_average_spans_all_jobs() {
        let mut store = store_with_priced_job(
            1000.0,
            Calculator {
                provider_cost: 400.0,
                ..Calculator::default()
            },
        );
        let client_id = store.clients()[0].id;
        store
            .add_job(NewJob {
                client_id,
                name: "Sin precio".to_string(),
                ..NewJob::default()
            })
            .unwrap();

        let stats = statistics(&store);
        assert_eq!(stats.total_jobs, 2);
        assert_eq!(stats.total_income, 1000.0);
        assert_eq!(stats.average_income, 500.0);
        assert_eq!(stats.total_profit, 600.0);
        assert_eq!(stats.profit_margin, 60.0);
    }
}
