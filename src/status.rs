//! Client status propagation.
//!
//! A client's status is derived from the statuses of its jobs whenever a job
//! changes. Only the three built-in status values participate; catalog
//! extensions are carried on records but never influence the derivation.

use crate::models::{Job, Status};

/// A status change produced by propagation, surfaced to callers so the UI
/// layer can notify the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// The client whose status changed
    pub client_id: i64,
    /// Status before propagation
    pub previous: Status,
    /// Status after propagation
    pub current: Status,
}

/// Derive a client's status from its jobs.
///
/// Precedence, evaluated in order:
/// 1. no jobs: keep the current status;
/// 2. any `pendiente` job: `pendiente`;
/// 3. every job `cerrado`: `cerrado`;
/// 4. any `seguimiento` job (and no `pendiente`): `seguimiento`;
/// 5. otherwise keep the current status.
///
/// Jobs with statuses outside the built-in set are not counted and cannot
/// influence the decision. The result is independent of job ordering and
/// the function is idempotent.
#[must_use]
pub fn derive_client_status(current: &Status, jobs: &[&Job]) -> Status {
    if jobs.is_empty() {
        return current.clone();
    }

    let mut seguimiento = 0usize;
    let mut cerrado = 0usize;
    let mut pendiente = 0usize;

    for job in jobs {
        match job.status {
            Status::Seguimiento => seguimiento += 1,
            Status::Cerrado => cerrado += 1,
            Status::Pendiente => pendiente += 1,
            Status::Other(_) => {}
        }
    }

    if pendiente > 0 {
        Status::Pendiente
    } else if cerrado == jobs.len() {
        Status::Cerrado
    } else if seguimiento > 0 {
        Status::Seguimiento
    } else {
        current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job(status: &str) -> Job {
        Job {
            id: 1,
            client_id: 1,
            name: "Rótulo".to_string(),
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

    #[test]
    fn test_no_jobs_keeps_current() {
        let current = Status::Cerrado;
        assert_eq!(derive_client_status(&current, &[]), Status::Cerrado);
    }

    #[test]
    fn test_any_pendiente_wins() {
        let jobs = [job("cerrado"), job("seguimiento"), job("pendiente")];
        let refs: Vec<&Job> = jobs.iter().collect();
        assert_eq!(
            derive_client_status(&Status::Seguimiento, &refs),
            Status::Pendiente
        );
    }

    #[test]
    fn test_all_cerrado() {
        let jobs = [job("cerrado"), job("cerrado")];
        let refs: Vec<&Job> = jobs.iter().collect();
        assert_eq!(
            derive_client_status(&Status::Seguimiento, &refs),
            Status::Cerrado
        );
    }

    #[test]
    fn test_seguimiento_without_pendiente() {
        let jobs = [job("seguimiento"), job("cerrado")];
        let refs: Vec<&Job> = jobs.iter().collect();
        assert_eq!(
            derive_client_status(&Status::Pendiente, &refs),
            Status::Seguimiento
        );
    }

    #[test]
    fn test_unrecognized_statuses_do_not_count() {
        // All jobs carry catalog extensions; nothing matches, keep current.
        let jobs = [job("en espera"), job("facturado")];
        let refs: Vec<&Job> = jobs.iter().collect();
        assert_eq!(
            derive_client_status(&Status::Pendiente, &refs),
            Status::Pendiente
        );
    }

    #[test]
    fn test_cerrado_needs_every_counted_job() {
        // One cerrado plus one unrecognized: counted cerrado != job count,
        // no seguimiento, no pendiente -> keep current.
        let jobs = [job("cerrado"), job("facturado")];
        let refs: Vec<&Job> = jobs.iter().collect();
        assert_eq!(
            derive_client_status(&Status::Seguimiento, &refs),
            Status::Seguimiento
        );
    }
}
