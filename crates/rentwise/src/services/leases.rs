use chrono::NaiveDate;
use tracing::info;

use super::ServiceError;
use crate::domain::LeaseStatus;
use crate::store::ScopedStore;
use crate::tasks::TaskSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeaseExpiryReport {
    pub leases_closed: u64,
}

impl From<LeaseExpiryReport> for TaskSummary {
    fn from(report: LeaseExpiryReport) -> Self {
        TaskSummary::default().with("leases_closed", report.leases_closed)
    }
}

/// End every active lease whose end date is before `as_of`.
pub fn close_expired_leases(
    store: &ScopedStore<'_>,
    as_of: NaiveDate,
) -> Result<LeaseExpiryReport, ServiceError> {
    let mut report = LeaseExpiryReport::default();

    for mut lease in store.leases().list()? {
        if !lease.has_expired(as_of) {
            continue;
        }
        lease.status = LeaseStatus::Ended;
        let lease = store.leases().update(lease)?;
        info!(lease_id = lease.id, ends_on = ?lease.ends_on, "lease closed");
        report.leases_closed += 1;
    }

    Ok(report)
}
