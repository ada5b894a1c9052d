use std::collections::HashSet;

use tracing::debug;

use super::ServiceError;
use crate::domain::{Payment, YearMonth};
use crate::store::ScopedStore;
use crate::tasks::TaskSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RentRunReport {
    pub leases_covered: u64,
    pub payments_created: u64,
    pub already_generated: u64,
}

impl From<RentRunReport> for TaskSummary {
    fn from(report: RentRunReport) -> Self {
        TaskSummary::default()
            .with("leases_covered", report.leases_covered)
            .with("payments_created", report.payments_created)
            .with("already_generated", report.already_generated)
    }
}

/// Create one rent call per lease active during `period`. Running twice is harmless.
pub fn generate_rent(
    store: &ScopedStore<'_>,
    period: YearMonth,
) -> Result<RentRunReport, ServiceError> {
    let generated: HashSet<u64> = store
        .payments()
        .list()?
        .into_iter()
        .filter(|payment| payment.period == period)
        .map(|payment| payment.lease_id)
        .collect();

    let mut report = RentRunReport::default();
    for lease in store.leases().list()? {
        if !lease.covers(period) {
            continue;
        }
        report.leases_covered += 1;

        if generated.contains(&lease.id) {
            report.already_generated += 1;
            continue;
        }

        let payment = store.payments().insert(Payment::due_for(&lease, period))?;
        debug!(lease_id = lease.id, payment_id = payment.id, %period, "rent call created");
        report.payments_created += 1;
    }

    Ok(report)
}
