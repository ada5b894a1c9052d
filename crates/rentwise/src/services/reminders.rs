use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use super::ServiceError;
use crate::domain::YearMonth;
use crate::store::ScopedStore;
use crate::tasks::TaskSummary;
use crate::tenancy::TenantStamp;

/// Outbound channel for rent reminders (e-mail, SMS, ...).
pub trait Notifier: Send + Sync {
    fn notify(&self, reminder: RentReminder) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RentReminder {
    pub owner: TenantStamp,
    pub payment_id: u64,
    pub lease_id: u64,
    pub recipient: String,
    pub period: YearMonth,
    pub outstanding_cents: i64,
    pub days_overdue: i64,
    /// 1 for the first reminder of this payment.
    pub sequence: u32,
}

/// Keeps reminders in memory; used by the demo and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    sent: Arc<Mutex<Vec<RentReminder>>>,
}

impl MemoryNotifier {
    pub fn sent(&self) -> Vec<RentReminder> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, reminder: RentReminder) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .map_err(|_| NotifyError::Transport("notifier mutex poisoned".to_string()))?
            .push(reminder);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderRunReport {
    pub reminders_sent: u64,
    pub already_reminded_today: u64,
    pub missing_recipient: u64,
}

impl From<ReminderRunReport> for TaskSummary {
    fn from(report: ReminderRunReport) -> Self {
        TaskSummary::default()
            .with("reminders_sent", report.reminders_sent)
            .with("already_reminded_today", report.already_reminded_today)
            .with("missing_recipient", report.missing_recipient)
    }
}

/// Remind the tenant of every rent call still unpaid after its due date, once per day.
pub fn send_rent_reminders(
    store: &ScopedStore<'_>,
    notifier: &dyn Notifier,
    as_of: NaiveDate,
) -> Result<ReminderRunReport, ServiceError> {
    let mut report = ReminderRunReport::default();

    for mut payment in store.payments().list()? {
        if !payment.is_overdue(as_of) {
            continue;
        }
        if payment.last_reminder_on == Some(as_of) {
            report.already_reminded_today += 1;
            continue;
        }

        let recipient = match store.leases().get(payment.lease_id)? {
            Some(lease) => store
                .tenants()
                .get(lease.tenant_id)?
                .map(|tenant| tenant.email)
                .filter(|email| !email.trim().is_empty()),
            None => None,
        };
        let Some(recipient) = recipient else {
            warn!(payment_id = payment.id, "no reachable tenant for overdue rent");
            report.missing_recipient += 1;
            continue;
        };

        let sequence = payment.reminders_sent + 1;
        notifier.notify(RentReminder {
            owner: payment.owner,
            payment_id: payment.id,
            lease_id: payment.lease_id,
            recipient,
            period: payment.period,
            outstanding_cents: payment.outstanding_cents(),
            days_overdue: (as_of - payment.due_on).num_days(),
            sequence,
        })?;

        payment.reminders_sent = sequence;
        payment.last_reminder_on = Some(as_of);
        let payment = store.payments().update(payment)?;
        debug!(payment_id = payment.id, sequence, "rent reminder sent");
        report.reminders_sent += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::*;
    use crate::services::generate_rent;
    use crate::store::Store;

    struct DownNotifier;

    impl Notifier for DownNotifier {
        fn notify(&self, _reminder: RentReminder) -> Result<(), NotifyError> {
            Err(NotifyError::Transport("smtp unreachable".to_string()))
        }
    }

    #[test]
    fn reminds_each_overdue_payment_once_per_day() {
        let store = Store::in_memory();
        seed_portfolio(&store, ORG_A);
        let scoped = store.scoped(org_scope(ORG_A));
        generate_rent(&scoped, october()).expect("rent generated");
        let notifier = MemoryNotifier::default();

        // Short lease is due on the 1st, the long lease on the 5th.
        let report = send_rent_reminders(&scoped, &notifier, date(2025, 10, 3)).expect("run");
        assert_eq!(report.reminders_sent, 1);

        let same_day = send_rent_reminders(&scoped, &notifier, date(2025, 10, 3)).expect("run");
        assert_eq!(same_day.reminders_sent, 0);
        assert_eq!(same_day.already_reminded_today, 1);

        let later = send_rent_reminders(&scoped, &notifier, date(2025, 10, 10)).expect("run");
        assert_eq!(later.reminders_sent, 2);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].recipient, "renter1@example.com");
        assert_eq!(sent[0].days_overdue, 2);
        assert_eq!(sent[2].sequence, 2);
    }

    #[test]
    fn settled_payments_are_not_reminded() {
        let store = Store::in_memory();
        seed_portfolio(&store, ORG_A);
        let scoped = store.scoped(org_scope(ORG_A));
        generate_rent(&scoped, october()).expect("rent generated");
        for mut payment in scoped.payments().list().expect("list") {
            payment.record_settlement(payment.amount_cents, date(2025, 10, 1));
            scoped.payments().update(payment).expect("update");
        }

        let notifier = MemoryNotifier::default();
        let report = send_rent_reminders(&scoped, &notifier, date(2025, 10, 20)).expect("run");
        assert_eq!(report, ReminderRunReport::default());
        assert!(notifier.sent().is_empty());
    }

    #[test]
    fn transport_failure_leaves_payment_unreminded() {
        let store = Store::in_memory();
        seed_portfolio(&store, ORG_A);
        let scoped = store.scoped(org_scope(ORG_A));
        generate_rent(&scoped, october()).expect("rent generated");

        let err = send_rent_reminders(&scoped, &DownNotifier, date(2025, 10, 20))
            .expect_err("transport failure surfaces");
        assert!(matches!(err, ServiceError::Notify(_)));
        assert!(scoped
            .payments()
            .list()
            .expect("list")
            .iter()
            .all(|payment| payment.reminders_sent == 0));
    }
}
