use std::collections::HashMap;
use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::ServiceError;
use crate::domain::{AccountingEntry, EntrySource};
use crate::store::ScopedStore;
use crate::tasks::TaskSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountingSyncReport {
    pub payments_booked: u64,
    pub expenses_booked: u64,
}

impl From<AccountingSyncReport> for TaskSummary {
    fn from(report: AccountingSyncReport) -> Self {
        TaskSummary::default()
            .with("payments_booked", report.payments_booked)
            .with("expenses_booked", report.expenses_booked)
    }
}

/// Book collected rent as credits and expenses as debits.
///
/// A payment is credited for whatever was collected since the last sync, so a partial payment
/// followed by a top-up ends up fully on the ledger. Expenses are booked at most once.
pub fn sync_accounting(
    store: &ScopedStore<'_>,
    until: NaiveDate,
) -> Result<AccountingSyncReport, ServiceError> {
    let mut credited: HashMap<EntrySource, i64> = HashMap::new();
    for entry in store.accounting_entries().list()? {
        *credited.entry(entry.source).or_default() += entry.credit_cents - entry.debit_cents;
    }

    let mut report = AccountingSyncReport::default();

    for payment in store.payments().list()? {
        let Some(paid_on) = payment.paid_on.filter(|paid_on| *paid_on <= until) else {
            continue;
        };
        let source = EntrySource::Payment(payment.id);
        let uncredited = payment.paid_cents - credited.get(&source).copied().unwrap_or(0);
        if uncredited <= 0 {
            continue;
        }

        store.accounting_entries().insert(AccountingEntry {
            id: 0,
            owner: payment.owner,
            booked_on: paid_on,
            label: format!("Rent {} (lease {})", payment.period, payment.lease_id),
            source,
            debit_cents: 0,
            credit_cents: uncredited,
        })?;
        report.payments_booked += 1;
    }

    for expense in store.expenses().list()? {
        let source = EntrySource::Expense(expense.id);
        if expense.incurred_on > until || credited.contains_key(&source) {
            continue;
        }

        store.accounting_entries().insert(AccountingEntry {
            id: 0,
            owner: expense.owner,
            booked_on: expense.incurred_on,
            label: expense.label.clone(),
            source,
            debit_cents: expense.amount_cents,
            credit_cents: 0,
        })?;
        report.expenses_booked += 1;
    }

    debug!(
        payments = report.payments_booked,
        expenses = report.expenses_booked,
        %until,
        "accounting synchronised"
    );
    Ok(report)
}

#[derive(Debug, Serialize)]
struct LedgerRow<'a> {
    date: NaiveDate,
    reference: String,
    label: &'a str,
    debit: String,
    credit: String,
}

fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

/// Write the ledger visible to the scope as CSV, ordered by booking date. Returns the row count.
pub fn ledger_csv<W: Write>(store: &ScopedStore<'_>, writer: W) -> Result<usize, ServiceError> {
    let mut entries = store.accounting_entries().list()?;
    entries.sort_by(|a, b| a.booked_on.cmp(&b.booked_on).then(a.id.cmp(&b.id)));

    let mut csv = csv::Writer::from_writer(writer);
    for entry in &entries {
        csv.serialize(LedgerRow {
            date: entry.booked_on,
            reference: entry.source.to_string(),
            label: &entry.label,
            debit: format_cents(entry.debit_cents),
            credit: format_cents(entry.credit_cents),
        })?;
    }
    csv.flush()?;

    Ok(entries.len())
}
