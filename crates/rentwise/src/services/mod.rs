//! Domain operations invoked by task handlers. Every function receives a [`ScopedStore`], so it
//! only reads and writes rows of the tenant the task runs for.
//!
//! [`ScopedStore`]: crate::store::ScopedStore

pub mod accounting;
pub mod leases;
pub mod receipts;
pub mod reminders;
pub mod rent;

#[cfg(test)]
mod fixtures;

pub use accounting::{ledger_csv, sync_accounting, AccountingSyncReport};
pub use leases::{close_expired_leases, LeaseExpiryReport};
pub use receipts::{issue_rent_receipts, ReceiptRunReport};
pub use reminders::{
    send_rent_reminders, MemoryNotifier, NotifyError, Notifier, ReminderRunReport, RentReminder,
};
pub use rent::{generate_rent, RentRunReport};

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error("ledger export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("ledger export failed: {0}")]
    Io(#[from] std::io::Error),
}
