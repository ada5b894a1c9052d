use std::sync::Arc;

use super::manager::TaskError;
use super::message::{Message, MessageKind};
use super::task::TaskSummary;
use crate::services::{self, Notifier};
use crate::store::ScopedStore;

/// Executes one kind of message against a store already confined to the task's tenant.
pub trait MessageHandler: Send + Sync {
    fn kind(&self) -> MessageKind;
    fn handle(&self, store: &ScopedStore<'_>, message: &Message)
        -> Result<TaskSummary, TaskError>;
}

fn unexpected(expected: MessageKind, message: &Message) -> TaskError {
    TaskError::UnexpectedMessage {
        expected,
        found: message.kind(),
    }
}

pub struct GenerateRentHandler;

impl MessageHandler for GenerateRentHandler {
    fn kind(&self) -> MessageKind {
        MessageKind::GenerateRent
    }

    fn handle(
        &self,
        store: &ScopedStore<'_>,
        message: &Message,
    ) -> Result<TaskSummary, TaskError> {
        let Message::GenerateRent { period } = message else {
            return Err(unexpected(self.kind(), message));
        };
        Ok(services::generate_rent(store, *period)?.into())
    }
}

pub struct RentReceiptHandler;

impl MessageHandler for RentReceiptHandler {
    fn kind(&self) -> MessageKind {
        MessageKind::SendRentReceipts
    }

    fn handle(
        &self,
        store: &ScopedStore<'_>,
        message: &Message,
    ) -> Result<TaskSummary, TaskError> {
        let Message::SendRentReceipts { period } = message else {
            return Err(unexpected(self.kind(), message));
        };
        Ok(services::issue_rent_receipts(store, *period)?.into())
    }
}

pub struct RentReminderHandler {
    notifier: Arc<dyn Notifier>,
}

impl RentReminderHandler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl MessageHandler for RentReminderHandler {
    fn kind(&self) -> MessageKind {
        MessageKind::SendRentReminders
    }

    fn handle(
        &self,
        store: &ScopedStore<'_>,
        message: &Message,
    ) -> Result<TaskSummary, TaskError> {
        let Message::SendRentReminders { as_of } = message else {
            return Err(unexpected(self.kind(), message));
        };
        Ok(services::send_rent_reminders(store, self.notifier.as_ref(), *as_of)?.into())
    }
}

pub struct AccountingSyncHandler;

impl MessageHandler for AccountingSyncHandler {
    fn kind(&self) -> MessageKind {
        MessageKind::SyncAccounting
    }

    fn handle(
        &self,
        store: &ScopedStore<'_>,
        message: &Message,
    ) -> Result<TaskSummary, TaskError> {
        let Message::SyncAccounting { until } = message else {
            return Err(unexpected(self.kind(), message));
        };
        Ok(services::sync_accounting(store, *until)?.into())
    }
}

pub struct LeaseExpiryHandler;

impl MessageHandler for LeaseExpiryHandler {
    fn kind(&self) -> MessageKind {
        MessageKind::CloseExpiredLeases
    }

    fn handle(
        &self,
        store: &ScopedStore<'_>,
        message: &Message,
    ) -> Result<TaskSummary, TaskError> {
        let Message::CloseExpiredLeases { as_of } = message else {
            return Err(unexpected(self.kind(), message));
        };
        Ok(services::close_expired_leases(store, *as_of)?.into())
    }
}

/// One handler per [`MessageKind`].
pub fn standard_handlers(notifier: Arc<dyn Notifier>) -> Vec<Box<dyn MessageHandler>> {
    vec![
        Box::new(GenerateRentHandler),
        Box::new(RentReceiptHandler),
        Box::new(RentReminderHandler::new(notifier)),
        Box::new(AccountingSyncHandler),
        Box::new(LeaseExpiryHandler),
    ]
}
