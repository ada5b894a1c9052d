//! Named background jobs.
//!
//! A [`Message`] is dispatched on behalf of an [`Actor`](crate::tenancy::Actor), persisted as a
//! tenant-stamped [`Task`], queued, and later executed by the [`TaskManager`], which routes it to
//! the registered [`MessageHandler`]. Handlers only ever see a store scoped to the tenant that
//! dispatched the task.

pub mod handlers;
pub mod manager;
pub mod message;
pub mod router;
pub mod task;

#[cfg(test)]
mod tests;

pub use handlers::{standard_handlers, MessageHandler};
pub use manager::{TaskError, TaskManager, TaskQueue};
pub use message::{Message, MessageKind};
pub use router::task_router;
pub use task::{Task, TaskStatus, TaskSummary, TaskView};
