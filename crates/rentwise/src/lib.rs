//! Tenant-isolated property management core.
//!
//! Every business row belongs to an organization (and optionally a company). The [`store`]
//! applies the isolation filter on every read and stamps ownership on every write; the
//! [`tasks`] module persists and runs named background jobs (rent generation, receipts,
//! reminders, accounting sync, lease expiry) under the tenant that dispatched them.

pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod store;
pub mod tasks;
pub mod telemetry;
pub mod tenancy;
