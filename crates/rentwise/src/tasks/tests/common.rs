use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::{TaskConfig, TenancyConfig};
use crate::domain::{Lease, LeaseStatus, Tenant, YearMonth};
use crate::services::{MemoryNotifier, NotifyError, ServiceError};
use crate::store::Store;
use crate::tasks::{Message, MessageHandler, TaskError, TaskManager, TaskQueue, TaskSummary};
use crate::tenancy::{Actor, Company, CompanyId, OrganizationId, TenantScope, TenantStamp, UserId};

pub(super) const ORG_A: OrganizationId = OrganizationId(1);
pub(super) const ORG_B: OrganizationId = OrganizationId(2);
pub(super) const COMPANY_A1: Company = Company {
    id: CompanyId(11),
    organization: ORG_A,
};

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) fn october() -> YearMonth {
    YearMonth::new(2025, 10).expect("valid period")
}

pub(super) fn org_member(organization: OrganizationId) -> Actor {
    Actor::member(UserId(100 + organization.0), organization)
}

pub(super) fn company_member() -> Actor {
    Actor::member(UserId(200), ORG_A).with_company(COMPANY_A1)
}

pub(super) fn super_admin() -> Actor {
    Actor::super_admin(UserId(1))
}

pub(super) fn generate_rent() -> Message {
    Message::GenerateRent { period: october() }
}

pub(super) struct Harness {
    pub(super) store: Arc<Store>,
    pub(super) manager: Arc<TaskManager>,
    pub(super) queue: TaskQueue,
    pub(super) notifier: MemoryNotifier,
}

impl Harness {
    pub(super) fn drain(&mut self) -> Vec<Result<crate::tasks::Task, TaskError>> {
        self.queue.drain(&self.manager)
    }
}

pub(super) fn harness_with_capacity(queue_capacity: usize) -> Harness {
    let store = Arc::new(Store::in_memory());
    let notifier = MemoryNotifier::default();
    let (manager, queue) = TaskManager::standard(
        store.clone(),
        Arc::new(notifier.clone()),
        TaskConfig { queue_capacity },
        TenancyConfig::default(),
    );
    Harness {
        store,
        manager: Arc::new(manager),
        queue,
        notifier,
    }
}

pub(super) fn harness() -> Harness {
    harness_with_capacity(16)
}

/// One renter with one active lease for `owner`; company leases go to `COMPANY_A1`.
pub(super) fn seed_lease(store: &Store, owner: TenantStamp) -> Lease {
    let scoped = store.scoped(TenantScope::Unrestricted);
    let tenant = scoped
        .tenants()
        .insert(Tenant {
            id: 0,
            owner,
            full_name: "Sam Ortiz".to_string(),
            email: "sam.ortiz@example.com".to_string(),
        })
        .expect("tenant stored");

    scoped
        .leases()
        .insert(Lease {
            id: 0,
            owner,
            property_id: 1,
            tenant_id: tenant.id,
            rent_cents: 90_000,
            charges_cents: 0,
            due_day: 1,
            starts_on: date(2025, 1, 1),
            ends_on: None,
            status: LeaseStatus::Active,
        })
        .expect("lease stored")
}

/// Handler that always fails, for exercising failure bookkeeping.
pub(super) struct BrokenRentHandler;

impl MessageHandler for BrokenRentHandler {
    fn kind(&self) -> crate::tasks::MessageKind {
        crate::tasks::MessageKind::GenerateRent
    }

    fn handle(
        &self,
        _store: &crate::store::ScopedStore<'_>,
        _message: &Message,
    ) -> Result<TaskSummary, TaskError> {
        Err(TaskError::Service(ServiceError::Notify(NotifyError::Transport(
            "ledger offline".to_string(),
        ))))
    }
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}
