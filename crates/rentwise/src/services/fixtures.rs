use chrono::NaiveDate;

use crate::domain::{
    Expense, Lease, LeaseStatus, MaintenanceRequest, MaintenanceStatus, Property, Tenant,
    YearMonth,
};
use crate::store::Store;
use crate::tenancy::{OrganizationId, TenantScope, TenantStamp};

pub(crate) const ORG_A: OrganizationId = OrganizationId(1);
pub(crate) const ORG_B: OrganizationId = OrganizationId(2);

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(crate) fn october() -> YearMonth {
    YearMonth::new(2025, 10).expect("valid period")
}

pub(crate) fn org_scope(organization: OrganizationId) -> TenantScope {
    TenantScope::Organization { organization }
}

pub(crate) struct Portfolio {
    pub(crate) lease_id: u64,
    pub(crate) short_lease_id: u64,
    pub(crate) expired_lease_id: u64,
    pub(crate) expense_id: u64,
}

/// One property with a long lease, a lease ending in December and a lease that ran out in June.
pub(crate) fn seed_portfolio(store: &Store, organization: OrganizationId) -> Portfolio {
    let scoped = store.scoped(org_scope(organization));

    let property = scoped
        .properties()
        .insert(Property {
            id: 0,
            owner: TenantStamp::default(),
            name: format!("Riverside {organization}"),
            address: "40 River Rd".to_string(),
        })
        .expect("property stored");

    let tenant = scoped
        .tenants()
        .insert(Tenant {
            id: 0,
            owner: TenantStamp::default(),
            full_name: "Jordan Reyes".to_string(),
            email: format!("renter{organization}@example.com"),
        })
        .expect("tenant stored");

    let lease = |rent_cents: i64,
                 due_day: u32,
                 starts_on: NaiveDate,
                 ends_on: Option<NaiveDate>| Lease {
        id: 0,
        owner: TenantStamp::default(),
        property_id: property.id,
        tenant_id: tenant.id,
        rent_cents,
        charges_cents: 5_000,
        due_day,
        starts_on,
        ends_on,
        status: LeaseStatus::Active,
    };

    let long = scoped
        .leases()
        .insert(lease(120_000, 5, date(2024, 1, 1), None))
        .expect("lease stored");
    let short = scoped
        .leases()
        .insert(lease(80_000, 1, date(2025, 3, 1), Some(date(2025, 12, 31))))
        .expect("lease stored");
    let expired = scoped
        .leases()
        .insert(lease(70_000, 1, date(2023, 1, 1), Some(date(2025, 6, 30))))
        .expect("lease stored");

    let expense = scoped
        .expenses()
        .insert(Expense {
            id: 0,
            owner: TenantStamp::default(),
            property_id: property.id,
            label: "Boiler service".to_string(),
            amount_cents: 30_000,
            incurred_on: date(2025, 10, 10),
        })
        .expect("expense stored");

    scoped
        .maintenance_requests()
        .insert(MaintenanceRequest {
            id: 0,
            owner: TenantStamp::default(),
            property_id: property.id,
            summary: "Radiator cold in bedroom".to_string(),
            status: MaintenanceStatus::Open,
            reported_on: date(2025, 10, 3),
        })
        .expect("maintenance request stored");

    Portfolio {
        lease_id: long.id,
        short_lease_id: short.id,
        expired_lease_id: expired.id,
        expense_id: expense.id,
    }
}
