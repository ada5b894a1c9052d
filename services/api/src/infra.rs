use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use rentwise::domain::{
    Expense, Lease, LeaseStatus, MaintenanceRequest, MaintenanceStatus, Property, Tenant,
    YearMonth,
};
use rentwise::services::ServiceError;
use rentwise::store::Store;
use rentwise::tasks::MessageKind;
use rentwise::tenancy::{
    Actor, Company, CompanyId, OrganizationId, TenantScope, TenantStamp, UserId,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// User the CLI acts as when it dispatches tasks.
pub(crate) const CLI_OPERATOR: UserId = UserId(1);

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_period(raw: &str) -> Result<YearMonth, String> {
    YearMonth::parse(raw.trim()).ok_or_else(|| format!("failed to parse '{raw}' as YYYY-MM"))
}

pub(crate) fn parse_task_name(raw: &str) -> Result<MessageKind, String> {
    MessageKind::from_name(raw).ok_or_else(|| {
        let known: Vec<&str> = MessageKind::ordered().iter().map(|kind| kind.name()).collect();
        format!("unknown task '{raw}' (expected one of: {})", known.join(", "))
    })
}

/// Actor for an operator working inside `organization`, optionally narrowed to a company.
pub(crate) fn operator(organization: u64, company: Option<u64>) -> Actor {
    let organization = OrganizationId(organization);
    let actor = Actor::member(CLI_OPERATOR, organization);
    match company {
        Some(company) => actor.with_company(Company {
            id: CompanyId(company),
            organization,
        }),
        None => actor,
    }
}

/// Portfolio written for one tenant by [`seed_portfolio`].
#[derive(Debug, Clone)]
pub(crate) struct SeededPortfolio {
    pub(crate) owner: TenantStamp,
    pub(crate) leases: Vec<u64>,
}

/// Seeds the sample portfolio the CLI commands run against: organization 1 with its
/// company 11, and organization 2.
///
/// Every owner gets one property, one long-running lease, one lease that ended the month
/// before `today`, an expense and an open maintenance request.
pub(crate) fn seed_sample_data(
    store: &Store,
    today: NaiveDate,
) -> Result<Vec<SeededPortfolio>, ServiceError> {
    let first = OrganizationId(1);
    let owners = [
        TenantStamp::organization(first),
        TenantStamp::company(Company {
            id: CompanyId(11),
            organization: first,
        }),
        TenantStamp::organization(OrganizationId(2)),
    ];

    owners
        .into_iter()
        .map(|owner| seed_portfolio(store, owner, today))
        .collect()
}

pub(crate) fn seed_portfolio(
    store: &Store,
    owner: TenantStamp,
    today: NaiveDate,
) -> Result<SeededPortfolio, ServiceError> {
    let scoped = store.scoped(TenantScope::Unrestricted);
    let domain = match (owner.organization, owner.company) {
        (_, Some(company)) => format!("company{company}"),
        (Some(organization), None) => format!("org{organization}"),
        (None, None) => "unowned".to_string(),
    };
    let current = YearMonth::containing(today);
    let previous_month_end = current.first_day().pred_opt().unwrap_or(current.first_day());

    let property = scoped.properties().insert(Property {
        id: 0,
        owner,
        name: format!("Maple Court ({owner})"),
        address: "12 Maple Court".to_string(),
    })?;

    let mut leases = Vec::new();
    let residents = [
        ("Jordan Reyes", 95_000, None),
        ("Priya Natarajan", 72_500, Some(previous_month_end)),
    ];
    for (index, (full_name, rent_cents, ends_on)) in residents.into_iter().enumerate() {
        let tenant = scoped.tenants().insert(Tenant {
            id: 0,
            owner,
            full_name: full_name.to_string(),
            email: format!(
                "{}@{domain}.example.com",
                full_name.to_ascii_lowercase().replace(' ', ".")
            ),
        })?;
        let lease = scoped.leases().insert(Lease {
            id: 0,
            owner,
            property_id: property.id,
            tenant_id: tenant.id,
            rent_cents,
            charges_cents: 4_500,
            due_day: 1 + index as u32 * 4,
            starts_on: current.first_day() - chrono::Duration::days(400),
            ends_on,
            status: LeaseStatus::Active,
        })?;
        leases.push(lease.id);
    }

    scoped.expenses().insert(Expense {
        id: 0,
        owner,
        property_id: property.id,
        label: "Boiler service".to_string(),
        amount_cents: 38_000,
        incurred_on: current.first_day(),
    })?;
    scoped.maintenance_requests().insert(MaintenanceRequest {
        id: 0,
        owner,
        property_id: property.id,
        summary: "Leaking kitchen tap".to_string(),
        status: MaintenanceStatus::Open,
        reported_on: today,
    })?;

    Ok(SeededPortfolio { owner, leases })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 14).expect("valid date")
    }

    #[test]
    fn parse_helpers_report_the_offending_value() {
        assert_eq!(parse_date(" 2025-10-01 "), Ok(today().with_day(1).expect("day")));
        assert!(parse_date("10/01/2025")
            .expect_err("rejected")
            .contains("10/01/2025"));
        assert_eq!(
            parse_period("2025-10").expect("period"),
            YearMonth::new(2025, 10).expect("valid")
        );
        assert!(parse_period("2025-13").is_err());
        assert_eq!(
            parse_task_name("Close_Expired_Leases"),
            Ok(MessageKind::CloseExpiredLeases)
        );
        assert!(parse_task_name("reindex")
            .expect_err("rejected")
            .contains("generate_rent"));
    }

    #[test]
    fn operator_scope_prefers_company() {
        assert_eq!(
            operator(1, None).scope(),
            TenantScope::Organization {
                organization: OrganizationId(1)
            }
        );
        assert_eq!(
            operator(1, Some(11)).scope(),
            TenantScope::Company {
                organization: OrganizationId(1),
                company: CompanyId(11),
            }
        );
    }

    #[test]
    fn sample_data_is_partitioned_by_owner() {
        let store = Store::in_memory();
        let seeded = seed_sample_data(&store, today()).expect("seeded");
        assert_eq!(seeded.len(), 3);

        let org_one = store.scoped(operator(1, None).scope());
        assert_eq!(org_one.leases().list().expect("leases").len(), 4);
        let company = store.scoped(operator(1, Some(11)).scope());
        assert_eq!(company.leases().list().expect("leases").len(), 2);
        let org_two = store.scoped(operator(2, None).scope());
        assert_eq!(org_two.properties().list().expect("properties").len(), 1);
        assert_eq!(
            org_two.leases().list().expect("leases")[1].ends_on,
            NaiveDate::from_ymd_opt(2025, 9, 30)
        );
    }
}
