use super::*;
use crate::domain::Property;
use crate::tasks::{Message, Task};
use chrono::NaiveDate;

const ORG_A: OrganizationId = OrganizationId(1);
const ORG_B: OrganizationId = OrganizationId(2);
const COMPANY_A1: Company = Company {
    id: CompanyId(11),
    organization: ORG_A,
};

fn property(owner: TenantStamp) -> Property {
    Property {
        id: 0,
        owner,
        name: "Maple Court".to_string(),
        address: "12 Maple Ct".to_string(),
    }
}

#[test]
fn company_takes_priority_over_organization() {
    let actor = Actor::member(UserId(5), ORG_B).with_company(COMPANY_A1);
    assert_eq!(
        TenantScope::for_actor(&actor),
        TenantScope::Company {
            organization: ORG_A,
            company: CompanyId(11),
        }
    );
}

#[test]
fn organization_scope_without_company() {
    let actor = Actor::member(UserId(5), ORG_A);
    assert_eq!(
        actor.scope(),
        TenantScope::Organization { organization: ORG_A }
    );
}

#[test]
fn user_without_tenant_is_unrestricted() {
    let actor = Actor::super_admin(UserId(1));
    assert_eq!(actor.scope(), TenantScope::Unrestricted);
    assert!(actor.scope().allows(&TenantStamp::organization(ORG_B)));
    assert!(actor.scope().sql_predicate("p").is_none());
}

#[test]
fn company_scope_hides_rows_without_company() {
    let scope = Actor::member(UserId(5), ORG_A)
        .with_company(COMPANY_A1)
        .scope();

    assert!(scope.allows(&TenantStamp::company(COMPANY_A1)));
    assert!(!scope.allows(&TenantStamp::organization(ORG_A)));
    assert!(!scope.allows(&TenantStamp::default()));
}

#[test]
fn organization_scope_sees_every_company_of_the_organization() {
    let scope = TenantScope::Organization { organization: ORG_A };
    assert!(scope.allows(&TenantStamp::organization(ORG_A)));
    assert!(scope.allows(&TenantStamp::company(COMPANY_A1)));
    assert!(!scope.allows(&TenantStamp::organization(ORG_B)));
}

#[test]
fn sql_predicate_follows_precedence() {
    let company = TenantScope::Company {
        organization: ORG_A,
        company: CompanyId(11),
    };
    assert_eq!(
        company.sql_predicate("l").as_deref(),
        Some("l.company_id = 11")
    );
    assert_eq!(
        TenantScope::Organization { organization: ORG_B }
            .sql_predicate("l")
            .as_deref(),
        Some("l.organization_id = 2")
    );
}

#[test]
fn stamp_fills_missing_columns_from_company_scope() {
    let scope = TenantScope::for_actor(&Actor::member(UserId(5), ORG_A).with_company(COMPANY_A1));
    let mut row = property(TenantStamp::default());
    scope.stamp(&mut row).expect("stamps");
    assert_eq!(row.owner, TenantStamp::company(COMPANY_A1));
}

#[test]
fn stamp_keeps_company_chosen_by_organization_user() {
    let scope = TenantScope::Organization { organization: ORG_A };
    let mut row = property(TenantStamp {
        organization: None,
        company: Some(CompanyId(11)),
    });
    scope.stamp(&mut row).expect("stamps");
    assert_eq!(row.owner, TenantStamp::company(COMPANY_A1));
}

#[test]
fn stamp_rejects_rows_owned_elsewhere() {
    let scope = TenantScope::Organization { organization: ORG_A };
    let mut row = property(TenantStamp::organization(ORG_B));
    let err = scope.stamp(&mut row).expect_err("foreign row rejected");
    assert!(matches!(err, TenantError::CrossTenantWrite { .. }));

    let company_scope = TenantScope::Company {
        organization: ORG_A,
        company: CompanyId(11),
    };
    let mut sibling = property(TenantStamp {
        organization: Some(ORG_A),
        company: Some(CompanyId(12)),
    });
    assert!(company_scope.stamp(&mut sibling).is_err());
}

#[test]
fn unrestricted_writes_need_an_explicit_organization() {
    let mut row = property(TenantStamp::default());
    let err = TenantScope::Unrestricted
        .stamp(&mut row)
        .expect_err("unowned business row rejected");
    assert_eq!(
        err,
        TenantError::MissingOrganization {
            kind: EntityKind::Property
        }
    );

    let mut owned = property(TenantStamp::organization(ORG_B));
    TenantScope::Unrestricted
        .stamp(&mut owned)
        .expect("owned row accepted");
    assert_eq!(owned.owner, TenantStamp::organization(ORG_B));
}

#[test]
fn unrestricted_tasks_may_stay_unowned() {
    let mut task = Task::pending(
        UserId(1),
        Message::CloseExpiredLeases {
            as_of: NaiveDate::from_ymd_opt(2025, 10, 1).expect("valid date"),
        },
    );
    TenantScope::Unrestricted
        .stamp(&mut task)
        .expect("system task accepted");
    assert!(task.owner.is_unowned());
}

#[test]
fn scope_from_stamp_rejects_orphan_company() {
    let stamp = TenantStamp {
        organization: None,
        company: Some(CompanyId(11)),
    };
    assert_eq!(
        TenantScope::for_stamp(&stamp),
        Err(TenantError::OrphanCompany {
            company: CompanyId(11)
        })
    );
    assert_eq!(
        TenantScope::for_stamp(&TenantStamp::default()),
        Ok(TenantScope::Unrestricted)
    );
}

#[test]
fn disabled_filter_lifts_isolation() {
    let actor = Actor::member(UserId(5), ORG_A);
    let mut filter = TenantFilter::default();
    assert!(filter.is_enabled());
    assert_eq!(
        filter.scope_for(&actor),
        TenantScope::Organization { organization: ORG_A }
    );

    filter.disable();
    assert_eq!(filter.scope_for(&actor), TenantScope::Unrestricted);
}

#[test]
fn every_business_entity_requires_an_owner() {
    for kind in EntityKind::business() {
        assert!(kind.requires_owner(), "{kind} must be owned");
    }
    assert!(!EntityKind::Task.requires_owner());
}
