use serde::Serialize;
use std::fmt;

use super::{Actor, CompanyId, OrganizationId, TenantError, TenantScoped, TenantStamp};

/// Row visibility for one actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum TenantScope {
    Company {
        organization: OrganizationId,
        company: CompanyId,
    },
    Organization { organization: OrganizationId },
    Unrestricted,
}

impl TenantScope {
    /// Company beats organization; a user with neither sees everything.
    ///
    /// When the user's own organization disagrees with the company's, the company's
    /// organization is used.
    pub fn for_actor(actor: &Actor) -> Self {
        if let Some(company) = actor.company {
            return Self::Company {
                organization: company.organization,
                company: company.id,
            };
        }

        match actor.organization {
            Some(organization) => Self::Organization { organization },
            None => Self::Unrestricted,
        }
    }

    /// Same precedence applied to a persisted stamp, e.g. the owner of a queued task.
    pub fn for_stamp(stamp: &TenantStamp) -> Result<Self, TenantError> {
        match (stamp.organization, stamp.company) {
            (Some(organization), Some(company)) => Ok(Self::Company {
                organization,
                company,
            }),
            (Some(organization), None) => Ok(Self::Organization { organization }),
            (None, Some(company)) => Err(TenantError::OrphanCompany { company }),
            (None, None) => Ok(Self::Unrestricted),
        }
    }

    pub fn organization(&self) -> Option<OrganizationId> {
        match self {
            Self::Company { organization, .. } | Self::Organization { organization } => {
                Some(*organization)
            }
            Self::Unrestricted => None,
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }

    /// Read filter. Rows without a company are invisible under a company scope.
    pub fn allows(&self, stamp: &TenantStamp) -> bool {
        match self {
            Self::Company { company, .. } => stamp.company == Some(*company),
            Self::Organization { organization } => stamp.organization == Some(*organization),
            Self::Unrestricted => true,
        }
    }

    /// WHERE fragment a SQL-backed repository appends for the table aliased `alias`.
    pub fn sql_predicate(&self, alias: &str) -> Option<String> {
        match self {
            Self::Company { company, .. } => Some(format!("{alias}.company_id = {company}")),
            Self::Organization { organization } => {
                Some(format!("{alias}.organization_id = {organization}"))
            }
            Self::Unrestricted => None,
        }
    }

    /// Fill the ownership columns of a row about to be inserted.
    ///
    /// Values already present are kept when they agree with the scope and rejected
    /// when they point at another tenant.
    pub fn stamp<T: TenantScoped>(&self, entity: &mut T) -> Result<(), TenantError> {
        let kind = T::KIND;
        let scope = *self;
        let stamp = entity.tenant_mut();

        match scope {
            Self::Company {
                organization,
                company,
            } => {
                let foreign_org = stamp.organization.is_some_and(|found| found != organization);
                let foreign_company = stamp.company.is_some_and(|found| found != company);
                if foreign_org || foreign_company {
                    return Err(TenantError::CrossTenantWrite {
                        kind,
                        scope,
                        found: *stamp,
                    });
                }
                stamp.organization = Some(organization);
                stamp.company = Some(company);
            }
            Self::Organization { organization } => {
                if stamp.organization.is_some_and(|found| found != organization) {
                    return Err(TenantError::CrossTenantWrite {
                        kind,
                        scope,
                        found: *stamp,
                    });
                }
                stamp.organization = Some(organization);
            }
            Self::Unrestricted => match (stamp.organization, stamp.company) {
                (None, Some(company)) => return Err(TenantError::OrphanCompany { company }),
                (None, None) if kind.requires_owner() => {
                    return Err(TenantError::MissingOrganization { kind })
                }
                _ => {}
            },
        }

        Ok(())
    }
}

impl fmt::Display for TenantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Company {
                organization,
                company,
            } => write!(f, "company {company} (organization {organization})"),
            Self::Organization { organization } => write!(f, "organization {organization}"),
            Self::Unrestricted => write!(f, "unrestricted scope"),
        }
    }
}

/// Switch in front of [`TenantScope::for_actor`]; disabling it lifts isolation for everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantFilter {
    enabled: bool,
}

impl Default for TenantFilter {
    fn default() -> Self {
        Self::enabled()
    }
}

impl TenantFilter {
    pub const fn enabled() -> Self {
        Self { enabled: true }
    }

    pub const fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn scope_for(&self, actor: &Actor) -> TenantScope {
        if self.enabled {
            TenantScope::for_actor(actor)
        } else {
            TenantScope::Unrestricted
        }
    }
}
