//! Tenant isolation: which organization/company owns a row, and which rows an actor may
//! read or write.
//!
//! Every business entity carries a [`TenantStamp`]. Writes go through
//! [`TenantScope::stamp`], reads through [`TenantScope::allows`] (or the equivalent
//! [`TenantScope::sql_predicate`] for SQL-backed stores). The scope itself is derived from
//! the acting user with a fixed precedence: company, then organization, then nothing.

mod scope;

#[cfg(test)]
mod tests;

pub use scope::{TenantFilter, TenantScope};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level tenant boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(pub u64);

/// Optional sub-tenant nested under an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A company always belongs to exactly one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub organization: OrganizationId,
}

/// The user on whose behalf a read or write happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user: UserId,
    pub organization: Option<OrganizationId>,
    pub company: Option<Company>,
}

impl Actor {
    /// A user attached to neither an organization nor a company.
    pub fn super_admin(user: UserId) -> Self {
        Self {
            user,
            organization: None,
            company: None,
        }
    }

    pub fn member(user: UserId, organization: OrganizationId) -> Self {
        Self {
            user,
            organization: Some(organization),
            company: None,
        }
    }

    pub fn with_company(mut self, company: Company) -> Self {
        self.company = Some(company);
        self
    }

    pub fn scope(&self) -> TenantScope {
        TenantScope::for_actor(self)
    }
}

/// Ownership columns persisted on every tenant-scoped row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantStamp {
    pub organization: Option<OrganizationId>,
    pub company: Option<CompanyId>,
}

impl TenantStamp {
    pub fn organization(organization: OrganizationId) -> Self {
        Self {
            organization: Some(organization),
            company: None,
        }
    }

    pub fn company(company: Company) -> Self {
        Self {
            organization: Some(company.organization),
            company: Some(company.id),
        }
    }

    pub fn is_unowned(&self) -> bool {
        self.organization.is_none() && self.company.is_none()
    }
}

impl fmt::Display for TenantStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.organization, self.company) {
            (Some(organization), Some(company)) => {
                write!(f, "organization {organization}, company {company}")
            }
            (Some(organization), None) => write!(f, "organization {organization}"),
            (None, Some(company)) => write!(f, "company {company} (no organization)"),
            (None, None) => write!(f, "unowned"),
        }
    }
}

/// Persisted entity types subject to the isolation filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Property,
    Tenant,
    Lease,
    Payment,
    Expense,
    MaintenanceRequest,
    Document,
    AccountingEntry,
    Task,
}

impl EntityKind {
    /// The business entities that must always belong to an organization.
    pub const fn business() -> [Self; 8] {
        [
            Self::Property,
            Self::Tenant,
            Self::Lease,
            Self::Payment,
            Self::Expense,
            Self::MaintenanceRequest,
            Self::Document,
            Self::AccountingEntry,
        ]
    }

    pub const fn table(self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::Tenant => "tenant",
            Self::Lease => "lease",
            Self::Payment => "payment",
            Self::Expense => "expense",
            Self::MaintenanceRequest => "maintenance_request",
            Self::Document => "document",
            Self::AccountingEntry => "accounting_entry",
            Self::Task => "task",
        }
    }

    /// Tasks dispatched by a super-admin run across all tenants and stay unowned.
    pub const fn requires_owner(self) -> bool {
        !matches!(self, Self::Task)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Implemented by every row type that carries ownership columns.
pub trait TenantScoped {
    const KIND: EntityKind;

    fn tenant(&self) -> &TenantStamp;
    fn tenant_mut(&mut self) -> &mut TenantStamp;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TenantError {
    #[error("{kind} rows must carry an organization when written without a tenant scope")]
    MissingOrganization { kind: EntityKind },
    #[error("{kind} row owned by {found} cannot be written under {scope}")]
    CrossTenantWrite {
        kind: EntityKind,
        scope: TenantScope,
        found: TenantStamp,
    },
    #[error("company {company} is not attached to an organization")]
    OrphanCompany { company: CompanyId },
}
