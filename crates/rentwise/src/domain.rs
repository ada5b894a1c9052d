//! Business entities. Each one carries a [`TenantStamp`] in its `owner` field.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tenancy::{EntityKind, TenantScoped, TenantStamp};

/// Identity handling shared by every persisted row.
pub trait Entity: TenantScoped + Clone + Send + Sync + 'static {
    fn id(&self) -> u64;
    fn assign_id(&mut self, id: u64);
}

macro_rules! tenant_scoped {
    ($($entity:ty => $kind:expr),+ $(,)?) => {
        $(
            impl $crate::tenancy::TenantScoped for $entity {
                const KIND: $crate::tenancy::EntityKind = $kind;

                fn tenant(&self) -> &$crate::tenancy::TenantStamp {
                    &self.owner
                }

                fn tenant_mut(&mut self) -> &mut $crate::tenancy::TenantStamp {
                    &mut self.owner
                }
            }

            impl $crate::domain::Entity for $entity {
                fn id(&self) -> u64 {
                    self.id
                }

                fn assign_id(&mut self, id: u64) {
                    self.id = id;
                }
            }
        )+
    };
}

pub(crate) use tenant_scoped;

tenant_scoped! {
    Property => EntityKind::Property,
    Tenant => EntityKind::Tenant,
    Lease => EntityKind::Lease,
    Payment => EntityKind::Payment,
    Expense => EntityKind::Expense,
    MaintenanceRequest => EntityKind::MaintenanceRequest,
    Document => EntityKind::Document,
    AccountingEntry => EntityKind::AccountingEntry,
}

/// Rent period, serialized as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let (year, month) = raw.trim().split_once('-')?;
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day()
            .checked_add_months(chrono::Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// The given day of this month, clamped to the month's length (31 in February → 28/29).
    pub fn day_clamped(&self, day: u32) -> NaiveDate {
        let last = self.last_day();
        let day = day.clamp(1, last.day());
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or(last)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("'{value}' is not a YYYY-MM period"))
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: u64,
    pub owner: TenantStamp,
    pub name: String,
    pub address: String,
}

/// The person renting a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: u64,
    pub owner: TenantStamp,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Active,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub id: u64,
    pub owner: TenantStamp,
    pub property_id: u64,
    pub tenant_id: u64,
    pub rent_cents: i64,
    pub charges_cents: i64,
    /// Day of month rent falls due.
    pub due_day: u32,
    pub starts_on: NaiveDate,
    pub ends_on: Option<NaiveDate>,
    pub status: LeaseStatus,
}

impl Lease {
    pub fn monthly_due_cents(&self) -> i64 {
        self.rent_cents + self.charges_cents
    }

    /// Active and overlapping at least one day of `period`.
    pub fn covers(&self, period: YearMonth) -> bool {
        self.status == LeaseStatus::Active
            && self.starts_on <= period.last_day()
            && self.ends_on.map_or(true, |end| end >= period.first_day())
    }

    pub fn has_expired(&self, as_of: NaiveDate) -> bool {
        self.status == LeaseStatus::Active && self.ends_on.is_some_and(|end| end < as_of)
    }
}

/// A rent call for one lease and one period, and what has been collected against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: u64,
    pub owner: TenantStamp,
    pub lease_id: u64,
    pub period: YearMonth,
    pub due_on: NaiveDate,
    pub amount_cents: i64,
    pub paid_cents: i64,
    pub paid_on: Option<NaiveDate>,
    pub receipt_document_id: Option<u64>,
    pub reminders_sent: u32,
    pub last_reminder_on: Option<NaiveDate>,
}

impl Payment {
    /// New rent call inheriting the lease's ownership.
    pub fn due_for(lease: &Lease, period: YearMonth) -> Self {
        Self {
            id: 0,
            owner: lease.owner,
            lease_id: lease.id,
            period,
            due_on: period.day_clamped(lease.due_day),
            amount_cents: lease.monthly_due_cents(),
            paid_cents: 0,
            paid_on: None,
            receipt_document_id: None,
            reminders_sent: 0,
            last_reminder_on: None,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.paid_cents >= self.amount_cents
    }

    pub fn outstanding_cents(&self) -> i64 {
        (self.amount_cents - self.paid_cents).max(0)
    }

    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        !self.is_settled() && self.due_on < as_of
    }

    pub fn record_settlement(&mut self, amount_cents: i64, paid_on: NaiveDate) {
        self.paid_cents += amount_cents;
        self.paid_on = Some(paid_on);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: u64,
    pub owner: TenantStamp,
    pub property_id: u64,
    pub label: String,
    pub amount_cents: i64,
    pub incurred_on: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Open,
    InProgress,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    pub id: u64,
    pub owner: TenantStamp,
    pub property_id: u64,
    pub summary: String,
    pub status: MaintenanceStatus,
    pub reported_on: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    RentReceipt,
    LeaseAgreement,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    pub owner: TenantStamp,
    pub kind: DocumentKind,
    pub title: String,
    pub payment_id: Option<u64>,
    pub issued_on: NaiveDate,
}

/// Row a ledger entry was booked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EntrySource {
    Payment(u64),
    Expense(u64),
}

impl fmt::Display for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payment(id) => write!(f, "PAY-{id}"),
            Self::Expense(id) => write!(f, "EXP-{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingEntry {
    pub id: u64,
    pub owner: TenantStamp,
    pub booked_on: NaiveDate,
    pub label: String,
    pub source: EntrySource,
    pub debit_cents: i64,
    pub credit_cents: i64,
}
