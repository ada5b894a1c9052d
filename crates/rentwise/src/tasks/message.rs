use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::YearMonth;

/// Payload of a background job, tagged by its stable `name` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Message {
    /// Create the rent calls of `period` for every active lease.
    GenerateRent { period: YearMonth },
    /// Issue receipts for the settled rent calls of `period`.
    SendRentReceipts { period: YearMonth },
    /// Remind tenants of rent still unpaid after its due date.
    SendRentReminders { as_of: NaiveDate },
    /// Book payments and expenses up to `until` into the ledger.
    SyncAccounting { until: NaiveDate },
    CloseExpiredLeases { as_of: NaiveDate },
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::GenerateRent { .. } => MessageKind::GenerateRent,
            Self::SendRentReceipts { .. } => MessageKind::SendRentReceipts,
            Self::SendRentReminders { .. } => MessageKind::SendRentReminders,
            Self::SyncAccounting { .. } => MessageKind::SyncAccounting,
            Self::CloseExpiredLeases { .. } => MessageKind::CloseExpiredLeases,
        }
    }

    /// Message of `kind` for a reference date; period-based jobs use the date's month.
    pub fn for_date(kind: MessageKind, date: NaiveDate) -> Self {
        match kind {
            MessageKind::GenerateRent => Self::GenerateRent {
                period: YearMonth::containing(date),
            },
            MessageKind::SendRentReceipts => Self::SendRentReceipts {
                period: YearMonth::containing(date),
            },
            MessageKind::SendRentReminders => Self::SendRentReminders { as_of: date },
            MessageKind::SyncAccounting => Self::SyncAccounting { until: date },
            MessageKind::CloseExpiredLeases => Self::CloseExpiredLeases { as_of: date },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    GenerateRent,
    SendRentReceipts,
    SendRentReminders,
    SyncAccounting,
    CloseExpiredLeases,
}

impl MessageKind {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::GenerateRent,
            Self::SendRentReceipts,
            Self::SendRentReminders,
            Self::SyncAccounting,
            Self::CloseExpiredLeases,
        ]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::GenerateRent => "generate_rent",
            Self::SendRentReceipts => "send_rent_receipts",
            Self::SendRentReminders => "send_rent_reminders",
            Self::SyncAccounting => "sync_accounting",
            Self::CloseExpiredLeases => "close_expired_leases",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ordered()
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn messages_are_tagged_by_name() {
        let message: Message = serde_json::from_value(json!({
            "name": "generate_rent",
            "period": "2025-10",
        }))
        .expect("deserializes");
        assert_eq!(
            message,
            Message::GenerateRent {
                period: YearMonth::new(2025, 10).expect("valid period"),
            }
        );

        let value = serde_json::to_value(Message::SyncAccounting {
            until: NaiveDate::from_ymd_opt(2025, 10, 31).expect("valid date"),
        })
        .expect("serializes");
        assert_eq!(value, json!({ "name": "sync_accounting", "until": "2025-10-31" }));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let result = serde_json::from_value::<Message>(json!({ "name": "rebuild_search_index" }));
        assert!(result.is_err());
        assert!(MessageKind::from_name("rebuild_search_index").is_none());
    }

    #[test]
    fn kind_names_round_trip_through_lookup() {
        for kind in MessageKind::ordered() {
            assert_eq!(MessageKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(
            MessageKind::from_name(" Generate_Rent "),
            Some(MessageKind::GenerateRent)
        );
    }

    #[test]
    fn for_date_derives_period_from_reference_date() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 17).expect("valid date");
        assert_eq!(
            Message::for_date(MessageKind::SendRentReceipts, date),
            Message::SendRentReceipts {
                period: YearMonth::new(2025, 10).expect("valid period"),
            }
        );
        assert_eq!(
            Message::for_date(MessageKind::SendRentReminders, date).kind(),
            MessageKind::SendRentReminders
        );
    }
}
