use std::collections::HashMap;

use tracing::{debug, warn};

use super::ServiceError;
use crate::domain::{Document, DocumentKind, YearMonth};
use crate::store::ScopedStore;
use crate::tasks::TaskSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiptRunReport {
    pub receipts_issued: u64,
    pub already_issued: u64,
    pub unsettled: u64,
}

impl From<ReceiptRunReport> for TaskSummary {
    fn from(report: ReceiptRunReport) -> Self {
        TaskSummary::default()
            .with("receipts_issued", report.receipts_issued)
            .with("already_issued", report.already_issued)
            .with("unsettled", report.unsettled)
    }
}

/// Record a receipt document for every settled rent call of `period` that lacks one.
///
/// Rendering and mailing the receipt belong to the delivery layer; this only creates the
/// document row and links it to the payment. A receipt document left unlinked by an earlier
/// failed run is linked instead of issued again.
pub fn issue_rent_receipts(
    store: &ScopedStore<'_>,
    period: YearMonth,
) -> Result<ReceiptRunReport, ServiceError> {
    let mut report = ReceiptRunReport::default();
    let mut unlinked: HashMap<u64, u64> = store
        .documents()
        .list()?
        .into_iter()
        .filter(|document| document.kind == DocumentKind::RentReceipt)
        .filter_map(|document| document.payment_id.map(|payment_id| (payment_id, document.id)))
        .collect();

    for mut payment in store.payments().list()? {
        if payment.period != period {
            continue;
        }
        if payment.receipt_document_id.is_some() {
            report.already_issued += 1;
            continue;
        }
        if !payment.is_settled() {
            report.unsettled += 1;
            continue;
        }

        let document_id = match unlinked.remove(&payment.id) {
            Some(document_id) => {
                warn!(payment_id = payment.id, document_id, "linking previously issued receipt");
                report.already_issued += 1;
                document_id
            }
            None => {
                let receipt = store.documents().insert(Document {
                    id: 0,
                    owner: payment.owner,
                    kind: DocumentKind::RentReceipt,
                    title: format!("Rent receipt {period} (lease {})", payment.lease_id),
                    payment_id: Some(payment.id),
                    issued_on: payment.paid_on.unwrap_or_else(|| period.last_day()),
                })?;
                report.receipts_issued += 1;
                receipt.id
            }
        };

        payment.receipt_document_id = Some(document_id);
        let payment = store.payments().update(payment)?;
        debug!(payment_id = payment.id, document_id, "rent receipt linked");
    }

    Ok(report)
}
