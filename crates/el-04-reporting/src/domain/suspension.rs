//! Suspension is a pure function of the committed reports, read through the
//! ledger's active-report index.

use el_01_order_ledger::{OrderAggregate, OrderLedger};
use shared_types::entities::{OrderState, PrincipalId, Report};

/// Reports may only be filed once the equipment has left the warehouse,
/// including on an order cancelled after delivery.
#[must_use]
pub fn reportable(order: &OrderAggregate) -> bool {
    match order.state() {
        OrderState::Delivered | OrderState::Returned => true,
        OrderState::Cancelled => order.delivery().is_some(),
        _ => false,
    }
}

#[must_use]
pub fn is_suspended(ledger: &OrderLedger, borrower: &PrincipalId) -> bool {
    ledger.has_active_report(borrower)
}

#[must_use]
pub fn active_reports_of(ledger: &OrderLedger, borrower: &PrincipalId) -> Vec<Report> {
    ledger.active_reports_of(borrower)
}
