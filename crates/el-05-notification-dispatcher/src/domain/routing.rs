//! Who hears about what.
//!
//! | Event                    | Recipient   |
//! |--------------------------|-------------|
//! | `CoResponsibleInvited`   | participant |
//! | `AuthorizationRequested` | authorizer  |
//! | everything else          | borrower    |

use super::notification::{Notification, NotificationKind};
use shared_bus::{EventEnvelope, LoanEvent};
use shared_types::entities::PrincipalId;

fn route(event: &LoanEvent) -> (PrincipalId, NotificationKind) {
    match event {
        LoanEvent::CoResponsibleInvited { participant, .. } => {
            (participant.clone(), NotificationKind::Invitation)
        }
        LoanEvent::AuthorizationRequested { authorizer, .. } => {
            (authorizer.clone(), NotificationKind::AuthorizationRequest)
        }
        LoanEvent::OrderApproved { borrower, .. } => (borrower.clone(), NotificationKind::OrderApproved),
        LoanEvent::OrderRejected { borrower, .. } => (borrower.clone(), NotificationKind::OrderRejected),
        LoanEvent::OrderCancelled { borrower, .. } => (borrower.clone(), NotificationKind::OrderCancelled),
        LoanEvent::OrderDelivered { borrower, .. } => (borrower.clone(), NotificationKind::OrderDelivered),
        LoanEvent::OrderReturned { borrower, .. } => (borrower.clone(), NotificationKind::OrderReturned),
        LoanEvent::ReportFiled { borrower, .. } => (borrower.clone(), NotificationKind::ReportFiled),
        LoanEvent::ReportDeactivated { borrower, .. } => {
            (borrower.clone(), NotificationKind::ReportDeactivated)
        }
    }
}

/// The notifications one envelope fans out to. A borrower who cancels
/// their own order is still told; the message is the receipt.
#[must_use]
pub fn notifications_for(envelope: &EventEnvelope) -> Vec<Notification> {
    let (recipient, kind) = route(&envelope.event);
    vec![Notification {
        event_id: envelope.event_id,
        order: envelope.event.order(),
        recipient,
        kind,
        payload: envelope.event.clone(),
    }]
}
