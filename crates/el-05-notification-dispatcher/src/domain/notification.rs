//! Recipient-addressed notifications.

use serde::{Deserialize, Serialize};
use shared_bus::LoanEvent;
use shared_types::entities::{OrderId, PrincipalId};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Asked to co-sign an order.
    Invitation,
    /// Asked to authorize an order.
    AuthorizationRequest,
    OrderApproved,
    OrderRejected,
    OrderCancelled,
    OrderDelivered,
    OrderReturned,
    ReportFiled,
    ReportDeactivated,
}

impl NotificationKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invitation => "invitation",
            Self::AuthorizationRequest => "authorization_request",
            Self::OrderApproved => "order_approved",
            Self::OrderRejected => "order_rejected",
            Self::OrderCancelled => "order_cancelled",
            Self::OrderDelivered => "order_delivered",
            Self::OrderReturned => "order_returned",
            Self::ReportFiled => "report_filed",
            Self::ReportDeactivated => "report_deactivated",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound message: the event's payload addressed to one recipient.
///
/// `event_id` is the source envelope's id, so a sink can drop repeats the
/// same way the dispatcher does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub event_id: Uuid,
    pub order: OrderId,
    pub recipient: PrincipalId,
    pub kind: NotificationKind,
    pub payload: LoanEvent,
}
