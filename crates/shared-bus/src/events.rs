//! # Loan Events
//!
//! Every event that flows through the shared bus. Each carries enough
//! identifiers for a consumer to address and render a notification without
//! calling back into the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::entities::{OrderId, OrderKind, PrincipalId, ReportId};
use uuid::Uuid;

/// Why an order ended in a rejection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    CoResponsibleDeclined { participant: PrincipalId },
    AuthorizerDeclined { authorizer: PrincipalId },
}

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanEvent {
    // =========================================================================
    // CO-RESPONSIBLES
    // =========================================================================
    /// A pending co-responsible record was created.
    CoResponsibleInvited {
        order: OrderId,
        borrower: PrincipalId,
        participant: PrincipalId,
    },

    // =========================================================================
    // AUTHORIZATION
    // =========================================================================
    /// The authorization record was created and awaits its authorizer.
    AuthorizationRequested {
        order: OrderId,
        borrower: PrincipalId,
        authorizer: PrincipalId,
        kind: OrderKind,
    },

    OrderApproved {
        order: OrderId,
        borrower: PrincipalId,
    },

    // =========================================================================
    // LIFECYCLE ENDINGS
    // =========================================================================
    OrderRejected {
        order: OrderId,
        borrower: PrincipalId,
        reason: RejectionReason,
    },

    OrderCancelled {
        order: OrderId,
        borrower: PrincipalId,
        cancelled_by: PrincipalId,
    },

    // =========================================================================
    // FULFILLMENT
    // =========================================================================
    OrderDelivered {
        order: OrderId,
        borrower: PrincipalId,
        holder: PrincipalId,
    },

    OrderReturned {
        order: OrderId,
        borrower: PrincipalId,
        holder: PrincipalId,
    },

    // =========================================================================
    // REPORTING
    // =========================================================================
    /// An active report now suspends `borrower`.
    ReportFiled {
        order: OrderId,
        report: ReportId,
        borrower: PrincipalId,
        issuer: PrincipalId,
    },

    ReportDeactivated {
        order: OrderId,
        report: ReportId,
        borrower: PrincipalId,
        resolved_by: PrincipalId,
    },
}

impl LoanEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::CoResponsibleInvited { .. } => EventTopic::CoResponsibles,
            Self::AuthorizationRequested { .. } | Self::OrderApproved { .. } => {
                EventTopic::Authorization
            }
            Self::OrderRejected { .. } | Self::OrderCancelled { .. } => EventTopic::Lifecycle,
            Self::OrderDelivered { .. } | Self::OrderReturned { .. } => EventTopic::Fulfillment,
            Self::ReportFiled { .. } | Self::ReportDeactivated { .. } => EventTopic::Reporting,
        }
    }

    /// The order the event is about.
    #[must_use]
    pub fn order(&self) -> OrderId {
        match self {
            Self::CoResponsibleInvited { order, .. }
            | Self::AuthorizationRequested { order, .. }
            | Self::OrderApproved { order, .. }
            | Self::OrderRejected { order, .. }
            | Self::OrderCancelled { order, .. }
            | Self::OrderDelivered { order, .. }
            | Self::OrderReturned { order, .. }
            | Self::ReportFiled { order, .. }
            | Self::ReportDeactivated { order, .. } => *order,
        }
    }

    /// Short stable name, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CoResponsibleInvited { .. } => "CoResponsibleInvited",
            Self::AuthorizationRequested { .. } => "AuthorizationRequested",
            Self::OrderApproved { .. } => "OrderApproved",
            Self::OrderRejected { .. } => "OrderRejected",
            Self::OrderCancelled { .. } => "OrderCancelled",
            Self::OrderDelivered { .. } => "OrderDelivered",
            Self::OrderReturned { .. } => "OrderReturned",
            Self::ReportFiled { .. } => "ReportFiled",
            Self::ReportDeactivated { .. } => "ReportDeactivated",
        }
    }
}

/// Wire wrapper: a unique id per emission so consumers can drop redeliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub emitted_at: DateTime<Utc>,
    pub event: LoanEvent,
}

impl EventEnvelope {
    #[must_use]
    pub fn new(event: LoanEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            emitted_at: Utc::now(),
            event,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    CoResponsibles,
    Authorization,
    Lifecycle,
    Fulfillment,
    Reporting,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Orders to include. Empty means all orders.
    pub orders: Vec<OrderId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            orders: Vec::new(),
        }
    }

    /// Only events about the given order.
    #[must_use]
    pub fn for_order(order: OrderId) -> Self {
        Self {
            topics: Vec::new(),
            orders: vec![order],
        }
    }

    #[must_use]
    pub fn matches(&self, event: &LoanEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let order_match = self.orders.is_empty() || self.orders.contains(&event.order());

        topic_match && order_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approved(order: OrderId) -> LoanEvent {
        LoanEvent::OrderApproved {
            order,
            borrower: PrincipalId::from("A01"),
        }
    }

    fn delivered(order: OrderId) -> LoanEvent {
        LoanEvent::OrderDelivered {
            order,
            borrower: PrincipalId::from("A01"),
            holder: PrincipalId::from("W01"),
        }
    }

    #[test]
    fn test_event_topic_mapping() {
        let order = OrderId::new();
        assert_eq!(approved(order).topic(), EventTopic::Authorization);
        assert_eq!(delivered(order).topic(), EventTopic::Fulfillment);
        assert_eq!(delivered(order).order(), order);
    }

    #[test]
    fn test_filter_all() {
        assert!(EventFilter::all().matches(&approved(OrderId::new())));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Fulfillment]);
        let order = OrderId::new();

        assert!(filter.matches(&delivered(order)));
        assert!(!filter.matches(&approved(order)));
    }

    #[test]
    fn test_filter_by_order() {
        let watched = OrderId::new();
        let filter = EventFilter::for_order(watched);

        assert!(filter.matches(&approved(watched)));
        assert!(!filter.matches(&approved(OrderId::new())));
    }

    #[test]
    fn test_envelope_ids_are_unique_and_serializable() {
        let first = EventEnvelope::new(approved(OrderId::new()));
        let second = EventEnvelope::new(first.event.clone());
        assert_ne!(first.event_id, second.event_id);

        let json = serde_json::to_string(&first).unwrap();
        let decoded: EventEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, first);
    }
}
