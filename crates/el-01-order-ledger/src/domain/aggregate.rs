//! The order together with every record attached to it.

use super::coresponsibles::aggregate_decision;
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared_types::entities::{
    AuthorizationRecord, CoResponsibleRecord, Decision, DeliveryRecord, Order, OrderId,
    OrderState, PrincipalId, Report, ReportId, ReturnRecord,
};

/// Who cancelled an order, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cancellation {
    pub by: PrincipalId,
    pub at: DateTime<Utc>,
}

/// Unit of consistency: one order and its records, always read and written
/// together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderAggregate {
    pub(crate) order: Order,
    pub(crate) opened: bool,
    pub(crate) coresponsibles: Vec<CoResponsibleRecord>,
    pub(crate) had_coresponsibles: bool,
    pub(crate) authorization: Option<AuthorizationRecord>,
    pub(crate) delivery: Option<DeliveryRecord>,
    pub(crate) return_record: Option<ReturnRecord>,
    pub(crate) reports: Vec<Report>,
    pub(crate) cancellation: Option<Cancellation>,
}

impl OrderAggregate {
    /// A fresh aggregate for an order in `DRAFT`.
    #[must_use]
    pub fn draft(order: Order) -> Self {
        Self {
            order,
            opened: false,
            coresponsibles: Vec::new(),
            had_coresponsibles: false,
            authorization: None,
            delivery: None,
            return_record: None,
            reports: Vec::new(),
            cancellation: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> OrderId {
        self.order.id
    }

    #[must_use]
    pub fn order(&self) -> &Order {
        &self.order
    }

    #[must_use]
    pub fn state(&self) -> OrderState {
        self.order.state
    }

    #[must_use]
    pub fn borrower(&self) -> &PrincipalId {
        &self.order.borrower
    }

    #[must_use]
    pub fn is_opened(&self) -> bool {
        self.opened
    }

    #[must_use]
    pub fn coresponsibles(&self) -> &[CoResponsibleRecord] {
        &self.coresponsibles
    }

    #[must_use]
    pub fn coresponsible(&self, participant: &PrincipalId) -> Option<&CoResponsibleRecord> {
        self.coresponsibles
            .iter()
            .find(|r| &r.participant == participant)
    }

    #[must_use]
    pub fn had_coresponsibles(&self) -> bool {
        self.had_coresponsibles
    }

    /// Aggregate over the current co-responsible records.
    #[must_use]
    pub fn coresponsible_status(&self) -> Decision {
        aggregate_decision(&self.coresponsibles, self.had_coresponsibles)
    }

    #[must_use]
    pub fn authorization(&self) -> Option<&AuthorizationRecord> {
        self.authorization.as_ref()
    }

    #[must_use]
    pub fn delivery(&self) -> Option<&DeliveryRecord> {
        self.delivery.as_ref()
    }

    #[must_use]
    pub fn return_record(&self) -> Option<&ReturnRecord> {
        self.return_record.as_ref()
    }

    #[must_use]
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    #[must_use]
    pub fn report(&self, id: ReportId) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn has_active_report(&self) -> bool {
        self.reports.iter().any(Report::is_active)
    }

    #[must_use]
    pub fn cancellation(&self) -> Option<&Cancellation> {
        self.cancellation.as_ref()
    }

    /// Delivered and not yet returned, whatever the state says.
    #[must_use]
    pub fn equipment_out(&self) -> bool {
        self.delivery.is_some() && self.return_record.is_none()
    }

    /// The order's units stay reserved while the loan is live or the
    /// equipment has not come back.
    #[must_use]
    pub fn holds_units(&self) -> bool {
        !self.order.state.releases_units() || self.equipment_out()
    }

    /// The state the records imply, or `None` if no state explains them
    /// (for instance an accepted co-responsible set on an opened order with
    /// no authorization record).
    #[must_use]
    pub fn derived_state(&self) -> Option<OrderState> {
        if self.cancellation.is_some() {
            return Some(OrderState::Cancelled);
        }
        if !self.opened {
            return Some(OrderState::Draft);
        }
        if self.return_record.is_some() {
            return self.delivery.as_ref().map(|_| OrderState::Returned);
        }
        if self.delivery.is_some() {
            return Some(OrderState::Delivered);
        }

        if let Some(auth) = &self.authorization {
            return match auth.decision {
                Decision::Pending => Some(OrderState::AwaitingAuthorization),
                Decision::Accepted => Some(OrderState::Approved),
                Decision::Rejected => Some(OrderState::RejectedByAuthorizer),
            };
        }

        match self.coresponsible_status() {
            Decision::Pending => Some(OrderState::AwaitingCoResponsibles),
            Decision::Rejected => Some(OrderState::RejectedByCoResponsible),
            Decision::Accepted => None,
        }
    }

    /// Cached state matches what the records imply.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.derived_state() == Some(self.order.state)
    }
}
