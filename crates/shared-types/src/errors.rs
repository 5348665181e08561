//! # Error Types
//!
//! The workflow error shared by every subsystem, and the value type returned
//! by idempotent operations.

use crate::entities::{OrderId, OrderState, PrincipalId, ReportId, UnitId};
use crate::identity::Capability;
use thiserror::Error;

/// Errors surfaced by workflow operations.
///
/// None of these are retried by the core except lock contention, which is
/// retried internally before `Busy` is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// The order's current state does not permit the operation.
    #[error("Invalid transition for {order}: {operation} not allowed from {from}")]
    InvalidTransition {
        order: OrderId,
        from: OrderState,
        operation: &'static str,
    },

    /// Suspended, self-referential or non-signing co-responsible.
    #[error("Invalid participant {participant} for {order}: {reason}")]
    InvalidParticipant {
        order: OrderId,
        participant: PrincipalId,
        reason: ParticipantRejection,
    },

    /// `deliver` called on an order that is not APPROVED.
    #[error("Order {order} is not ready for delivery (state {state})")]
    NotReadyForDelivery { order: OrderId, state: OrderState },

    /// `return_equipment` called on an order that is not DELIVERED.
    #[error("Order {order} has not been delivered (state {state})")]
    NotYetDelivered { order: OrderId, state: OrderState },

    /// Per-order lock could not be acquired within the retry budget.
    #[error("Order {order} is busy after {attempts} lock attempts")]
    Busy { order: OrderId, attempts: u32 },

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// No co-responsible or authorization record for this principal.
    #[error("No record for {principal} on {order}")]
    RecordNotFound { order: OrderId, principal: PrincipalId },

    #[error("Report not found: {0}")]
    ReportNotFound(ReportId),

    /// The principal's role lacks the capability, or the principal is not
    /// the party the record belongs to.
    #[error("Forbidden: {principal} lacks {capability:?}")]
    Forbidden {
        principal: PrincipalId,
        capability: Capability,
    },

    #[error("Borrower {0} is suspended")]
    BorrowerSuspended(PrincipalId),

    #[error("Units unavailable in requested window: {units:?}")]
    UnitsUnavailable { units: Vec<UnitId> },

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Neither an instructor nor the coordinator could be resolved.
    #[error("No authorizer available for {0}")]
    NoAuthorizer(OrderId),

    /// An external directory failed.
    #[error("Directory error: {0}")]
    Directory(String),

    /// Cached state disagrees with the records; the transaction was dropped.
    /// `derived` is `None` when no state explains the records at all.
    #[error("Projection drift on {order}: cached {cached}, derived {derived:?}")]
    ProjectionDrift {
        order: OrderId,
        cached: OrderState,
        derived: Option<OrderState>,
    },
}

/// Why a participant was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRejection {
    IsBorrower,
    Suspended,
    /// The participant's role may not co-sign.
    CannotCoSign,
}

impl std::fmt::Display for ParticipantRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IsBorrower => f.write_str("participant is the borrower"),
            Self::Suspended => f.write_str("participant is suspended"),
            Self::CannotCoSign => f.write_str("participant's role cannot co-sign"),
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Result of an idempotent get-or-create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// A new record was written by this call.
    Recorded(T),
    /// The record already existed; nothing was written.
    AlreadyRecorded(T),
}

impl<T> Outcome<T> {
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }

    #[must_use]
    pub fn get(&self) -> &T {
        match self {
            Self::Recorded(value) | Self::AlreadyRecorded(value) => value,
        }
    }

    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Recorded(value) | Self::AlreadyRecorded(value) => value,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Recorded(value) => Outcome::Recorded(f(value)),
            Self::AlreadyRecorded(value) => Outcome::AlreadyRecorded(f(value)),
        }
    }
}
