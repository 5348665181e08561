//! Driven ports to the collaborators the workflow core consumes.
//!
//! Implementations live outside the core (see `lending-runtime`). Calls made
//! through these ports may block on I/O, so the engine never issues them
//! while holding an order lock.

use crate::entities::{OrderId, PrincipalId, SubjectId, TimeWindow, UnitId};
use crate::errors::WorkflowResult;
use crate::identity::Role;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Who people are, what role they hold, and who teaches what.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Role of a principal. Unknown principals are a `Directory` error.
    async fn role_of(&self, principal: &PrincipalId) -> WorkflowResult<Role>;

    /// Whether the principal is currently blocked from taking part in loans.
    async fn is_suspended(&self, principal: &PrincipalId) -> WorkflowResult<bool>;

    /// Instructors of a subject, primary instructor first.
    async fn instructors_of(&self, subject: &SubjectId) -> WorkflowResult<Vec<PrincipalId>>;

    /// The coordinator, if one is configured.
    async fn coordinator(&self) -> WorkflowResult<Option<PrincipalId>>;
}

/// Inventory units and their reservations.
#[async_trait]
pub trait InventoryDirectory: Send + Sync {
    /// Whether the unit is free over the whole window.
    async fn is_unit_available(&self, unit: &UnitId, window: &TimeWindow) -> WorkflowResult<bool>;

    /// Reserve units for an order over `window`. Re-reserving for the same
    /// order is a no-op.
    ///
    /// # Errors
    ///
    /// `UnitsUnavailable` if another order took one of the units since it
    /// was checked.
    async fn reserve_units(&self, order: OrderId, units: &[UnitId], window: &TimeWindow) -> WorkflowResult<()>;

    /// Drop every reservation held by the order.
    async fn release_units(&self, order: OrderId) -> WorkflowResult<()>;
}

/// Wall-clock abstraction so record timestamps are testable.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
