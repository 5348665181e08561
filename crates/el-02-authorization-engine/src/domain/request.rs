//! Borrower-facing order request.

use chrono::{DateTime, Utc};
use shared_types::entities::{
    Location, LocationKind, Order, OrderId, OrderKind, OrderState, PrincipalId, SubjectId,
    TimeWindow, UnitId,
};
use shared_types::errors::{WorkflowError, WorkflowResult};

/// Everything a borrower submits to open an order.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub borrower: PrincipalId,
    pub subject: SubjectId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub justification: String,
    pub kind: OrderKind,
    pub location: Location,
    pub units: Vec<UnitId>,
    pub coresponsibles: Vec<PrincipalId>,
}

impl OrderRequest {
    /// Check the request's own fields.
    ///
    /// # Errors
    ///
    /// `InvalidOrder` for an empty or inverted window, no units, or an
    /// off-campus location without detail.
    pub fn validate(&self) -> WorkflowResult<TimeWindow> {
        let window = TimeWindow::new(self.start, self.end).ok_or_else(|| {
            WorkflowError::InvalidOrder(format!(
                "window start {} must precede end {}",
                self.start, self.end
            ))
        })?;

        if self.units.is_empty() {
            return Err(WorkflowError::InvalidOrder("no units requested".into()));
        }

        if self.location.kind == LocationKind::OffCampus
            && self
                .location
                .detail
                .as_deref()
                .map_or(true, |d| d.trim().is_empty())
        {
            return Err(WorkflowError::InvalidOrder(
                "off-campus orders need a location detail".into(),
            ));
        }

        Ok(window)
    }

    /// Requested units without repeats, first occurrence wins.
    #[must_use]
    pub fn distinct_units(&self) -> Vec<UnitId> {
        distinct(&self.units)
    }

    /// Named co-responsibles without repeats, first occurrence wins.
    #[must_use]
    pub fn distinct_coresponsibles(&self) -> Vec<PrincipalId> {
        distinct(&self.coresponsibles)
    }

    /// The `DRAFT` order this request describes.
    #[must_use]
    pub fn into_order(self, id: OrderId, window: TimeWindow, now: DateTime<Utc>) -> Order {
        let units = self.distinct_units();
        Order {
            id,
            borrower: self.borrower,
            subject: self.subject,
            window,
            justification: self.justification,
            kind: self.kind,
            location: self.location,
            state: OrderState::Draft,
            created_at: now,
            units,
        }
    }
}

fn distinct<T: Clone + PartialEq>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}
