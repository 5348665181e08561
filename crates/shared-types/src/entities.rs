//! # Core Domain Entities
//!
//! Defines the loan entities shared by every subsystem.
//!
//! ## Clusters
//!
//! - **Identifiers**: `OrderId`, `ReportId`, `PrincipalId`, `SubjectId`, `UnitId`
//! - **Order**: `Order`, `OrderState`, `OrderKind`, `Location`, `TimeWindow`
//! - **Sign-off records**: `CoResponsibleRecord`, `AuthorizationRecord`
//! - **Fulfillment**: `DeliveryRecord`, `ReturnRecord`
//! - **Reporting**: `Report`, `ReportStatus`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// CLUSTER A: IDENTIFIERS
// =============================================================================

/// Unique identifier of a loan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order:{}", self.0)
    }
}

/// Unique identifier of a misconduct report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportId(pub Uuid);

impl ReportId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "report:{}", self.0)
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Borrow the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// A user of the system: student id or employee number.
    PrincipalId
);
string_id!(
    /// The academic subject (class) an order is requested for.
    SubjectId
);
string_id!(
    /// Control number of one physical inventory unit.
    UnitId
);

// =============================================================================
// CLUSTER B: THE ORDER
// =============================================================================

/// Half-open loan window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Returns `None` unless `start < end`.
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Two half-open windows overlap iff each starts before the other ends.
    #[must_use]
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Ordinary orders are authorized by the subject's instructor,
/// extraordinary ones by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    Ordinary,
    Extraordinary,
}

/// Where the equipment will be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationKind {
    OnCampus,
    OffCampus,
}

/// Location kind plus optional free-text detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub kind: LocationKind,
    pub detail: Option<String>,
}

impl Location {
    #[must_use]
    pub fn on_campus() -> Self {
        Self {
            kind: LocationKind::OnCampus,
            detail: None,
        }
    }

    #[must_use]
    pub fn off_campus(detail: impl Into<String>) -> Self {
        Self {
            kind: LocationKind::OffCampus,
            detail: Some(detail.into()),
        }
    }
}

/// Order lifecycle state.
///
/// ```text
/// [DRAFT] ──open──→ [AWAITING_CORESPONSIBLES] ──all accept──→ [AWAITING_AUTHORIZATION]
///    │                      │                                        │
///    │                      └── any reject ──→ [REJECTED_BY_CORESPONSIBLE]
///    │                                                               │
///    └──open (no co-responsibles)──────────────→ [AWAITING_AUTHORIZATION]
///                                                                    │
///                     [REJECTED_BY_AUTHORIZER] ←── reject ───────────┤
///                                                                    │
///                                                     accept ──→ [APPROVED]
///                                                                    │
///                                                  deliver ──→ [DELIVERED] ──return──→ [RETURNED]
///
/// Any non-terminal state ──cancel──→ [CANCELLED]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderState {
    Draft,
    AwaitingCoResponsibles,
    AwaitingAuthorization,
    Approved,
    Delivered,
    Returned,
    RejectedByCoResponsible,
    RejectedByAuthorizer,
    Cancelled,
}

impl OrderState {
    /// All nine states, in lifecycle order.
    pub const ALL: [OrderState; 9] = [
        OrderState::Draft,
        OrderState::AwaitingCoResponsibles,
        OrderState::AwaitingAuthorization,
        OrderState::Approved,
        OrderState::Delivered,
        OrderState::Returned,
        OrderState::RejectedByCoResponsible,
        OrderState::RejectedByAuthorizer,
        OrderState::Cancelled,
    ];

    /// Absorbing states: no edge leaves them.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Returned
                | Self::RejectedByCoResponsible
                | Self::RejectedByAuthorizer
                | Self::Cancelled
        )
    }

    /// States in which a loan no longer holds its units, provided no
    /// delivered equipment is still out.
    #[must_use]
    pub fn releases_units(self) -> bool {
        self.is_terminal()
    }

    /// The edge table of the lifecycle.
    #[must_use]
    pub fn can_transition_to(self, next: OrderState) -> bool {
        use OrderState::*;

        if next == Cancelled {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Draft, AwaitingCoResponsibles)
                | (Draft, AwaitingAuthorization)
                | (AwaitingCoResponsibles, AwaitingAuthorization)
                | (AwaitingCoResponsibles, RejectedByCoResponsible)
                | (AwaitingAuthorization, Approved)
                | (AwaitingAuthorization, RejectedByAuthorizer)
                | (Approved, Delivered)
                | (Delivered, Returned)
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::AwaitingCoResponsibles => "AWAITING_CORESPONSIBLES",
            Self::AwaitingAuthorization => "AWAITING_AUTHORIZATION",
            Self::Approved => "APPROVED",
            Self::Delivered => "DELIVERED",
            Self::Returned => "RETURNED",
            Self::RejectedByCoResponsible => "REJECTED_BY_CORESPONSIBLE",
            Self::RejectedByAuthorizer => "REJECTED_BY_AUTHORIZER",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loan request for one or more inventory units over a time window.
///
/// `state` is a cached projection of the attached records; it is written
/// only by the order ledger's transition path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub borrower: PrincipalId,
    pub subject: SubjectId,
    pub window: TimeWindow,
    pub justification: String,
    pub kind: OrderKind,
    pub location: Location,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
    /// Requested units, in request order, without duplicates.
    pub units: Vec<UnitId>,
}

// =============================================================================
// CLUSTER C: SIGN-OFF RECORDS
// =============================================================================

/// Decision held by a co-responsible or authorization record. Also used for
/// the co-responsible aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Pending,
    Accepted,
    Rejected,
}

/// A decision a principal can actually submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Accept,
    Reject,
}

impl From<Verdict> for Decision {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accept => Decision::Accepted,
            Verdict::Reject => Decision::Rejected,
        }
    }
}

/// One participant's acceptance of shared responsibility for an order.
/// Unique per (order, participant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoResponsibleRecord {
    pub order: OrderId,
    pub participant: PrincipalId,
    pub decision: Decision,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl CoResponsibleRecord {
    #[must_use]
    pub fn pending(order: OrderId, participant: PrincipalId, now: DateTime<Utc>) -> Self {
        Self {
            order,
            participant,
            decision: Decision::Pending,
            created_at: now,
            decided_at: None,
        }
    }
}

/// The single authorizer's sign-off. `kind` mirrors the order kind at
/// creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRecord {
    pub order: OrderId,
    pub authorizer: PrincipalId,
    pub decision: Decision,
    pub kind: OrderKind,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

// =============================================================================
// CLUSTER D: FULFILLMENT
// =============================================================================

/// Warehouse handed the equipment to the borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub order: OrderId,
    pub holder: PrincipalId,
    pub emitted_at: DateTime<Utc>,
}

/// Warehouse received the equipment back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub order: OrderId,
    pub holder: PrincipalId,
    pub emitted_at: DateTime<Utc>,
}

// =============================================================================
// CLUSTER E: REPORTING
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportStatus {
    Active,
    Inactive,
}

/// Misconduct report against a delivered or returned order.
/// While `Active` it suspends the order's borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub order: OrderId,
    pub issuer: PrincipalId,
    pub status: ReportStatus,
    pub description: String,
    pub emitted_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
}

impl Report {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ReportStatus::Active
    }
}
