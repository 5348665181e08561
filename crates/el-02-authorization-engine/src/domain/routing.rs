//! Authorizer routing.
//!
//! | Kind          | Authorizer                          | Capability             |
//! |---------------|-------------------------------------|------------------------|
//! | Ordinary      | first listed instructor of subject  | AuthorizeOrdinary      |
//! | Extraordinary | the coordinator                     | AuthorizeExtraordinary |

use shared_types::entities::{OrderKind, PrincipalId};
use shared_types::identity::Capability;

/// Exactly one authorizer per order, or `None` if the directory has nobody
/// for this kind.
#[must_use]
pub fn route_authorizer(
    kind: OrderKind,
    instructors: &[PrincipalId],
    coordinator: Option<&PrincipalId>,
) -> Option<PrincipalId> {
    match kind {
        OrderKind::Ordinary => instructors.first().cloned(),
        OrderKind::Extraordinary => coordinator.cloned(),
    }
}

#[must_use]
pub fn authorize_capability(kind: OrderKind) -> Capability {
    match kind {
        OrderKind::Ordinary => Capability::AuthorizeOrdinary,
        OrderKind::Extraordinary => Capability::AuthorizeExtraordinary,
    }
}
