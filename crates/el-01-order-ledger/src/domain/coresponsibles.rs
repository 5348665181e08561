//! Co-responsible aggregate.
//!
//! ```text
//! any REJECTED                      → REJECTED   (other records left as-is)
//! all ACCEPTED (empty, never had)   → ACCEPTED
//! no records left, had some         → PENDING
//! otherwise                         → PENDING
//! ```

use shared_types::entities::{CoResponsibleRecord, Decision};

/// Fold the decisions of an order's co-responsible records.
///
/// `had_any` distinguishes an order created without co-responsibles (the
/// empty set accepts) from one whose participants were all detached (it
/// stays pending).
#[must_use]
pub fn aggregate_decision(records: &[CoResponsibleRecord], had_any: bool) -> Decision {
    if records.iter().any(|r| r.decision == Decision::Rejected) {
        return Decision::Rejected;
    }

    if records.is_empty() {
        return if had_any {
            Decision::Pending
        } else {
            Decision::Accepted
        };
    }

    if records.iter().all(|r| r.decision == Decision::Accepted) {
        Decision::Accepted
    } else {
        Decision::Pending
    }
}
