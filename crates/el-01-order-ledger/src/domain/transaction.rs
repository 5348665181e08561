//! Mutable handle onto a draft copy of one order aggregate.
//!
//! A handle only exists while the order's exclusive lock is held. Nothing it
//! does is visible to readers until the ledger swaps the draft in; if the
//! closure using it returns an error, the draft and its outbox are dropped.

use super::aggregate::{Cancellation, OrderAggregate};
use chrono::{DateTime, Utc};
use shared_bus::LoanEvent;
use shared_types::entities::{
    AuthorizationRecord, CoResponsibleRecord, Decision, DeliveryRecord, OrderId, OrderKind,
    OrderState, PrincipalId, Report, ReportId, ReportStatus, ReturnRecord,
};
use shared_types::errors::{Outcome, WorkflowError, WorkflowResult};
use tracing::debug;

pub struct OrderTx<'a> {
    draft: &'a mut OrderAggregate,
    outbox: Vec<LoanEvent>,
    now: DateTime<Utc>,
}

impl<'a> OrderTx<'a> {
    pub(crate) fn new(draft: &'a mut OrderAggregate, now: DateTime<Utc>) -> Self {
        Self {
            draft,
            outbox: Vec::new(),
            now,
        }
    }

    pub(crate) fn into_outbox(self) -> Vec<LoanEvent> {
        self.outbox
    }

    #[must_use]
    pub fn id(&self) -> OrderId {
        self.draft.id()
    }

    #[must_use]
    pub fn aggregate(&self) -> &OrderAggregate {
        &*self.draft
    }

    #[must_use]
    pub fn state(&self) -> OrderState {
        self.draft.state()
    }

    #[must_use]
    pub fn borrower(&self) -> &PrincipalId {
        self.draft.borrower()
    }

    /// Timestamp shared by every record written in this transaction.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// The only writer of the cached order state.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if `next` is not reachable from the current state
    /// in one edge.
    pub fn transition(&mut self, next: OrderState, operation: &'static str) -> WorkflowResult<()> {
        let from = self.draft.order.state;
        if !from.can_transition_to(next) {
            debug!(order = %self.id(), %from, %next, operation, "transition refused");
            return Err(WorkflowError::InvalidTransition {
                order: self.id(),
                from,
                operation,
            });
        }
        self.draft.order.state = next;
        Ok(())
    }

    /// Leave `DRAFT`. Records written afterwards drive the derived state.
    pub fn open(&mut self) {
        self.draft.opened = true;
    }

    /// Queue an event for publication after commit.
    pub fn emit(&mut self, event: LoanEvent) {
        self.outbox.push(event);
    }

    // -------------------------------------------------------------------------
    // Co-responsibles
    // -------------------------------------------------------------------------

    /// Get-or-create the participant's record.
    pub fn add_coresponsible(&mut self, participant: PrincipalId) -> Outcome<CoResponsibleRecord> {
        if let Some(existing) = self.draft.coresponsible(&participant) {
            return Outcome::AlreadyRecorded(existing.clone());
        }
        let record = CoResponsibleRecord::pending(self.id(), participant, self.now);
        self.draft.coresponsibles.push(record.clone());
        self.draft.had_coresponsibles = true;
        Outcome::Recorded(record)
    }

    pub fn remove_coresponsible(&mut self, participant: &PrincipalId) -> Option<CoResponsibleRecord> {
        let position = self
            .draft
            .coresponsibles
            .iter()
            .position(|r| &r.participant == participant)?;
        Some(self.draft.coresponsibles.remove(position))
    }

    /// Set a participant's decision. Returns whether the decision changed.
    ///
    /// # Errors
    ///
    /// `RecordNotFound` if the participant has no record on this order.
    pub fn decide_coresponsible(
        &mut self,
        participant: &PrincipalId,
        decision: Decision,
    ) -> WorkflowResult<bool> {
        let order = self.id();
        let now = self.now;
        let record = self
            .draft
            .coresponsibles
            .iter_mut()
            .find(|r| &r.participant == participant)
            .ok_or_else(|| WorkflowError::RecordNotFound {
                order,
                principal: participant.clone(),
            })?;

        if record.decision == decision {
            return Ok(false);
        }
        record.decision = decision;
        record.decided_at = Some(now);
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Authorization
    // -------------------------------------------------------------------------

    /// Get-or-create the single authorization record.
    pub fn create_authorization(
        &mut self,
        authorizer: PrincipalId,
        kind: OrderKind,
    ) -> Outcome<AuthorizationRecord> {
        if let Some(existing) = &self.draft.authorization {
            return Outcome::AlreadyRecorded(existing.clone());
        }
        let record = AuthorizationRecord {
            order: self.id(),
            authorizer,
            decision: Decision::Pending,
            kind,
            created_at: self.now,
            decided_at: None,
        };
        self.draft.authorization = Some(record.clone());
        Outcome::Recorded(record)
    }

    /// # Errors
    ///
    /// `RecordNotFound` if no authorization record exists yet.
    pub fn decide_authorization(&mut self, decision: Decision) -> WorkflowResult<AuthorizationRecord> {
        let order = self.id();
        let now = self.now;
        let borrower = self.draft.order.borrower.clone();
        let record = self
            .draft
            .authorization
            .as_mut()
            .ok_or(WorkflowError::RecordNotFound {
                order,
                principal: borrower,
            })?;
        record.decision = decision;
        record.decided_at = Some(now);
        Ok(record.clone())
    }

    // -------------------------------------------------------------------------
    // Fulfillment
    // -------------------------------------------------------------------------

    pub fn record_delivery(&mut self, holder: PrincipalId) -> Outcome<DeliveryRecord> {
        if let Some(existing) = &self.draft.delivery {
            return Outcome::AlreadyRecorded(existing.clone());
        }
        let record = DeliveryRecord {
            order: self.id(),
            holder,
            emitted_at: self.now,
        };
        self.draft.delivery = Some(record.clone());
        Outcome::Recorded(record)
    }

    pub fn record_return(&mut self, holder: PrincipalId) -> Outcome<ReturnRecord> {
        if let Some(existing) = &self.draft.return_record {
            return Outcome::AlreadyRecorded(existing.clone());
        }
        let record = ReturnRecord {
            order: self.id(),
            holder,
            emitted_at: self.now,
        };
        self.draft.return_record = Some(record.clone());
        Outcome::Recorded(record)
    }

    // -------------------------------------------------------------------------
    // Reports and cancellation
    // -------------------------------------------------------------------------

    /// Get-or-create the issuer's active report on this order.
    pub fn file_report(&mut self, issuer: PrincipalId, description: String) -> Outcome<Report> {
        if let Some(existing) = self
            .draft
            .reports
            .iter()
            .find(|r| r.issuer == issuer && r.is_active())
        {
            return Outcome::AlreadyRecorded(existing.clone());
        }
        let report = Report {
            id: ReportId::new(),
            order: self.id(),
            issuer,
            status: ReportStatus::Active,
            description,
            emitted_at: self.now,
            deactivated_at: None,
        };
        self.draft.reports.push(report.clone());
        Outcome::Recorded(report)
    }

    /// # Errors
    ///
    /// `ReportNotFound` if the report does not belong to this order.
    pub fn deactivate_report(&mut self, id: ReportId) -> WorkflowResult<Outcome<Report>> {
        let now = self.now;
        let report = self
            .draft
            .reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(WorkflowError::ReportNotFound(id))?;

        if !report.is_active() {
            return Ok(Outcome::AlreadyRecorded(report.clone()));
        }
        report.status = ReportStatus::Inactive;
        report.deactivated_at = Some(now);
        Ok(Outcome::Recorded(report.clone()))
    }

    pub fn mark_cancelled(&mut self, by: PrincipalId) -> Cancellation {
        let cancellation = Cancellation { by, at: self.now };
        self.draft.cancellation = Some(cancellation.clone());
        cancellation
    }
}
