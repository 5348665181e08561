//! Reporting Service

use crate::domain::{self, reportable};
use crate::ports::inbound::ReportingApi;
use async_trait::async_trait;
use el_01_order_ledger::OrderLedger;
use shared_bus::LoanEvent;
use shared_types::directory::IdentityDirectory;
use shared_types::entities::{OrderId, PrincipalId, Report, ReportId};
use shared_types::errors::{Outcome, WorkflowError, WorkflowResult};
use shared_types::identity::{Capability, PermissionTable, Principal};
use std::sync::Arc;
use tracing::{debug, info};

pub struct ReportingService<I: IdentityDirectory> {
    ledger: Arc<OrderLedger>,
    identity: Arc<I>,
    permissions: Arc<PermissionTable>,
}

impl<I: IdentityDirectory> ReportingService<I> {
    pub fn new(ledger: Arc<OrderLedger>, identity: Arc<I>, permissions: Arc<PermissionTable>) -> Self {
        Self {
            ledger,
            identity,
            permissions,
        }
    }

    async fn require(&self, actor: &PrincipalId, capability: Capability) -> WorkflowResult<()> {
        let role = self.identity.role_of(actor).await?;
        self.permissions
            .require(&Principal::new(actor.clone(), role), capability)
    }
}

#[async_trait]
impl<I: IdentityDirectory + 'static> ReportingApi for ReportingService<I> {
    async fn report(
        &self,
        order: OrderId,
        issuer: &PrincipalId,
        description: String,
    ) -> WorkflowResult<Outcome<Report>> {
        self.require(issuer, Capability::FileReport).await?;

        let by = issuer.clone();
        let committed = self
            .ledger
            .transact(order, move |tx| {
                if !reportable(tx.aggregate()) {
                    debug!(%order, state = %tx.state(), "report refused");
                    return Err(WorkflowError::InvalidTransition {
                        order,
                        from: tx.state(),
                        operation: "report",
                    });
                }
                let outcome = tx.file_report(by.clone(), description);
                if let Outcome::Recorded(report) = &outcome {
                    let event = LoanEvent::ReportFiled {
                        order,
                        report: report.id,
                        borrower: tx.borrower().clone(),
                        issuer: by,
                    };
                    tx.emit(event);
                }
                Ok(outcome)
            })
            .await?;

        if committed.value.is_new() {
            info!(
                %order,
                report = %committed.value.get().id,
                issuer = %issuer,
                borrower = %committed.snapshot.borrower(),
                "report filed"
            );
        }
        Ok(committed.value)
    }

    async fn deactivate(&self, report: ReportId, actor: &PrincipalId) -> WorkflowResult<Outcome<Report>> {
        self.require(actor, Capability::ResolveReport).await?;
        let order = self
            .ledger
            .order_for_report(report)
            .ok_or(WorkflowError::ReportNotFound(report))?;

        let resolved_by = actor.clone();
        let committed = self
            .ledger
            .transact(order, move |tx| {
                let outcome = tx.deactivate_report(report)?;
                if outcome.is_new() {
                    let event = LoanEvent::ReportDeactivated {
                        order,
                        report,
                        borrower: tx.borrower().clone(),
                        resolved_by,
                    };
                    tx.emit(event);
                }
                Ok(outcome)
            })
            .await?;

        if committed.value.is_new() {
            info!(%order, %report, by = %actor, "report deactivated");
        } else {
            debug!(%order, %report, "report already inactive");
        }
        Ok(committed.value)
    }

    fn is_suspended(&self, borrower: &PrincipalId) -> bool {
        domain::is_suspended(&self.ledger, borrower)
    }

    fn reports_for(&self, order: OrderId) -> WorkflowResult<Vec<Report>> {
        Ok(self.ledger.snapshot(order)?.reports().to_vec())
    }

    fn active_reports_of(&self, borrower: &PrincipalId) -> Vec<Report> {
        domain::active_reports_of(&self.ledger, borrower)
    }
}
