//! Driving Ports (API - Inbound)

use async_trait::async_trait;
use shared_types::entities::{OrderId, PrincipalId, Report, ReportId};
use shared_types::errors::{Outcome, WorkflowResult};

#[async_trait]
pub trait ReportingApi: Send + Sync {
    /// File a report against a delivered or returned order. One active
    /// report per issuer and order; repeats return it as `AlreadyRecorded`.
    async fn report(
        &self,
        order: OrderId,
        issuer: &PrincipalId,
        description: String,
    ) -> WorkflowResult<Outcome<Report>>;

    /// Mark a report inactive. There is no way back.
    async fn deactivate(&self, report: ReportId, actor: &PrincipalId) -> WorkflowResult<Outcome<Report>>;

    /// Whether any active report exists on an order `borrower` placed.
    /// Always recomputed; never cached.
    fn is_suspended(&self, borrower: &PrincipalId) -> bool;

    fn reports_for(&self, order: OrderId) -> WorkflowResult<Vec<Report>>;

    /// Active reports across all of the borrower's orders.
    fn active_reports_of(&self, borrower: &PrincipalId) -> Vec<Report>;
}
