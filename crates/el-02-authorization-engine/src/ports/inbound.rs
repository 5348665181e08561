//! Driving Ports (API - Inbound)

use crate::domain::OrderRequest;
use async_trait::async_trait;
use el_01_order_ledger::Cancellation;
use shared_types::entities::{
    AuthorizationRecord, CoResponsibleRecord, Decision, Order, OrderId, PrincipalId, Verdict,
};
use shared_types::errors::{Outcome, WorkflowResult};

/// Primary Authorization API.
///
/// Every mutating call runs as one transaction on the order's ledger entry
/// and publishes its events after commit. `actor` is the principal invoking
/// the operation; its role is resolved through the identity directory.
#[async_trait]
pub trait AuthorizationApi: Send + Sync {
    /// Open a new order for `request.borrower`.
    async fn create_order(&self, request: OrderRequest) -> WorkflowResult<Order>;

    /// Get-or-create a pending record for `participant`.
    async fn attach_coresponsible(
        &self,
        order: OrderId,
        participant: PrincipalId,
        actor: &PrincipalId,
    ) -> WorkflowResult<Outcome<CoResponsibleRecord>>;

    /// Remove `participant`'s record and re-evaluate the aggregate.
    async fn detach_coresponsible(
        &self,
        order: OrderId,
        participant: &PrincipalId,
        actor: &PrincipalId,
    ) -> WorkflowResult<CoResponsibleRecord>;

    /// Record `actor`'s own co-responsible decision.
    async fn decide_coresponsible(
        &self,
        order: OrderId,
        actor: &PrincipalId,
        verdict: Verdict,
    ) -> WorkflowResult<CoResponsibleRecord>;

    /// Record the authorizer's decision.
    async fn decide_authorization(
        &self,
        order: OrderId,
        actor: &PrincipalId,
        verdict: Verdict,
    ) -> WorkflowResult<AuthorizationRecord>;

    /// Cancel a live order. Cancelling a cancelled order is a no-op.
    async fn cancel(&self, order: OrderId, actor: &PrincipalId) -> WorkflowResult<Outcome<Cancellation>>;

    /// Delete an order together with all of its records.
    async fn delete_order(&self, order: OrderId, actor: &PrincipalId) -> WorkflowResult<()>;

    // Queries. None of these take an order lock.

    fn order(&self, order: OrderId) -> WorkflowResult<Order>;

    fn coresponsible_status(&self, order: OrderId) -> WorkflowResult<Decision>;

    fn coresponsibles(&self, order: OrderId) -> WorkflowResult<Vec<CoResponsibleRecord>>;

    fn authorization(&self, order: OrderId) -> WorkflowResult<Option<AuthorizationRecord>>;

    fn orders_of(&self, borrower: &PrincipalId) -> Vec<Order>;

    /// Undecided invitations on orders still collecting sign-offs.
    fn pending_invitations(&self, participant: &PrincipalId) -> Vec<CoResponsibleRecord>;

    /// Undecided authorization requests addressed to `authorizer`.
    fn pending_authorizations(&self, authorizer: &PrincipalId) -> Vec<AuthorizationRecord>;
}
