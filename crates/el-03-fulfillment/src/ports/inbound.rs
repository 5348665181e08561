//! Driving Ports (API - Inbound)

use async_trait::async_trait;
use shared_types::entities::{DeliveryRecord, OrderId, PrincipalId, ReturnRecord};
use shared_types::errors::{Outcome, WorkflowResult};

/// Warehouse-facing API.
///
/// Both commands are idempotent: a second call returns the existing record
/// as `AlreadyRecorded` instead of failing.
#[async_trait]
pub trait FulfillmentApi: Send + Sync {
    /// Hand the equipment of an `APPROVED` order to the borrower.
    async fn deliver(&self, order: OrderId, agent: &PrincipalId) -> WorkflowResult<Outcome<DeliveryRecord>>;

    /// Take the equipment of a `DELIVERED` order back.
    async fn return_equipment(&self, order: OrderId, agent: &PrincipalId) -> WorkflowResult<Outcome<ReturnRecord>>;

    fn delivery(&self, order: OrderId) -> WorkflowResult<Option<DeliveryRecord>>;

    fn return_record(&self, order: OrderId) -> WorkflowResult<Option<ReturnRecord>>;
}
