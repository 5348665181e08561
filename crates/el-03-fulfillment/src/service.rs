//! Fulfillment Service

use crate::ports::inbound::FulfillmentApi;
use async_trait::async_trait;
use el_01_order_ledger::OrderLedger;
use shared_bus::LoanEvent;
use shared_types::directory::{IdentityDirectory, InventoryDirectory};
use shared_types::entities::{DeliveryRecord, OrderId, OrderState, PrincipalId, ReturnRecord};
use shared_types::errors::{Outcome, WorkflowError, WorkflowResult};
use shared_types::identity::{Capability, PermissionTable, Principal};
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct FulfillmentService<I, V>
where
    I: IdentityDirectory,
    V: InventoryDirectory,
{
    ledger: Arc<OrderLedger>,
    identity: Arc<I>,
    inventory: Arc<V>,
    permissions: Arc<PermissionTable>,
}

impl<I, V> FulfillmentService<I, V>
where
    I: IdentityDirectory,
    V: InventoryDirectory,
{
    pub fn new(
        ledger: Arc<OrderLedger>,
        identity: Arc<I>,
        inventory: Arc<V>,
        permissions: Arc<PermissionTable>,
    ) -> Self {
        Self {
            ledger,
            identity,
            inventory,
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
impl<I, V> FulfillmentApi for FulfillmentService<I, V>
where
    I: IdentityDirectory + 'static,
    V: InventoryDirectory + 'static,
{
    async fn deliver(&self, order: OrderId, agent: &PrincipalId) -> WorkflowResult<Outcome<DeliveryRecord>> {
        self.require(agent, Capability::RecordDelivery).await?;

        let holder = agent.clone();
        let committed = self
            .ledger
            .transact(order, move |tx| {
                if let Some(existing) = tx.aggregate().delivery() {
                    return Ok(Outcome::AlreadyRecorded(existing.clone()));
                }
                if tx.state() != OrderState::Approved {
                    debug!(%order, state = %tx.state(), "delivery refused");
                    return Err(WorkflowError::NotReadyForDelivery {
                        order,
                        state: tx.state(),
                    });
                }

                let outcome = tx.record_delivery(holder.clone());
                tx.transition(OrderState::Delivered, "deliver")?;
                let borrower = tx.borrower().clone();
                tx.emit(LoanEvent::OrderDelivered {
                    order,
                    borrower,
                    holder,
                });
                Ok(outcome)
            })
            .await?;

        if committed.value.is_new() {
            info!(%order, holder = %agent, "equipment delivered");
        } else {
            debug!(%order, "already delivered");
        }
        Ok(committed.value)
    }

    async fn return_equipment(&self, order: OrderId, agent: &PrincipalId) -> WorkflowResult<Outcome<ReturnRecord>> {
        self.require(agent, Capability::RecordReturn).await?;

        let holder = agent.clone();
        let committed = self
            .ledger
            .transact(order, move |tx| {
                if let Some(existing) = tx.aggregate().return_record() {
                    return Ok(Outcome::AlreadyRecorded(existing.clone()));
                }
                let cancelled_while_out =
                    tx.state() == OrderState::Cancelled && tx.aggregate().equipment_out();
                if tx.state() != OrderState::Delivered && !cancelled_while_out {
                    debug!(%order, state = %tx.state(), "return refused");
                    return Err(WorkflowError::NotYetDelivered {
                        order,
                        state: tx.state(),
                    });
                }

                let outcome = tx.record_return(holder.clone());
                // A cancelled order keeps its state; the return only frees the units.
                if !cancelled_while_out {
                    tx.transition(OrderState::Returned, "return_equipment")?;
                }
                let borrower = tx.borrower().clone();
                tx.emit(LoanEvent::OrderReturned {
                    order,
                    borrower,
                    holder,
                });
                Ok(outcome)
            })
            .await?;

        if committed.value.is_new() {
            info!(%order, holder = %agent, state = %committed.snapshot.state(), "equipment returned");
        } else {
            debug!(%order, "already returned");
        }
        if committed.released_units() {
            if let Err(e) = self.inventory.release_units(order).await {
                error!(%order, error = %e, "failed to release reserved units");
            }
        }
        Ok(committed.value)
    }

    fn delivery(&self, order: OrderId) -> WorkflowResult<Option<DeliveryRecord>> {
        Ok(self.ledger.snapshot(order)?.delivery().cloned())
    }

    fn return_record(&self, order: OrderId) -> WorkflowResult<Option<ReturnRecord>> {
        Ok(self.ledger.snapshot(order)?.return_record().cloned())
    }
}
