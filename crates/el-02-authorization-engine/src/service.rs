//! Authorization Service - core business logic
//!
//! Every command follows the same shape: resolve whatever the directories
//! must tell us (roles, suspension, the authorizer) first, then run one
//! ledger transaction that never awaits, then do post-commit work such as
//! releasing units.

use crate::domain::{authorize_capability, route_authorizer, OrderRequest};
use crate::ports::inbound::AuthorizationApi;
use async_trait::async_trait;
use el_01_order_ledger::{Cancellation, Committed, OrderLedger, OrderTx};
use shared_bus::{LoanEvent, RejectionReason};
use shared_types::directory::{IdentityDirectory, InventoryDirectory};
use shared_types::entities::{
    AuthorizationRecord, CoResponsibleRecord, Decision, Order, OrderId, OrderKind, OrderState,
    PrincipalId, Verdict,
};
use shared_types::errors::{Outcome, ParticipantRejection, WorkflowError, WorkflowResult};
use shared_types::identity::{Capability, PermissionTable, Principal};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Authorization Service implementation.
pub struct AuthorizationService<I, V>
where
    I: IdentityDirectory,
    V: InventoryDirectory,
{
    ledger: Arc<OrderLedger>,
    identity: Arc<I>,
    inventory: Arc<V>,
    permissions: Arc<PermissionTable>,
}

impl<I, V> AuthorizationService<I, V>
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

    #[must_use]
    pub fn ledger(&self) -> &Arc<OrderLedger> {
        &self.ledger
    }

    async fn principal(&self, id: &PrincipalId) -> WorkflowResult<Principal> {
        let role = self.identity.role_of(id).await?;
        Ok(Principal::new(id.clone(), role))
    }

    async fn require(&self, actor: &PrincipalId, capability: Capability) -> WorkflowResult<Principal> {
        let principal = self.principal(actor).await?;
        self.permissions.require(&principal, capability)?;
        Ok(principal)
    }

    /// Borrower-only guard against the order's immutable borrower field.
    fn require_borrower(&self, order: &Order, actor: &PrincipalId, capability: Capability) -> WorkflowResult<()> {
        if &order.borrower == actor {
            Ok(())
        } else {
            debug!(order = %order.id, %actor, "actor is not the borrower");
            Err(WorkflowError::Forbidden {
                principal: actor.clone(),
                capability,
            })
        }
    }

    /// The checks `attach_coresponsible` and `create_order` apply to each
    /// named participant.
    async fn vet_participant(
        &self,
        order: OrderId,
        borrower: &PrincipalId,
        participant: &PrincipalId,
    ) -> WorkflowResult<()> {
        let reject = |reason: ParticipantRejection| {
            debug!(%order, %participant, %reason, "participant refused");
            Err(WorkflowError::InvalidParticipant {
                order,
                participant: participant.clone(),
                reason,
            })
        };

        if participant == borrower {
            return reject(ParticipantRejection::IsBorrower);
        }
        let principal = self.principal(participant).await?;
        if !self.permissions.allows(principal.role, Capability::CoSign) {
            return reject(ParticipantRejection::CannotCoSign);
        }
        if self.identity.is_suspended(participant).await? {
            return reject(ParticipantRejection::Suspended);
        }
        Ok(())
    }

    /// Who would authorize `order` right now. `None` if nobody is configured.
    async fn resolve_authorizer(&self, order: &Order) -> WorkflowResult<Option<PrincipalId>> {
        let authorizer = match order.kind {
            OrderKind::Ordinary => {
                let instructors = self.identity.instructors_of(&order.subject).await?;
                route_authorizer(order.kind, &instructors, None)
            }
            OrderKind::Extraordinary => {
                let coordinator = self.identity.coordinator().await?;
                route_authorizer(order.kind, &[], coordinator.as_ref())
            }
        };
        Ok(authorizer)
    }

    /// Post-commit: give the units back once the loan no longer holds them.
    async fn release_if_freed<T>(&self, committed: &Committed<T>) {
        if committed.released_units() {
            self.release_units(committed.snapshot.id()).await;
        }
    }

    async fn release_units(&self, order: OrderId) {
        if let Err(e) = self.inventory.release_units(order).await {
            error!(%order, error = %e, "failed to release reserved units");
        }
    }
}

/// Re-evaluate the co-responsible aggregate of an order still collecting
/// sign-offs and apply the edge it implies.
fn settle_coresponsibles(
    tx: &mut OrderTx<'_>,
    authorizer: Option<PrincipalId>,
    operation: &'static str,
) -> WorkflowResult<()> {
    match tx.aggregate().coresponsible_status() {
        Decision::Pending => Ok(()),
        Decision::Accepted => request_authorization(tx, authorizer, operation),
        Decision::Rejected => {
            let participant = tx
                .aggregate()
                .coresponsibles()
                .iter()
                .find(|r| r.decision == Decision::Rejected)
                .map(|r| r.participant.clone())
                .unwrap_or_else(|| tx.borrower().clone());
            tx.transition(OrderState::RejectedByCoResponsible, operation)?;

            let order = tx.id();
            let borrower = tx.borrower().clone();
            tx.emit(LoanEvent::OrderRejected {
                order,
                borrower,
                reason: RejectionReason::CoResponsibleDeclined { participant },
            });
            Ok(())
        }
    }
}

/// Create the single authorization record and move to
/// `AWAITING_AUTHORIZATION`.
fn request_authorization(
    tx: &mut OrderTx<'_>,
    authorizer: Option<PrincipalId>,
    operation: &'static str,
) -> WorkflowResult<()> {
    let order = tx.id();
    let authorizer = authorizer.ok_or(WorkflowError::NoAuthorizer(order))?;
    let kind = tx.aggregate().order().kind;

    let created = tx.create_authorization(authorizer, kind);
    tx.transition(OrderState::AwaitingAuthorization, operation)?;

    if let Outcome::Recorded(record) = created {
        let borrower = tx.borrower().clone();
        tx.emit(LoanEvent::AuthorizationRequested {
            order,
            borrower,
            authorizer: record.authorizer,
            kind,
        });
    }
    Ok(())
}

fn invite(tx: &mut OrderTx<'_>, participant: PrincipalId) -> Outcome<CoResponsibleRecord> {
    let outcome = tx.add_coresponsible(participant);
    if let Outcome::Recorded(record) = &outcome {
        let order = tx.id();
        let borrower = tx.borrower().clone();
        tx.emit(LoanEvent::CoResponsibleInvited {
            order,
            borrower,
            participant: record.participant.clone(),
        });
    }
    outcome
}

#[async_trait]
impl<I, V> AuthorizationApi for AuthorizationService<I, V>
where
    I: IdentityDirectory + 'static,
    V: InventoryDirectory + 'static,
{
    async fn create_order(&self, request: OrderRequest) -> WorkflowResult<Order> {
        let borrower = request.borrower.clone();
        self.require(&borrower, Capability::RequestOrder).await?;

        if self.identity.is_suspended(&borrower).await? {
            debug!(%borrower, "suspended borrower refused");
            return Err(WorkflowError::BorrowerSuspended(borrower));
        }

        let window = request.validate()?;
        let participants = request.distinct_coresponsibles();
        let id = OrderId::new();
        let order = request.into_order(id, window, self.ledger.clock().now());

        for participant in &participants {
            self.vet_participant(id, &borrower, participant).await?;
        }

        let authorizer = self.resolve_authorizer(&order).await?;
        if authorizer.is_none() {
            debug!(order = %id, kind = ?order.kind, subject = %order.subject, "no authorizer");
            return Err(WorkflowError::NoAuthorizer(id));
        }

        let mut unavailable = Vec::new();
        for unit in &order.units {
            if !self.inventory.is_unit_available(unit, &window).await? {
                unavailable.push(unit.clone());
            }
        }
        if !unavailable.is_empty() {
            debug!(order = %id, units = ?unavailable, "units unavailable");
            return Err(WorkflowError::UnitsUnavailable { units: unavailable });
        }
        self.inventory.reserve_units(id, &order.units, &order.window).await?;

        let created = self
            .ledger
            .create(order, move |tx| {
                tx.open();
                if participants.is_empty() {
                    request_authorization(tx, authorizer, "create_order")
                } else {
                    for participant in participants {
                        invite(tx, participant);
                    }
                    tx.transition(OrderState::AwaitingCoResponsibles, "create_order")
                }
            })
            .await;

        match created {
            Ok(committed) => {
                info!(
                    order = %id,
                    %borrower,
                    state = %committed.snapshot.state(),
                    coresponsibles = committed.snapshot.coresponsibles().len(),
                    "order opened"
                );
                Ok(committed.snapshot.order().clone())
            }
            Err(e) => {
                self.release_units(id).await;
                Err(e)
            }
        }
    }

    async fn attach_coresponsible(
        &self,
        order: OrderId,
        participant: PrincipalId,
        actor: &PrincipalId,
    ) -> WorkflowResult<Outcome<CoResponsibleRecord>> {
        let snapshot = self.ledger.snapshot(order)?;
        self.require_borrower(snapshot.order(), actor, Capability::RequestOrder)?;
        // Only newcomers are vetted; a known participant gets the existing record.
        if let Some(existing) = snapshot.coresponsible(&participant) {
            debug!(%order, %participant, "co-responsible already attached");
            return Ok(Outcome::AlreadyRecorded(existing.clone()));
        }
        self.vet_participant(order, snapshot.borrower(), &participant).await?;

        let committed = self
            .ledger
            .transact(order, move |tx| {
                if let Some(existing) = tx.aggregate().coresponsible(&participant) {
                    return Ok(Outcome::AlreadyRecorded(existing.clone()));
                }
                if tx.state() != OrderState::AwaitingCoResponsibles {
                    debug!(%order, state = %tx.state(), "attach refused");
                    return Err(WorkflowError::InvalidTransition {
                        order,
                        from: tx.state(),
                        operation: "attach_coresponsible",
                    });
                }
                Ok(invite(tx, participant))
            })
            .await?;

        if committed.value.is_new() {
            info!(%order, participant = %committed.value.get().participant, "co-responsible attached");
        }
        Ok(committed.value)
    }

    async fn detach_coresponsible(
        &self,
        order: OrderId,
        participant: &PrincipalId,
        actor: &PrincipalId,
    ) -> WorkflowResult<CoResponsibleRecord> {
        let snapshot = self.ledger.snapshot(order)?;
        self.require_borrower(snapshot.order(), actor, Capability::RequestOrder)?;
        let authorizer = self.resolve_authorizer(snapshot.order()).await?;

        let participant = participant.clone();
        let committed = self
            .ledger
            .transact(order, move |tx| {
                if tx.state() != OrderState::AwaitingCoResponsibles {
                    return Err(WorkflowError::InvalidTransition {
                        order,
                        from: tx.state(),
                        operation: "detach_coresponsible",
                    });
                }
                let removed = tx.remove_coresponsible(&participant).ok_or_else(|| {
                    WorkflowError::RecordNotFound {
                        order,
                        principal: participant.clone(),
                    }
                })?;
                settle_coresponsibles(tx, authorizer, "detach_coresponsible")?;
                Ok(removed)
            })
            .await?;

        info!(
            %order,
            participant = %committed.value.participant,
            state = %committed.snapshot.state(),
            "co-responsible detached"
        );
        Ok(committed.value)
    }

    async fn decide_coresponsible(
        &self,
        order: OrderId,
        actor: &PrincipalId,
        verdict: Verdict,
    ) -> WorkflowResult<CoResponsibleRecord> {
        self.require(actor, Capability::CoSign).await?;
        let snapshot = self.ledger.snapshot(order)?;
        let authorizer = self.resolve_authorizer(snapshot.order()).await?;

        let participant = actor.clone();
        let decision = Decision::from(verdict);
        let committed = self
            .ledger
            .transact(order, move |tx| {
                if tx.state() != OrderState::AwaitingCoResponsibles {
                    return Err(WorkflowError::InvalidTransition {
                        order,
                        from: tx.state(),
                        operation: "decide_coresponsible",
                    });
                }
                let changed = tx.decide_coresponsible(&participant, decision)?;
                if changed {
                    settle_coresponsibles(tx, authorizer, "decide_coresponsible")?;
                }
                tx.aggregate()
                    .coresponsible(&participant)
                    .cloned()
                    .ok_or(WorkflowError::RecordNotFound {
                        order,
                        principal: participant,
                    })
            })
            .await?;

        info!(
            %order,
            participant = %actor,
            decision = ?committed.value.decision,
            aggregate = ?committed.snapshot.coresponsible_status(),
            "co-responsible decision recorded"
        );
        self.release_if_freed(&committed).await;
        Ok(committed.value)
    }

    async fn decide_authorization(
        &self,
        order: OrderId,
        actor: &PrincipalId,
        verdict: Verdict,
    ) -> WorkflowResult<AuthorizationRecord> {
        let snapshot = self.ledger.snapshot(order)?;
        self.require(actor, authorize_capability(snapshot.order().kind))
            .await?;

        let authorizer = actor.clone();
        let committed = self
            .ledger
            .transact(order, move |tx| {
                if tx.state() != OrderState::AwaitingAuthorization {
                    return Err(WorkflowError::InvalidTransition {
                        order,
                        from: tx.state(),
                        operation: "decide_authorization",
                    });
                }
                let assigned = tx
                    .aggregate()
                    .authorization()
                    .map(|a| a.authorizer.clone())
                    .ok_or_else(|| WorkflowError::RecordNotFound {
                        order,
                        principal: authorizer.clone(),
                    })?;
                if assigned != authorizer {
                    debug!(%order, %authorizer, %assigned, "not the assigned authorizer");
                    return Err(WorkflowError::Forbidden {
                        principal: authorizer,
                        capability: authorize_capability(tx.aggregate().order().kind),
                    });
                }

                let record = tx.decide_authorization(Decision::from(verdict))?;
                let borrower = tx.borrower().clone();
                match verdict {
                    Verdict::Accept => {
                        tx.transition(OrderState::Approved, "decide_authorization")?;
                        tx.emit(LoanEvent::OrderApproved { order, borrower });
                    }
                    Verdict::Reject => {
                        tx.transition(OrderState::RejectedByAuthorizer, "decide_authorization")?;
                        tx.emit(LoanEvent::OrderRejected {
                            order,
                            borrower,
                            reason: RejectionReason::AuthorizerDeclined { authorizer },
                        });
                    }
                }
                Ok(record)
            })
            .await?;

        info!(%order, authorizer = %actor, decision = ?committed.value.decision, "authorization decided");
        self.release_if_freed(&committed).await;
        Ok(committed.value)
    }

    async fn cancel(&self, order: OrderId, actor: &PrincipalId) -> WorkflowResult<Outcome<Cancellation>> {
        let snapshot = self.ledger.snapshot(order)?;
        if snapshot.borrower() != actor {
            self.require(actor, Capability::CancelAnyOrder).await?;
        }

        let by = actor.clone();
        let committed = self
            .ledger
            .transact(order, move |tx| {
                if let Some(existing) = tx.aggregate().cancellation() {
                    return Ok(Outcome::AlreadyRecorded(existing.clone()));
                }
                tx.transition(OrderState::Cancelled, "cancel")?;
                let cancellation = tx.mark_cancelled(by.clone());
                let borrower = tx.borrower().clone();
                tx.emit(LoanEvent::OrderCancelled {
                    order,
                    borrower,
                    cancelled_by: by,
                });
                Ok(Outcome::Recorded(cancellation))
            })
            .await?;

        if committed.value.is_new() {
            info!(%order, by = %actor, from = %committed.previous, "order cancelled");
        } else {
            debug!(%order, "order already cancelled");
        }
        self.release_if_freed(&committed).await;
        Ok(committed.value)
    }

    async fn delete_order(&self, order: OrderId, actor: &PrincipalId) -> WorkflowResult<()> {
        let principal = self.principal(actor).await?;
        let may_delete_any = self.permissions.allows(principal.role, Capability::DeleteOrder);

        self.ledger
            .remove(order, |aggregate| {
                let own_finished = aggregate.borrower() == actor && aggregate.state().is_terminal();
                if may_delete_any || own_finished {
                    Ok(())
                } else {
                    Err(WorkflowError::Forbidden {
                        principal: actor.clone(),
                        capability: Capability::DeleteOrder,
                    })
                }
            })
            .await?;

        self.release_units(order).await;
        Ok(())
    }

    fn order(&self, order: OrderId) -> WorkflowResult<Order> {
        Ok(self.ledger.snapshot(order)?.order().clone())
    }

    fn coresponsible_status(&self, order: OrderId) -> WorkflowResult<Decision> {
        Ok(self.ledger.snapshot(order)?.coresponsible_status())
    }

    fn coresponsibles(&self, order: OrderId) -> WorkflowResult<Vec<CoResponsibleRecord>> {
        Ok(self.ledger.snapshot(order)?.coresponsibles().to_vec())
    }

    fn authorization(&self, order: OrderId) -> WorkflowResult<Option<AuthorizationRecord>> {
        Ok(self.ledger.snapshot(order)?.authorization().cloned())
    }

    fn orders_of(&self, borrower: &PrincipalId) -> Vec<Order> {
        self.ledger
            .orders_of(borrower)
            .iter()
            .map(|a| a.order().clone())
            .collect()
    }

    fn pending_invitations(&self, participant: &PrincipalId) -> Vec<CoResponsibleRecord> {
        self.ledger
            .all()
            .iter()
            .filter(|a| a.state() == OrderState::AwaitingCoResponsibles)
            .filter_map(|a| a.coresponsible(participant).cloned())
            .filter(|r| r.decision == Decision::Pending)
            .collect()
    }

    fn pending_authorizations(&self, authorizer: &PrincipalId) -> Vec<AuthorizationRecord> {
        self.ledger
            .all()
            .iter()
            .filter(|a| a.state() == OrderState::AwaitingAuthorization)
            .filter_map(|a| a.authorization().cloned())
            .filter(|r| &r.authorizer == authorizer && r.decision == Decision::Pending)
            .collect()
    }
}
