//! # Single-Order Races
//!
//! Many tasks hitting one order at once. The per-order lock must serialize
//! them so the aggregate is only ever read and acted on by one writer.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use el_02_authorization_engine::AuthorizationApi;
    use el_03_fulfillment::FulfillmentApi;
    use el_05_notification_dispatcher::NotificationKind;
    use futures::future::join_all;
    use shared_types::entities::{OrderKind, OrderState, Verdict};
    use shared_types::errors::WorkflowError;

    const SIGNERS: usize = 8;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_acceptances_create_one_authorization() {
        let world = World::start();
        let names: Vec<&str> = (1..=SIGNERS).map(coresponsible).collect();

        let order = world
            .authorization()
            .create_order(request(BORROWER, &names, OrderKind::Ordinary))
            .await
            .unwrap();

        let handles = names.iter().map(|name| {
            let auth = world.services.authorization.clone();
            let signer = p(name);
            tokio::spawn(async move {
                auth.decide_coresponsible(order.id, &signer, Verdict::Accept)
                    .await
            })
        });
        for result in join_all(handles).await {
            result.unwrap().unwrap();
        }

        let auth = world.authorization();
        assert_eq!(auth.order(order.id).unwrap().state, OrderState::AwaitingAuthorization);
        assert!(auth.authorization(order.id).unwrap().is_some());

        // SIGNERS invitations plus exactly one authorization request.
        world.notifications(SIGNERS + 1).await;
        world.settle().await;
        assert_eq!(world.sink.count_of(NotificationKind::AuthorizationRequest), 1);
        assert_eq!(world.sink.count_of(NotificationKind::Invitation), SIGNERS);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cancel_racing_rejection_has_one_winner() {
        let world = World::start();
        let signer = coresponsible(1);

        for _ in 0..20 {
            let order = world
                .authorization()
                .create_order(request(BORROWER, &[signer], OrderKind::Ordinary))
                .await
                .unwrap();

            let canceller = {
                let auth = world.services.authorization.clone();
                tokio::spawn(async move { auth.cancel(order.id, &p(BORROWER)).await })
            };
            let rejecter = {
                let auth = world.services.authorization.clone();
                let signer = p(signer);
                tokio::spawn(async move {
                    auth.decide_coresponsible(order.id, &signer, Verdict::Reject)
                        .await
                })
            };
            let cancelled = canceller.await.unwrap();
            let rejected = rejecter.await.unwrap();

            let state = world.authorization().order(order.id).unwrap().state;
            match state {
                OrderState::Cancelled => {
                    assert!(cancelled.unwrap().is_new());
                    assert!(matches!(
                        rejected,
                        Err(WorkflowError::InvalidTransition {
                            from: OrderState::Cancelled,
                            ..
                        })
                    ));
                }
                OrderState::RejectedByCoResponsible => {
                    rejected.unwrap();
                    assert!(matches!(
                        cancelled,
                        Err(WorkflowError::InvalidTransition {
                            from: OrderState::RejectedByCoResponsible,
                            ..
                        })
                    ));
                }
                other => panic!("unexpected state after race: {other}"),
            }
            assert!(world.services.inventory.reserved_by(order.id).is_empty());
        }
        world.settle().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deliveries_record_once() {
        let world = World::start();
        let order = world
            .authorization()
            .create_order(request(BORROWER, &[], OrderKind::Ordinary))
            .await
            .unwrap();
        world
            .authorization()
            .decide_authorization(order.id, &p(INSTRUCTOR), Verdict::Accept)
            .await
            .unwrap();

        let handles = (0..6).map(|_| {
            let fulfillment = world.services.fulfillment.clone();
            tokio::spawn(async move { fulfillment.deliver(order.id, &p(WAREHOUSE)).await })
        });
        let outcomes: Vec<_> = join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        assert_eq!(outcomes.iter().filter(|o| o.is_new()).count(), 1);
        let first = outcomes[0].get();
        assert!(outcomes.iter().all(|o| o.get() == first));
        world.settle().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_attach_of_same_participant() {
        let world = World::start();
        let first = coresponsible(1);
        let order = world
            .authorization()
            .create_order(request(BORROWER, &[first], OrderKind::Ordinary))
            .await
            .unwrap();

        let late = coresponsible(2);
        let handles = (0..6).map(|_| {
            let auth = world.services.authorization.clone();
            let participant = p(late);
            tokio::spawn(async move {
                auth.attach_coresponsible(order.id, participant, &p(BORROWER))
                    .await
            })
        });
        let recorded = join_all(handles)
            .await
            .into_iter()
            .filter(|r| r.as_ref().unwrap().as_ref().unwrap().is_new())
            .count();

        assert_eq!(recorded, 1);
        assert_eq!(world.authorization().coresponsibles(order.id).unwrap().len(), 2);
        world.settle().await;
    }
}
