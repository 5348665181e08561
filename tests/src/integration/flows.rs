//! # Order Lifecycle Flows
//!
//! Full workflows through authorization, fulfillment and reporting, all
//! sharing one ledger the way the runtime wires them.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use el_02_authorization_engine::AuthorizationApi;
    use el_03_fulfillment::FulfillmentApi;
    use el_04_reporting::ReportingApi;
    use shared_types::entities::{Decision, OrderKind, OrderState, Verdict};
    use shared_types::errors::WorkflowError;

    // =========================================================================
    // APPROVAL PATHS
    // =========================================================================

    #[tokio::test]
    async fn test_two_coresponsibles_ordinary_full_path() {
        let world = World::start();
        let auth = world.authorization();
        let r1 = coresponsible(1);
        let r2 = coresponsible(2);

        let order = auth
            .create_order(request(BORROWER, &[r1, r2], OrderKind::Ordinary))
            .await
            .unwrap();
        assert_eq!(order.state, OrderState::AwaitingCoResponsibles);

        auth.decide_coresponsible(order.id, &p(r1), Verdict::Accept)
            .await
            .unwrap();
        assert!(auth.authorization(order.id).unwrap().is_none());

        auth.decide_coresponsible(order.id, &p(r2), Verdict::Accept)
            .await
            .unwrap();
        let record = auth.authorization(order.id).unwrap().unwrap();
        assert_eq!(record.authorizer, p(INSTRUCTOR));
        assert_eq!(record.decision, Decision::Pending);
        assert_eq!(auth.order(order.id).unwrap().state, OrderState::AwaitingAuthorization);
        assert_eq!(auth.pending_authorizations(&p(INSTRUCTOR)).len(), 1);

        auth.decide_authorization(order.id, &p(INSTRUCTOR), Verdict::Accept)
            .await
            .unwrap();
        assert_eq!(auth.order(order.id).unwrap().state, OrderState::Approved);

        let delivered = world
            .fulfillment()
            .deliver(order.id, &p(WAREHOUSE))
            .await
            .unwrap();
        assert!(delivered.is_new());
        assert_eq!(auth.order(order.id).unwrap().state, OrderState::Delivered);

        let returned = world
            .fulfillment()
            .return_equipment(order.id, &p(WAREHOUSE))
            .await
            .unwrap();
        assert!(returned.is_new());
        assert_eq!(auth.order(order.id).unwrap().state, OrderState::Returned);

        // The unit is free again for the same window.
        assert!(world.services.inventory.reserved_by(order.id).is_empty());
        world.settle().await;
    }

    #[tokio::test]
    async fn test_extraordinary_order_routes_to_coordinator() {
        let world = World::start();
        let auth = world.authorization();

        let order = auth
            .create_order(request(BORROWER, &[], OrderKind::Extraordinary))
            .await
            .unwrap();
        assert_eq!(order.state, OrderState::AwaitingAuthorization);
        assert_eq!(
            auth.authorization(order.id).unwrap().unwrap().authorizer,
            p(COORDINATOR)
        );

        // The instructor holds the wrong capability for this kind.
        assert!(matches!(
            auth.decide_authorization(order.id, &p(INSTRUCTOR), Verdict::Accept)
                .await,
            Err(WorkflowError::Forbidden { .. })
        ));

        auth.decide_authorization(order.id, &p(COORDINATOR), Verdict::Accept)
            .await
            .unwrap();
        assert_eq!(auth.order(order.id).unwrap().state, OrderState::Approved);
        world.settle().await;
    }

    // =========================================================================
    // REJECTION AND CANCELLATION
    // =========================================================================

    #[tokio::test]
    async fn test_single_coresponsible_rejects() {
        let world = World::start();
        let auth = world.authorization();
        let r1 = coresponsible(1);

        let order = auth
            .create_order(request(BORROWER, &[r1], OrderKind::Ordinary))
            .await
            .unwrap();
        auth.decide_coresponsible(order.id, &p(r1), Verdict::Reject)
            .await
            .unwrap();

        assert_eq!(
            auth.order(order.id).unwrap().state,
            OrderState::RejectedByCoResponsible
        );
        assert!(auth.authorization(order.id).unwrap().is_none());
        assert!(auth.pending_authorizations(&p(INSTRUCTOR)).is_empty());
        world.settle().await;
    }

    #[tokio::test]
    async fn test_cancel_while_collecting_signoffs() {
        let world = World::start();
        let auth = world.authorization();
        let r1 = coresponsible(1);

        let order = auth
            .create_order(request(BORROWER, &[r1], OrderKind::Ordinary))
            .await
            .unwrap();
        let cancelled = auth.cancel(order.id, &p(BORROWER)).await.unwrap();
        assert!(cancelled.is_new());
        assert_eq!(auth.order(order.id).unwrap().state, OrderState::Cancelled);

        assert!(matches!(
            auth.decide_coresponsible(order.id, &p(r1), Verdict::Accept)
                .await,
            Err(WorkflowError::InvalidTransition {
                from: OrderState::Cancelled,
                ..
            })
        ));
        assert!(auth.pending_invitations(&p(r1)).is_empty());

        // Cancelling again is a no-op.
        assert!(!auth.cancel(order.id, &p(BORROWER)).await.unwrap().is_new());
        world.settle().await;
    }

    #[tokio::test]
    async fn test_cancelled_order_frees_its_units() {
        let world = World::start();
        let auth = world.authorization();

        let req = request(BORROWER, &[], OrderKind::Ordinary);
        let mut same_window = req.clone();
        same_window.borrower = p(OTHER_BORROWER);

        let first = auth.create_order(req).await.unwrap();
        assert!(matches!(
            auth.create_order(same_window.clone()).await,
            Err(WorkflowError::UnitsUnavailable { .. })
        ));

        auth.cancel(first.id, &p(WAREHOUSE)).await.unwrap();
        let second = auth.create_order(same_window).await.unwrap();
        assert_eq!(second.state, OrderState::AwaitingAuthorization);
        world.settle().await;
    }

    #[tokio::test]
    async fn test_cancel_after_delivery_keeps_units_until_returned() {
        let world = World::start();
        let auth = world.authorization();

        let req = request(BORROWER, &[], OrderKind::Ordinary);
        let mut same_window = req.clone();
        same_window.borrower = p(OTHER_BORROWER);

        let order = auth.create_order(req).await.unwrap();
        auth.decide_authorization(order.id, &p(INSTRUCTOR), Verdict::Accept)
            .await
            .unwrap();
        world.fulfillment().deliver(order.id, &p(WAREHOUSE)).await.unwrap();

        assert!(auth.cancel(order.id, &p(BORROWER)).await.unwrap().is_new());
        assert!(!world.services.inventory.reserved_by(order.id).is_empty());
        assert!(matches!(
            auth.create_order(same_window.clone()).await,
            Err(WorkflowError::UnitsUnavailable { .. })
        ));

        // The equipment is still out, so it can be reported.
        let report = world
            .reporting()
            .report(order.id, &p(WAREHOUSE), "camera not returned".into())
            .await
            .unwrap();
        assert!(report.is_new());

        let returned = world
            .fulfillment()
            .return_equipment(order.id, &p(WAREHOUSE))
            .await
            .unwrap();
        assert!(returned.is_new());
        assert_eq!(auth.order(order.id).unwrap().state, OrderState::Cancelled);
        assert!(world.services.inventory.reserved_by(order.id).is_empty());

        let second = auth.create_order(same_window).await.unwrap();
        assert_eq!(second.state, OrderState::AwaitingAuthorization);
        world.settle().await;
    }

    // =========================================================================
    // FULFILLMENT
    // =========================================================================

    #[tokio::test]
    async fn test_deliver_twice_and_return_before_deliver() {
        let world = World::start();
        let auth = world.authorization();
        let order = auth
            .create_order(request(BORROWER, &[], OrderKind::Ordinary))
            .await
            .unwrap();
        auth.decide_authorization(order.id, &p(INSTRUCTOR), Verdict::Accept)
            .await
            .unwrap();

        for _ in 0..5 {
            assert!(matches!(
                world
                    .fulfillment()
                    .return_equipment(order.id, &p(WAREHOUSE))
                    .await,
                Err(WorkflowError::NotYetDelivered { .. })
            ));
        }

        let first = world
            .fulfillment()
            .deliver(order.id, &p(WAREHOUSE))
            .await
            .unwrap();
        let second = world
            .fulfillment()
            .deliver(order.id, &p(WAREHOUSE))
            .await
            .unwrap();
        assert!(first.is_new());
        assert!(!second.is_new());
        assert_eq!(first.get(), second.get());
        world.settle().await;
    }

    // =========================================================================
    // REPORTING AND SUSPENSION
    // =========================================================================

    #[tokio::test]
    async fn test_report_suspends_until_deactivated() {
        let world = World::start();
        let auth = world.authorization();
        let order = auth
            .create_order(request(BORROWER, &[], OrderKind::Ordinary))
            .await
            .unwrap();
        auth.decide_authorization(order.id, &p(INSTRUCTOR), Verdict::Accept)
            .await
            .unwrap();
        world.fulfillment().deliver(order.id, &p(WAREHOUSE)).await.unwrap();
        world
            .fulfillment()
            .return_equipment(order.id, &p(WAREHOUSE))
            .await
            .unwrap();

        let report = world
            .reporting()
            .report(order.id, &p(WAREHOUSE), "returned with a cracked lens".into())
            .await
            .unwrap();
        assert!(world.reporting().is_suspended(&p(BORROWER)));

        // Suspension is read through the identity directory too.
        assert!(matches!(
            auth.create_order(request(BORROWER, &[], OrderKind::Ordinary))
                .await,
            Err(WorkflowError::BorrowerSuspended(_))
        ));
        let r1 = coresponsible(1);
        let other = auth
            .create_order(request(OTHER_BORROWER, &[r1], OrderKind::Ordinary))
            .await
            .unwrap();
        assert!(matches!(
            auth.attach_coresponsible(other.id, p(BORROWER), &p(OTHER_BORROWER))
                .await,
            Err(WorkflowError::InvalidParticipant { .. })
        ));

        world
            .reporting()
            .deactivate(report.get().id, &p(COORDINATOR))
            .await
            .unwrap();
        assert!(!world.reporting().is_suspended(&p(BORROWER)));
        auth.create_order(request(BORROWER, &[], OrderKind::Ordinary))
            .await
            .unwrap();
        world.settle().await;
    }

    #[tokio::test]
    async fn test_deleting_an_order_lifts_its_suspension() {
        let world = World::start();
        let auth = world.authorization();
        let order = auth
            .create_order(request(BORROWER, &[], OrderKind::Ordinary))
            .await
            .unwrap();
        auth.decide_authorization(order.id, &p(INSTRUCTOR), Verdict::Accept)
            .await
            .unwrap();
        world.fulfillment().deliver(order.id, &p(WAREHOUSE)).await.unwrap();
        world
            .reporting()
            .report(order.id, &p(WAREHOUSE), "late".into())
            .await
            .unwrap();
        assert!(world.reporting().is_suspended(&p(BORROWER)));

        // A delivered order is not terminal, so its borrower may not delete it.
        assert!(matches!(
            auth.delete_order(order.id, &p(BORROWER)).await,
            Err(WorkflowError::Forbidden { .. })
        ));

        auth.delete_order(order.id, &p(COORDINATOR)).await.unwrap();
        assert!(!world.reporting().is_suspended(&p(BORROWER)));
        assert_eq!(
            auth.order(order.id).unwrap_err(),
            WorkflowError::OrderNotFound(order.id)
        );
        world.settle().await;
    }
}
