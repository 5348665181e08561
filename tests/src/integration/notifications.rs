//! # Post-Commit Notifications
//!
//! What reaches the sink, and to whom, once transitions commit.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use el_02_authorization_engine::AuthorizationApi;
    use el_03_fulfillment::FulfillmentApi;
    use el_04_reporting::ReportingApi;
    use el_05_notification_dispatcher::NotificationKind;
    use shared_bus::{EventFilter, EventPublisher, EventTopic};
    use shared_types::entities::{OrderKind, Verdict};

    #[tokio::test]
    async fn test_full_path_notifies_each_party() {
        let world = World::start();
        let auth = world.authorization();
        let (r1, r2) = (coresponsible(1), coresponsible(2));

        let order = auth
            .create_order(request(BORROWER, &[r1, r2], OrderKind::Ordinary))
            .await
            .unwrap();
        auth.decide_coresponsible(order.id, &p(r1), Verdict::Accept)
            .await
            .unwrap();
        auth.decide_coresponsible(order.id, &p(r2), Verdict::Accept)
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

        let sent = world.notifications(6).await;
        world.settle().await;
        assert_eq!(sent.len(), 6);

        let kinds_for = |who: &str| -> Vec<NotificationKind> {
            world
                .sink
                .sent_to(&p(who))
                .into_iter()
                .map(|n| n.kind)
                .collect()
        };
        assert_eq!(kinds_for(r1), vec![NotificationKind::Invitation]);
        assert_eq!(kinds_for(r2), vec![NotificationKind::Invitation]);
        assert_eq!(kinds_for(INSTRUCTOR), vec![NotificationKind::AuthorizationRequest]);
        assert_eq!(
            kinds_for(BORROWER),
            vec![
                NotificationKind::OrderApproved,
                NotificationKind::OrderDelivered,
                NotificationKind::OrderReturned,
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_operations_notify_nobody() {
        let world = World::start();
        let auth = world.authorization();
        let order = auth
            .create_order(request(BORROWER, &[], OrderKind::Ordinary))
            .await
            .unwrap();
        world.notifications(1).await;

        // Not approved yet, so nothing commits.
        assert!(world.fulfillment().deliver(order.id, &p(WAREHOUSE)).await.is_err());
        assert!(world
            .reporting()
            .report(order.id, &p(WAREHOUSE), "early".into())
            .await
            .is_err());

        world.settle().await;
        assert_eq!(world.sink.sent().len(), 1);
        assert_eq!(world.sink.count_of(NotificationKind::AuthorizationRequest), 1);
    }

    #[tokio::test]
    async fn test_redelivered_envelope_is_not_sent_twice() {
        let world = World::start();
        let mut tap = world
            .services
            .event_bus
            .subscribe(EventFilter::topics(vec![EventTopic::Authorization]));

        world
            .authorization()
            .create_order(request(BORROWER, &[], OrderKind::Ordinary))
            .await
            .unwrap();
        let envelope = tap.recv().await.unwrap();
        world.notifications(1).await;

        // At-least-once upstream: the same envelope published again.
        world.services.event_bus.publish_envelope(envelope).await;
        for _ in 0..200 {
            if world.services.dispatcher.stats().duplicates == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        world.settle().await;

        assert_eq!(world.sink.count_of(NotificationKind::AuthorizationRequest), 1);
        assert_eq!(world.services.dispatcher.stats().duplicates, 1);
    }
}
