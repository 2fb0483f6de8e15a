//! Notification engine integration tests
//!
//! These tests drive `NotificationEngine` through its public API with a
//! recording transport standing in for real delivery.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::join_all;

use pulsehub_notification_service::config::RegistryConfig;
use pulsehub_notification_service::notification::{
    DeliveryRequest, DeliveryTransport, NotificationEngine, NotificationError, TransportError,
};

/// Transport that remembers every delivery it was handed
#[derive(Default)]
struct RecordingTransport {
    deliveries: Mutex<Vec<DeliveryRequest>>,
}

impl RecordingTransport {
    fn deliveries(&self) -> Vec<DeliveryRequest> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryTransport for RecordingTransport {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, request: DeliveryRequest) -> Result<(), TransportError> {
        self.deliveries.lock().unwrap().push(request);
        Ok(())
    }
}

/// Transport whose handoff always fails
struct RejectingTransport;

#[async_trait]
impl DeliveryTransport for RejectingTransport {
    fn name(&self) -> &'static str {
        "rejecting"
    }

    async fn deliver(&self, _request: DeliveryRequest) -> Result<(), TransportError> {
        Err(TransportError::Other("gateway offline".to_string()))
    }
}

fn create_engine() -> (Arc<NotificationEngine>, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let engine = Arc::new(NotificationEngine::new(transport.clone()));
    (engine, transport)
}

// =============================================================================
// Subscription Lifecycle Tests
// =============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_duplicate_subscription_rejected() {
        let (engine, _) = create_engine();

        assert!(engine.subscribe("u", "tok-1", "news").is_ok());
        let second = engine.subscribe("u", "tok-1", "news");

        assert!(matches!(
            second,
            Err(NotificationError::AlreadySubscribed { .. })
        ));
        assert_eq!(engine.get_subscriptions("u").len(), 1);
    }

    #[test]
    fn test_unsubscribe_removes_every_device_on_channel() {
        let (engine, _) = create_engine();
        engine.subscribe("u", "t1", "c").unwrap();
        engine.subscribe("u", "t2", "c").unwrap();

        assert!(engine.unsubscribe("u", "c").is_ok());
        assert!(engine.get_subscriptions("u").is_empty());

        let again = engine.unsubscribe("u", "c");
        assert!(matches!(again, Err(NotificationError::NotFound { .. })));
    }

    #[test]
    fn test_token_update_fans_out() {
        let (engine, _) = create_engine();
        engine.subscribe("u", "t1", "c1").unwrap();
        engine.subscribe("u", "t1", "c2").unwrap();

        engine.update_device_token("u", "t2").unwrap();

        let subs = engine.get_subscriptions("u");
        assert_eq!(subs.len(), 2);
        assert!(subs.iter().all(|s| s.device_token == "t2"));
        assert_eq!(subs[0].channel, "c1");
        assert_eq!(subs[1].channel, "c2");
    }

    #[test]
    fn test_token_update_reports_updated_and_merged() {
        let (engine, _) = create_engine();
        engine.subscribe("u", "t1", "c").unwrap();
        engine.subscribe("u", "t2", "c").unwrap();
        engine.subscribe("u", "t1", "d").unwrap();

        let rewrite = engine.update_device_token("u", "t3").unwrap();

        assert_eq!(rewrite.updated, 3);
        assert_eq!(rewrite.merged, 1);
        assert_eq!(rewrite.remaining(), 2);

        let subs = engine.get_subscriptions("u");
        let pairs: Vec<_> = subs
            .iter()
            .map(|s| (s.channel.as_str(), s.device_token.as_str()))
            .collect();
        assert_eq!(pairs, vec![("c", "t3"), ("d", "t3")]);

        let stats = engine.stats();
        assert_eq!(stats.subscriptions_created, 3);
        assert_eq!(stats.subscriptions_removed, 1);
        assert_eq!(engine.registry_stats().total_subscriptions, 2);
    }

    #[test]
    fn test_token_update_unknown_user() {
        let (engine, _) = create_engine();

        let result = engine.update_device_token("ghost", "t9");

        assert!(matches!(result, Err(NotificationError::NotFound { .. })));
        assert!(engine.get_subscriptions("ghost").is_empty());
        assert!(engine.validate_device_token("t9").is_err());
        assert_eq!(engine.tokens().len(), 0);
    }

    #[test]
    fn test_validate_token() {
        let (engine, _) = create_engine();
        engine.subscribe("u", "tokA", "news").unwrap();

        assert!(engine.validate_device_token("tokA").is_ok());
        assert!(matches!(
            engine.validate_device_token("unknown"),
            Err(NotificationError::InvalidToken)
        ));
    }

    #[test]
    fn test_validate_follows_token_update() {
        let (engine, _) = create_engine();
        engine.subscribe("u", "tokA", "news").unwrap();
        engine.update_device_token("u", "tokB").unwrap();

        assert!(engine.validate_device_token("tokB").is_ok());
        assert!(engine.validate_device_token("tokA").is_err());
    }

    #[test]
    fn test_reclaim_disabled_keeps_token_after_last_unsubscribe() {
        let transport = Arc::new(RecordingTransport::default());
        let engine = NotificationEngine::with_config(
            transport,
            RegistryConfig {
                reclaim_tokens_on_empty: false,
            },
        );
        engine.subscribe("u", "tokA", "news").unwrap();
        engine.unsubscribe("u", "news").unwrap();

        assert_eq!(engine.registry().user_count(), 0);
        assert!(engine.validate_device_token("tokA").is_ok());
    }

    #[test]
    fn test_stats_track_operations() {
        let (engine, _) = create_engine();
        engine.subscribe("u", "t1", "c1").unwrap();
        engine.subscribe("u", "t2", "c1").unwrap();
        engine.unsubscribe("u", "c1").unwrap();

        let stats = engine.stats();
        assert_eq!(stats.subscriptions_created, 2);
        assert_eq!(stats.subscriptions_removed, 2);
    }
}

// =============================================================================
// Notification Send Tests
// =============================================================================

mod send_tests {
    use super::*;

    #[tokio::test]
    async fn test_send_requires_matching_channel() {
        let (engine, transport) = create_engine();
        engine.subscribe("u", "tok-1", "news").unwrap();

        let miss = engine.send_notification("u", "hi", "alerts").await;
        assert!(matches!(miss, Err(NotificationError::NoSubscriptions { .. })));
        assert!(transport.deliveries().is_empty());

        let receipt = engine.send_notification("u", "hi", "news").await.unwrap();
        assert_eq!(receipt.matched_devices, 1);

        let deliveries = transport.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].id, receipt.delivery_id);
        assert_eq!(deliveries[0].user_id, "u");
        assert_eq!(deliveries[0].message, "hi");
        assert_eq!(deliveries[0].channel, "news");
        assert_eq!(deliveries[0].device_tokens, vec!["tok-1".to_string()]);
    }

    #[tokio::test]
    async fn test_send_unknown_user_and_unknown_channel_collapse() {
        let (engine, _) = create_engine();
        engine.subscribe("u", "tok-1", "news").unwrap();

        let unknown_user = engine
            .send_notification("ghost", "hi", "news")
            .await
            .unwrap_err();
        let unknown_channel = engine
            .send_notification("u", "hi", "alerts")
            .await
            .unwrap_err();

        assert_eq!(unknown_user.code(), unknown_channel.code());
        assert_eq!(unknown_user.to_string(), "No subscriptions found");
    }

    #[tokio::test]
    async fn test_send_one_handoff_for_many_devices() {
        let (engine, transport) = create_engine();
        engine.subscribe("u", "tok-1", "news").unwrap();
        engine.subscribe("u", "tok-2", "news").unwrap();
        engine.subscribe("u", "tok-3", "news").unwrap();

        let receipt = engine.send_notification("u", "hi", "news").await.unwrap();

        assert_eq!(receipt.matched_devices, 3);
        assert_eq!(transport.deliveries().len(), 1);
    }

    #[tokio::test]
    async fn test_send_uses_rewritten_tokens() {
        let (engine, transport) = create_engine();
        engine.subscribe("u", "old", "news").unwrap();
        engine.update_device_token("u", "new").unwrap();

        engine.send_notification("u", "hi", "news").await.unwrap();

        assert_eq!(transport.deliveries()[0].device_tokens, vec!["new".to_string()]);
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces() {
        let engine = NotificationEngine::new(Arc::new(RejectingTransport));
        engine.subscribe("u", "tok-1", "news").unwrap();

        let result = engine.send_notification("u", "hi", "news").await;

        assert!(matches!(result, Err(NotificationError::Transport(_))));
        assert_eq!(engine.stats().transport_failures, 1);
        // Subscription state is untouched by a failed handoff
        assert_eq!(engine.get_subscriptions("u").len(), 1);
    }
}

// =============================================================================
// Concurrency Tests
// =============================================================================

mod concurrency_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscribes_distinct_users() {
        let (engine, _) = create_engine();

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    let user = format!("user-{}", i);
                    let token = format!("tok-{}", i);
                    engine.subscribe(&user, &token, &format!("chan-{}-a", i))?;
                    engine.subscribe(&user, &token, &format!("chan-{}-b", i))
                })
            })
            .collect();

        for result in join_all(handles).await {
            assert!(result.unwrap().is_ok());
        }

        for i in 0..64 {
            let subs = engine.get_subscriptions(&format!("user-{}", i));
            let channels: Vec<_> = subs.iter().map(|s| s.channel.clone()).collect();
            assert_eq!(channels.len(), 2);
            assert!(channels.contains(&format!("chan-{}-a", i)));
            assert!(channels.contains(&format!("chan-{}-b", i)));
            assert!(subs.iter().all(|s| s.device_token == format!("tok-{}", i)));
        }
        assert_eq!(engine.registry().user_count(), 64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscribes_same_user_no_lost_updates() {
        let (engine, _) = create_engine();

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.subscribe("u", "tok", &format!("chan-{}", i)) })
            })
            .collect();

        for result in join_all(handles).await {
            assert!(result.unwrap().is_ok());
        }

        assert_eq!(engine.get_subscriptions("u").len(), 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_subscribes_accept_exactly_one() {
        let (engine, _) = create_engine();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.subscribe("u", "tok", "news") })
            })
            .collect();

        let accepted = join_all(handles)
            .await
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(()))))
            .count();

        assert_eq!(accepted, 1);
        assert_eq!(engine.get_subscriptions("u").len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_never_see_partial_token_update() {
        let (engine, _) = create_engine();
        for i in 0..10 {
            engine.subscribe("u", "tok-0", &format!("chan-{}", i)).unwrap();
        }

        let writer = {
            let engine = engine.clone();
            tokio::spawn(async move {
                for n in 1..=200 {
                    engine.update_device_token("u", &format!("tok-{}", n)).unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    for _ in 0..200 {
                        let subs = engine.get_subscriptions("u");
                        assert_eq!(subs.len(), 10);
                        let first = &subs[0].device_token;
                        assert!(subs.iter().all(|s| &s.device_token == first));
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        writer.await.unwrap();
        for reader in join_all(readers).await {
            reader.unwrap();
        }

        assert_eq!(engine.tokens().get("u").as_deref(), Some("tok-200"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sends_run_alongside_other_users_churn() {
        let (engine, transport) = create_engine();
        engine.subscribe("sender", "tok-s", "news").unwrap();

        let churn: Vec<_> = (0..32)
            .map(|i| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    let user = format!("churn-{}", i);
                    engine.subscribe(&user, "tok", "news").unwrap();
                    engine.unsubscribe(&user, "news").unwrap();
                })
            })
            .collect();

        let sends: Vec<_> = (0..32)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.send_notification("sender", "hi", "news").await })
            })
            .collect();

        for result in join_all(churn).await {
            result.unwrap();
        }
        for result in join_all(sends).await {
            assert_eq!(result.unwrap().unwrap().matched_devices, 1);
        }

        assert_eq!(transport.deliveries().len(), 32);
        assert_eq!(engine.registry().user_count(), 1);
        assert_eq!(engine.tokens().len(), 1);
    }
}
