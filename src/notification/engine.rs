use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::config::RegistryConfig;
use crate::metrics::{NotificationMetrics, SubscriptionMetrics};
use crate::subscription::{
    AlreadySubscribed, DeviceTokenStore, RegistryStats, Subscription, SubscriptionRegistry,
    TokenRewrite,
};

use super::error::NotificationError;
use super::transport::{DeliveryRequest, DeliveryTransport};

/// Outcome of a notification handed to the transport
#[derive(Debug, Clone, Serialize)]
pub struct SendReceipt {
    pub delivery_id: Uuid,
    pub matched_devices: usize,
}

/// Statistics for the notification engine
#[derive(Debug, Default)]
pub struct EngineStats {
    pub subscriptions_created: AtomicU64,
    pub subscriptions_removed: AtomicU64,
    pub token_updates: AtomicU64,
    pub notifications_sent: AtomicU64,
    pub notifications_rejected: AtomicU64,
    pub transport_failures: AtomicU64,
}

impl EngineStats {
    pub fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            subscriptions_created: self.subscriptions_created.load(Ordering::Relaxed),
            subscriptions_removed: self.subscriptions_removed.load(Ordering::Relaxed),
            token_updates: self.token_updates.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            notifications_rejected: self.notifications_rejected.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of engine statistics
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatsSnapshot {
    pub subscriptions_created: u64,
    pub subscriptions_removed: u64,
    pub token_updates: u64,
    pub notifications_sent: u64,
    pub notifications_rejected: u64,
    pub transport_failures: u64,
}

/// Keeps the subscription registry and device token store consistent and
/// fans notifications out to the delivery transport.
///
/// Whenever both stores are touched, the user's registry slot is taken first
/// and the token store second; nothing takes them in the opposite order.
/// `update_device_token` therefore looks atomic to `get_subscriptions`
/// readers. `validate_device_token` reads the token store alone and may see
/// a new token a moment before the user's subscriptions carry it.
pub struct NotificationEngine {
    registry: SubscriptionRegistry,
    tokens: DeviceTokenStore,
    transport: Arc<dyn DeliveryTransport>,
    config: RegistryConfig,
    stats: EngineStats,
}

impl NotificationEngine {
    pub fn new(transport: Arc<dyn DeliveryTransport>) -> Self {
        Self::with_config(transport, RegistryConfig::default())
    }

    pub fn with_config(transport: Arc<dyn DeliveryTransport>, config: RegistryConfig) -> Self {
        Self {
            registry: SubscriptionRegistry::new(),
            tokens: DeviceTokenStore::new(),
            transport,
            config,
            stats: EngineStats::default(),
        }
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn tokens(&self) -> &DeviceTokenStore {
        &self.tokens
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    pub fn stats(&self) -> EngineStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn registry_stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// Subscribe a device to a channel.
    ///
    /// The user's device token is seeded before the duplicate check, so a
    /// rejected duplicate still leaves the user with a recorded token.
    #[tracing::instrument(name = "engine.subscribe", skip(self, device_token))]
    pub fn subscribe(
        &self,
        user_id: &str,
        device_token: &str,
        channel: &str,
    ) -> Result<(), NotificationError> {
        let result = self
            .registry
            .add_subscription_with(user_id, device_token, channel, || {
                if self.tokens.seed_if_absent(user_id, device_token) {
                    tracing::debug!(user_id = %user_id, "Device token recorded");
                }
            });

        match result {
            Ok(()) => {
                self.stats
                    .subscriptions_created
                    .fetch_add(1, Ordering::Relaxed);
                SubscriptionMetrics::record_subscribe("created");
                tracing::info!(user_id = %user_id, channel = %channel, "Subscribed");
                Ok(())
            }
            Err(AlreadySubscribed) => {
                SubscriptionMetrics::record_subscribe("already_subscribed");
                tracing::debug!(
                    user_id = %user_id,
                    channel = %channel,
                    "Duplicate subscription rejected"
                );
                Err(NotificationError::AlreadySubscribed {
                    user_id: user_id.to_string(),
                    channel: channel.to_string(),
                })
            }
        }
    }

    /// Remove every subscription the user holds on `channel`
    #[tracing::instrument(name = "engine.unsubscribe", skip(self))]
    pub fn unsubscribe(&self, user_id: &str, channel: &str) -> Result<(), NotificationError> {
        let reclaim = self.config.reclaim_tokens_on_empty;
        let result = self.registry.remove_by_channel_with(user_id, channel, || {
            if reclaim && self.tokens.remove(user_id).is_some() {
                tracing::debug!(user_id = %user_id, "Device token reclaimed");
            }
        });

        match result {
            Ok(removed) => {
                self.stats
                    .subscriptions_removed
                    .fetch_add(removed as u64, Ordering::Relaxed);
                SubscriptionMetrics::record_unsubscribe("removed");
                tracing::info!(
                    user_id = %user_id,
                    channel = %channel,
                    removed = removed,
                    "Unsubscribed"
                );
                Ok(())
            }
            Err(reason) => {
                SubscriptionMetrics::record_unsubscribe("not_found");
                tracing::debug!(user_id = %user_id, reason = %reason, "Unsubscribe found nothing");
                Err(NotificationError::NotFound {
                    user_id: user_id.to_string(),
                    reason,
                })
            }
        }
    }

    /// Replace the user's device token and rewrite it onto every subscription.
    ///
    /// Subscriptions of one channel that end up on the same token are merged
    /// and counted as removed. Fails without side effects when the user has no
    /// recorded token.
    #[tracing::instrument(name = "engine.update_device_token", skip(self, new_token))]
    pub fn update_device_token(
        &self,
        user_id: &str,
        new_token: &str,
    ) -> Result<TokenRewrite, NotificationError> {
        let result = self
            .registry
            .rewrite_token_with(user_id, new_token, || self.tokens.update(user_id, new_token));

        match result {
            Ok(rewrite) => {
                self.stats.token_updates.fetch_add(1, Ordering::Relaxed);
                SubscriptionMetrics::record_token_update("updated");
                if rewrite.merged > 0 {
                    self.stats
                        .subscriptions_removed
                        .fetch_add(rewrite.merged as u64, Ordering::Relaxed);
                    SubscriptionMetrics::record_merged(rewrite.merged);
                }
                tracing::info!(
                    user_id = %user_id,
                    updated = rewrite.updated,
                    merged = rewrite.merged,
                    "Device token updated"
                );
                Ok(rewrite)
            }
            Err(reason) => {
                SubscriptionMetrics::record_token_update("not_found");
                Err(NotificationError::NotFound {
                    user_id: user_id.to_string(),
                    reason,
                })
            }
        }
    }

    /// Succeeds if any user currently holds `token`
    pub fn validate_device_token(&self, token: &str) -> Result<(), NotificationError> {
        if self.tokens.token_exists(token) {
            Ok(())
        } else {
            Err(NotificationError::InvalidToken)
        }
    }

    pub fn is_subscribed(&self, user_id: &str, channel: &str) -> Result<(), NotificationError> {
        if self.registry.is_subscribed(user_id, channel) {
            Ok(())
        } else {
            Err(NotificationError::NotSubscribed {
                user_id: user_id.to_string(),
                channel: channel.to_string(),
            })
        }
    }

    pub fn get_subscriptions(&self, user_id: &str) -> Vec<Subscription> {
        self.registry.list_subscriptions(user_id)
    }

    /// Resolve the user's devices on `channel` and hand them to the transport once.
    ///
    /// The device list is copied out before the transport is awaited, so no
    /// registry lock is held during delivery.
    #[tracing::instrument(name = "engine.send_notification", skip(self, message))]
    pub async fn send_notification(
        &self,
        user_id: &str,
        message: &str,
        channel: &str,
    ) -> Result<SendReceipt, NotificationError> {
        let device_tokens = match self.registry.matching_tokens(user_id, channel) {
            Some(tokens) if !tokens.is_empty() => tokens,
            _ => {
                self.stats
                    .notifications_rejected
                    .fetch_add(1, Ordering::Relaxed);
                NotificationMetrics::record_no_subscriptions();
                tracing::debug!(
                    user_id = %user_id,
                    channel = %channel,
                    "No subscriptions to notify"
                );
                return Err(NotificationError::NoSubscriptions {
                    user_id: user_id.to_string(),
                    channel: channel.to_string(),
                });
            }
        };

        let request = DeliveryRequest::new(user_id, message, channel, device_tokens);
        let receipt = SendReceipt {
            delivery_id: request.id,
            matched_devices: request.device_count(),
        };

        if let Err(e) = self.transport.deliver(request).await {
            self.stats.transport_failures.fetch_add(1, Ordering::Relaxed);
            NotificationMetrics::record_transport_error();
            tracing::warn!(
                user_id = %user_id,
                channel = %channel,
                transport = self.transport.name(),
                error = %e,
                "Delivery transport rejected notification"
            );
            return Err(e.into());
        }

        self.stats.notifications_sent.fetch_add(1, Ordering::Relaxed);
        NotificationMetrics::record_sent(receipt.matched_devices);
        tracing::debug!(
            user_id = %user_id,
            channel = %channel,
            delivery_id = %receipt.delivery_id,
            matched_devices = receipt.matched_devices,
            "Notification handed to transport"
        );

        Ok(receipt)
    }
}
