//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::subscription::RegistryStats;

use super::{
    CHANNEL_SUBSCRIPTIONS, DELIVERIES_HANDLED_TOTAL, DEVICE_TOKENS, NOTIFICATIONS_SENT_TOTAL,
    NOTIFICATION_DEVICES_MATCHED, SUBSCRIBE_TOTAL, SUBSCRIPTIONS_ACTIVE,
    SUBSCRIPTIONS_MERGED_TOTAL, TOKEN_UPDATES_TOTAL, UNSUBSCRIBE_TOTAL, USERS_SUBSCRIBED,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording subscription lifecycle metrics
pub struct SubscriptionMetrics;

impl SubscriptionMetrics {
    pub fn record_subscribe(outcome: &str) {
        SUBSCRIBE_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn record_unsubscribe(outcome: &str) {
        UNSUBSCRIBE_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn record_token_update(outcome: &str) {
        TOKEN_UPDATES_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn record_merged(count: usize) {
        SUBSCRIPTIONS_MERGED_TOTAL.inc_by(count as u64);
    }

    /// Refresh registry gauges from a stats snapshot
    pub fn set_registry_gauges(stats: &RegistryStats, device_tokens: usize) {
        USERS_SUBSCRIBED.set(stats.users as i64);
        SUBSCRIPTIONS_ACTIVE.set(stats.total_subscriptions as i64);
        DEVICE_TOKENS.set(device_tokens as i64);

        // Channels that emptied out since the last scrape must not keep a stale value
        CHANNEL_SUBSCRIPTIONS.reset();
        for (channel, count) in &stats.channels {
            CHANNEL_SUBSCRIPTIONS
                .with_label_values(&[channel.as_str()])
                .set(*count as i64);
        }
    }
}

/// Helper struct for recording notification send metrics
pub struct NotificationMetrics;

impl NotificationMetrics {
    pub fn record_sent(matched_devices: usize) {
        NOTIFICATIONS_SENT_TOTAL.with_label_values(&["sent"]).inc();
        NOTIFICATION_DEVICES_MATCHED.observe(matched_devices as f64);
    }

    pub fn record_no_subscriptions() {
        NOTIFICATIONS_SENT_TOTAL
            .with_label_values(&["no_subscriptions"])
            .inc();
    }

    pub fn record_transport_error() {
        NOTIFICATIONS_SENT_TOTAL
            .with_label_values(&["transport_error"])
            .inc();
    }
}

/// Helper struct for recording delivery worker metrics
pub struct DeliveryMetrics;

impl DeliveryMetrics {
    pub fn record_handled() {
        DELIVERIES_HANDLED_TOTAL.inc();
    }
}
