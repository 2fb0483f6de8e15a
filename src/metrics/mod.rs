//! Prometheus metrics for the notification service.
//!
//! - Registry gauges (subscribed users, active subscriptions, per-channel counts)
//! - Operation outcome counters (subscribe, unsubscribe, token update, send)
//! - Subscriptions merged away by token updates
//! - Fan-out size of sent notifications
//! - Deliveries drained by the background worker

mod helpers;

pub use helpers::{encode_metrics, DeliveryMetrics, NotificationMetrics, SubscriptionMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    register_int_gauge_vec, Histogram, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "pulsehub";

lazy_static! {
    // ============================================================================
    // Registry Metrics
    // ============================================================================

    /// Number of users holding at least one subscription
    pub static ref USERS_SUBSCRIBED: IntGauge = register_int_gauge!(
        format!("{}_users_subscribed", METRIC_PREFIX),
        "Number of users with at least one subscription"
    ).unwrap();

    /// Total active subscriptions across all users
    pub static ref SUBSCRIPTIONS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_subscriptions_active", METRIC_PREFIX),
        "Total number of active subscriptions"
    ).unwrap();

    /// Active subscriptions per channel
    pub static ref CHANNEL_SUBSCRIPTIONS: IntGaugeVec = register_int_gauge_vec!(
        format!("{}_channel_subscriptions", METRIC_PREFIX),
        "Number of subscriptions per channel",
        &["channel"]
    ).unwrap();

    /// Users with a registered device token
    pub static ref DEVICE_TOKENS: IntGauge = register_int_gauge!(
        format!("{}_device_tokens", METRIC_PREFIX),
        "Number of users with a registered device token"
    ).unwrap();

    // ============================================================================
    // Operation Metrics
    // ============================================================================

    pub static ref SUBSCRIBE_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_subscribe_total", METRIC_PREFIX),
        "Subscribe requests by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref UNSUBSCRIBE_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_unsubscribe_total", METRIC_PREFIX),
        "Unsubscribe requests by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref TOKEN_UPDATES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_token_updates_total", METRIC_PREFIX),
        "Device token updates by outcome",
        &["outcome"]
    ).unwrap();

    /// Subscriptions dropped because a token update collapsed them onto another entry
    pub static ref SUBSCRIPTIONS_MERGED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_subscriptions_merged_total", METRIC_PREFIX),
        "Subscriptions merged away by device token updates"
    ).unwrap();

    pub static ref NOTIFICATIONS_SENT_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_sent_total", METRIC_PREFIX),
        "Send requests by outcome",
        &["outcome"]
    ).unwrap();

    /// Devices matched per handed-off notification
    pub static ref NOTIFICATION_DEVICES_MATCHED: Histogram = register_histogram!(
        format!("{}_notification_devices_matched", METRIC_PREFIX),
        "Distribution of matched devices per notification",
        vec![1.0, 2.0, 3.0, 5.0, 10.0, 25.0]
    ).unwrap();

    // ============================================================================
    // Delivery Metrics
    // ============================================================================

    pub static ref DELIVERIES_HANDLED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_deliveries_handled_total", METRIC_PREFIX),
        "Total deliveries drained from the handoff queue"
    ).unwrap();
}
