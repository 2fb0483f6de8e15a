use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::health::{health, stats};
use super::metrics::prometheus_metrics;
use super::subscriptions::{
    get_subscriptions, is_subscribed, send_notification, subscribe, unsubscribe,
    update_device_token, validate_device_token,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health, Stats & Metrics
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api/v1/notifications",
            Router::new()
                .route("/subscribe", post(subscribe))
                .route("/unsubscribe", post(unsubscribe))
                .route("/subscriptions/{user_id}", get(get_subscriptions))
                .route("/update-device-token", post(update_device_token))
                .route("/validate-device-token", post(validate_device_token))
                .route("/is-subscribed", post(is_subscribed))
                .route("/send-notification", post(send_notification)),
        )
}
