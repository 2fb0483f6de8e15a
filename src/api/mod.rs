//! API layer - HTTP endpoint handlers.

mod health;
mod metrics;
mod models;
mod routes;
mod subscriptions;

pub use health::{health, stats, HealthResponse, StatsResponse};
pub use metrics::prometheus_metrics;
pub use models::{
    AckResponse, ChannelRequest, SendNotificationRequest, SendNotificationResponse,
    SubscribeRequest, SubscriptionsResponse, UpdateDeviceTokenRequest,
    ValidateDeviceTokenRequest,
};
pub use routes::api_routes;
pub use subscriptions::{
    get_subscriptions, is_subscribed, send_notification, subscribe, unsubscribe,
    update_device_token, validate_device_token,
};
