//! Subscription and notification endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

use crate::error::Result;
use crate::server::AppState;

use super::models::{
    AckResponse, ChannelRequest, SendNotificationRequest, SendNotificationResponse,
    SubscribeRequest, SubscriptionsResponse, UpdateDeviceTokenRequest,
    ValidateDeviceTokenRequest,
};

/// POST /api/v1/notifications/subscribe
#[tracing::instrument(
    name = "http.subscribe",
    skip(state, request),
    fields(user_id = %request.user_id, channel = %request.channel)
)]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<AckResponse>> {
    request.validate()?;
    state
        .engine
        .subscribe(&request.user_id, &request.device_token, &request.channel)?;
    Ok(Json(AckResponse::ok("Subscription successful")))
}

/// POST /api/v1/notifications/unsubscribe
#[tracing::instrument(
    name = "http.unsubscribe",
    skip(state, request),
    fields(user_id = %request.user_id, channel = %request.channel)
)]
pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(request): Json<ChannelRequest>,
) -> Result<Json<AckResponse>> {
    request.validate()?;
    state.engine.unsubscribe(&request.user_id, &request.channel)?;
    Ok(Json(AckResponse::ok("Unsubscription successful")))
}

/// GET /api/v1/notifications/subscriptions/{user_id}
pub async fn get_subscriptions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<SubscriptionsResponse> {
    let subscriptions = state.engine.get_subscriptions(&user_id);
    Json(SubscriptionsResponse {
        user_id,
        count: subscriptions.len(),
        subscriptions,
    })
}

/// POST /api/v1/notifications/update-device-token
#[tracing::instrument(
    name = "http.update_device_token",
    skip(state, request),
    fields(user_id = %request.user_id)
)]
pub async fn update_device_token(
    State(state): State<AppState>,
    Json(request): Json<UpdateDeviceTokenRequest>,
) -> Result<Json<AckResponse>> {
    request.validate()?;
    state
        .engine
        .update_device_token(&request.user_id, &request.new_token)?;
    Ok(Json(AckResponse::ok("Device token updated successfully")))
}

/// POST /api/v1/notifications/validate-device-token
pub async fn validate_device_token(
    State(state): State<AppState>,
    Json(request): Json<ValidateDeviceTokenRequest>,
) -> Result<Json<AckResponse>> {
    request.validate()?;
    state.engine.validate_device_token(&request.device_token)?;
    Ok(Json(AckResponse::ok("Device token is valid")))
}

/// POST /api/v1/notifications/is-subscribed
pub async fn is_subscribed(
    State(state): State<AppState>,
    Json(request): Json<ChannelRequest>,
) -> Result<Json<AckResponse>> {
    request.validate()?;
    state.engine.is_subscribed(&request.user_id, &request.channel)?;
    Ok(Json(AckResponse::ok("User is subscribed to the channel")))
}

/// POST /api/v1/notifications/send-notification
#[tracing::instrument(
    name = "http.send_notification",
    skip(state, request),
    fields(user_id = %request.user_id, channel = %request.channel)
)]
pub async fn send_notification(
    State(state): State<AppState>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<Json<SendNotificationResponse>> {
    request.validate()?;
    let receipt = state
        .engine
        .send_notification(&request.user_id, &request.message, &request.channel)
        .await?;

    Ok(Json(SendNotificationResponse {
        success: true,
        delivery_id: receipt.delivery_id,
        matched_devices: receipt.matched_devices,
        timestamp: Utc::now(),
    }))
}
