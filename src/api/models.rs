//! Request and response models for the subscription HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::subscription::Subscription;

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Register a device for a channel
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub user_id: String,
    pub device_token: String,
    pub channel: String,
}

impl SubscribeRequest {
    pub fn validate(&self) -> Result<()> {
        require("user_id", &self.user_id)?;
        require("device_token", &self.device_token)?;
        require("channel", &self.channel)
    }
}

/// Identifies a (user, channel) pair; used by unsubscribe and is-subscribed
#[derive(Debug, Deserialize)]
pub struct ChannelRequest {
    pub user_id: String,
    pub channel: String,
}

impl ChannelRequest {
    pub fn validate(&self) -> Result<()> {
        require("user_id", &self.user_id)?;
        require("channel", &self.channel)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateDeviceTokenRequest {
    pub user_id: String,
    pub new_token: String,
}

impl UpdateDeviceTokenRequest {
    pub fn validate(&self) -> Result<()> {
        require("user_id", &self.user_id)?;
        require("new_token", &self.new_token)
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateDeviceTokenRequest {
    pub device_token: String,
}

impl ValidateDeviceTokenRequest {
    pub fn validate(&self) -> Result<()> {
        require("device_token", &self.device_token)
    }
}

#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    pub user_id: String,
    pub message: String,
    pub channel: String,
}

impl SendNotificationRequest {
    pub fn validate(&self) -> Result<()> {
        require("user_id", &self.user_id)?;
        require("message", &self.message)?;
        require("channel", &self.channel)
    }
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

impl AckResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionsResponse {
    pub user_id: String,
    pub count: usize,
    pub subscriptions: Vec<Subscription>,
}

#[derive(Debug, Serialize)]
pub struct SendNotificationResponse {
    pub success: bool,
    pub delivery_id: Uuid,
    /// Number of devices the notification was handed off for
    pub matched_devices: usize,
    pub timestamp: DateTime<Utc>,
}
