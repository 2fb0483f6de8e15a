use thiserror::Error;

use crate::subscription::NotFoundReason;

use super::transport::TransportError;

/// Failure kinds returned by `NotificationEngine` operations.
///
/// Missing users and duplicate subscriptions are ordinary outcomes reported
/// through these variants; none of them is raised as a panic.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Already subscribed to channel {channel} with this device")]
    AlreadySubscribed { user_id: String, channel: String },

    /// `reason` is kept for diagnostics; callers see a single NotFound kind
    #[error("Not found for user {user_id}: {reason}")]
    NotFound {
        user_id: String,
        reason: NotFoundReason,
    },

    #[error("No subscriptions found")]
    NoSubscriptions { user_id: String, channel: String },

    #[error("Invalid device token")]
    InvalidToken,

    #[error("User {user_id} is not subscribed to channel {channel}")]
    NotSubscribed { user_id: String, channel: String },

    #[error("Delivery transport unavailable: {0}")]
    Transport(#[from] TransportError),
}

impl NotificationError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadySubscribed { .. } => "ALREADY_SUBSCRIBED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::NoSubscriptions { .. } => "NO_SUBSCRIPTIONS",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::NotSubscribed { .. } => "NOT_SUBSCRIBED",
            Self::Transport(_) => "TRANSPORT_ERROR",
        }
    }

    /// Human-readable explanation of why the operation failed
    pub fn description(&self) -> &'static str {
        match self {
            Self::AlreadySubscribed { .. } => {
                "Subscription request failed because the device is already subscribed to the channel."
            }
            Self::NotFound { reason, .. } => match reason {
                NotFoundReason::UnknownUser => {
                    "Unsubscription failed because the user has no subscriptions."
                }
                NotFoundReason::NoMatchingChannel(_) => {
                    "Unsubscription failed because no subscriptions exist for the specified channel."
                }
                NotFoundReason::NoDeviceToken => {
                    "Update failed because no device token is associated with the user."
                }
            },
            Self::NoSubscriptions { .. } => "No subscriptions found for user.",
            Self::InvalidToken => {
                "The provided device token does not match any existing tokens."
            }
            Self::NotSubscribed { .. } => {
                "The subscription could not be validated because the user is not subscribed to the specified channel."
            }
            Self::Transport(_) => "The notification could not be handed off for delivery.",
        }
    }
}
