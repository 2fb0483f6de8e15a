use thiserror::Error;

/// Why a lookup or removal found nothing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundReason {
    #[error("user has no subscriptions")]
    UnknownUser,

    #[error("user has no subscriptions on channel {0}")]
    NoMatchingChannel(String),

    #[error("user has no registered device token")]
    NoDeviceToken,
}

/// The device is already bound to the channel for this user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("device is already subscribed to this channel")]
pub struct AlreadySubscribed;
