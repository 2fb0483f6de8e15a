//! Subscription records and registry statistics

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// One (user, device, channel) binding.
///
/// `device_token` is a copy of the user's current token taken at subscribe
/// time; it is rewritten in place when the user's token changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    pub user_id: String,
    pub device_token: String,
    pub channel: String,
    pub subscribed_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(user_id: &str, device_token: &str, channel: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            device_token: device_token.to_string(),
            channel: channel.to_string(),
            subscribed_at: Utc::now(),
        }
    }

    /// True when this entry binds `device_token` to `channel`
    pub fn matches(&self, channel: &str, device_token: &str) -> bool {
        self.channel == channel && self.device_token == device_token
    }
}

/// Outcome of rewriting a user's device token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenRewrite {
    /// Entries that now carry the new token, before merging
    pub updated: usize,
    /// Entries dropped because they collapsed onto another entry of the same channel
    pub merged: usize,
}

impl TokenRewrite {
    /// Subscriptions the user holds after the rewrite
    pub fn remaining(&self) -> usize {
        self.updated - self.merged
    }
}

/// Registry statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistryStats {
    pub users: usize,
    pub total_subscriptions: usize,
    /// channel -> number of subscriptions across all users
    pub channels: HashMap<String, usize>,
}
