use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;

use super::error::{AlreadySubscribed, NotFoundReason};
use super::types::{RegistryStats, Subscription, TokenRewrite};

/// Per-user channel subscriptions.
///
/// Every mutation of a user's list runs under the DashMap entry guard for that
/// user, so concurrent writers for the same user are serialized while
/// different users only share a shard lock. The `*_with` variants run a hook
/// inside that same critical section; the engine uses them to keep the device
/// token store in step with the list. Hooks must not call back into the
/// registry.
pub struct SubscriptionRegistry {
    /// user_id -> subscriptions in insertion order (never empty)
    subscriptions: DashMap<String, Vec<Subscription>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            subscriptions: DashMap::new(),
        }
    }

    /// Snapshot of a user's subscriptions, empty for unknown users
    pub fn list_subscriptions(&self, user_id: &str) -> Vec<Subscription> {
        self.subscriptions
            .get(user_id)
            .map(|subs| subs.clone())
            .unwrap_or_default()
    }

    pub fn add_subscription(
        &self,
        user_id: &str,
        device_token: &str,
        channel: &str,
    ) -> Result<(), AlreadySubscribed> {
        self.add_subscription_with(user_id, device_token, channel, || ())
    }

    /// Append a subscription, running `before` first while the user's slot is held.
    ///
    /// `before` runs even when the add is then rejected as a duplicate.
    pub fn add_subscription_with(
        &self,
        user_id: &str,
        device_token: &str,
        channel: &str,
        before: impl FnOnce(),
    ) -> Result<(), AlreadySubscribed> {
        match self.subscriptions.entry(user_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                before();
                let subs = occupied.get_mut();
                if subs.iter().any(|s| s.matches(channel, device_token)) {
                    return Err(AlreadySubscribed);
                }
                subs.push(Subscription::new(user_id, device_token, channel));
            }
            Entry::Vacant(vacant) => {
                before();
                vacant.insert(vec![Subscription::new(user_id, device_token, channel)]);
            }
        }

        tracing::debug!(user_id = %user_id, channel = %channel, "Subscription added");
        Ok(())
    }

    pub fn remove_by_channel(&self, user_id: &str, channel: &str) -> Result<usize, NotFoundReason> {
        self.remove_by_channel_with(user_id, channel, || ())
    }

    /// Remove every subscription on `channel`, regardless of device.
    ///
    /// Returns the number of entries removed. When the list becomes empty the
    /// user's entry is dropped and `on_empty` runs before the slot is released.
    pub fn remove_by_channel_with(
        &self,
        user_id: &str,
        channel: &str,
        on_empty: impl FnOnce(),
    ) -> Result<usize, NotFoundReason> {
        let Entry::Occupied(mut occupied) = self.subscriptions.entry(user_id.to_string()) else {
            return Err(NotFoundReason::UnknownUser);
        };

        let subs = occupied.get_mut();
        let before = subs.len();
        subs.retain(|s| s.channel != channel);
        let removed = before - subs.len();

        if removed == 0 {
            return Err(NotFoundReason::NoMatchingChannel(channel.to_string()));
        }

        if subs.is_empty() {
            on_empty();
            occupied.remove();
            tracing::debug!(user_id = %user_id, "Last subscription removed, user entry reclaimed");
        }

        Ok(removed)
    }

    /// Replace the device token on every subscription of the user.
    ///
    /// Reports how many entries were updated and how many of those were then
    /// merged away; all zero for an unknown user.
    pub fn rewrite_token_for_user(&self, user_id: &str, new_token: &str) -> TokenRewrite {
        match self.rewrite_token_with(user_id, new_token, || Ok::<(), Infallible>(())) {
            Ok(rewrite) => rewrite,
            Err(never) => match never {},
        }
    }

    /// Run `commit` and, if it succeeds, rewrite the user's tokens, all under
    /// the user's slot. Nothing is rewritten when `commit` fails.
    ///
    /// Entries of one channel that collapse onto the same token are merged so
    /// that (channel, token) stays unique per user.
    pub fn rewrite_token_with<E>(
        &self,
        user_id: &str,
        new_token: &str,
        commit: impl FnOnce() -> Result<(), E>,
    ) -> Result<TokenRewrite, E> {
        match self.subscriptions.entry(user_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                commit()?;

                let subs = occupied.get_mut();
                for sub in subs.iter_mut() {
                    sub.device_token = new_token.to_string();
                }

                let updated = subs.len();
                let mut seen = HashSet::new();
                subs.retain(|s| seen.insert(s.channel.clone()));

                Ok(TokenRewrite {
                    updated,
                    merged: updated - subs.len(),
                })
            }
            Entry::Vacant(vacant) => {
                commit()?;
                drop(vacant);
                Ok(TokenRewrite::default())
            }
        }
    }

    pub fn is_subscribed(&self, user_id: &str, channel: &str) -> bool {
        self.subscriptions
            .get(user_id)
            .is_some_and(|subs| subs.iter().any(|s| s.channel == channel))
    }

    /// Device tokens subscribed to `channel`, in insertion order.
    ///
    /// `None` when the user has no subscriptions at all.
    pub fn matching_tokens(&self, user_id: &str, channel: &str) -> Option<Vec<String>> {
        self.subscriptions.get(user_id).map(|subs| {
            subs.iter()
                .filter(|s| s.channel == channel)
                .map(|s| s.device_token.clone())
                .collect()
        })
    }

    /// Number of users with at least one subscription
    pub fn user_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn stats(&self) -> RegistryStats {
        let mut channels: HashMap<String, usize> = HashMap::new();
        let mut total_subscriptions = 0;

        for entry in self.subscriptions.iter() {
            total_subscriptions += entry.value().len();
            for sub in entry.value() {
                *channels.entry(sub.channel.clone()).or_default() += 1;
            }
        }

        RegistryStats {
            users: self.subscriptions.len(),
            total_subscriptions,
            channels,
        }
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
