use dashmap::DashMap;

use super::error::NotFoundReason;

/// Current device token per user (one active token, no history)
pub struct DeviceTokenStore {
    /// user_id -> device token
    tokens: DashMap<String, String>,
}

impl DeviceTokenStore {
    pub fn new() -> Self {
        Self {
            tokens: DashMap::new(),
        }
    }

    pub fn has_token(&self, user_id: &str) -> bool {
        self.tokens.contains_key(user_id)
    }

    pub fn get(&self, user_id: &str) -> Option<String> {
        self.tokens.get(user_id).map(|t| t.clone())
    }

    /// Record `token` only if the user has none yet. Returns true if it was recorded.
    pub fn seed_if_absent(&self, user_id: &str, token: &str) -> bool {
        let mut seeded = false;
        self.tokens.entry(user_id.to_string()).or_insert_with(|| {
            seeded = true;
            token.to_string()
        });
        seeded
    }

    /// Replace the user's token; the user must already have one
    pub fn update(&self, user_id: &str, new_token: &str) -> Result<(), NotFoundReason> {
        let mut current = self
            .tokens
            .get_mut(user_id)
            .ok_or(NotFoundReason::NoDeviceToken)?;
        *current = new_token.to_string();
        Ok(())
    }

    /// True if any user currently holds exactly this token
    pub fn token_exists(&self, token: &str) -> bool {
        self.tokens.iter().any(|entry| entry.value() == token)
    }

    pub fn remove(&self, user_id: &str) -> Option<String> {
        self.tokens.remove(user_id).map(|(_, token)| token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Default for DeviceTokenStore {
    fn default() -> Self {
        Self::new()
    }
}
