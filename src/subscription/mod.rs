//! In-memory subscription state.
//!
//! Two independently synchronized stores keyed by user id:
//! - `SubscriptionRegistry`: the user's channel subscriptions
//! - `DeviceTokenStore`: the user's current device token
//!
//! Neither store knows about the other; `NotificationEngine` keeps them
//! consistent.

mod error;
mod registry;
mod token_store;
mod types;

pub use error::{AlreadySubscribed, NotFoundReason};
pub use registry::SubscriptionRegistry;
pub use token_store::DeviceTokenStore;
pub use types::{RegistryStats, Subscription, TokenRewrite};
