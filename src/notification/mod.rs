//! Subscription-aware notification engine and its delivery transports.

mod engine;
mod error;
mod transport;

pub use engine::{EngineStats, EngineStatsSnapshot, NotificationEngine, SendReceipt};
pub use error::NotificationError;
pub use transport::{
    create_transport, ChannelTransport, DeliveryRequest, DeliveryTransport, LogTransport,
    TransportError,
};
