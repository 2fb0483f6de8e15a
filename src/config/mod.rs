mod settings;

pub use settings::{DeliveryConfig, RegistryConfig, ServerConfig, Settings, TelemetryConfig};
