// Shared components
pub mod config;
pub mod error;
pub mod metrics;

// Domain layer (business logic)
pub mod notification;
pub mod subscription;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod tasks;
pub mod telemetry;
