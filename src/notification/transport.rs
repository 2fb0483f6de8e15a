//! Delivery transport abstraction.
//!
//! The engine hands each successful send to a `DeliveryTransport` exactly
//! once. What happens next (push gateway, WebSocket hub, ...) is the
//! transport's business; the engine only learns whether the handoff itself
//! was accepted.
//!
//! - `LogTransport`: records the handoff in the log (default)
//! - `ChannelTransport`: pushes onto a bounded queue drained by `DeliveryWorker`

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::DeliveryConfig;

/// One notification resolved to the devices it should reach
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryRequest {
    pub id: Uuid,
    pub user_id: String,
    pub message: String,
    pub channel: String,
    pub device_tokens: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl DeliveryRequest {
    pub fn new(user_id: &str, message: &str, channel: &str, device_tokens: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            message: message.to_string(),
            channel: channel.to_string(),
            device_tokens,
            created_at: Utc::now(),
        }
    }

    pub fn device_count(&self) -> usize {
        self.device_tokens.len()
    }
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("delivery queue is full")]
    Saturated,

    #[error("delivery queue is closed")]
    Closed,

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Accept a delivery. Returning `Ok` ends the engine's responsibility.
    async fn deliver(&self, request: DeliveryRequest) -> Result<(), TransportError>;
}

/// Writes each handoff to the log and reports success
#[derive(Debug, Default)]
pub struct LogTransport;

#[async_trait]
impl DeliveryTransport for LogTransport {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, request: DeliveryRequest) -> Result<(), TransportError> {
        tracing::info!(
            delivery_id = %request.id,
            user_id = %request.user_id,
            channel = %request.channel,
            devices = request.device_count(),
            message = %request.message,
            "Sending notification to devices"
        );
        Ok(())
    }
}

/// Hands deliveries to a bounded mpsc queue without waiting for capacity
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: mpsc::Sender<DeliveryRequest>,
}

impl ChannelTransport {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<DeliveryRequest>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl DeliveryTransport for ChannelTransport {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn deliver(&self, request: DeliveryRequest) -> Result<(), TransportError> {
        self.sender.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::Saturated,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

/// Create a delivery transport based on configuration.
///
/// - `"channel"`: a `ChannelTransport`; the matching receiver is returned so
///   the caller can start a `DeliveryWorker`
/// - `"log"` (default): a `LogTransport`
pub fn create_transport(
    settings: &DeliveryConfig,
) -> (
    Arc<dyn DeliveryTransport>,
    Option<mpsc::Receiver<DeliveryRequest>>,
) {
    match settings.transport.as_str() {
        "channel" => {
            tracing::info!(
                transport = "channel",
                capacity = settings.queue_capacity,
                "Creating channel delivery transport"
            );
            let (transport, receiver) = ChannelTransport::new(settings.queue_capacity);
            (Arc::new(transport), Some(receiver))
        }
        "log" => {
            tracing::info!(transport = "log", "Creating log delivery transport");
            (Arc::new(LogTransport), None)
        }
        other => {
            tracing::warn!(
                transport = %other,
                "Unknown delivery transport requested, falling back to log"
            );
            (Arc::new(LogTransport), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DeliveryRequest {
        DeliveryRequest::new("user-1", "hello", "news", vec!["tok-a".to_string()])
    }

    #[tokio::test]
    async fn test_log_transport_accepts() {
        assert!(LogTransport.deliver(request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_channel_transport_forwards() {
        let (transport, mut receiver) = ChannelTransport::new(4);
        let sent = request();
        let id = sent.id;

        transport.deliver(sent).await.unwrap();

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.id, id);
        assert_eq!(received.device_count(), 1);
    }

    #[tokio::test]
    async fn test_channel_transport_saturated() {
        let (transport, _receiver) = ChannelTransport::new(1);
        transport.deliver(request()).await.unwrap();

        let result = transport.deliver(request()).await;
        assert!(matches!(result, Err(TransportError::Saturated)));
    }

    #[tokio::test]
    async fn test_channel_transport_closed() {
        let (transport, receiver) = ChannelTransport::new(1);
        drop(receiver);

        let result = transport.deliver(request()).await;
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[test]
    fn test_factory_selects_backend() {
        let config = DeliveryConfig {
            transport: "channel".to_string(),
            queue_capacity: 8,
        };
        let (transport, receiver) = create_transport(&config);
        assert_eq!(transport.name(), "channel");
        assert!(receiver.is_some());

        let config = DeliveryConfig {
            transport: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        let (transport, receiver) = create_transport(&config);
        assert_eq!(transport.name(), "log");
        assert!(receiver.is_none());
    }
}
