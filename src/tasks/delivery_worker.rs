use tokio::sync::{broadcast, mpsc};

use crate::metrics::DeliveryMetrics;
use crate::notification::DeliveryRequest;

/// Background task draining the channel transport's handoff queue
pub struct DeliveryWorker {
    receiver: mpsc::Receiver<DeliveryRequest>,
    shutdown: broadcast::Receiver<()>,
}

impl DeliveryWorker {
    pub fn new(
        receiver: mpsc::Receiver<DeliveryRequest>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self { receiver, shutdown }
    }

    /// Run until shutdown is signalled or every sender is gone.
    ///
    /// Returns the number of deliveries handled.
    pub async fn run(mut self) -> u64 {
        tracing::info!("Delivery worker started");
        let mut handled = 0u64;

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Delivery worker received shutdown signal");
                    break;
                }
                request = self.receiver.recv() => {
                    match request {
                        Some(request) => {
                            Self::handle(&request);
                            handled += 1;
                        }
                        None => {
                            tracing::info!("Delivery queue closed");
                            break;
                        }
                    }
                }
            }
        }

        // Flush what was already accepted before stopping
        self.receiver.close();
        while let Ok(request) = self.receiver.try_recv() {
            Self::handle(&request);
            handled += 1;
        }

        tracing::info!(handled = handled, "Delivery worker stopped");
        handled
    }

    fn handle(request: &DeliveryRequest) {
        tracing::info!(
            delivery_id = %request.id,
            user_id = %request.user_id,
            channel = %request.channel,
            devices = request.device_count(),
            "Delivering notification"
        );
        DeliveryMetrics::record_handled();
    }
}
