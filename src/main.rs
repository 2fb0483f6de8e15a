use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;

use pulsehub_notification_service::config::Settings;
use pulsehub_notification_service::notification::create_transport;
use pulsehub_notification_service::server::{create_app, AppState};
use pulsehub_notification_service::tasks::DeliveryWorker;
use pulsehub_notification_service::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing (guard flushes spans on exit)
    let _telemetry = init_telemetry(&settings.telemetry)?;
    tracing::info!("Configuration loaded");

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Delivery transport; the channel backend needs a worker draining it
    let (transport, delivery_rx) = create_transport(&settings.delivery);
    let worker_handle = delivery_rx.map(|receiver| {
        let worker = DeliveryWorker::new(receiver, shutdown_tx.subscribe());
        tokio::spawn(worker.run())
    });

    let state = AppState::new(settings.clone(), transport);
    tracing::info!(
        transport = state.engine.transport_name(),
        reclaim_tokens_on_empty = settings.registry.reclaim_tokens_on_empty,
        "Notification engine initialized"
    );

    let app = create_app(state);

    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler(shutdown_tx))
        .await?;

    if let Some(handle) = worker_handle {
        tracing::info!("Waiting for delivery worker to finish...");
        match handle.await {
            Ok(handled) => tracing::info!(handled = handled, "Delivery worker finished"),
            Err(e) => tracing::error!(error = %e, "Delivery worker panicked"),
        }
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }

    // Stop background tasks
    let _ = shutdown_tx.send(());
}
