use std::sync::Arc;

use crate::config::Settings;
use crate::notification::{DeliveryTransport, NotificationEngine};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub engine: Arc<NotificationEngine>,
}

impl AppState {
    pub fn new(settings: Settings, transport: Arc<dyn DeliveryTransport>) -> Self {
        let engine = Arc::new(NotificationEngine::with_config(
            transport,
            settings.registry.clone(),
        ));

        Self {
            settings: Arc::new(settings),
            engine,
        }
    }
}
