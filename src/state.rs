use std::sync::Arc;

use crate::config::Config;
use crate::services::dispatcher::NotificationDispatcher;
use crate::websocket::ConnectionRegistry;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: ConnectionRegistry,
    pub dispatcher: Arc<NotificationDispatcher>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let registry = ConnectionRegistry::new();
        let dispatcher = Arc::new(NotificationDispatcher::new(Arc::new(registry.clone())));
        Self {
            config,
            registry,
            dispatcher,
        }
    }
}
