use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::store::EventStore;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<RwLock<EventStore>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = EventStore::new(config.storage.max_events);

        Self {
            config: Arc::new(config),
            store: Arc::new(RwLock::new(store)),
        }
    }
}
