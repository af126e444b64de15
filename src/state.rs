use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Store;
use crate::realtime::RoomHub;
use crate::services::ai::AiAssistant;
use crate::services::notifications::NotificationService;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    pub hub: RoomHub,
    pub ai: AiAssistant,
}

impl AppState {
    /// Fresh state with an empty store and the assistant configured from `config`
    pub fn new(config: AppConfig) -> Self {
        let ai = AiAssistant::from_config(&config.ai);
        Self {
            config: Arc::new(config),
            store: Store::new(),
            hub: RoomHub::new(),
            ai,
        }
    }

    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.store.clone(), self.hub.clone())
    }
}
