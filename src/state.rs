//! Application state shared by every page service

use std::sync::Arc;

use crate::cache::ResourceCache;
use crate::client::ResourceClient;
use crate::config::Config;
use crate::domain::ApiError;
use crate::form::FormController;
use crate::notify::{LogNavigator, LogNotifier, Navigator, Notifier};

#[derive(Clone)]
pub struct AppState {
    /// Process-wide read cache (wraps the resource client)
    pub cache: ResourceCache,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
}

impl AppState {
    /// Wire the reqwest client with log-backed collaborators
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = ResourceClient::new(config)?;
        Ok(Self::with_collaborators(
            ResourceCache::new(client),
            Arc::new(LogNotifier),
            Arc::new(LogNavigator),
        ))
    }

    pub fn with_collaborators(
        cache: ResourceCache,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            cache,
            notifier,
            navigator,
        }
    }

    pub fn client(&self) -> &ResourceClient {
        self.cache.client()
    }

    /// A fresh controller, one per form
    pub fn form_controller(&self) -> FormController {
        FormController::new(
            self.cache.clone(),
            Arc::clone(&self.notifier),
            Arc::clone(&self.navigator),
        )
    }
}
