//! Shared application state.

use std::sync::Arc;

use rankd_core::Config;
use rankd_store::{Registry, Store};

/// State handed to every request handler and the settlement scheduler.
///
/// The store client is created once at startup and passed in explicitly;
/// nothing in the service reaches for a global connection.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub registry: Registry,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        let registry = Registry::new(store.clone());
        Self {
            config,
            store,
            registry,
        }
    }
}
