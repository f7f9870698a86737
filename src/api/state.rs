use std::sync::Arc;
use std::time::Duration;

use crate::{
    db::Store,
    services::{AuthSettings, MovieProvider},
};

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub movie_provider: Arc<dyn MovieProvider>,
    pub auth: AuthSettings,
    /// Upper bound on each external metadata lookup
    pub metadata_timeout: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        movie_provider: Arc<dyn MovieProvider>,
        auth: AuthSettings,
        metadata_timeout: Duration,
    ) -> Self {
        Self {
            store,
            movie_provider,
            auth,
            metadata_timeout,
        }
    }
}
