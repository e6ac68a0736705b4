//! Shared application state handed to every handler.

use std::sync::Arc;

use godown_db::Database;

use crate::config::ApiConfig;

/// Shared application state.
///
/// Cloned per request; the pool and config are shared.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}
