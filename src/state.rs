use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::services::Services;

/// Shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<Services>,
    /// Present only with the PostgreSQL backend
    pub database: Option<DatabaseManager>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, services: Services, database: Option<DatabaseManager>) -> Self {
        Self {
            config,
            services: Arc::new(services),
            database,
        }
    }
}
