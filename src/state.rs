/*
 * Responsibility
 * - Shared context handed to consumers (AppState)
 *   - config + the one SessionController of this process
 * - Clone is cheap (Arc inside)
 */
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::services::session::{SessionController, build_session};
use crate::services::storage::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: FileStore,
    pub session: SessionController,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let store = FileStore::open(&config.storage_dir)?;
        let session = build_session(&config, Arc::new(store.clone()))?;

        Ok(Self {
            config: Arc::new(config),
            store,
            session,
        })
    }
}
