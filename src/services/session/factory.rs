/// Factory: build the `SessionController` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::services::api::HttpUserApi;
use crate::services::session::{LogNavigator, SessionController};
use crate::services::storage::KeyValueStore;

pub fn build_session(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
) -> Result<SessionController, AppError> {
    let api = HttpUserApi::new(config.api_base_url.clone())?;

    tracing::debug!(
        api = %config.api_base_url,
        storage = store.backend_name(),
        "building session controller"
    );

    Ok(SessionController::new(
        store,
        Arc::new(api),
        Arc::new(LogNavigator),
        config.landing_path.clone(),
    ))
}
