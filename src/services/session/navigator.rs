use thiserror::Error;

#[derive(Debug, Error)]
#[error("navigation to {path} failed: {reason}")]
pub struct NavigationError {
    pub path: String,
    pub reason: String,
}

/// Moves the consumer to another view (used after logout).
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, path: &str) -> Result<(), NavigationError>;
}

/// Navigator for headless consumers: just records the intent in the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str) -> Result<(), NavigationError> {
        tracing::info!(path, "navigate");
        Ok(())
    }
}
