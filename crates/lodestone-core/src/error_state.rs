//! The single user-facing error message shared by every flow.

use tokio::sync::RwLock;

/// Holds the most recent user-facing error, if any.
///
/// Flows write here at their own boundary; the latest write wins. The message
/// stays until the user dismisses it or a new authentication/search flow
/// starts.
#[derive(Debug, Default)]
pub struct ErrorState {
    message: RwLock<Option<String>>,
}

impl ErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%message, "error surfaced");
        *self.message.write().await = Some(message);
    }

    pub async fn clear(&self) {
        *self.message.write().await = None;
    }

    pub async fn current(&self) -> Option<String> {
        self.message.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_last_write_wins_and_clear() {
        let errors = ErrorState::new();
        assert_eq!(errors.current().await, None);

        errors.set("Failed to fetch files").await;
        errors.set("Search failed").await;
        assert_eq!(errors.current().await.as_deref(), Some("Search failed"));

        errors.clear().await;
        assert_eq!(errors.current().await, None);
    }
}
