//! Credential persistence trait.

use async_trait::async_trait;
use std::sync::Mutex;

use super::model::Credential;
use crate::error::{LodestoneError, Result};

/// Well-known key the credential is persisted under.
pub const CREDENTIAL_KEY: &str = "token";

/// Persists the single session credential across process restarts.
///
/// The store is read once at startup and written only by login and logout.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the persisted credential, if any.
    async fn load(&self) -> Result<Option<Credential>>;

    /// Replaces the persisted credential.
    async fn save(&self, credential: &Credential) -> Result<()>;

    /// Removes the persisted credential. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<()>;
}

/// Process-local store, for embedding without a filesystem and for tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `credential`, as after a restart.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Mutex::new(Some(credential)),
        }
    }

    /// Current contents, for assertions.
    pub fn snapshot(&self) -> Option<Credential> {
        self.credential.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<Credential>> {
        let guard = self
            .credential
            .lock()
            .map_err(|e| LodestoneError::storage(format!("Credential lock poisoned: {}", e)))?;
        Ok(guard.clone())
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        let mut guard = self
            .credential
            .lock()
            .map_err(|e| LodestoneError::storage(format!("Credential lock poisoned: {}", e)))?;
        *guard = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut guard = self
            .credential
            .lock()
            .map_err(|e| LodestoneError::storage(format!("Credential lock poisoned: {}", e)))?;
        *guard = None;
        Ok(())
    }
}
