//! File-backed credential persistence.
//!
//! Keeps the session credential in `~/.config/lodestone/session.toml`:
//!
//! ```toml
//! token = "eyJhbGciOi..."
//! ```

use async_trait::async_trait;
use lodestone_core::Result;
use lodestone_core::session::{Credential, CredentialStore};
use lodestone_core::LodestoneError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;

use crate::paths::LodestonePaths;
use crate::storage::{AtomicTomlError, AtomicTomlFile};

/// On-disk shape of the session file. The field name is the well-known
/// credential key.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    token: Option<String>,
}

/// [`CredentialStore`] over a private TOML file.
///
/// # Security Note
///
/// The credential is stored in plaintext. The file is written with mode 600
/// on Unix. File access runs on the blocking pool.
pub struct FileCredentialStore {
    file: Arc<AtomicTomlFile<SessionFile>>,
}

impl FileCredentialStore {
    /// Creates a store at the default session path.
    pub fn new(paths: &LodestonePaths) -> Result<Self> {
        Ok(Self::with_path(paths.session_file()?))
    }

    /// Creates a store at a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::new(path).private()),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    async fn with_file<R, F>(&self, op: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&AtomicTomlFile<SessionFile>) -> std::result::Result<R, AtomicTomlError> + Send + 'static,
    {
        let file = Arc::clone(&self.file);
        let result = task::spawn_blocking(move || op(&file))
            .await
            .map_err(|e| LodestoneError::storage(format!("Failed to spawn blocking task: {}", e)))?;
        Ok(result?)
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>> {
        let credential = self
            .with_file(|file| file.load())
            .await?
            .and_then(|session| session.token)
            .filter(|token| !token.trim().is_empty())
            .map(Credential::new);

        tracing::debug!(
            path = %self.path().display(),
            present = credential.is_some(),
            "loaded persisted credential"
        );
        Ok(credential)
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        let session = SessionFile {
            token: Some(credential.expose().to_string()),
        };
        self.with_file(move |file| file.save(&session)).await?;
        tracing::debug!(path = %self.path().display(), "persisted credential");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.with_file(|file| file.remove()).await?;
        tracing::debug!(path = %self.path().display(), "cleared persisted credential");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_core::session::CREDENTIAL_KEY;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> FileCredentialStore {
        FileCredentialStore::new(&LodestonePaths::new(Some(dir.path()))).unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_survives_new_instance() {
        let dir = TempDir::new().unwrap();
        store(&dir).save(&Credential::new("abc123")).await.unwrap();

        let reloaded = store(&dir).load().await.unwrap();
        assert_eq!(reloaded.map(|c| c.expose().to_string()), Some("abc123".to_string()));
    }

    #[tokio::test]
    async fn test_file_uses_well_known_key() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&Credential::new("abc123")).await.unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        let table: toml::Table = toml::from_str(&content).unwrap();
        assert_eq!(table.get(CREDENTIAL_KEY).and_then(|v| v.as_str()), Some("abc123"));
    }

    #[tokio::test]
    async fn test_missing_file_means_no_credential() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&Credential::new("abc123")).await.unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert!(!store.path().exists());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_token_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::write(store.path(), "token = \"\"\n").unwrap();

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overlapping_saves_leave_one_whole_credential() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let (first, second) = (Credential::new("first"), Credential::new("second"));

        let (a, b) = tokio::join!(store.save(&first), store.save(&second));
        a.unwrap();
        b.unwrap();

        let token = store.load().await.unwrap().map(|c| c.expose().to_string());
        assert!(matches!(token.as_deref(), Some("first") | Some("second")));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::write(store.path(), "token = [unterminated").unwrap();

        assert!(store.load().await.is_err());
    }
}
