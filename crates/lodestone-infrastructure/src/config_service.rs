//! Configuration service implementation.
//!
//! Loads [`ClientConfig`] from `~/.config/lodestone/config.toml` and applies
//! `LODESTONE_*` environment overrides on top.

use lodestone_core::config::ClientConfig;
use lodestone_core::{LodestoneError, Result};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::paths::LodestonePaths;
use crate::storage::AtomicTomlFile;

pub const ENV_API_URL: &str = "LODESTONE_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "LODESTONE_TIMEOUT_SECS";
pub const ENV_DOWNLOAD_DIR: &str = "LODESTONE_DOWNLOAD_DIR";

/// Loads and caches the client configuration.
///
/// A missing config file yields the defaults; it is not created.
#[derive(Debug, Clone)]
pub struct ConfigService {
    paths: LodestonePaths,
    config: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    pub fn new(paths: LodestonePaths) -> Self {
        Self {
            paths,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading it on first access.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be parsed, an override is malformed, or the
    /// merged settings do not validate.
    pub fn get_config(&self) -> Result<ClientConfig> {
        if let Ok(cached) = self.config.read()
            && let Some(config) = cached.as_ref()
        {
            return Ok(config.clone());
        }

        let loaded = self.load_config()?;

        if let Ok(mut cache) = self.config.write() {
            *cache = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut cache) = self.config.write() {
            *cache = None;
        }
    }

    pub fn config_path(&self) -> Result<PathBuf> {
        Ok(self.paths.config_file()?)
    }

    fn load_config(&self) -> Result<ClientConfig> {
        let path = self.config_path()?;
        let from_file = AtomicTomlFile::<ClientConfig>::new(path.clone()).load()?;

        tracing::debug!(
            path = %path.display(),
            found = from_file.is_some(),
            "loading client configuration"
        );

        let config = apply_overrides(from_file.unwrap_or_default(), |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }
}

/// Applies `LODESTONE_*` overrides read through `lookup`. Blank values are
/// ignored.
pub fn apply_overrides<F>(mut config: ClientConfig, lookup: F) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = get(ENV_API_URL) {
        config.base_url = url.trim().to_string();
    }

    if let Some(raw) = get(ENV_TIMEOUT_SECS) {
        config.request_timeout_secs = raw.trim().parse().map_err(|_| {
            LodestoneError::config(format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT_SECS, raw))
        })?;
    }

    if let Some(dir) = get(ENV_DOWNLOAD_DIR) {
        config.download_dir = Some(PathBuf::from(dir));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let service = ConfigService::new(LodestonePaths::new(Some(dir.path())));

        let config = service.load_config().unwrap();
        assert_eq!(config.request_timeout_secs, lodestone_core::config::DEFAULT_TIMEOUT_SECS);
        assert!(!dir.path().join("config.toml").exists());
    }

    #[test]
    fn test_reads_file_and_caches() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "request_timeout_secs = 5\n").unwrap();
        let service = ConfigService::new(LodestonePaths::new(Some(dir.path())));

        assert_eq!(service.get_config().unwrap().request_timeout_secs, 5);

        std::fs::write(&path, "request_timeout_secs = 9\n").unwrap();
        assert_eq!(service.get_config().unwrap().request_timeout_secs, 5);

        service.invalidate_cache();
        assert_eq!(service.get_config().unwrap().request_timeout_secs, 9);
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "base_url = \"ftp://nope\"\n").unwrap();
        let service = ConfigService::new(LodestonePaths::new(Some(dir.path())));

        assert!(service.get_config().is_err());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let config = apply_overrides(
            ClientConfig::default(),
            env(&[
                (ENV_API_URL, "https://api.example.com"),
                (ENV_TIMEOUT_SECS, " 12 "),
                (ENV_DOWNLOAD_DIR, "/srv/downloads"),
            ]),
        )
        .unwrap();

        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.request_timeout_secs, 12);
        assert_eq!(config.download_dir, Some(PathBuf::from("/srv/downloads")));
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let config = apply_overrides(ClientConfig::default(), env(&[(ENV_API_URL, "  ")])).unwrap();
        assert_eq!(config.base_url, lodestone_core::config::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_malformed_timeout_is_a_config_error() {
        let err = apply_overrides(ClientConfig::default(), env(&[(ENV_TIMEOUT_SECS, "soon")])).unwrap_err();
        assert!(matches!(err, LodestoneError::Config(_)));
    }
}
