//! Unified path management for Lodestone client files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/lodestone/         # Config directory
//! ├── config.toml              # Client configuration
//! └── session.toml             # Persisted credential (mode 600)
//!
//! ~/Downloads/                 # Default download destination
//! ```

use std::path::{Path, PathBuf};

const APP_DIR: &str = "lodestone";
const CONFIG_FILE: &str = "config.toml";
const SESSION_FILE: &str = "session.toml";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for lodestone_core::LodestoneError {
    fn from(e: PathError) -> Self {
        lodestone_core::LodestoneError::config(e.to_string())
    }
}

/// Resolves every file the client reads or writes.
///
/// With a base path all files live directly under it; otherwise the platform
/// config directory is used (XDG on Linux, `~/Library/Application Support`
/// on macOS, `%APPDATA%` on Windows).
#[derive(Debug, Clone, Default)]
pub struct LodestonePaths {
    base: Option<PathBuf>,
}

impl LodestonePaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the Lodestone configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to config.toml.
    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join(CONFIG_FILE))
    }

    /// Returns the path to the persisted credential.
    ///
    /// # Security Note
    ///
    /// The file is written with mode 600 on Unix.
    pub fn session_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join(SESSION_FILE))
    }

    /// Returns the default download destination.
    ///
    /// Falls back to the home directory when the platform has no download
    /// directory.
    pub fn download_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.join("downloads"));
        }
        dirs::download_dir()
            .or_else(dirs::home_dir)
            .ok_or(PathError::HomeDirNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_path_overrides_platform_dirs() {
        let paths = LodestonePaths::new(Some(Path::new("/tmp/lodestone-test")));
        assert_eq!(
            paths.session_file().unwrap(),
            PathBuf::from("/tmp/lodestone-test/session.toml")
        );
        assert_eq!(
            paths.config_file().unwrap(),
            PathBuf::from("/tmp/lodestone-test/config.toml")
        );
        assert_eq!(
            paths.download_dir().unwrap(),
            PathBuf::from("/tmp/lodestone-test/downloads")
        );
    }
}
