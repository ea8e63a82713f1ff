use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::LaunchpadConfig;

/// State persisted across restarts.
///
/// Only the last connected public key is stored. The signing capability is
/// never written to disk; it has to be re-established through the wallet on
/// next use.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SessionState {
    pub wallet_public_key: Option<String>,
}

impl SessionState {
    /// Persist session state to `~/.launchpad/session.json`.
    pub fn save(&self) -> Result<()> {
        let path = LaunchpadConfig::session_path()?;
        self.save_to(&path)
    }

    /// Load session state from `~/.launchpad/session.json`.
    pub fn load() -> Result<Self> {
        let path = LaunchpadConfig::session_path()?;
        Self::load_from(&path)
    }

    /// Load session from an explicit path. Returns `Default` if the file is
    /// missing or corrupt (never errors on bad JSON).
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read session: {}", path.display()))?;
            Ok(serde_json::from_str(&content).unwrap_or_default())
        } else {
            Ok(Self::default())
        }
    }

    /// Save session to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to save session: {}", path.display()))?;
        Ok(())
    }

    /// Delete the session file at `path` if present.
    pub fn clear_at(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to remove session: {}", path.display()))?;
        }
        Ok(())
    }

    /// Quick load: the last connected public key, if any.
    pub fn load_public_key_from(path: &Path) -> Option<String> {
        Self::load_from(path)
            .ok()
            .and_then(|s| s.wallet_public_key)
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const KEY: &str = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H";

    #[test]
    fn save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.json");

        let state = SessionState {
            wallet_public_key: Some(KEY.into()),
        };
        state.save_to(&path).unwrap();

        let loaded = SessionState::load_from(&path).unwrap();
        assert_eq!(loaded, state);
        assert_eq!(SessionState::load_public_key_from(&path).as_deref(), Some(KEY));
    }

    #[test]
    fn missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        let loaded = SessionState::load_from(&path).unwrap();
        assert!(loaded.wallet_public_key.is_none());
        assert!(SessionState::load_public_key_from(&path).is_none());
    }

    #[test]
    fn corrupt_json_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        std::fs::write(&path, "NOT VALID JSON {{{{").unwrap();
        assert!(SessionState::load_from(&path).unwrap().wallet_public_key.is_none());
    }

    #[test]
    fn clear_removes_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("session.json");
        SessionState {
            wallet_public_key: Some(KEY.into()),
        }
        .save_to(&path)
        .unwrap();
        assert!(path.exists());

        SessionState::clear_at(&path).unwrap();
        assert!(!path.exists());
        // Clearing twice is fine.
        SessionState::clear_at(&path).unwrap();
    }

    #[test]
    fn empty_key_is_treated_as_absent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        std::fs::write(&path, r#"{ "wallet_public_key": "" }"#).unwrap();
        assert!(SessionState::load_public_key_from(&path).is_none());
    }
}
