//! Dispatch configuration.
//!
//! Loaded from an optional YAML file; every field has a default so a partial
//! (or missing) file is valid.
//!
//! ```yaml
//! provider_budget: 1000
//! batch_units: 100
//! nontraversed_units: 10
//! lock_poll_interval_ms: 50
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, TeamError};

/// Progress weights and lock polling used by the provider dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Progress units allotted to each provider.
    pub provider_budget: u64,
    /// Units charged for each deep or shallow batch.
    pub batch_units: u64,
    /// Units charged for handling non-traversed folders.
    pub nontraversed_units: u64,
    /// How often a thread blocked on a scope lock re-checks cancellation.
    pub lock_poll_interval_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            provider_budget: 1000,
            batch_units: 100,
            nontraversed_units: 10,
            lock_poll_interval_ms: 50,
        }
    }
}

impl DispatchConfig {
    pub fn lock_poll_interval(&self) -> Duration {
        Duration::from_millis(self.lock_poll_interval_ms)
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    ///
    /// Returns `TeamError::ConfigParse` (with the path) on malformed YAML.
    pub fn load_at(path: &Path) -> Result<Self, TeamError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(io_err(path, err)),
        };
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| TeamError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write as YAML to `path` via a `.tmp` sibling and rename.
    pub fn save_at(&self, path: &Path) -> Result<(), TeamError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let tmp = path.with_extension("yaml.tmp");
        std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = DispatchConfig::load_at(&dir.path().join("dispatch.yaml")).unwrap();
        assert_eq!(config, DispatchConfig::default());
        assert_eq!(config.lock_poll_interval(), Duration::from_millis(50));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dispatch.yaml");
        std::fs::write(&path, "batch_units: 40\n").unwrap();
        let config = DispatchConfig::load_at(&path).unwrap();
        assert_eq!(config.batch_units, 40);
        assert_eq!(config.provider_budget, 1000);
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dispatch.yaml");
        std::fs::write(&path, "batch_units: [unclosed").unwrap();
        let err = DispatchConfig::load_at(&path).unwrap_err();
        assert!(matches!(err, TeamError::ConfigParse { .. }));
        assert!(err.to_string().contains("dispatch.yaml"));
    }

    #[test]
    fn save_then_load_preserves_values_and_cleans_tmp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf").join("dispatch.yaml");
        let config = DispatchConfig {
            provider_budget: 500,
            ..DispatchConfig::default()
        };
        config.save_at(&path).unwrap();
        assert!(!path.with_extension("yaml.tmp").exists());
        assert_eq!(DispatchConfig::load_at(&path).unwrap(), config);
    }
}
