use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Session configuration.
///
/// Only pacing knobs live here. The clinical screening thresholds are fixed
/// constants at their call sites in the analyzers and the aggregator;
/// changing them is a clinical decision, not a deployment one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningConfig {
    pub schema_version: u32,

    /// Countdown for the facial capture phase.
    pub face_phase_secs: u32,
    /// Countdown for the pose capture phase.
    pub pose_phase_secs: u32,

    /// Minimum interval between analyzer runs per modality, regardless of
    /// raw frame delivery rate.
    pub min_analysis_interval_ms: u64,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            face_phase_secs: 10,
            pose_phase_secs: 15,
            min_analysis_interval_ms: 100,
        }
    }
}

impl ScreeningConfig {
    /// Load config from file, or create default
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .context("Failed to read config file")?;
            serde_json::from_str(&content)
                .context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, content)
            .context("Failed to write config file")
    }

    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Failed to get home directory")?;
        Ok(home.join(".neuroscreen"))
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScreeningConfig::default();
        assert_eq!(config.schema_version, 1);
        assert_eq!(config.face_phase_secs, 10);
        assert_eq!(config.pose_phase_secs, 15);
        assert_eq!(config.min_analysis_interval_ms, 100);
    }

    #[test]
    fn test_load_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = ScreeningConfig::load(&path).unwrap();
        assert_eq!(config.face_phase_secs, 10);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = ScreeningConfig {
            schema_version: 1,
            face_phase_secs: 7,
            pose_phase_secs: 21,
            min_analysis_interval_ms: 250,
        };
        config.save(&path).unwrap();

        let loaded = ScreeningConfig::load(&path).unwrap();
        assert_eq!(loaded.face_phase_secs, 7);
        assert_eq!(loaded.pose_phase_secs, 21);
        assert_eq!(loaded.min_analysis_interval_ms, 250);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(ScreeningConfig::load(&path).is_err());
    }
}
