use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recognizer::SegmentationMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How a document is scanned: which language model and which segmentation
/// modes to run, one recognition pass per mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub language: String,
    pub segmentation_modes: Vec<SegmentationMode>,
    /// Modes whose output is too fragmented for line-item parsing; their
    /// passes still vote on fields.
    pub itemless_modes: Vec<SegmentationMode>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            language: "tur".to_string(),
            segmentation_modes: vec![
                SegmentationMode::SPARSE_TEXT,
                SegmentationMode::SINGLE_COLUMN,
                SegmentationMode::SINGLE_BLOCK,
                SegmentationMode::AUTO,
            ],
            itemless_modes: vec![SegmentationMode::SPARSE_TEXT],
        }
    }
}

impl ScanConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.language.trim().is_empty() {
            return Err(ConfigError::Invalid("language must not be empty".into()));
        }
        if self.segmentation_modes.is_empty() {
            return Err(ConfigError::Invalid("at least one segmentation mode is required".into()));
        }
        let mut seen = self.segmentation_modes.clone();
        seen.sort();
        seen.dedup();
        if seen.len() != self.segmentation_modes.len() {
            return Err(ConfigError::Invalid("segmentation modes must be distinct".into()));
        }
        Ok(())
    }

    pub fn yields_items(&self, mode: SegmentationMode) -> bool {
        !self.itemless_modes.contains(&mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_four_pass_scan() {
        let c = ScanConfig::default();
        assert_eq!(c.language, "tur");
        let modes: Vec<u8> = c.segmentation_modes.iter().map(|m| m.value()).collect();
        assert_eq!(modes, vec![11, 4, 6, 3]);
        assert!(!c.yields_items(SegmentationMode::SPARSE_TEXT));
        assert!(c.yields_items(SegmentationMode::AUTO));
        c.validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ScanConfig::from_toml("segmentation_modes = [6, 3]").unwrap();
        assert_eq!(c.language, "tur");
        assert_eq!(c.segmentation_modes, vec![SegmentationMode::SINGLE_BLOCK, SegmentationMode::AUTO]);
    }

    #[test]
    fn rejects_bad_configs() {
        assert!(matches!(ScanConfig::from_toml("segmentation_modes = []"), Err(ConfigError::Invalid(_))));
        assert!(matches!(ScanConfig::from_toml("segmentation_modes = [6, 6]"), Err(ConfigError::Invalid(_))));
        assert!(matches!(ScanConfig::from_toml("language = \"\""), Err(ConfigError::Invalid(_))));
        assert!(matches!(ScanConfig::from_toml("segmentation_modes = [99]"), Err(ConfigError::Parse(_))));
        assert!(matches!(ScanConfig::from_toml("colour = \"blue\""), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "language = \"tur+eng\"\nitemless_modes = []").unwrap();
        let c = ScanConfig::load(file.path()).unwrap();
        assert_eq!(c.language, "tur+eng");
        assert!(c.yields_items(SegmentationMode::SPARSE_TEXT));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(ScanConfig::load(&dir.path().join("nope.toml")), Err(ConfigError::Io(_))));
    }
}
