//! Configuration persistence for tagmatch settings

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::verify::DEFAULT_TRAILING_DIGITS;

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Number of trailing characters compared across sources (at least 1)
    pub trailing_digits: usize,
    /// IANA zone used for persisted timestamps
    pub time_zone: String,
    /// Integer upscale applied to label photos before OCR
    pub upscale_factor: u32,
    /// Barcode frames larger than this are downsampled first (0 = never)
    pub barcode_max_dimension: u32,
    /// Tesseract language code
    pub ocr_language: String,
    /// Local CSV file results are appended to, when set
    pub csv_path: Option<PathBuf>,
    /// A1 range rows are appended after in the Google sheet
    pub sheet_range: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            trailing_digits: DEFAULT_TRAILING_DIGITS,
            time_zone: "Asia/Tokyo".to_string(),
            upscale_factor: 2,
            barcode_max_dimension: 1600,
            ocr_language: "eng".to_string(),
            csv_path: None,
            sheet_range: "Sheet1!A1".to_string(),
        }
    }
}

impl AppConfig {
    /// Directory name under the platform config dir
    pub const APP_DIR: &'static str = "tagmatch";

    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(Self::APP_DIR).join("config.json"))
    }

    /// Load configuration from `path` (or the default location), falling back
    /// to defaults if it is missing or unreadable
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            log::warn!("No config directory available, using defaults");
            return Self::default();
        };
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::read(&path) {
            Ok(config) => config.checked(),
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:?}", err);
                Self::default()
            }
        }
    }

    /// Replace values that would break comparison with their defaults
    fn checked(mut self) -> Self {
        if self.trailing_digits == 0 {
            log::warn!(
                "trailing_digits must be at least 1, using {}",
                DEFAULT_TRAILING_DIGITS
            );
            self.trailing_digits = DEFAULT_TRAILING_DIGITS;
        }
        self
    }

    fn read(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Parsed time zone, falling back to Asia/Tokyo on an unknown name
    pub fn zone(&self) -> Tz {
        self.time_zone.parse::<Tz>().unwrap_or_else(|err| {
            log::warn!("Unknown time zone {:?} ({}), using Asia/Tokyo", self.time_zone, err);
            chrono_tz::Asia::Tokyo
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.trailing_digits, 7);
        assert_eq!(config.zone(), chrono_tz::Asia::Tokyo);
        assert_eq!(config.upscale_factor, 2);
        assert!(config.csv_path.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "trailing_digits": 5, "time_zone": "UTC" }"#).unwrap();
        let config = AppConfig::load(Some(&path));
        assert_eq!(config.trailing_digits, 5);
        assert_eq!(config.zone(), chrono_tz::UTC);
        assert_eq!(config.ocr_language, "eng");
    }

    #[test]
    fn test_zero_trailing_digits_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "trailing_digits": 0, "ocr_language": "jpn" }"#).unwrap();
        let config = AppConfig::load(Some(&path));
        assert_eq!(config.trailing_digits, DEFAULT_TRAILING_DIGITS);
        assert_eq!(config.ocr_language, "jpn");
    }

    #[test]
    fn test_broken_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppConfig::load(Some(&path)), AppConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(AppConfig::load(Some(&path)), AppConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            csv_path: Some(PathBuf::from("/tmp/results.csv")),
            ..AppConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(Some(&path)), config);
    }

    #[test]
    fn test_unknown_zone_falls_back() {
        let config = AppConfig {
            time_zone: "Mars/Olympus".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.zone(), chrono_tz::Asia::Tokyo);
    }
}
