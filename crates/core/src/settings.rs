use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    controller::ControllerConfig,
    document::EXPORT_FILE_NAME,
    error::{Result, TubemarkError},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Segment-end polling period, in milliseconds.
    pub check_interval_ms: u64,
    /// File name used when no explicit document path is given.
    pub export_file_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            check_interval_ms: 100,
            export_file_name: EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl Settings {
    /// Load from the per-user settings file, falling back to defaults when
    /// there is none.
    pub fn load() -> Result<Self> {
        match settings_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| TubemarkError::Settings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let settings: Settings =
            serde_json::from_str(&contents).map_err(|e| TubemarkError::Settings {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if settings.check_interval_ms == 0 {
            return Err(TubemarkError::Settings {
                path: path.to_path_buf(),
                reason: "check_interval_ms must be greater than zero".to_string(),
            });
        }
        Ok(settings)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            check_interval: Duration::from_millis(self.check_interval_ms),
        }
    }
}

/// `<config dir>/tubemark/settings.json`
pub fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tubemark").join("settings.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::load_from(&temp.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(
            settings.controller_config().check_interval,
            Duration::from_millis(100)
        );
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        std::fs::write(&path, r#"{ "check_interval_ms": 50 }"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.check_interval_ms, 50);
        assert_eq!(settings.export_file_name, "timestamps.json");
    }

    #[test]
    fn zero_interval_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        std::fs::write(&path, r#"{ "check_interval_ms": 0 }"#).unwrap();

        assert!(matches!(
            Settings::load_from(&path),
            Err(TubemarkError::Settings { .. })
        ));
    }

    #[test]
    fn garbage_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(Settings::load_from(&path).is_err());
    }
}
