//! Application-level configuration.
//!
//! Contains the settings the window and frame timer are created with:
//! - Window title, class name and initial client size
//! - Periodic timer frequency
//! - Default log filter (overridden by `RUST_LOG`)

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::compositor::types::FrameSize;
use crate::error::{DcompShaderError, DcompShaderResult};

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV_VAR: &str = "DCOMP_SHADER_CONFIG";

const MAX_TICK_RATE_HZ: u32 = 1000;

/// Settings for the top-level window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowConfig {
    pub title: String,
    /// Window class registered for the main window.
    pub class_name: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "DirectComposition Window".to_string(),
            class_name: "ExampleDirectComposition".to_string(),
            width: 1000,
            height: 640,
        }
    }
}

impl WindowConfig {
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub window: WindowConfig,
    /// Frame timer frequency.
    pub tick_rate_hz: u32,
    /// `env_logger` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            tick_rate_hz: 60,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the file named by `DCOMP_SHADER_CONFIG`, or use defaults.
    pub fn load() -> DcompShaderResult<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> DcompShaderResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> DcompShaderResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the window or timer cannot be created with.
    pub fn validate(&self) -> DcompShaderResult<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(DcompShaderError::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if !(1..=MAX_TICK_RATE_HZ).contains(&self.tick_rate_hz) {
            return Err(DcompShaderError::Config(format!(
                "tickRateHz must be between 1 and {}, got {}",
                MAX_TICK_RATE_HZ, self.tick_rate_hz
            )));
        }
        Ok(())
    }

    /// Period of the frame timer.
    pub fn tick_interval(&self) -> Duration {
        let millis = 1000 / u64::from(self.tick_rate_hz.max(1));
        Duration::from_millis(millis.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.window.title, "DirectComposition Window");
        assert_eq!(config.window.class_name, "ExampleDirectComposition");
        assert_eq!(config.window.size(), FrameSize::new(1000, 640));
        assert_eq!(config.tick_rate_hz, 60);
        assert_eq!(config.log_filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AppConfig::from_json_str(r#"{ "window": { "width": 800 }, "tickRateHz": 30 }"#)
            .unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 640);
        assert_eq!(config.tick_rate_hz, 30);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_camel_case_keys() {
        let json = serde_json::to_value(AppConfig::default()).unwrap();
        assert!(json.get("tickRateHz").is_some());
        assert!(json.get("logFilter").is_some());
        assert!(json["window"].get("className").is_some());
    }

    #[test]
    fn test_rejects_zero_window() {
        let err = AppConfig::from_json_str(r#"{ "window": { "height": 0 } }"#).unwrap_err();
        assert!(matches!(err, DcompShaderError::Config(_)));
    }

    #[test]
    fn test_rejects_tick_rate_out_of_range() {
        for rate in [0, 1001] {
            let config = AppConfig {
                tick_rate_hz: rate,
                ..AppConfig::default()
            };
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_malformed_json() {
        let err = AppConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, DcompShaderError::Json(_)));
    }

    #[test]
    fn test_tick_interval() {
        let mut config = AppConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(16));

        config.tick_rate_hz = 1000;
        assert_eq!(config.tick_interval(), Duration::from_millis(1));

        config.tick_rate_hz = 1;
        assert_eq!(config.tick_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AppConfig::from_file(Path::new("/nonexistent/dcomp-shader.json")).unwrap_err();
        assert!(matches!(err, DcompShaderError::Io(_)));
    }
}
