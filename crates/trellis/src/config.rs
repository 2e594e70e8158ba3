//! Toolkit configuration files.
//!
//! Configuration is plain TOML. Every key is optional; missing keys fall back
//! to the platform defaults.
//!
//! ```toml
//! [platform]
//! multi_click_interval_ms = 300
//! cursor_blink_rate_ms = 500
//! text_antialiasing = "on"
//! drag_threshold = 4
//!
//! [resources]
//! root = "assets"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trellis_core::logging::targets;

use crate::error::WidgetResult;
use crate::platform::TextAntialiasing;

/// Top-level toolkit configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    pub platform: PlatformConfig,
    pub resources: ResourcesConfig,
}

/// Overrides for desktop properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub multi_click_interval_ms: Option<u64>,
    pub cursor_blink_rate_ms: Option<u64>,
    pub text_antialiasing: Option<TextAntialiasing>,
    pub drag_threshold: Option<u32>,
}

/// Where named resources are looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// Directory that resource names are resolved against.
    pub root: Option<PathBuf>,
}

impl ToolkitConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> WidgetResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a configuration file.
    ///
    /// A relative `resources.root` is resolved against the file's folder.
    pub fn load(path: impl AsRef<Path>) -> WidgetResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(root) = config.resources.root.as_mut()
            && root.is_relative()
            && let Some(folder) = path.parent()
        {
            *root = folder.join(&*root);
        }
        tracing::debug!(target: targets::CONFIG, path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Serialize back to TOML text.
    pub fn to_toml_string(&self) -> WidgetResult<String> {
        toml::to_string(self).map_err(|error| crate::WidgetError::invalid(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(ToolkitConfig::from_toml_str("").unwrap(), ToolkitConfig::default());
    }

    #[test]
    fn test_parse_tables() {
        let config = ToolkitConfig::from_toml_str(
            r#"
            [platform]
            multi_click_interval_ms = 250
            text_antialiasing = "off"

            [resources]
            root = "/opt/app/assets"
            "#,
        )
        .unwrap();
        assert_eq!(config.platform.multi_click_interval_ms, Some(250));
        assert_eq!(config.platform.cursor_blink_rate_ms, None);
        assert_eq!(config.platform.text_antialiasing, Some(TextAntialiasing::Off));
        assert_eq!(config.resources.root, Some(PathBuf::from("/opt/app/assets")));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let error = ToolkitConfig::from_toml_str("[platform\nx = ").unwrap_err();
        assert!(matches!(error, crate::WidgetError::Config(_)));
    }

    #[test]
    fn test_load_resolves_relative_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trellis.toml");
        fs::write(&path, "[resources]\nroot = \"assets\"\n").unwrap();

        let config = ToolkitConfig::load(&path).unwrap();
        assert_eq!(config.resources.root, Some(dir.path().join("assets")));

        let missing = ToolkitConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, crate::WidgetError::Io(_)));
    }

    #[test]
    fn test_round_trip_through_text() {
        let mut config = ToolkitConfig::default();
        config.platform.drag_threshold = Some(8);
        let text = config.to_toml_string().unwrap();
        assert_eq!(ToolkitConfig::from_toml_str(&text).unwrap(), config);
    }
}
