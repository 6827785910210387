use crate::loader::LoaderConfig;
use crate::surface::PageConfig;
use crate::RenderOptions;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Settings file for the binary. Every section is optional.
///
/// ```json
/// {
///   "render": {"width": 1000, "height": 700, "type": "svg"},
///   "loader": {"gender_column": "RIAGENDR", "unmapped": "pass_through"},
///   "page": {"title": "NHANES", "hide_chrome": false}
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub render: RenderOptions,
    pub loader: LoaderConfig,
    /// Replaces the report's own page setup when present
    pub page: Option<PageConfig>,
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse config JSON")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::UnmappedCodePolicy;
    use crate::OutputFormat;

    #[test]
    fn test_config_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.render.width, 800);
        assert_eq!(config.render.height, 600);
        assert_eq!(config.render.format, OutputFormat::Png);
        assert_eq!(config.loader.gender_label_column, "RIAGENDRx");
        assert!(config.page.is_none());
    }

    #[test]
    fn test_config_sections() {
        let config = AppConfig::from_json(
            r#"{
                "render": {"width": 1000, "type": "svg"},
                "loader": {"unmapped": "pass_through"},
                "page": {"title": "NHANES", "hide_chrome": false}
            }"#,
        )
        .unwrap();
        assert_eq!(config.render.width, 1000);
        assert_eq!(config.render.height, 600);
        assert_eq!(config.render.format, OutputFormat::Svg);
        assert_eq!(config.loader.unmapped, UnmappedCodePolicy::PassThrough);
        assert_eq!(config.loader.gender_column, "RIAGENDR");
        let page = config.page.unwrap();
        assert_eq!(page.title, "NHANES");
        assert!(!page.hide_chrome);
    }

    #[test]
    fn test_config_format_alias() {
        let config = AppConfig::from_json(r#"{"render": {"format": "svg"}}"#).unwrap();
        assert_eq!(config.render.format, OutputFormat::Svg);
    }

    #[test]
    fn test_config_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"render": {"height": 480}}"#).unwrap();
        let config = AppConfig::from_path(&path).unwrap();
        assert_eq!(config.render.height, 480);

        assert!(AppConfig::from_path(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_config_rejects_bad_format() {
        assert!(AppConfig::from_json(r#"{"render": {"type": "gif"}}"#).is_err());
    }
}
