// Library exports for evdash

pub mod aggregate;
pub mod compiler;
pub mod data;
pub mod error;
pub mod graph;
pub mod ir;
pub mod palette;
pub mod parser;
pub mod preprocessor;
pub mod runtime;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}

/// Settings read from a `--config` JSON file. Command-line flags win.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub render: RenderOptions,
    /// Pipeline used when none is given on the command line.
    #[serde(default)]
    pub pipeline: Option<String>,
    #[serde(default)]
    pub vars: HashMap<String, String>,
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: DashboardConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.render.width, 800);
        assert_eq!(config.render.format, OutputFormat::Png);
    }

    #[test]
    fn test_config_full() {
        let config: DashboardConfig = serde_json::from_str(
            r#"{
                "render": {"width": 1024, "type": "svg"},
                "pipeline": "range(top: $n)",
                "vars": {"n": "3"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.render.width, 1024);
        assert_eq!(config.render.height, 600);
        assert_eq!(config.render.format, OutputFormat::Svg);
        assert_eq!(config.vars.get("n").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_config_bad_format() {
        let result: std::result::Result<DashboardConfig, serde_json::Error> =
            serde_json::from_str(r#"{"render": {"type": "gif"}}"#);
        assert!(result.is_err());
    }
}
