//! arcstroke configuration file handling (arcstroke.toml)

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arcstroke_core::StrokeStyle;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub stroke: StrokeStyle,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct WindowConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
}

fn default_title() -> String {
    "arcstroke".to_string()
}

fn default_size() -> u32 {
    800
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_size(),
            height: default_size(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Clear color, RGBA in 0..=1
    #[serde(default = "default_background")]
    pub background: [f64; 4],
    /// Scene file (JSON columns); the built-in showcase when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<PathBuf>,
}

fn default_background() -> [f64; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            scene: None,
        }
    }
}

impl RenderConfig {
    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.background;
        wgpu::Color { r, g, b, a }
    }
}

impl AppConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcstroke_core::{LineCap, LineJoin};

    #[test]
    fn empty_file_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.window.width, 800);
        assert_eq!(config.stroke.line_width, 20.0);
        assert_eq!(config.render.clear_color(), wgpu::Color::WHITE);
    }

    #[test]
    fn sections_override_fields() {
        let config = AppConfig::from_toml(
            r#"
[window]
title = "strokes"
height = 600

[stroke]
line_width = 8.0
join = "round"
cap = "round"

[render]
background = [0.0, 0.0, 0.0, 1.0]
scene = "scenes/demo.json"
"#,
        )
        .unwrap();

        assert_eq!(config.window.title, "strokes");
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.stroke.line_width, 8.0);
        assert_eq!(config.stroke.join, LineJoin::Round);
        assert_eq!(config.stroke.cap, LineCap::Round);
        assert_eq!(config.stroke.miter_limit, 4.0);
        assert_eq!(config.render.clear_color(), wgpu::Color::BLACK);
        assert_eq!(
            config.render.scene.as_deref(),
            Some(Path::new("scenes/demo.json"))
        );
    }

    #[test]
    fn unknown_join_is_an_error() {
        assert!(AppConfig::from_toml("[stroke]\njoin = \"sharp\"").is_err());
    }

    #[test]
    fn serializes_back_to_toml() {
        let config = AppConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&text).unwrap(), config);
    }
}
