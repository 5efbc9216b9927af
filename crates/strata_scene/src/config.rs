//! Root configuration
//!
//! `RootConfig` can be built in code or loaded from a TOML file:
//!
//! ```toml
//! width = 800
//! height = 600
//! pixel_ratio = 2.0
//! background = "#ffffff"
//!
//! [interaction]
//! double_click_ms = 300
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_core::{Color, ColorSpace};

use crate::error::{Result, SceneError};

// =============================================================================
// Root
// =============================================================================

/// Renderer configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RootConfig {
    /// Logical width in pixels
    #[serde(default = "default_width")]
    pub width: u32,
    /// Logical height in pixels
    #[serde(default = "default_height")]
    pub height: u32,
    /// Device pixels per logical pixel
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: f32,
    /// Frame rate of the fixed-rate fallback loop
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Output clear color, any syntax `Color::parse` accepts
    #[serde(default = "default_background")]
    pub background: String,
    /// Color space used when animating colors
    #[serde(default)]
    pub color_space: ColorSpace,
    #[serde(default)]
    pub text: TextConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

fn default_pixel_ratio() -> f32 {
    1.0
}

fn default_fps() -> u32 {
    60
}

fn default_background() -> String {
    "transparent".to_string()
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            pixel_ratio: default_pixel_ratio(),
            fps: default_fps(),
            background: default_background(),
            color_space: ColorSpace::default(),
            text: TextConfig::default(),
            interaction: InteractionConfig::default(),
        }
    }
}

impl RootConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_pixel_ratio(mut self, ratio: f32) -> Self {
        self.pixel_ratio = ratio;
        self
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into();
        self
    }

    pub fn with_ghost(mut self, enabled: bool) -> Self {
        self.interaction.ghost_enabled = enabled;
        self
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RootConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| SceneError::Config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Serialize to a TOML document
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn background_color(&self) -> Result<Color> {
        Ok(Color::parse(&self.background)?)
    }

    /// Interval between frames of the fixed-rate loop
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / f64::from(self.fps.max(1))
    }

    /// Device size of the output surfaces
    pub fn device_size(&self) -> (u32, u32) {
        (
            scale_dimension(self.width, self.pixel_ratio),
            scale_dimension(self.height, self.pixel_ratio),
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneError::Config(format!(
                "size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0) {
            return Err(SceneError::Config(format!(
                "pixel_ratio must be positive, got {}",
                self.pixel_ratio
            )));
        }
        if self.text.font_size <= 0.0 {
            return Err(SceneError::Config("text.font_size must be positive".into()));
        }
        self.background_color()?;
        Ok(())
    }
}

pub(crate) fn scale_dimension(value: u32, ratio: f32) -> u32 {
    ((value as f32 * ratio).round() as u32).max(1)
}

// =============================================================================
// Text defaults
// =============================================================================

/// Defaults applied to text nodes that do not set their own font
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TextConfig {
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub font_family: Option<String>,
    /// Text color when neither the node nor the markup sets one
    #[serde(default = "default_text_color")]
    pub color: String,
    /// Treat `'...'` spans in markup as literal text
    #[serde(default)]
    pub quoted_literals: bool,
}

fn default_font_size() -> f32 {
    12.0
}

fn default_text_color() -> String {
    "#000000".to_string()
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            font_family: None,
            color: default_text_color(),
            quoted_literals: false,
        }
    }
}

// =============================================================================
// Interaction
// =============================================================================

/// Hit testing and pointer settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InteractionConfig {
    /// Paint the ghost surface; when off, hit tests walk node bounds
    #[serde(default = "default_true")]
    pub ghost_enabled: bool,
    /// Copy the ghost pixels once per frame instead of reading per query
    #[serde(default)]
    pub ghost_snapshot: bool,
    /// Maximum gap between two clicks of a double click
    #[serde(default = "default_double_click_ms")]
    pub double_click_ms: f64,
    /// Pointer travel before a press turns into a drag
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold: f32,
}

fn default_true() -> bool {
    true
}

fn default_double_click_ms() -> f64 {
    300.0
}

fn default_drag_threshold() -> f32 {
    4.0
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            ghost_enabled: true,
            ghost_snapshot: false,
            double_click_ms: default_double_click_ms(),
            drag_threshold: default_drag_threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = RootConfig::from_toml_str("").unwrap();
        assert_eq!(config, RootConfig::default());
        assert_eq!(config.width, 800);
        assert!(config.interaction.ghost_enabled);
    }

    #[test]
    fn test_partial_document() {
        let config = RootConfig::from_toml_str(
            r##"
            width = 320
            height = 200
            pixel_ratio = 2.0
            background = "#ff0000"
            color_space = "hsl"

            [interaction]
            drag_threshold = 8.0
            "##,
        )
        .unwrap();
        assert_eq!(config.device_size(), (640, 400));
        assert_eq!(config.color_space, ColorSpace::Hsl);
        assert_eq!(config.interaction.drag_threshold, 8.0);
        assert_eq!(config.interaction.double_click_ms, 300.0);
        assert_eq!(config.background_color().unwrap(), Color::RED);
    }

    #[test]
    fn test_invalid_documents_rejected() {
        assert!(matches!(
            RootConfig::from_toml_str("width = \"wide\""),
            Err(SceneError::Config(_))
        ));
        assert!(RootConfig::from_toml_str("width = 0").is_err());
        assert!(RootConfig::from_toml_str("background = \"nope(\"").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = RootConfig::new(100, 50).with_pixel_ratio(1.5);
        let text = config.to_toml().unwrap();
        assert_eq!(RootConfig::from_toml_str(&text).unwrap(), config);
    }
}
