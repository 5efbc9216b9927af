//! Paint style vocabulary shared by the paint and scene crates

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Blend mode used when a node is composited onto its layer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl FromStr for BlendMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "normal" | "source-over" => BlendMode::Normal,
            "multiply" => BlendMode::Multiply,
            "screen" => BlendMode::Screen,
            "overlay" => BlendMode::Overlay,
            "darken" => BlendMode::Darken,
            "lighten" => BlendMode::Lighten,
            "color-dodge" => BlendMode::ColorDodge,
            "color-burn" => BlendMode::ColorBurn,
            "hard-light" => BlendMode::HardLight,
            "soft-light" => BlendMode::SoftLight,
            "difference" => BlendMode::Difference,
            "exclusion" => BlendMode::Exclusion,
            other => {
                return Err(CoreError::InvalidValue {
                    key: "blend_mode".into(),
                    reason: format!("unknown blend mode '{other}'"),
                })
            }
        })
    }
}

/// Line cap style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Line join style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl FromStr for LineCap {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "butt" => Ok(LineCap::Butt),
            "round" => Ok(LineCap::Round),
            "square" => Ok(LineCap::Square),
            other => Err(CoreError::InvalidValue {
                key: "line_cap".into(),
                reason: format!("unknown cap '{other}'"),
            }),
        }
    }
}

impl FromStr for LineJoin {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "miter" => Ok(LineJoin::Miter),
            "round" => Ok(LineJoin::Round),
            "bevel" => Ok(LineJoin::Bevel),
            other => Err(CoreError::InvalidValue {
                key: "line_join".into(),
                reason: format!("unknown join '{other}'"),
            }),
        }
    }
}

/// Corner radii for rounded rectangles, clockwise from top-left
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CornerRadius {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_right: f32,
    pub bottom_left: f32,
}

impl CornerRadius {
    pub const ZERO: CornerRadius = CornerRadius {
        top_left: 0.0,
        top_right: 0.0,
        bottom_right: 0.0,
        bottom_left: 0.0,
    };

    pub fn new(top_left: f32, top_right: f32, bottom_right: f32, bottom_left: f32) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    pub fn uniform(radius: f32) -> Self {
        Self::new(radius, radius, radius, radius)
    }

    /// Scale radii down so adjacent corners never overlap on a `width` x `height` box
    pub fn clamped(&self, width: f32, height: f32) -> Self {
        let max = (width.abs() / 2.0).min(height.abs() / 2.0).max(0.0);
        Self::new(
            self.top_left.clamp(0.0, max),
            self.top_right.clamp(0.0, max),
            self.bottom_right.clamp(0.0, max),
            self.bottom_left.clamp(0.0, max),
        )
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl From<f32> for CornerRadius {
    fn from(radius: f32) -> Self {
        Self::uniform(radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_mode_parse() {
        assert_eq!("multiply".parse::<BlendMode>().unwrap(), BlendMode::Multiply);
        assert_eq!("source-over".parse::<BlendMode>().unwrap(), BlendMode::Normal);
        assert!("sparkle".parse::<BlendMode>().is_err());
    }

    #[test]
    fn test_corner_radius_clamp() {
        let r = CornerRadius::new(50.0, 2.0, 0.0, -3.0).clamped(40.0, 20.0);
        assert_eq!(r, CornerRadius::new(10.0, 2.0, 0.0, 0.0));
    }
}
