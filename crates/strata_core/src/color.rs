//! Colors
//!
//! RGBA with `f32` channels in `0.0..=1.0`. Parsing accepts the CSS-ish forms
//! that show up in settings and text markup: `#rgb`, `#rrggbb`, `#rrggbbaa`,
//! `rgb(..)`, `rgba(..)` and a handful of named colors.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// RGBA color
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Color space used when interpolating between two colors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    #[default]
    Rgb,
    Hsl,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const GRAY: Color = Color::rgb(0.5, 0.5, 0.5);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Packed `0xRRGGBB`, alpha dropped
    pub fn to_hex(&self) -> u32 {
        let [r, g, b, _] = self.to_rgba8();
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            channel_to_u8(self.r),
            channel_to_u8(self.g),
            channel_to_u8(self.b),
            channel_to_u8(self.a),
        ]
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    /// Multiply the alpha channel, e.g. by a composed opacity
    pub fn fade(mut self, factor: f32) -> Self {
        self.a = (self.a * factor).clamp(0.0, 1.0);
        self
    }

    /// Linear interpolation between two colors
    pub fn lerp(a: &Color, b: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: a.r + (b.r - a.r) * t,
            g: a.g + (b.g - a.g) * t,
            b: a.b + (b.b - a.b) * t,
            a: a.a + (b.a - a.a) * t,
        }
    }

    /// Interpolate through HSL, taking the short way around the hue wheel
    pub fn lerp_hsl(a: &Color, b: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let (h1, s1, l1) = a.to_hsl();
        let (h2, s2, l2) = b.to_hsl();
        let mut dh = h2 - h1;
        if dh > 0.5 {
            dh -= 1.0;
        } else if dh < -0.5 {
            dh += 1.0;
        }
        let h = (h1 + dh * t).rem_euclid(1.0);
        let mut out = Color::from_hsl(h, s1 + (s2 - s1) * t, l1 + (l2 - l1) * t);
        out.a = a.a + (b.a - a.a) * t;
        out
    }

    pub fn interpolate(a: &Color, b: &Color, t: f32, space: ColorSpace) -> Color {
        match space {
            ColorSpace::Rgb => Color::lerp(a, b, t),
            ColorSpace::Hsl => Color::lerp_hsl(a, b, t),
        }
    }

    /// Hue, saturation and lightness, all in `0.0..=1.0`
    pub fn to_hsl(&self) -> (f32, f32, f32) {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let l = (max + min) / 2.0;
        if max == min {
            return (0.0, 0.0, l);
        }
        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == self.r {
            (self.g - self.b) / d + if self.g < self.b { 6.0 } else { 0.0 }
        } else if max == self.g {
            (self.b - self.r) / d + 2.0
        } else {
            (self.r - self.g) / d + 4.0
        };
        (h / 6.0, s, l)
    }

    pub fn from_hsl(h: f32, s: f32, l: f32) -> Color {
        if s == 0.0 {
            return Color::rgb(l, l, l);
        }
        fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            if t < 1.0 / 6.0 {
                return p + (q - p) * 6.0 * t;
            }
            if t < 0.5 {
                return q;
            }
            if t < 2.0 / 3.0 {
                return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
            }
            p
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Color::rgb(
            hue_to_rgb(p, q, h + 1.0 / 3.0),
            hue_to_rgb(p, q, h),
            hue_to_rgb(p, q, h - 1.0 / 3.0),
        )
    }

    /// Parse a color string
    pub fn parse(input: &str) -> Result<Color> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| CoreError::InvalidColor(input.to_string()));
        }
        let lower = s.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
        {
            let args = args
                .strip_suffix(')')
                .ok_or_else(|| CoreError::InvalidColor(input.to_string()))?;
            return parse_rgb_args(args).ok_or_else(|| CoreError::InvalidColor(input.to_string()));
        }
        named_color(&lower).ok_or_else(|| CoreError::InvalidColor(input.to_string()))
    }

    /// True when the string looks like a color token (used by markup parsing)
    pub fn is_color_token(s: &str) -> bool {
        let lower = s.to_ascii_lowercase();
        s.starts_with('#')
            || lower.starts_with("rgb(")
            || lower.starts_with("rgba(")
            || named_color(&lower).is_some()
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl FromStr for Color {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Color::parse(s)
    }
}

fn channel_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Color::from_rgb8(nibble(0)?, nibble(1)?, nibble(2)?)),
        6 => Some(Color::from_rgb8(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::from_rgb8(byte(0)?, byte(2)?, byte(4)?).with_alpha(byte(6)? as f32 / 255.0)),
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<Color> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |s: &str| -> Option<f32> {
        let v: f32 = s.parse().ok()?;
        Some((v / 255.0).clamp(0.0, 1.0))
    };
    let alpha = match parts.get(3) {
        Some(a) => a.parse::<f32>().ok()?.clamp(0.0, 1.0),
        None => 1.0,
    };
    Some(Color::rgba(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}

fn named_color(name: &str) -> Option<Color> {
    let hex = match name {
        "black" => 0x000000,
        "white" => 0xffffff,
        "red" => 0xff0000,
        "green" => 0x008000,
        "lime" => 0x00ff00,
        "blue" => 0x0000ff,
        "yellow" => 0xffff00,
        "cyan" | "aqua" => 0x00ffff,
        "magenta" | "fuchsia" => 0xff00ff,
        "gray" | "grey" => 0x808080,
        "silver" => 0xc0c0c0,
        "maroon" => 0x800000,
        "navy" => 0x000080,
        "olive" => 0x808000,
        "purple" => 0x800080,
        "teal" => 0x008080,
        "orange" => 0xffa500,
        "transparent" => return Some(Color::TRANSPARENT),
        _ => return None,
    };
    Some(Color::from_hex(hex))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex() {
        let c = Color::from_hex(0xFF5500);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 85.0 / 255.0).abs() < 0.001);
        assert_eq!(c.b, 0.0);
        assert_eq!(c.to_hex(), 0xFF5500);
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(Color::parse("#ff0000").unwrap().to_hex(), 0xff0000);
        assert_eq!(Color::parse("#0f0").unwrap().to_hex(), 0x00ff00);
        assert_eq!(Color::parse("rgb(0, 0, 255)").unwrap().to_hex(), 0x0000ff);
        let c = Color::parse("rgba(255,255,255,0.5)").unwrap();
        assert!((c.a - 0.5).abs() < 1e-6);
        assert_eq!(Color::parse("Navy").unwrap().to_hex(), 0x000080);
        let c = Color::parse("#11223380").unwrap();
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Color::parse("#12").is_err());
        assert!(Color::parse("#zzzzzz").is_err());
        assert!(Color::parse("rgb(1,2)").is_err());
        assert!(Color::parse("notacolor").is_err());
    }

    #[test]
    fn test_hsl_round_trip() {
        let c = Color::from_hex(0x3366cc);
        let (h, s, l) = c.to_hsl();
        assert_eq!(Color::from_hsl(h, s, l).to_hex(), 0x3366cc);
    }

    #[test]
    fn test_interpolation_endpoints() {
        let a = Color::from_hex(0xff0000);
        let b = Color::from_hex(0x0000ff);
        for space in [ColorSpace::Rgb, ColorSpace::Hsl] {
            assert_eq!(Color::interpolate(&a, &b, 0.0, space).to_hex(), 0xff0000);
            assert_eq!(Color::interpolate(&a, &b, 1.0, space).to_hex(), 0x0000ff);
        }
        assert_eq!(Color::lerp(&a, &b, 0.5).to_hex(), 0x800080);
    }
}
