//! Text styles
//!
//! A `TextStyle` is the resolved style of one chunk: the node's defaults
//! with every open markup directive applied on top, innermost last.

use std::str::FromStr;

use strata_core::Color;

use crate::markup::{Directive, WeightChange};

/// Font weight variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum FontWeight {
    Thin = 100,
    ExtraLight = 200,
    Light = 300,
    #[default]
    Regular = 400,
    Medium = 500,
    SemiBold = 600,
    Bold = 700,
    ExtraBold = 800,
    Black = 900,
}

impl FontWeight {
    /// Convert from numeric weight (100-900)
    pub fn from_number(weight: u16) -> Self {
        match weight {
            0..=149 => FontWeight::Thin,
            150..=249 => FontWeight::ExtraLight,
            250..=349 => FontWeight::Light,
            350..=449 => FontWeight::Regular,
            450..=549 => FontWeight::Medium,
            550..=649 => FontWeight::SemiBold,
            650..=749 => FontWeight::Bold,
            750..=849 => FontWeight::ExtraBold,
            _ => FontWeight::Black,
        }
    }

    pub fn to_number(self) -> u16 {
        self as u16
    }

    /// Relative weight as CSS resolves `bolder`
    pub fn bolder(self) -> Self {
        match self.to_number() {
            0..=349 => FontWeight::Regular,
            350..=549 => FontWeight::Bold,
            _ => FontWeight::Black,
        }
    }

    /// Relative weight as CSS resolves `lighter`
    pub fn lighter(self) -> Self {
        match self.to_number() {
            0..=549 => FontWeight::Thin,
            550..=749 => FontWeight::Regular,
            _ => FontWeight::Bold,
        }
    }

    pub fn is_bold(self) -> bool {
        self >= FontWeight::SemiBold
    }
}

/// Font style (normal or italic)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FromStr for FontWeight {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thin" => Ok(FontWeight::Thin),
            "light" => Ok(FontWeight::Light),
            "normal" | "regular" => Ok(FontWeight::Regular),
            "medium" => Ok(FontWeight::Medium),
            "semibold" => Ok(FontWeight::SemiBold),
            "bold" => Ok(FontWeight::Bold),
            "black" => Ok(FontWeight::Black),
            other => other
                .parse::<u16>()
                .map(FontWeight::from_number)
                .map_err(|_| format!("unknown font weight '{other}'")),
        }
    }
}

impl FromStr for FontStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(FontStyle::Normal),
            "italic" => Ok(FontStyle::Italic),
            "oblique" => Ok(FontStyle::Oblique),
            other => Err(format!("unknown font style '{other}'")),
        }
    }
}

/// Horizontal alignment of lines inside the text box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAlign {
    #[default]
    Start,
    Center,
    End,
}

impl FromStr for TextAlign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "start" | "left" => Ok(TextAlign::Start),
            "center" | "middle" => Ok(TextAlign::Center),
            "end" | "right" => Ok(TextAlign::End),
            other => Err(format!("unknown alignment '{other}'")),
        }
    }
}

/// Superscript / subscript placement
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BaselineShift {
    #[default]
    None,
    Super,
    Sub,
    /// Explicit shift in pixels, positive moves up
    Pixels(f32),
}

/// Glyph size factor for super/subscript chunks
const SHIFTED_SCALE: f32 = 0.7;

/// What a measurer needs to know about a chunk's font
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: Option<String>,
    pub size: f32,
    pub weight: FontWeight,
    pub style: FontStyle,
}

impl FontSpec {
    pub fn new(size: f32) -> Self {
        Self {
            family: None,
            size,
            weight: FontWeight::Regular,
            style: FontStyle::Normal,
        }
    }
}

/// Resolved style of a text chunk
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: f32,
    pub weight: FontWeight,
    pub style: FontStyle,
    /// `None` inherits the node's fill
    pub color: Option<Color>,
    pub underline: bool,
    pub line_through: bool,
    pub baseline_shift: BaselineShift,
    /// Fixed chunk width from an inline `width:` directive
    pub fixed_width: Option<f32>,
    /// Alignment of the chunk text inside `fixed_width`
    pub fixed_align: TextAlign,
    /// `key: value` pairs with no built-in meaning, innermost last
    pub extra: Vec<(String, String)>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: None,
            font_size: 12.0,
            weight: FontWeight::Regular,
            style: FontStyle::Normal,
            color: None,
            underline: false,
            line_through: false,
            baseline_shift: BaselineShift::None,
            fixed_width: None,
            fixed_align: TextAlign::Start,
            extra: Vec::new(),
        }
    }
}

impl TextStyle {
    pub fn new(font_size: f32) -> Self {
        Self {
            font_size,
            ..Default::default()
        }
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Size glyphs are actually drawn at, after super/subscript reduction
    pub fn effective_size(&self) -> f32 {
        match self.baseline_shift {
            BaselineShift::Super | BaselineShift::Sub => self.font_size * SHIFTED_SCALE,
            _ => self.font_size,
        }
    }

    /// Vertical baseline offset in pixels, negative moves up (y-down space)
    pub fn baseline_offset(&self) -> f32 {
        match self.baseline_shift {
            BaselineShift::None => 0.0,
            BaselineShift::Super => -self.font_size * 0.4,
            BaselineShift::Sub => self.font_size * 0.2,
            BaselineShift::Pixels(px) => -px,
        }
    }

    pub fn font(&self) -> FontSpec {
        FontSpec {
            family: self.font_family.clone(),
            size: self.effective_size(),
            weight: self.weight,
            style: self.style,
        }
    }

    /// Look up a pass-through `key: value` pair
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Apply one markup directive on top of this style
    pub fn apply(&mut self, directive: &Directive) {
        match directive {
            Directive::Weight(WeightChange::Absolute(w)) => self.weight = *w,
            Directive::Weight(WeightChange::Bolder) => self.weight = self.weight.bolder(),
            Directive::Weight(WeightChange::Lighter) => self.weight = self.weight.lighter(),
            Directive::Style(s) => self.style = *s,
            Directive::Underline => self.underline = true,
            Directive::LineThrough => self.line_through = true,
            Directive::NoDecoration => {
                self.underline = false;
                self.line_through = false;
            }
            Directive::Color(c) => self.color = Some(*c),
            Directive::FontSize(size) => self.font_size = *size,
            Directive::FontFamily(family) => self.font_family = Some(family.clone()),
            Directive::BaselineShift(shift) => self.baseline_shift = *shift,
            Directive::Width(w) => self.fixed_width = Some(*w),
            Directive::Align(a) => self.fixed_align = *a,
            Directive::Property(k, v) => self.extra.push((k.clone(), v.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_weights() {
        assert_eq!(FontWeight::Regular.bolder(), FontWeight::Bold);
        assert_eq!(FontWeight::Bold.bolder(), FontWeight::Black);
        assert_eq!(FontWeight::Bold.lighter(), FontWeight::Regular);
        assert_eq!(FontWeight::from_number(640), FontWeight::SemiBold);
        assert!(FontWeight::SemiBold.is_bold());
    }

    #[test]
    fn test_parse_weight_and_style() {
        assert_eq!("bold".parse::<FontWeight>().unwrap(), FontWeight::Bold);
        assert_eq!("300".parse::<FontWeight>().unwrap(), FontWeight::Light);
        assert!("heavyish".parse::<FontWeight>().is_err());
        assert_eq!("Italic".parse::<FontStyle>().unwrap(), FontStyle::Italic);
        assert!("slanted".parse::<FontStyle>().is_err());
    }

    #[test]
    fn test_apply_directives() {
        let mut style = TextStyle::new(20.0);
        style.apply(&Directive::Weight(WeightChange::Bolder));
        style.apply(&Directive::Underline);
        style.apply(&Directive::Color(Color::RED));
        style.apply(&Directive::Property("data-id".into(), "7".into()));
        assert_eq!(style.weight, FontWeight::Bold);
        assert!(style.underline);
        assert_eq!(style.color, Some(Color::RED));
        assert_eq!(style.extra("data-id"), Some("7"));
    }

    #[test]
    fn test_shifted_font_is_smaller() {
        let mut style = TextStyle::new(10.0);
        style.apply(&Directive::BaselineShift(BaselineShift::Super));
        assert!((style.font().size - 7.0).abs() < 1e-6);
        assert!(style.baseline_offset() < 0.0);
    }
}
