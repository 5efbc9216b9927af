//! Font loading and measurement
//!
//! Provides font parsing via ttf-parser, font metric extraction, glyph
//! outlines for the raster surface and a [`FontLibrary`] measurer that
//! falls back to estimated metrics when no face is registered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

pub use ttf_parser::OutlineBuilder;

use crate::measure::{EstimatedTextMeasurer, TextMeasurer, TextMetrics};
use crate::style::{FontSpec, FontStyle, FontWeight};
use crate::{Result, TextError};

/// Font metrics in font units (typically 1000 or 2048 units per em)
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    /// Units per em (typically 1000 or 2048)
    pub units_per_em: u16,
    /// Ascender (distance from baseline to top of tallest glyph)
    pub ascender: i16,
    /// Descender (distance from baseline to bottom, typically negative)
    pub descender: i16,
    /// Line gap (additional spacing between lines)
    pub line_gap: i16,
}

impl FontMetrics {
    /// Scale a value from font units to pixels
    pub fn scale(&self, value: f32, font_size: f32) -> f32 {
        value * font_size / self.units_per_em as f32
    }

    pub fn ascender_px(&self, font_size: f32) -> f32 {
        self.scale(self.ascender as f32, font_size)
    }

    /// Descender in pixels, as a positive distance below the baseline
    pub fn descender_px(&self, font_size: f32) -> f32 {
        -self.scale(self.descender as f32, font_size)
    }
}

/// A parsed font face
pub struct FontFace {
    /// Raw font data (kept alive for ttf-parser)
    data: Arc<Vec<u8>>,
    /// Face index within the font file (for TTC files)
    face_index: u32,
    metrics: FontMetrics,
    family_name: String,
    weight: FontWeight,
    style: FontStyle,
}

impl FontFace {
    /// Load a font from raw TTF/OTF data (uses face index 0)
    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        Self::from_data_with_index(data, 0)
    }

    /// Load a font from raw TTF/OTF data with a specific face index
    pub fn from_data_with_index(data: Vec<u8>, face_index: u32) -> Result<Self> {
        let data = Arc::new(data);

        let face = ttf_parser::Face::parse(&data, face_index)
            .map_err(|e| TextError::FontParseError(format!("{:?}", e)))?;

        let metrics = FontMetrics {
            units_per_em: face.units_per_em(),
            ascender: face.ascender(),
            descender: face.descender(),
            line_gap: face.line_gap(),
        };

        let family_name = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::FAMILY)
            .and_then(|n| n.to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let weight = face
            .tables()
            .os2
            .map(|os2| FontWeight::from_number(os2.weight().to_number()))
            .unwrap_or(FontWeight::Regular);

        let style = if face.is_italic() {
            FontStyle::Italic
        } else if face.is_oblique() {
            FontStyle::Oblique
        } else {
            FontStyle::Normal
        };

        Ok(Self {
            data,
            face_index,
            metrics,
            family_name,
            weight,
            style,
        })
    }

    /// Load a font from a file path
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| TextError::FontLoadError(format!("Failed to read file: {}", e)))?;
        Self::from_data(data)
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn weight(&self) -> FontWeight {
        self.weight
    }

    pub fn style(&self) -> FontStyle {
        self.style
    }

    fn as_ttf_face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.face_index).ok()
    }

    /// Measure a run in pixels, applying `kern` table pairs when present
    pub fn measure(&self, text: &str, font_size: f32) -> TextMetrics {
        let mut advance = 0.0f32;
        if let Some(face) = self.as_ttf_face() {
            let kern = face.tables().kern;
            let mut prev: Option<ttf_parser::GlyphId> = None;
            for c in text.chars() {
                let glyph = face.glyph_index(c).unwrap_or(ttf_parser::GlyphId(0));
                advance += face.glyph_hor_advance(glyph).unwrap_or(0) as f32;
                if let (Some(left), Some(kern)) = (prev, kern.as_ref()) {
                    let pair = kern
                        .subtables
                        .into_iter()
                        .filter(|s| s.horizontal && !s.variable)
                        .find_map(|s| s.glyphs_kerning(left, glyph));
                    advance += pair.unwrap_or(0) as f32;
                }
                prev = Some(glyph);
            }
        }
        TextMetrics {
            width: self.metrics.scale(advance, font_size),
            ascent: self.metrics.ascender_px(font_size),
            descent: self.metrics.descender_px(font_size),
        }
    }

    /// Feed the outline of `c` (font units, y up) into `builder`
    ///
    /// Returns the glyph's advance in font units, or `None` if the face
    /// cannot be read.
    pub fn outline_char(&self, c: char, builder: &mut dyn OutlineBuilder) -> Option<f32> {
        let face = self.as_ttf_face()?;
        let glyph = face.glyph_index(c).unwrap_or(ttf_parser::GlyphId(0));
        face.outline_glyph(glyph, builder);
        Some(face.glyph_hor_advance(glyph).unwrap_or(0) as f32)
    }
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family_name", &self.family_name)
            .field("weight", &self.weight)
            .field("style", &self.style)
            .finish()
    }
}

/// Registered font faces, usable as a [`TextMeasurer`]
#[derive(Debug, Default)]
pub struct FontLibrary {
    faces: Vec<FontFace>,
    warned_empty: AtomicBool,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, face: FontFace) {
        debug!(family = face.family_name(), weight = ?face.weight(), "font registered");
        self.faces.push(face);
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Best face for `spec`: same family, then same style, then closest weight
    ///
    /// A family that is not registered falls back to all faces.
    pub fn face_for(&self, spec: &FontSpec) -> Option<&FontFace> {
        let family_matches: Vec<&FontFace> = match &spec.family {
            Some(family) => self
                .faces
                .iter()
                .filter(|f| f.family_name.eq_ignore_ascii_case(family))
                .collect(),
            None => Vec::new(),
        };
        let pool: Vec<&FontFace> = if family_matches.is_empty() {
            self.faces.iter().collect()
        } else {
            family_matches
        };
        let weight_distance =
            |f: &&FontFace| (f.weight.to_number() as i32 - spec.weight.to_number() as i32).abs();
        pool.iter()
            .copied()
            .filter(|f| f.style == spec.style)
            .min_by_key(weight_distance)
            .or_else(|| pool.iter().copied().min_by_key(weight_distance))
    }
}

impl TextMeasurer for FontLibrary {
    fn measure(&self, text: &str, font: &FontSpec) -> TextMetrics {
        match self.face_for(font) {
            Some(face) => face.measure(text, font.size),
            None => {
                if !self.warned_empty.swap(true, Ordering::Relaxed) {
                    warn!("no font faces registered, using estimated text metrics");
                }
                EstimatedTextMeasurer.measure(text, font)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_garbage_font_data() {
        let err = FontFace::from_data(vec![0u8; 16]).unwrap_err();
        assert!(matches!(err, TextError::FontParseError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = FontFace::from_file(std::path::Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, TextError::FontLoadError(_)));
    }

    #[test]
    fn test_empty_library_falls_back_to_estimate() {
        let library = FontLibrary::new();
        let font = FontSpec::new(10.0);
        assert_eq!(
            library.measure("abc", &font),
            EstimatedTextMeasurer.measure("abc", &font)
        );
    }

    #[test]
    fn test_metrics_scale() {
        let m = FontMetrics {
            units_per_em: 1000,
            ascender: 800,
            descender: -200,
            line_gap: 0,
        };
        assert_eq!(m.ascender_px(20.0), 16.0);
        assert_eq!(m.descender_px(20.0), 4.0);
    }
}
