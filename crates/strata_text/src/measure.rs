//! Text measurement
//!
//! Provides a trait for measuring text runs during layout. The estimated
//! measurer needs no font data and is fully deterministic, which makes it
//! the default for tests and the fallback when no font is registered.

use crate::style::FontSpec;

/// Measured extent of a single-line text run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    /// Advance width in pixels
    pub width: f32,
    /// Distance from baseline to top, positive
    pub ascent: f32,
    /// Distance from baseline to bottom, positive
    pub descent: f32,
}

impl TextMetrics {
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// Trait for measuring text dimensions
pub trait TextMeasurer: Send + Sync {
    /// Measure a single-line run of text
    fn measure(&self, text: &str, font: &FontSpec) -> TextMetrics;

    /// Width of `text`, the common case during line breaking
    fn width(&self, text: &str, font: &FontSpec) -> f32 {
        self.measure(text, font).width
    }
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for &T {
    fn measure(&self, text: &str, font: &FontSpec) -> TextMetrics {
        (**self).measure(text, font)
    }
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for Box<T> {
    fn measure(&self, text: &str, font: &FontSpec) -> TextMetrics {
        (**self).measure(text, font)
    }
}

/// A text measurer that uses estimates
///
/// Every character advances `0.55 * size`; ascent is `0.8 * size` and
/// descent `0.2 * size`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedTextMeasurer;

impl EstimatedTextMeasurer {
    pub const CHAR_WIDTH: f32 = 0.55;
    pub const ASCENT: f32 = 0.8;
    pub const DESCENT: f32 = 0.2;
}

impl TextMeasurer for EstimatedTextMeasurer {
    fn measure(&self, text: &str, font: &FontSpec) -> TextMetrics {
        let char_count = text.chars().count() as f32;
        TextMetrics {
            width: char_count * font.size * Self::CHAR_WIDTH,
            ascent: font.size * Self::ASCENT,
            descent: font.size * Self::DESCENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimated_metrics() {
        let m = EstimatedTextMeasurer.measure("Hello", &FontSpec::new(20.0));
        assert!((m.width - 55.0).abs() < 1e-4);
        assert!((m.ascent - 16.0).abs() < 1e-4);
        assert!((m.height() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_measure_counts_chars_not_bytes() {
        let font = FontSpec::new(10.0);
        assert_eq!(
            EstimatedTextMeasurer.width("héllo", &font),
            EstimatedTextMeasurer.width("hello", &font)
        );
    }
}
