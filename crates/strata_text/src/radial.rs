//! Circular text placement
//!
//! Lays a single line of text along a circle centered at the origin. Each
//! segment gets its own position and rotation; right-to-left words are
//! placed as one segment so their letters stay joined.

use strata_core::Point;

use crate::bidi;
use crate::measure::TextMeasurer;
use crate::style::{TextAlign, TextStyle};

/// Circular placement settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialOptions {
    pub radius: f32,
    /// Degrees, clockwise from +x in y-down space
    pub start_angle: f32,
    /// Glyph tops point at the center instead of away from it
    pub inside: bool,
    /// Extra spacing between segments, in pixels along the arc
    pub kerning: f32,
    /// Where the text sits relative to `start_angle`
    pub align: TextAlign,
    pub rtl: bool,
}

impl Default for RadialOptions {
    fn default() -> Self {
        Self {
            radius: 100.0,
            start_angle: -90.0,
            inside: false,
            kerning: 0.0,
            align: TextAlign::Center,
            rtl: false,
        }
    }
}

/// Where to draw one segment
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphPlacement {
    pub text: String,
    /// Segment center on the circle
    pub position: Point,
    /// Glyph rotation in degrees
    pub rotation: f32,
    pub width: f32,
    pub rtl: bool,
}

pub fn place_on_circle(
    text: &str,
    style: &TextStyle,
    options: &RadialOptions,
    measurer: &dyn TextMeasurer,
) -> Vec<GlyphPlacement> {
    let radius = options.radius;
    if radius <= 0.0 || text.is_empty() {
        return Vec::new();
    }
    let font = style.font();
    let segments = bidi::segments(text, options.rtl);
    let widths: Vec<f32> = segments
        .iter()
        .map(|s| measurer.width(&s.text, &font))
        .collect();
    let gaps = segments.len().saturating_sub(1) as f32 * options.kerning;
    let total = widths.iter().sum::<f32>() + gaps;
    let span = (total / radius).to_degrees();

    // Outside text runs clockwise, inside text counter-clockwise, so both read left to right
    let dir = if options.inside { -1.0 } else { 1.0 };
    let mut angle = match options.align {
        TextAlign::Start => options.start_angle,
        TextAlign::Center => options.start_angle - dir * span / 2.0,
        TextAlign::End => options.start_angle - dir * span,
    };

    let mut placements = Vec::with_capacity(segments.len());
    for (segment, width) in segments.into_iter().zip(widths) {
        let half = (width / 2.0 / radius).to_degrees();
        let center = angle + dir * half;
        let rad = center.to_radians();
        placements.push(GlyphPlacement {
            text: segment.text,
            position: Point::new(radius * rad.cos(), radius * rad.sin()),
            rotation: center + dir * 90.0,
            width,
            rtl: segment.rtl,
        });
        angle += dir * ((width + options.kerning) / radius).to_degrees();
    }
    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::EstimatedTextMeasurer;

    #[test]
    fn test_glyphs_sit_on_circle() {
        let style = TextStyle::new(10.0);
        let options = RadialOptions {
            radius: 50.0,
            ..Default::default()
        };
        let placed = place_on_circle("abc", &style, &options, &EstimatedTextMeasurer);
        assert_eq!(placed.len(), 3);
        for p in &placed {
            let r = (p.position.x * p.position.x + p.position.y * p.position.y).sqrt();
            assert!((r - 50.0).abs() < 1e-3);
        }
        // Centered on the top of the circle: middle glyph straight up, upright
        assert!(placed[1].position.x.abs() < 1e-3);
        assert!((placed[1].rotation - 0.0).abs() < 1e-3);
        assert!(placed[0].position.x < 0.0 && placed[2].position.x > 0.0);
    }

    #[test]
    fn test_inside_runs_counter_clockwise() {
        let style = TextStyle::new(10.0);
        let options = RadialOptions {
            radius: 50.0,
            start_angle: 90.0,
            inside: true,
            ..Default::default()
        };
        let placed = place_on_circle("ab", &style, &options, &EstimatedTextMeasurer);
        // At the bottom, reading left to right means x increases
        assert!(placed[0].position.x < placed[1].position.x);
    }

    #[test]
    fn test_degenerate_radius() {
        let style = TextStyle::new(10.0);
        let options = RadialOptions {
            radius: 0.0,
            ..Default::default()
        };
        assert!(place_on_circle("abc", &style, &options, &EstimatedTextMeasurer).is_empty());
    }
}
