//! Stroke, dash and shadow settings carried by op lists

use strata_core::{Color, LineCap, LineJoin};

/// Stroke style configuration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    pub color: Color,
    pub cap: LineCap,
    pub join: LineJoin,
    /// Miter limit (for Miter joins)
    pub miter_limit: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            color: Color::BLACK,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 4.0,
        }
    }
}

impl StrokeStyle {
    pub fn new(width: f32, color: Color) -> Self {
        Self {
            width,
            color,
            ..Default::default()
        }
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }
}

/// Dash pattern; an empty pattern is a solid line
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineDash {
    pub intervals: Vec<f32>,
    pub offset: f32,
}

impl LineDash {
    pub fn new(intervals: Vec<f32>, offset: f32) -> Self {
        Self { intervals, offset }
    }

    /// True when the pattern would draw anything other than a solid line
    pub fn is_dashed(&self) -> bool {
        self.intervals.iter().any(|v| *v > 0.0) && self.intervals.iter().all(|v| *v >= 0.0)
    }

    /// Intervals with an even count, repeating odd patterns as canvas does
    pub fn normalized(&self) -> Vec<f32> {
        if self.intervals.len() % 2 == 1 {
            self.intervals.repeat(2)
        } else {
            self.intervals.clone()
        }
    }
}

/// Drop shadow painted under fills on the visible surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shadow {
    pub color: Color,
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Shadow {
    pub fn new(color: Color, blur: f32, offset_x: f32, offset_y: f32) -> Self {
        Self {
            color,
            blur,
            offset_x,
            offset_y,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.color.a > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odd_dash_repeats() {
        let dash = LineDash::new(vec![4.0, 2.0, 1.0], 0.0);
        assert_eq!(dash.normalized(), vec![4.0, 2.0, 1.0, 4.0, 2.0, 1.0]);
        assert!(dash.is_dashed());
        assert!(!LineDash::default().is_dashed());
        assert!(!LineDash::new(vec![0.0, 0.0], 0.0).is_dashed());
    }
}
