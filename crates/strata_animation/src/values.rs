//! Animatable value types
//!
//! `Interpolate` covers the typed values; `interpolate_value` picks a
//! strategy from a [`Value`]'s kind: numbers and percentages are linear
//! (`"50%"` text counts as a percentage), colors go through RGB or HSL, and
//! anything else holds the start value until the animation ends.

use strata_core::{Color, ColorSpace, Percent, Point, Value};

/// Typed values an animation can blend
///
/// `t` may leave `0..=1` for overshooting easings.
pub trait Interpolate: Clone {
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

// ============================================================================
// Scalars
// ============================================================================

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for Percent {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Percent(Interpolate::lerp(&self.0, &other.0, t))
    }
}

// ============================================================================
// Geometry and color
// ============================================================================

impl Interpolate for Point {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Point::new(
            Interpolate::lerp(&self.x, &other.x, t),
            Interpolate::lerp(&self.y, &other.y, t),
        )
    }
}

impl Interpolate for Color {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Color::lerp(self, other, t)
    }
}

/// Interpolate between two setting values at eased progress `t`
///
/// `t` is not clamped: back and elastic easings overshoot past `to`.
pub fn interpolate_value(from: &Value, to: &Value, t: f32, space: ColorSpace) -> Value {
    match (from, to) {
        (Value::Number(a), Value::Number(b)) => Value::Number(Interpolate::lerp(a, b, t)),
        (Value::Point(a), Value::Point(b)) => Value::Point(Interpolate::lerp(a, b, t)),
        (Value::List(a), Value::List(b)) if a.len() == b.len() => {
            Value::List(a.iter().zip(b).map(|(x, y)| Interpolate::lerp(x, y, t)).collect())
        }
        _ => {
            if let (Some(a), Some(b)) = (as_percent(from), as_percent(to)) {
                return Value::Percent(Interpolate::lerp(&a, &b, t));
            }
            match (from.as_color(), to.as_color()) {
                (Some(a), Some(b)) => Value::Color(Color::interpolate(&a, &b, t, space)),
                _ if t >= 1.0 => to.clone(),
                _ => from.clone(),
            }
        }
    }
}

fn as_percent(value: &Value) -> Option<Percent> {
    match value {
        Value::Percent(p) => Some(*p),
        Value::Text(s) => Percent::parse(s).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_linear() {
        let v = interpolate_value(&Value::Number(0.0), &Value::Number(100.0), 0.5, ColorSpace::Rgb);
        assert_eq!(v, Value::Number(50.0));
    }

    #[test]
    fn test_percent_linear() {
        let v = interpolate_value(
            &Value::Percent(Percent(10.0)),
            &Value::Percent(Percent(30.0)),
            0.25,
            ColorSpace::Rgb,
        );
        assert_eq!(v, Value::Percent(Percent(15.0)));
    }

    #[test]
    fn test_percent_from_text() {
        let from = Value::Text("10%".into());
        let to = Value::Text("50%".into());
        assert_eq!(
            interpolate_value(&from, &to, 0.5, ColorSpace::Rgb),
            Value::Percent(Percent(30.0))
        );
        let mixed = interpolate_value(&from, &Value::Percent(Percent(20.0)), 0.5, ColorSpace::Rgb);
        assert_eq!(mixed, Value::Percent(Percent(15.0)));
    }

    #[test]
    fn test_overshoot_not_clamped() {
        let v = interpolate_value(&Value::Number(0.0), &Value::Number(100.0), 1.1, ColorSpace::Rgb);
        let n = v.as_number().unwrap();
        assert!((n - 110.0).abs() < 1e-3);
    }

    #[test]
    fn test_color_from_strings() {
        let v = interpolate_value(
            &Value::Text("#000000".into()),
            &Value::Color(Color::WHITE),
            0.5,
            ColorSpace::Rgb,
        );
        let c = v.as_color().unwrap();
        assert!((c.r - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_discrete_step() {
        let from = Value::Text("left".into());
        let to = Value::Text("right".into());
        assert_eq!(interpolate_value(&from, &to, 0.99, ColorSpace::Rgb), from);
        assert_eq!(interpolate_value(&from, &to, 1.0, ColorSpace::Rgb), to);
        let mixed = interpolate_value(&Value::Bool(false), &Value::Number(3.0), 0.5, ColorSpace::Rgb);
        assert_eq!(mixed, Value::Bool(false));
    }
}
