//! Dynamic setting values
//!
//! Node settings are stored as `Value`s keyed by name. The variant decides
//! how an animation interpolates between two values of the same key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{CoreError, Result};
use crate::geometry::Point;

/// A percentage relative to some reference length (`50%` of the parent width)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Percent(pub f32);

impl Percent {
    /// Percentage as a fraction (`50%` -> `0.5`)
    pub fn fraction(&self) -> f32 {
        self.0 / 100.0
    }

    /// Resolve against a reference length
    pub fn resolve(&self, total: f32) -> f32 {
        total * self.fraction()
    }

    /// Parse `"50%"`
    pub fn parse(s: &str) -> Result<Percent> {
        let trimmed = s.trim();
        trimmed
            .strip_suffix('%')
            .and_then(|n| n.trim().parse::<f32>().ok())
            .map(Percent)
            .ok_or_else(|| CoreError::InvalidPercent(s.to_string()))
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Length that is either absolute pixels or relative to a reference
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    Px(f32),
    Percent(Percent),
}

impl Length {
    pub fn resolve(&self, total: f32) -> f32 {
        match self {
            Length::Px(v) => *v,
            Length::Percent(p) => p.resolve(total),
        }
    }
}

/// Kind tag of a [`Value`], used to pick an interpolation strategy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Number,
    Percent,
    Color,
    Bool,
    Text,
    Point,
    List,
}

/// A dynamically typed setting value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f32),
    Percent(Percent),
    Color(Color),
    Bool(bool),
    Text(String),
    Point(Point),
    List(Vec<f32>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Number(_) => ValueKind::Number,
            Value::Percent(_) => ValueKind::Percent,
            Value::Color(_) => ValueKind::Color,
            Value::Bool(_) => ValueKind::Bool,
            Value::Text(_) => ValueKind::Text,
            Value::Point(_) => ValueKind::Point,
            Value::List(_) => ValueKind::List,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Colors are accepted either typed or as a parseable string
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(c) => Some(*c),
            Value::Text(s) => Color::parse(s).ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Value::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[f32]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Numbers read as pixels, percents as relative lengths
    pub fn as_length(&self) -> Option<Length> {
        match self {
            Value::Number(n) => Some(Length::Px(*n)),
            Value::Percent(p) => Some(Length::Percent(*p)),
            Value::Text(s) => Percent::parse(s).ok().map(Length::Percent),
            _ => None,
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Number(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v as f32)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f32)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Color> for Value {
    fn from(v: Color) -> Self {
        Value::Color(v)
    }
}

impl From<Percent> for Value {
    fn from(v: Percent) -> Self {
        Value::Percent(v)
    }
}

impl From<Point> for Value {
    fn from(v: Point) -> Self {
        Value::Point(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<f32>> for Value {
    fn from(v: Vec<f32>) -> Self {
        Value::List(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_parse_and_resolve() {
        let p = Percent::parse(" 25% ").unwrap();
        assert_eq!(p, Percent(25.0));
        assert_eq!(p.resolve(200.0), 50.0);
        assert!(Percent::parse("25").is_err());
        assert!(Percent::parse("abc%").is_err());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::from(3.0).as_number(), Some(3.0));
        assert_eq!(Value::from("#ff0000").as_color(), Some(Color::from_hex(0xff0000)));
        assert_eq!(Value::from("nope").as_color(), None);
        assert_eq!(Value::from("50%").as_length(), Some(Length::Percent(Percent(50.0))));
        assert_eq!(Value::from(12.0).as_length().map(|l| l.resolve(999.0)), Some(12.0));
        assert_eq!(Value::from(true).kind(), ValueKind::Bool);
    }
}
