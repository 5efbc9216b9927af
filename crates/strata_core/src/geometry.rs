//! Core geometry types
//!
//! `Point`, `Size` and `Rect` follow the usual origin + size convention.
//! `Bounds` is the min/max box used for bounds accumulation: it starts
//! empty and grows as points are folded into it.

use serde::{Deserialize, Serialize};

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Approximate equality, used by tests and change detection
    pub fn approx_eq(&self, other: Point, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Convert to a Rect at the origin (0, 0)
    pub const fn to_rect(self) -> Rect {
        Rect {
            origin: Point::ZERO,
            size: self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

impl From<Size> for Rect {
    fn from(size: Size) -> Self {
        size.to_rect()
    }
}

/// 2D rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn x(&self) -> f32 {
        self.origin.x
    }

    pub fn y(&self) -> f32 {
        self.origin.y
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.x < self.right()
            && point.y >= self.origin.y
            && point.y < self.bottom()
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x() + dx, self.y() + dy, self.width(), self.height())
    }

    /// Shrink (or grow, with negative values) by `dx`/`dy` on each side
    pub fn inset(&self, dx: f32, dy: f32) -> Self {
        Self::new(
            self.x() + dx,
            self.y() + dy,
            (self.width() - dx * 2.0).max(0.0),
            (self.height() - dy * 2.0).max(0.0),
        )
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.origin.x < other.right()
            && self.right() > other.origin.x
            && self.origin.y < other.bottom()
            && self.bottom() > other.origin.y
    }

    pub fn to_bounds(&self) -> Bounds {
        Bounds::new(self.x(), self.y(), self.right(), self.bottom())
    }
}

/// Axis-aligned min/max box
///
/// An empty `Bounds` has inverted infinite extents, so folding the first
/// point into it yields a zero-area box at that point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds {
    pub const EMPTY: Bounds = Bounds {
        left: f32::INFINITY,
        top: f32::INFINITY,
        right: f32::NEG_INFINITY,
        bottom: f32::NEG_INFINITY,
    };

    pub const ZERO: Bounds = Bounds {
        left: 0.0,
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
    };

    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// True until at least one point has been folded in
    pub fn is_empty(&self) -> bool {
        self.left > self.right || self.top > self.bottom
    }

    pub fn width(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.right - self.left
        }
    }

    pub fn height(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.bottom - self.top
        }
    }

    pub fn include(&mut self, point: Point) {
        self.left = self.left.min(point.x);
        self.top = self.top.min(point.y);
        self.right = self.right.max(point.x);
        self.bottom = self.bottom.max(point.y);
    }

    pub fn include_xy(&mut self, x: f32, y: f32) {
        self.include(Point::new(x, y));
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Bounds::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        !self.is_empty()
            && point.x >= self.left
            && point.x <= self.right
            && point.y >= self.top
            && point.y <= self.bottom
    }

    /// Empty bounds collapse to `Bounds::ZERO` so callers always get finite numbers
    pub fn or_zero(self) -> Bounds {
        if self.is_empty() {
            Bounds::ZERO
        } else {
            self
        }
    }

    pub fn to_rect(&self) -> Rect {
        if self.is_empty() {
            Rect::ZERO
        } else {
            Rect::new(self.left, self.top, self.width(), self.height())
        }
    }

    /// Grow by `amount` on every side
    pub fn expand(&self, amount: f32) -> Bounds {
        if self.is_empty() {
            return *self;
        }
        Bounds::new(
            self.left - amount,
            self.top - amount,
            self.right + amount,
            self.bottom + amount,
        )
    }

    pub fn approx_eq(&self, other: &Bounds, epsilon: f32) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.is_empty() == other.is_empty();
        }
        (self.left - other.left).abs() <= epsilon
            && (self.top - other.top).abs() <= epsilon
            && (self.right - other.right).abs() <= epsilon
            && (self.bottom - other.bottom).abs() <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_types() {
        let p = Point::new(1.0, 2.0);
        let s = Size::new(100.0, 50.0);
        let r = Rect::from_origin_size(p, s);

        assert_eq!(r.center(), Point::new(51.0, 27.0));
        assert!(r.contains(Point::new(50.0, 25.0)));
        assert!(!r.contains(Point::new(200.0, 100.0)));

        let rect: Rect = Size::new(200.0, 100.0).into();
        let inset = rect.inset(5.0, 10.0);
        assert_eq!(inset.x(), 5.0);
        assert_eq!(inset.height(), 80.0);
    }

    #[test]
    fn test_bounds_accumulation() {
        let mut b = Bounds::EMPTY;
        assert!(b.is_empty());
        assert_eq!(b.width(), 0.0);

        b.include_xy(3.0, 4.0);
        assert!(!b.is_empty());
        assert_eq!(b.width(), 0.0);

        b.include_xy(-1.0, 10.0);
        assert_eq!(b, Bounds::new(-1.0, 4.0, 3.0, 10.0));
        assert_eq!(b.to_rect(), Rect::new(-1.0, 4.0, 4.0, 6.0));
    }

    #[test]
    fn test_bounds_union_with_empty() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.union(&Bounds::EMPTY), a);
        assert_eq!(Bounds::EMPTY.union(&a), a);
        assert_eq!(
            a.union(&Bounds::new(5.0, -5.0, 20.0, 5.0)),
            Bounds::new(0.0, -5.0, 20.0, 10.0)
        );
        assert_eq!(Bounds::EMPTY.or_zero(), Bounds::ZERO);
    }
}
