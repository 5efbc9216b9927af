//! 2D affine transforms
//!
//! A node's local transform is built from its position, pivot, rotation and
//! uniform scale; world transforms are the parent's world transform composed
//! with the local one.

use crate::geometry::{Bounds, Point};

/// 2D affine transformation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2D {
    /// Matrix elements [a, b, c, d, tx, ty]
    /// | a  c  tx |
    /// | b  d  ty |
    /// | 0  0   1 |
    pub elements: [f32; 6],
}

impl Default for Affine2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2D {
    pub const IDENTITY: Affine2D = Affine2D {
        elements: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub const fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self {
            elements: [a, b, c, d, tx, ty],
        }
    }

    pub fn translation(x: f32, y: f32) -> Self {
        Self {
            elements: [1.0, 0.0, 0.0, 1.0, x, y],
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            elements: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    /// Rotation by `angle` radians (clockwise in y-down screen space)
    pub fn rotation(angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self {
            elements: [c, s, -s, c, 0.0, 0.0],
        }
    }

    /// Build a node transform: the local `pivot` point lands on (`x`, `y`)
    /// after rotating by `rotation_deg` degrees and scaling uniformly.
    pub fn from_placement(x: f32, y: f32, pivot: Point, rotation_deg: f32, scale: f32) -> Self {
        let angle = rotation_deg.to_radians();
        let (sin, cos) = if rotation_deg == 0.0 {
            (0.0, 1.0)
        } else {
            angle.sin_cos()
        };
        let a = cos * scale;
        let b = sin * scale;
        let c = -sin * scale;
        let d = cos * scale;
        Self {
            elements: [
                a,
                b,
                c,
                d,
                x - (pivot.x * a + pivot.y * c),
                y - (pivot.x * b + pivot.y * d),
            ],
        }
    }

    pub fn transform_point(&self, point: Point) -> Point {
        let [a, b, c, d, tx, ty] = self.elements;
        Point::new(
            a * point.x + c * point.y + tx,
            b * point.x + d * point.y + ty,
        )
    }

    /// Concatenate this transform with another (self * other)
    /// The resulting transform first applies `other`, then `self`.
    pub fn then(&self, other: &Affine2D) -> Affine2D {
        let [a1, b1, c1, d1, tx1, ty1] = self.elements;
        let [a2, b2, c2, d2, tx2, ty2] = other.elements;

        Affine2D {
            elements: [
                a1 * a2 + c1 * b2,
                b1 * a2 + d1 * b2,
                a1 * c2 + c1 * d2,
                b1 * c2 + d1 * d2,
                a1 * tx2 + c1 * ty2 + tx1,
                b1 * tx2 + d1 * ty2 + ty1,
            ],
        }
    }

    pub fn determinant(&self) -> f32 {
        let [a, b, c, d, _, _] = self.elements;
        a * d - b * c
    }

    /// The inverse transform, or `None` for a singular matrix (zero scale)
    pub fn invert(&self) -> Option<Affine2D> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let [a, b, c, d, tx, ty] = self.elements;
        let inv = 1.0 / det;
        Some(Affine2D {
            elements: [
                d * inv,
                -b * inv,
                -c * inv,
                a * inv,
                (c * ty - d * tx) * inv,
                (b * tx - a * ty) * inv,
            ],
        })
    }

    /// Map a point from the transformed space back into local space
    ///
    /// Singular transforms collapse everything onto the translation, so the
    /// origin is returned for them.
    pub fn transform_point_inverse(&self, point: Point) -> Point {
        match self.invert() {
            Some(inv) => inv.transform_point(point),
            None => Point::ZERO,
        }
    }

    /// Axis-aligned bounds of the four transformed corners
    pub fn transform_bounds(&self, bounds: &Bounds) -> Bounds {
        if bounds.is_empty() {
            return *bounds;
        }
        let mut out = Bounds::EMPTY;
        for corner in [
            Point::new(bounds.left, bounds.top),
            Point::new(bounds.right, bounds.top),
            Point::new(bounds.right, bounds.bottom),
            Point::new(bounds.left, bounds.bottom),
        ] {
            out.include(self.transform_point(corner));
        }
        out
    }

    pub fn translation_part(&self) -> Point {
        Point::new(self.elements[4], self.elements[5])
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}
