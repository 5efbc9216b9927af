//! Path building and geometric bounds
//!
//! A [`Path`] only stores the four primitives every backend understands
//! (move, line, quadratic, cubic) plus close. Arcs of every flavor are
//! lowered into cubic Bézier segments of at most 90 degrees when appended.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use strata_core::{Bounds, CornerRadius, Point, Rect};

/// Path command for building vector paths
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo {
        control: Point,
        end: Point,
    },
    CubicTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    Close,
}

/// A vector path with cursor tracking
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
    current: Option<Point>,
    subpath_start: Point,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.current = None;
        self.subpath_start = Point::ZERO;
    }

    /// The pen position, if any command has been issued
    pub fn current_point(&self) -> Option<Point> {
        self.current
    }

    pub fn move_to(&mut self, p: Point) {
        self.commands.push(PathCommand::MoveTo(p));
        self.current = Some(p);
        self.subpath_start = p;
    }

    /// Line to `p`; starts a subpath at `p` when there is no pen position
    pub fn line_to(&mut self, p: Point) {
        if self.current.is_none() {
            self.move_to(p);
            return;
        }
        self.commands.push(PathCommand::LineTo(p));
        self.current = Some(p);
    }

    pub fn quad_to(&mut self, control: Point, end: Point) {
        self.ensure_start(control);
        self.commands.push(PathCommand::QuadTo { control, end });
        self.current = Some(end);
    }

    pub fn cubic_to(&mut self, control1: Point, control2: Point, end: Point) {
        self.ensure_start(control1);
        self.commands.push(PathCommand::CubicTo {
            control1,
            control2,
            end,
        });
        self.current = Some(end);
    }

    pub fn close(&mut self) {
        if self.current.is_some() {
            self.commands.push(PathCommand::Close);
            self.current = Some(self.subpath_start);
        }
    }

    fn ensure_start(&mut self, p: Point) {
        if self.current.is_none() {
            self.move_to(p);
        }
    }

    /// Append every command of `other`
    pub fn extend(&mut self, other: &Path) {
        for command in other.commands() {
            match *command {
                PathCommand::MoveTo(p) => self.move_to(p),
                PathCommand::LineTo(p) => self.line_to(p),
                PathCommand::QuadTo { control, end } => self.quad_to(control, end),
                PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => self.cubic_to(control1, control2, end),
                PathCommand::Close => self.close(),
            }
        }
    }

    pub fn rect(&mut self, rect: Rect) {
        let (x, y, w, h) = (rect.x(), rect.y(), rect.width(), rect.height());
        self.move_to(Point::new(x, y));
        self.line_to(Point::new(x + w, y));
        self.line_to(Point::new(x + w, y + h));
        self.line_to(Point::new(x, y + h));
        self.close();
    }

    pub fn rounded_rect(&mut self, rect: Rect, radius: CornerRadius) {
        let r = radius.clamped(rect.width(), rect.height());
        if r.is_zero() {
            self.rect(rect);
            return;
        }
        let (x, y, w, h) = (rect.x(), rect.y(), rect.width(), rect.height());
        self.move_to(Point::new(x + r.top_left, y));
        self.line_to(Point::new(x + w - r.top_right, y));
        self.corner(Point::new(x + w - r.top_right, y + r.top_right), r.top_right, -FRAC_PI_2);
        self.line_to(Point::new(x + w, y + h - r.bottom_right));
        self.corner(
            Point::new(x + w - r.bottom_right, y + h - r.bottom_right),
            r.bottom_right,
            0.0,
        );
        self.line_to(Point::new(x + r.bottom_left, y + h));
        self.corner(Point::new(x + r.bottom_left, y + h - r.bottom_left), r.bottom_left, FRAC_PI_2);
        self.line_to(Point::new(x, y + r.top_left));
        self.corner(Point::new(x + r.top_left, y + r.top_left), r.top_left, PI);
        self.close();
    }

    fn corner(&mut self, center: Point, radius: f32, start: f32) {
        if radius > 0.0 {
            self.elliptical_segments(center, radius, radius, 0.0, start, FRAC_PI_2);
        }
    }

    pub fn ellipse(&mut self, center: Point, rx: f32, ry: f32) {
        let rx = rx.abs();
        let ry = ry.abs();
        self.move_to(Point::new(center.x + rx, center.y));
        self.elliptical_segments(center, rx, ry, 0.0, 0.0, TAU);
        self.close();
    }

    pub fn circle(&mut self, center: Point, radius: f32) {
        self.ellipse(center, radius, radius);
    }

    /// Circular arc around `center`, angles in radians, clockwise on screen
    /// unless `counter_clockwise`
    ///
    /// Connects to the arc start with a line when a subpath is open.
    pub fn arc(&mut self, center: Point, radius: f32, start: f32, end: f32, counter_clockwise: bool) {
        let radius = radius.abs();
        let sweep = arc_sweep(start, end, counter_clockwise);
        let first = Point::new(center.x + radius * start.cos(), center.y + radius * start.sin());
        self.line_to(first);
        if radius > 0.0 && sweep != 0.0 {
            self.elliptical_segments(center, radius, radius, 0.0, start, sweep);
        }
    }

    /// Rounded corner from the pen through `p1` towards `p2`
    pub fn arc_to(&mut self, p1: Point, p2: Point, radius: f32) {
        let Some(p0) = self.current else {
            self.move_to(p1);
            return;
        };
        let v1 = normalize(p0.x - p1.x, p0.y - p1.y);
        let v2 = normalize(p2.x - p1.x, p2.y - p1.y);
        let (Some(v1), Some(v2)) = (v1, v2) else {
            self.line_to(p1);
            return;
        };
        let cross = v1.x * v2.y - v1.y * v2.x;
        if radius <= 0.0 || cross.abs() < 1e-6 {
            self.line_to(p1);
            return;
        }
        let half = (v1.x * v2.x + v1.y * v2.y).clamp(-1.0, 1.0).acos() / 2.0;
        let tangent_distance = radius / half.tan();
        let t1 = Point::new(p1.x + v1.x * tangent_distance, p1.y + v1.y * tangent_distance);
        let t2 = Point::new(p1.x + v2.x * tangent_distance, p1.y + v2.y * tangent_distance);
        let Some(bisector) = normalize(v1.x + v2.x, v1.y + v2.y) else {
            self.line_to(p1);
            return;
        };
        let center_distance = radius / half.sin();
        let center = Point::new(
            p1.x + bisector.x * center_distance,
            p1.y + bisector.y * center_distance,
        );
        let start = (t1.y - center.y).atan2(t1.x - center.x);
        let end = (t2.y - center.y).atan2(t2.x - center.x);
        self.line_to(t1);
        let sweep = arc_sweep(start, end, cross > 0.0);
        self.elliptical_segments(center, radius, radius, 0.0, start, sweep);
    }

    /// Elliptical arc in SVG endpoint parameterization
    ///
    /// `x_rotation` is in degrees. Degenerate radii become a straight line
    /// and a zero-length arc is dropped.
    pub fn svg_arc_to(
        &mut self,
        rx: f32,
        ry: f32,
        x_rotation: f32,
        large_arc: bool,
        sweep: bool,
        end: Point,
    ) {
        let Some(start) = self.current else {
            self.move_to(end);
            return;
        };
        if start.approx_eq(end, 1e-6) {
            return;
        }
        let mut rx = rx.abs();
        let mut ry = ry.abs();
        if rx < 1e-6 || ry < 1e-6 {
            self.line_to(end);
            return;
        }

        let phi = x_rotation.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let dx = (start.x - end.x) / 2.0;
        let dy = (start.y - end.y) / 2.0;
        let x1 = cos_phi * dx + sin_phi * dy;
        let y1 = -sin_phi * dx + cos_phi * dy;

        // Out-of-range radii are scaled up just enough to reach
        let lambda = (x1 * x1) / (rx * rx) + (y1 * y1) / (ry * ry);
        if lambda > 1.0 {
            let s = lambda.sqrt();
            rx *= s;
            ry *= s;
        }

        let num = rx * rx * ry * ry - rx * rx * y1 * y1 - ry * ry * x1 * x1;
        let den = rx * rx * y1 * y1 + ry * ry * x1 * x1;
        let mut coef = if den > 0.0 { (num / den).max(0.0).sqrt() } else { 0.0 };
        if large_arc == sweep {
            coef = -coef;
        }
        let cxp = coef * rx * y1 / ry;
        let cyp = -coef * ry * x1 / rx;
        let center = Point::new(
            cos_phi * cxp - sin_phi * cyp + (start.x + end.x) / 2.0,
            sin_phi * cxp + cos_phi * cyp + (start.y + end.y) / 2.0,
        );

        let theta1 = vector_angle(1.0, 0.0, (x1 - cxp) / rx, (y1 - cyp) / ry);
        let mut delta = vector_angle(
            (x1 - cxp) / rx,
            (y1 - cyp) / ry,
            (-x1 - cxp) / rx,
            (-y1 - cyp) / ry,
        ) % TAU;
        if !sweep && delta > 0.0 {
            delta -= TAU;
        } else if sweep && delta < 0.0 {
            delta += TAU;
        }

        self.elliptical_segments(center, rx, ry, phi, theta1, delta);
        // Land exactly on the requested end point
        if let Some(PathCommand::CubicTo { end: last, .. }) = self.commands.last_mut() {
            *last = end;
        }
        self.current = Some(end);
    }

    /// Append cubic segments approximating the ellipse arc from `theta`
    /// through `delta` radians; the pen is assumed to be at the arc start
    fn elliptical_segments(
        &mut self,
        center: Point,
        rx: f32,
        ry: f32,
        phi: f32,
        theta: f32,
        delta: f32,
    ) {
        let segments = (delta.abs() / FRAC_PI_2 - 1e-4).ceil().max(1.0) as usize;
        let step = delta / segments as f32;
        let k = 4.0 / 3.0 * (step / 4.0).tan();
        let (sin_phi, cos_phi) = phi.sin_cos();

        let point = |t: f32| {
            let (s, c) = t.sin_cos();
            Point::new(
                center.x + rx * c * cos_phi - ry * s * sin_phi,
                center.y + rx * c * sin_phi + ry * s * cos_phi,
            )
        };
        let tangent = |t: f32| {
            let (s, c) = t.sin_cos();
            (
                -rx * s * cos_phi - ry * c * sin_phi,
                -rx * s * sin_phi + ry * c * cos_phi,
            )
        };

        let mut t1 = theta;
        for _ in 0..segments {
            let t2 = t1 + step;
            let p1 = point(t1);
            let p2 = point(t2);
            let d1 = tangent(t1);
            let d2 = tangent(t2);
            self.cubic_to(
                Point::new(p1.x + k * d1.0, p1.y + k * d1.1),
                Point::new(p2.x - k * d2.0, p2.y - k * d2.1),
                p2,
            );
            t1 = t2;
        }
    }

    /// Tight bounding box, including curve extrema
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::EMPTY;
        let mut pen = Point::ZERO;
        let mut start = Point::ZERO;
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(p) => {
                    bounds.include(p);
                    pen = p;
                    start = p;
                }
                PathCommand::LineTo(p) => {
                    bounds.include(pen);
                    bounds.include(p);
                    pen = p;
                }
                PathCommand::QuadTo { control, end } => {
                    include_quad(&mut bounds, pen, control, end);
                    pen = end;
                }
                PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => {
                    include_cubic(&mut bounds, pen, control1, control2, end);
                    pen = end;
                }
                PathCommand::Close => pen = start,
            }
        }
        bounds
    }
}

/// Canvas-style sweep between two angles
pub(crate) fn arc_sweep(start: f32, end: f32, counter_clockwise: bool) -> f32 {
    if counter_clockwise {
        if start - end >= TAU {
            -TAU
        } else {
            -(start - end).rem_euclid(TAU)
        }
    } else if end - start >= TAU {
        TAU
    } else {
        (end - start).rem_euclid(TAU)
    }
}

fn normalize(x: f32, y: f32) -> Option<Point> {
    let len = (x * x + y * y).sqrt();
    (len > 1e-9).then(|| Point::new(x / len, y / len))
}

fn vector_angle(ux: f32, uy: f32, vx: f32, vy: f32) -> f32 {
    (ux * vy - uy * vx).atan2(ux * vx + uy * vy)
}

/// Extend `bounds` with the exact extent of a quadratic Bézier
pub fn include_quad(bounds: &mut Bounds, p0: Point, p1: Point, p2: Point) {
    bounds.include(p0);
    bounds.include(p2);
    let eval = |t: f32| {
        let mt = 1.0 - t;
        Point::new(
            mt * mt * p0.x + 2.0 * mt * t * p1.x + t * t * p2.x,
            mt * mt * p0.y + 2.0 * mt * t * p1.y + t * t * p2.y,
        )
    };
    for (a, b, c) in [(p0.x, p1.x, p2.x), (p0.y, p1.y, p2.y)] {
        let den = a - 2.0 * b + c;
        if den.abs() > 1e-9 {
            let t = (a - b) / den;
            if t > 0.0 && t < 1.0 {
                bounds.include(eval(t));
            }
        }
    }
}

/// Extend `bounds` with the exact extent of a cubic Bézier
pub fn include_cubic(bounds: &mut Bounds, p0: Point, p1: Point, p2: Point, p3: Point) {
    bounds.include(p0);
    bounds.include(p3);
    let eval = |t: f32| {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point::new(
            a * p0.x + b * p1.x + c * p2.x + d * p3.x,
            a * p0.y + b * p1.y + c * p2.y + d * p3.y,
        )
    };
    for (v0, v1, v2, v3) in [(p0.x, p1.x, p2.x, p3.x), (p0.y, p1.y, p2.y, p3.y)] {
        // Roots of the derivative divided by 3
        let a = -v0 + 3.0 * v1 - 3.0 * v2 + v3;
        let b = 2.0 * (v0 - 2.0 * v1 + v2);
        let c = v1 - v0;
        for t in quadratic_roots(a, b, c).into_iter().flatten() {
            if t > 0.0 && t < 1.0 {
                bounds.include(eval(t));
            }
        }
    }
}

fn quadratic_roots(a: f32, b: f32, c: f32) -> [Option<f32>; 2] {
    if a.abs() < 1e-9 {
        if b.abs() < 1e-9 {
            return [None, None];
        }
        return [Some(-c / b), None];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return [None, None];
    }
    let sq = disc.sqrt();
    [Some((-b + sq) / (2.0 * a)), Some((-b - sq) / (2.0 * a))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_bounds() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.line_to(Point::new(10.0, 0.0));
        path.line_to(Point::new(10.0, 10.0));
        path.close();
        assert_eq!(path.bounds(), Bounds::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_cubic_bounds_use_extrema_not_control_points() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.cubic_to(Point::new(0.0, 10.0), Point::new(10.0, 10.0), Point::new(10.0, 0.0));
        let b = path.bounds();
        // Peak of this curve is at 7.5, control points reach 10
        assert!((b.bottom - 7.5).abs() < 1e-4);
        assert_eq!(b.left, 0.0);
        assert_eq!(b.right, 10.0);
    }

    #[test]
    fn test_quad_bounds() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.quad_to(Point::new(5.0, 10.0), Point::new(10.0, 0.0));
        assert!((path.bounds().bottom - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_circle_bounds() {
        let mut path = Path::new();
        path.circle(Point::new(5.0, 5.0), 5.0);
        assert!(path.bounds().approx_eq(&Bounds::new(0.0, 0.0, 10.0, 10.0), 1e-3));
    }

    #[test]
    fn test_half_circle_arc_extent() {
        let mut path = Path::new();
        path.arc(Point::ZERO, 10.0, 0.0, PI, false);
        let b = path.bounds();
        // Clockwise on screen from +x to -x passes through +y
        assert!((b.bottom - 10.0).abs() < 1e-3);
        assert!(b.top.abs() < 1e-3);
        assert!((b.left + 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_svg_arc_semicircle() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.svg_arc_to(5.0, 5.0, 0.0, false, true, Point::new(10.0, 0.0));
        assert_eq!(path.current_point(), Some(Point::new(10.0, 0.0)));
        let b = path.bounds();
        // Sweep flag set: clockwise on screen, through the top
        assert!((b.top + 5.0).abs() < 1e-3);
        assert!(b.bottom.abs() < 1e-3);
    }

    #[test]
    fn test_svg_arc_radius_scaled_up() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.svg_arc_to(1.0, 1.0, 0.0, false, false, Point::new(10.0, 0.0));
        let b = path.bounds();
        assert!((b.bottom - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_arc_to_rounds_corner() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.arc_to(Point::new(10.0, 0.0), Point::new(10.0, 10.0), 2.0);
        let end = path.current_point().unwrap();
        assert!(end.approx_eq(Point::new(10.0, 2.0), 1e-3));
        assert!(path.bounds().right <= 10.0 + 1e-3);
    }

    #[test]
    fn test_rounded_rect_stays_in_rect() {
        let mut path = Path::new();
        path.rounded_rect(Rect::new(0.0, 0.0, 20.0, 10.0), CornerRadius::uniform(4.0));
        assert!(path.bounds().approx_eq(&Bounds::new(0.0, 0.0, 20.0, 10.0), 1e-3));
    }
}
