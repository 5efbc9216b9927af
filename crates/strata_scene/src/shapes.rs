//! Shape builders for graphics nodes
//!
//! A graphics node's op list is never patched: whenever one of its settings
//! changes the whole list is rebuilt from the node's [`Shape`] and settings.
//! The order is always shadow, fill, geometry, end fill, stroke.

use std::f32::consts::PI;
use std::fmt;
use std::rc::Rc;

use strata_core::{CornerRadius, LineCap, LineJoin, PropertyStore, Rect, Size};
use strata_paint::{OpList, Shadow, StrokeStyle};

use crate::error::Result;
use crate::keys;

/// Custom drawing callback, given an empty op list and the node's settings
pub type DrawFn = Rc<dyn Fn(&mut OpList, &PropertyStore)>;

/// Geometry of a graphics node
#[derive(Clone, Default)]
pub enum Shape {
    /// Draws nothing
    #[default]
    Empty,
    /// `width` x `height` from the origin
    Rectangle,
    /// Rectangle with `corner_radius` / `corner_radius_*` corners
    RoundedRectangle,
    /// `radius` around the origin
    Circle,
    /// `radius` x `radius_y` around the origin
    Ellipse,
    /// Open polyline through `points`
    Line,
    /// Closed polygon through `points`
    Polygon,
    /// Pie or donut wedge: `radius`, `inner_radius`, `start_angle`, `arc`
    Slice,
    /// `spikes` points between `radius` and `inner_radius`
    Star,
    /// SVG path data from `svg_path`
    SvgPath,
    Custom(DrawFn),
}

impl Shape {
    pub fn custom<F>(draw: F) -> Self
    where
        F: Fn(&mut OpList, &PropertyStore) + 'static,
    {
        Shape::Custom(Rc::new(draw))
    }

    fn name(&self) -> &'static str {
        match self {
            Shape::Empty => "Empty",
            Shape::Rectangle => "Rectangle",
            Shape::RoundedRectangle => "RoundedRectangle",
            Shape::Circle => "Circle",
            Shape::Ellipse => "Ellipse",
            Shape::Line => "Line",
            Shape::Polygon => "Polygon",
            Shape::Slice => "Slice",
            Shape::Star => "Star",
            Shape::SvgPath => "SvgPath",
            Shape::Custom(_) => "Custom",
        }
    }

    fn fills(&self) -> bool {
        !matches!(self, Shape::Empty | Shape::Line | Shape::Custom(_))
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Shape::Custom(a), Shape::Custom(b)) => Rc::ptr_eq(a, b),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

/// Build the op list for `shape` from `settings`
///
/// `available` is the parent's inner size, used to resolve percent sizes.
pub fn build_ops(shape: &Shape, settings: &PropertyStore, available: Size) -> Result<OpList> {
    let mut ops = OpList::new();
    if let Shape::Custom(draw) = shape {
        draw(&mut ops, settings);
        return Ok(ops);
    }

    if let Some(shadow) = shadow(settings) {
        ops.shadow(Some(shadow));
    }

    let fill = settings
        .get_color(keys::FILL)
        .filter(|_| shape.fills())
        .map(|c| c.fade(settings.get_number(keys::FILL_OPACITY, 1.0)));
    match fill {
        Some(color) => ops.begin_fill(color),
        None => ops.begin_path(),
    }

    geometry(shape, settings, available, &mut ops)?;

    if fill.is_some() {
        ops.end_fill();
    }
    if let Some(stroke) = stroke(settings) {
        ops.line_style(stroke);
        if let Some(dashes) = settings.get_list(keys::STROKE_DASHARRAY) {
            ops.set_line_dash(
                dashes.to_vec(),
                settings.get_number(keys::STROKE_DASHOFFSET, 0.0),
            );
        }
        ops.end_stroke();
    }
    Ok(ops)
}

fn geometry(shape: &Shape, settings: &PropertyStore, available: Size, ops: &mut OpList) -> Result<()> {
    let width = length(settings, keys::WIDTH, available.width);
    let height = length(settings, keys::HEIGHT, available.height);
    let half_min = available.width.min(available.height) / 2.0;

    match shape {
        Shape::Empty | Shape::Custom(_) => {}
        Shape::Rectangle => {
            if width != 0.0 || height != 0.0 {
                ops.draw_rect(0.0, 0.0, width, height);
            }
        }
        Shape::RoundedRectangle => {
            if width != 0.0 || height != 0.0 {
                let radius = corner_radius(settings).clamped(width.abs(), height.abs());
                ops.draw_rounded_rect(Rect::new(0.0, 0.0, width, height), radius);
            }
        }
        Shape::Circle => {
            let radius = length(settings, keys::RADIUS, half_min);
            if radius > 0.0 {
                ops.draw_circle(0.0, 0.0, radius);
            }
        }
        Shape::Ellipse => {
            let rx = length(settings, keys::RADIUS, half_min);
            let ry = settings
                .get_length(keys::RADIUS_Y)
                .map_or(rx, |l| l.resolve(half_min));
            if rx > 0.0 && ry > 0.0 {
                ops.draw_ellipse(0.0, 0.0, rx, ry);
            }
        }
        Shape::Line | Shape::Polygon => {
            let points = settings.get_list(keys::POINTS).unwrap_or(&[]);
            let mut pairs = points.chunks_exact(2);
            if let Some(first) = pairs.next() {
                ops.move_to(first[0], first[1]);
                for p in pairs {
                    ops.line_to(p[0], p[1]);
                }
                if matches!(shape, Shape::Polygon) {
                    ops.close_path();
                }
            }
        }
        Shape::Slice => slice(settings, half_min, ops),
        Shape::Star => star(settings, half_min, ops),
        Shape::SvgPath => {
            if let Some(data) = settings.get_text(keys::SVG_PATH) {
                ops.svg_path(data)?;
            }
        }
    }
    Ok(())
}

fn slice(settings: &PropertyStore, half_min: f32, ops: &mut OpList) {
    let radius = length(settings, keys::RADIUS, half_min);
    if radius <= 0.0 {
        return;
    }
    let inner = length(settings, keys::INNER_RADIUS, radius).clamp(0.0, radius);
    let start = settings.get_number(keys::START_ANGLE, 0.0).to_radians();
    let arc = settings.get_number(keys::ARC, 360.0).clamp(-360.0, 360.0);
    if arc == 0.0 {
        return;
    }
    let end = start + arc.to_radians();
    let ccw = arc < 0.0;

    if inner > 0.0 {
        ops.move_to(inner * start.cos(), inner * start.sin());
        ops.arc(0.0, 0.0, radius, start, end, ccw);
        ops.arc(0.0, 0.0, inner, end, start, !ccw);
    } else {
        ops.move_to(0.0, 0.0);
        ops.arc(0.0, 0.0, radius, start, end, ccw);
    }
    ops.close_path();
}

fn star(settings: &PropertyStore, half_min: f32, ops: &mut OpList) {
    let radius = length(settings, keys::RADIUS, half_min);
    let spikes = settings.get_number(keys::SPIKES, 5.0).round().max(2.0) as usize;
    if radius <= 0.0 {
        return;
    }
    let inner = settings
        .get_length(keys::INNER_RADIUS)
        .map_or(radius / 2.0, |l| l.resolve(radius));
    let start = settings.get_number(keys::START_ANGLE, -90.0).to_radians();
    let step = PI / spikes as f32;

    for i in 0..spikes * 2 {
        let r = if i % 2 == 0 { radius } else { inner };
        let angle = start + step * i as f32;
        let (x, y) = (r * angle.cos(), r * angle.sin());
        if i == 0 {
            ops.move_to(x, y);
        } else {
            ops.line_to(x, y);
        }
    }
    ops.close_path();
}

fn length(settings: &PropertyStore, key: &str, total: f32) -> f32 {
    settings.get_length(key).map_or(0.0, |l| l.resolve(total))
}

fn corner_radius(settings: &PropertyStore) -> CornerRadius {
    let all = settings.get_number(keys::CORNER_RADIUS, 0.0);
    CornerRadius::new(
        settings.get_number(keys::CORNER_RADIUS_TL, all),
        settings.get_number(keys::CORNER_RADIUS_TR, all),
        settings.get_number(keys::CORNER_RADIUS_BR, all),
        settings.get_number(keys::CORNER_RADIUS_BL, all),
    )
}

fn stroke(settings: &PropertyStore) -> Option<StrokeStyle> {
    let color = settings
        .get_color(keys::STROKE)?
        .fade(settings.get_number(keys::STROKE_OPACITY, 1.0));
    let mut style = StrokeStyle::new(settings.get_number(keys::STROKE_WIDTH, 1.0), color);
    if let Some(join) = settings
        .get_text(keys::LINE_JOIN)
        .and_then(|s| s.parse::<LineJoin>().ok())
    {
        style = style.with_join(join);
    }
    if let Some(cap) = settings
        .get_text(keys::LINE_CAP)
        .and_then(|s| s.parse::<LineCap>().ok())
    {
        style = style.with_cap(cap);
    }
    Some(style)
}

fn shadow(settings: &PropertyStore) -> Option<Shadow> {
    let color = settings
        .get_color(keys::SHADOW_COLOR)?
        .fade(settings.get_number(keys::SHADOW_OPACITY, 1.0));
    let shadow = Shadow::new(
        color,
        settings.get_number(keys::SHADOW_BLUR, 0.0),
        settings.get_number(keys::SHADOW_OFFSET_X, 0.0),
        settings.get_number(keys::SHADOW_OFFSET_Y, 0.0),
    );
    shadow.is_visible().then_some(shadow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{Bounds, Color, Percent};
    use strata_paint::GraphicsOp;

    fn settings(pairs: &[(&str, strata_core::Value)]) -> PropertyStore {
        let mut store = PropertyStore::new();
        for (key, value) in pairs {
            store.set(key, value.clone());
        }
        store
    }

    const AVAILABLE: Size = Size::new(200.0, 100.0);

    #[test]
    fn test_rectangle_fill_and_stroke_order() {
        let s = settings(&[
            (keys::WIDTH, 100.0.into()),
            (keys::HEIGHT, 50.0.into()),
            (keys::FILL, Color::RED.into()),
            (keys::STROKE, "#0000ff".into()),
            (keys::STROKE_WIDTH, 2.0.into()),
        ]);
        let ops = build_ops(&Shape::Rectangle, &s, AVAILABLE).unwrap();
        let kinds: Vec<_> = ops.ops().iter().map(std::mem::discriminant).collect();
        let expected = [
            GraphicsOp::BeginFill(Color::RED),
            GraphicsOp::Rect(Rect::ZERO),
            GraphicsOp::EndFill,
            GraphicsOp::LineStyle(StrokeStyle::default()),
            GraphicsOp::EndStroke,
        ];
        assert_eq!(kinds, expected.iter().map(std::mem::discriminant).collect::<Vec<_>>());
        assert_eq!(ops.bounds(), Bounds::new(0.0, 0.0, 100.0, 50.0));
        assert!(matches!(ops.ops()[3], GraphicsOp::LineStyle(s) if s.width == 2.0 && s.color == Color::BLUE));
    }

    #[test]
    fn test_percent_width_resolves_against_available() {
        let s = settings(&[
            (keys::WIDTH, Percent(50.0).into()),
            (keys::HEIGHT, "100%".into()),
        ]);
        let ops = build_ops(&Shape::Rectangle, &s, AVAILABLE).unwrap();
        assert_eq!(ops.bounds(), Bounds::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_zero_area_shape_draws_nothing() {
        let ops = build_ops(&Shape::Rectangle, &PropertyStore::new(), AVAILABLE).unwrap();
        assert!(ops.bounds().is_empty());
        let ops = build_ops(&Shape::Circle, &settings(&[(keys::RADIUS, 0.0.into())]), AVAILABLE).unwrap();
        assert!(ops.bounds().is_empty());
    }

    #[test]
    fn test_circle_and_ellipse_extent() {
        let s = settings(&[(keys::RADIUS, 10.0.into())]);
        let circle = build_ops(&Shape::Circle, &s, AVAILABLE).unwrap();
        assert!(circle.bounds().approx_eq(&Bounds::new(-10.0, -10.0, 10.0, 10.0), 1e-3));

        let s = settings(&[(keys::RADIUS, 10.0.into()), (keys::RADIUS_Y, 4.0.into())]);
        let ellipse = build_ops(&Shape::Ellipse, &s, AVAILABLE).unwrap();
        assert!(ellipse.bounds().approx_eq(&Bounds::new(-10.0, -4.0, 10.0, 4.0), 1e-3));
    }

    #[test]
    fn test_line_is_never_filled() {
        let s = settings(&[
            (keys::POINTS, vec![0.0_f32, 0.0, 10.0, 5.0, 20.0, 0.0].into()),
            (keys::FILL, Color::RED.into()),
            (keys::STROKE, Color::BLACK.into()),
        ]);
        let ops = build_ops(&Shape::Line, &s, AVAILABLE).unwrap();
        assert!(!ops.ops().iter().any(|op| matches!(op, GraphicsOp::BeginFill(_))));
        assert!(!ops.ops().contains(&GraphicsOp::ClosePath));
        assert_eq!(ops.bounds(), Bounds::new(0.0, 0.0, 20.0, 5.0));

        let polygon = build_ops(&Shape::Polygon, &s, AVAILABLE).unwrap();
        assert!(polygon.ops().contains(&GraphicsOp::ClosePath));
    }

    #[test]
    fn test_quarter_slice_bounds() {
        let s = settings(&[
            (keys::RADIUS, 10.0.into()),
            (keys::START_ANGLE, 0.0.into()),
            (keys::ARC, 90.0.into()),
            (keys::FILL, Color::GREEN.into()),
        ]);
        let ops = build_ops(&Shape::Slice, &s, AVAILABLE).unwrap();
        assert!(ops.bounds().approx_eq(&Bounds::new(0.0, 0.0, 10.0, 10.0), 1e-3));
    }

    #[test]
    fn test_donut_slice_keeps_hole_out_of_origin() {
        let s = settings(&[
            (keys::RADIUS, 10.0.into()),
            (keys::INNER_RADIUS, Percent(50.0).into()),
            (keys::START_ANGLE, 0.0.into()),
            (keys::ARC, 90.0.into()),
        ]);
        let ops = build_ops(&Shape::Slice, &s, AVAILABLE).unwrap();
        assert_eq!(ops.ops()[1], GraphicsOp::MoveTo(strata_core::Point::new(5.0, 0.0)));
    }

    #[test]
    fn test_star_vertices() {
        let s = settings(&[(keys::RADIUS, 10.0.into()), (keys::SPIKES, 4.0.into())]);
        let ops = build_ops(&Shape::Star, &s, AVAILABLE).unwrap();
        let vertices = ops
            .ops()
            .iter()
            .filter(|op| matches!(op, GraphicsOp::MoveTo(_) | GraphicsOp::LineTo(_)))
            .count();
        assert_eq!(vertices, 8);
        assert!(ops.bounds().approx_eq(&Bounds::new(-10.0, -10.0, 10.0, 10.0), 1e-3));
    }

    #[test]
    fn test_svg_path_shape_and_errors() {
        let s = settings(&[(keys::SVG_PATH, "M0 0 L10 0 L10 10 Z".into())]);
        let ops = build_ops(&Shape::SvgPath, &s, AVAILABLE).unwrap();
        assert_eq!(ops.bounds(), Bounds::new(0.0, 0.0, 10.0, 10.0));

        let s = settings(&[(keys::SVG_PATH, "M0 0 L10".into())]);
        assert!(build_ops(&Shape::SvgPath, &s, AVAILABLE).is_err());
    }

    #[test]
    fn test_dash_and_shadow() {
        let s = settings(&[
            (keys::WIDTH, 10.0.into()),
            (keys::HEIGHT, 10.0.into()),
            (keys::STROKE, Color::BLACK.into()),
            (keys::STROKE_DASHARRAY, vec![2.0_f32, 1.0].into()),
            (keys::SHADOW_COLOR, Color::BLACK.into()),
            (keys::SHADOW_BLUR, 4.0.into()),
        ]);
        let ops = build_ops(&Shape::Rectangle, &s, AVAILABLE).unwrap();
        assert!(matches!(ops.ops()[0], GraphicsOp::Shadow(Some(_))));
        assert!(ops
            .ops()
            .iter()
            .any(|op| matches!(op, GraphicsOp::SetLineDash(d) if d.intervals == vec![2.0, 1.0])));
    }

    #[test]
    fn test_custom_shape() {
        let shape = Shape::custom(|ops, settings| {
            ops.begin_fill(Color::RED);
            ops.draw_rect(0.0, 0.0, settings.get_number("size", 1.0), 1.0);
            ops.end_fill();
        });
        let ops = build_ops(&shape, &settings(&[("size", 7.0.into())]), AVAILABLE).unwrap();
        assert_eq!(ops.bounds().width(), 7.0);
        assert_eq!(shape.clone(), shape);
        assert_ne!(shape, Shape::custom(|_, _| {}));
    }
}
