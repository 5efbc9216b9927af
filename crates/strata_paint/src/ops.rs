//! Replayable drawing operation lists
//!
//! An [`OpList`] records what a graphics node draws as a flat sequence of
//! [`GraphicsOp`]s. It is replayed twice per repaint: once onto the visible
//! layer and once onto the ghost surface with every color replaced by the
//! node's hit color. Replay never mutates the list.
//!
//! Fill/stroke model:
//!
//! - `begin_fill` starts a fresh path and arms a fill color
//! - geometry ops extend the current path
//! - `end_fill` fills the current path, `end_stroke` strokes it with the
//!   last `line_style`; neither discards the path, so a shape can be filled
//!   and then outlined

use std::cell::Cell;

use strata_core::{Bounds, Color, CornerRadius, Point, Rect};

use crate::path::Path;
use crate::path_data::{parse_path_data, SvgCommand};
use crate::style::{LineDash, Shadow, StrokeStyle};
use crate::surface::Surface;
use crate::Result;

/// A single recorded drawing operation
#[derive(Clone, Debug, PartialEq)]
pub enum GraphicsOp {
    /// Discard the current path
    BeginPath,
    MoveTo(Point),
    LineTo(Point),
    QuadTo {
        control: Point,
        end: Point,
    },
    CurveTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    /// Circular arc, angles in radians
    Arc {
        center: Point,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        counter_clockwise: bool,
    },
    /// Tangent arc from the pen through `p1` towards `p2`
    ArcTo {
        p1: Point,
        p2: Point,
        radius: f32,
    },
    Rect(Rect),
    ClosePath,
    BeginFill(Color),
    EndFill,
    LineStyle(StrokeStyle),
    SetLineDash(LineDash),
    EndStroke,
    Shadow(Option<Shadow>),
}

impl GraphicsOp {
    /// Extend `path` if this op is geometry; returns false for paint ops
    fn apply_geometry(&self, path: &mut Path) -> bool {
        match *self {
            GraphicsOp::MoveTo(p) => path.move_to(p),
            GraphicsOp::LineTo(p) => path.line_to(p),
            GraphicsOp::QuadTo { control, end } => path.quad_to(control, end),
            GraphicsOp::CurveTo {
                control1,
                control2,
                end,
            } => path.cubic_to(control1, control2, end),
            GraphicsOp::Arc {
                center,
                radius,
                start_angle,
                end_angle,
                counter_clockwise,
            } => path.arc(center, radius, start_angle, end_angle, counter_clockwise),
            GraphicsOp::ArcTo { p1, p2, radius } => path.arc_to(p1, p2, radius),
            GraphicsOp::Rect(rect) => path.rect(rect),
            GraphicsOp::ClosePath => path.close(),
            _ => return false,
        }
        true
    }
}

/// How colors resolve during replay
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PaintMode {
    /// Real colors, dashes and shadows
    Visible,
    /// Every fill and stroke in one flat opaque color, no shadows or dashes
    Ghost(Color),
}

/// Ordered drawing operations of one graphics node
#[derive(Debug, Default)]
pub struct OpList {
    ops: Vec<GraphicsOp>,
    bounds: Cell<Option<Bounds>>,
}

impl Clone for OpList {
    fn clone(&self) -> Self {
        Self {
            ops: self.ops.clone(),
            bounds: Cell::new(self.bounds.get()),
        }
    }
}

impl PartialEq for OpList {
    fn eq(&self, other: &Self) -> bool {
        self.ops == other.ops
    }
}

impl OpList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[GraphicsOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Remove every op and invalidate cached bounds
    pub fn clear(&mut self) {
        self.ops.clear();
        self.bounds.set(None);
    }

    pub fn push(&mut self, op: GraphicsOp) {
        self.ops.push(op);
        self.bounds.set(None);
    }

    // =========================================================================
    // Recording
    // =========================================================================

    pub fn begin_path(&mut self) {
        self.push(GraphicsOp::BeginPath);
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.push(GraphicsOp::MoveTo(Point::new(x, y)));
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.push(GraphicsOp::LineTo(Point::new(x, y)));
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.push(GraphicsOp::QuadTo {
            control: Point::new(cx, cy),
            end: Point::new(x, y),
        });
    }

    pub fn curve_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) {
        self.push(GraphicsOp::CurveTo {
            control1: Point::new(c1x, c1y),
            control2: Point::new(c2x, c2y),
            end: Point::new(x, y),
        });
    }

    /// Circular arc; angles in radians, clockwise on screen unless
    /// `counter_clockwise`
    pub fn arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32, counter_clockwise: bool) {
        self.push(GraphicsOp::Arc {
            center: Point::new(cx, cy),
            radius,
            start_angle: start,
            end_angle: end,
            counter_clockwise,
        });
    }

    pub fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) {
        self.push(GraphicsOp::ArcTo {
            p1: Point::new(x1, y1),
            p2: Point::new(x2, y2),
            radius,
        });
    }

    pub fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.push(GraphicsOp::Rect(Rect::new(x, y, width, height)));
    }

    pub fn draw_rounded_rect(&mut self, rect: Rect, radius: CornerRadius) {
        let mut path = Path::new();
        path.rounded_rect(rect, radius);
        self.append_path(&path);
    }

    pub fn draw_circle(&mut self, cx: f32, cy: f32, radius: f32) {
        let mut path = Path::new();
        path.circle(Point::new(cx, cy), radius);
        self.append_path(&path);
    }

    pub fn draw_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) {
        let mut path = Path::new();
        path.ellipse(Point::new(cx, cy), rx, ry);
        self.append_path(&path);
    }

    pub fn close_path(&mut self) {
        self.push(GraphicsOp::ClosePath);
    }

    pub fn begin_fill(&mut self, color: Color) {
        self.push(GraphicsOp::BeginFill(color));
    }

    pub fn end_fill(&mut self) {
        self.push(GraphicsOp::EndFill);
    }

    pub fn line_style(&mut self, style: StrokeStyle) {
        self.push(GraphicsOp::LineStyle(style));
    }

    pub fn end_stroke(&mut self) {
        self.push(GraphicsOp::EndStroke);
    }

    pub fn set_line_dash(&mut self, intervals: Vec<f32>, offset: f32) {
        self.push(GraphicsOp::SetLineDash(LineDash::new(intervals, offset)));
    }

    pub fn shadow(&mut self, shadow: Option<Shadow>) {
        self.push(GraphicsOp::Shadow(shadow));
    }

    /// Parse SVG path data and append it as primitive ops
    ///
    /// Arcs are lowered to cubic segments. On a parse error nothing is
    /// appended.
    pub fn svg_path(&mut self, data: &str) -> Result<()> {
        let commands = parse_path_data(data)?;
        let mut pen = Path::new();
        for command in commands {
            match command {
                SvgCommand::MoveTo(p) => {
                    pen.move_to(p);
                    self.push(GraphicsOp::MoveTo(p));
                }
                SvgCommand::LineTo(p) => {
                    pen.line_to(p);
                    self.push(GraphicsOp::LineTo(p));
                }
                SvgCommand::QuadTo { control, end } => {
                    pen.quad_to(control, end);
                    self.push(GraphicsOp::QuadTo { control, end });
                }
                SvgCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => {
                    pen.cubic_to(control1, control2, end);
                    self.push(GraphicsOp::CurveTo {
                        control1,
                        control2,
                        end,
                    });
                }
                SvgCommand::ArcTo {
                    rx,
                    ry,
                    x_rotation,
                    large_arc,
                    sweep,
                    end,
                } => {
                    let mut arc = Path::new();
                    if let Some(start) = pen.current_point() {
                        arc.move_to(start);
                    }
                    arc.svg_arc_to(rx, ry, x_rotation, large_arc, sweep, end);
                    for lowered in arc.commands().iter().skip(1) {
                        let op = match *lowered {
                            crate::PathCommand::LineTo(p) => GraphicsOp::LineTo(p),
                            crate::PathCommand::CubicTo {
                                control1,
                                control2,
                                end,
                            } => GraphicsOp::CurveTo {
                                control1,
                                control2,
                                end,
                            },
                            _ => continue,
                        };
                        self.push(op);
                    }
                    pen.line_to(end);
                }
                SvgCommand::Close => {
                    pen.close();
                    self.push(GraphicsOp::ClosePath);
                }
            }
        }
        Ok(())
    }

    fn append_path(&mut self, path: &Path) {
        for command in path.commands() {
            let op = match *command {
                crate::PathCommand::MoveTo(p) => GraphicsOp::MoveTo(p),
                crate::PathCommand::LineTo(p) => GraphicsOp::LineTo(p),
                crate::PathCommand::QuadTo { control, end } => GraphicsOp::QuadTo { control, end },
                crate::PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => GraphicsOp::CurveTo {
                    control1,
                    control2,
                    end,
                },
                crate::PathCommand::Close => GraphicsOp::ClosePath,
            };
            self.push(op);
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Geometric extent of everything the list draws (stroke width excluded)
    ///
    /// Curves and arcs contribute their true extent. Cached until the list
    /// changes.
    pub fn bounds(&self) -> Bounds {
        if let Some(bounds) = self.bounds.get() {
            return bounds;
        }
        let mut bounds = Bounds::EMPTY;
        let mut path = Path::new();
        for op in &self.ops {
            if op.apply_geometry(&mut path) {
                continue;
            }
            if matches!(op, GraphicsOp::BeginPath | GraphicsOp::BeginFill(_)) {
                bounds = bounds.union(&path.bounds());
                path.clear();
            }
        }
        bounds = bounds.union(&path.bounds());
        self.bounds.set(Some(bounds));
        bounds
    }

    /// Largest stroke width used, for callers that want painted extents
    pub fn max_stroke_width(&self) -> f32 {
        self.ops
            .iter()
            .filter_map(|op| match op {
                GraphicsOp::LineStyle(s) => Some(s.width),
                _ => None,
            })
            .fold(0.0, f32::max)
    }

    /// Every subpath the list draws, merged into one path (used for clipping)
    pub fn outline(&self) -> Path {
        let mut outline = Path::new();
        let mut path = Path::new();
        for op in &self.ops {
            if op.apply_geometry(&mut path) {
                continue;
            }
            if matches!(op, GraphicsOp::BeginPath | GraphicsOp::BeginFill(_)) {
                outline.extend(&path);
                path.clear();
            }
        }
        outline.extend(&path);
        outline
    }

    // =========================================================================
    // Replay
    // =========================================================================

    /// Paint every op onto `surface`
    pub fn replay(&self, surface: &mut dyn Surface, mode: PaintMode) {
        let mut path = Path::new();
        let mut fill: Option<Color> = None;
        let mut stroke: Option<StrokeStyle> = None;
        let mut dash: Option<LineDash> = None;
        let mut shadow: Option<Shadow> = None;

        for op in &self.ops {
            if op.apply_geometry(&mut path) {
                continue;
            }
            match op {
                GraphicsOp::BeginPath => path.clear(),
                GraphicsOp::BeginFill(color) => {
                    path.clear();
                    fill = Some(*color);
                }
                GraphicsOp::EndFill => {
                    let Some(color) = fill.take() else { continue };
                    if path.is_empty() {
                        continue;
                    }
                    match mode {
                        PaintMode::Visible => {
                            if let Some(s) = shadow.filter(Shadow::is_visible) {
                                surface.fill_shadow(&path, &s);
                            }
                            surface.fill_path(&path, color);
                        }
                        PaintMode::Ghost(ghost) => surface.fill_path(&path, ghost),
                    }
                }
                GraphicsOp::LineStyle(style) => stroke = Some(*style),
                GraphicsOp::SetLineDash(d) => {
                    dash = d.is_dashed().then(|| d.clone());
                }
                GraphicsOp::EndStroke => {
                    let Some(style) = stroke.filter(|s| s.width > 0.0) else {
                        continue;
                    };
                    if path.is_empty() {
                        continue;
                    }
                    match mode {
                        PaintMode::Visible => surface.stroke_path(&path, &style, dash.as_ref()),
                        PaintMode::Ghost(ghost) => {
                            let flat = StrokeStyle {
                                color: ghost,
                                ..style
                            };
                            surface.stroke_path(&path, &flat, None);
                        }
                    }
                }
                GraphicsOp::Shadow(s) => shadow = *s,
                _ => {}
            }
        }
    }
}
