//! CPU rasterization using tiny-skia
//!
//! [`PixmapSurface`] implements [`Surface`] over a `tiny_skia::Pixmap`.
//! Glyphs are filled from TrueType outlines of the registered fonts; shadows
//! are a blurred coverage mask filled with the shadow color.

use std::sync::Arc;

use strata_core::{Affine2D, BlendMode, Color, LineCap, LineJoin, Point, Rect};
use strata_text::{FontLibrary, FontSpec, OutlineBuilder, TextMeasurer};
use tiny_skia::{FillRule, FilterQuality, IntSize, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, PixmapRef, Transform};
use tracing::warn;

use crate::bitmap::ImageData;
use crate::path::{Path, PathCommand};
use crate::style::{LineDash, Shadow, StrokeStyle};
use crate::surface::{Surface, SurfaceFactory};
use crate::{PaintError, Result};

#[derive(Clone)]
struct State {
    transform: Affine2D,
    alpha: f32,
    blend_mode: BlendMode,
    anti_alias: bool,
    clip: Option<Mask>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            transform: Affine2D::IDENTITY,
            alpha: 1.0,
            blend_mode: BlendMode::Normal,
            anti_alias: true,
            clip: None,
        }
    }
}

/// A tiny-skia backed drawing surface
pub struct PixmapSurface {
    pixmap: Pixmap,
    state: State,
    stack: Vec<State>,
    fonts: Arc<FontLibrary>,
    warned_no_fonts: bool,
}

impl PixmapSurface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::with_fonts(width, height, Arc::new(FontLibrary::new()))
    }

    pub fn with_fonts(width: u32, height: u32, fonts: Arc<FontLibrary>) -> Result<Self> {
        Ok(Self {
            pixmap: allocate(width, height)?,
            state: State::default(),
            stack: Vec::new(),
            fonts,
            warned_no_fonts: false,
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha RGBA copy of the contents
    pub fn to_rgba(&self) -> Vec<u8> {
        unpremultiply_alpha(self.pixmap.data())
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| PaintError::Encode(e.to_string()))
    }

    fn skia_transform(&self) -> Transform {
        let [a, b, c, d, tx, ty] = self.state.transform.elements;
        Transform::from_row(a, b, c, d, tx, ty)
    }

    fn paint(&self, color: Color) -> Paint<'static> {
        let [r, g, b, a] = color.fade(self.state.alpha).to_rgba8();
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = self.state.anti_alias;
        paint.blend_mode = skia_blend_mode(self.state.blend_mode);
        paint
    }
}

impl std::fmt::Debug for PixmapSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixmapSurface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("depth", &self.stack.len())
            .finish()
    }
}

fn allocate(width: u32, height: u32) -> Result<Pixmap> {
    Pixmap::new(width, height).ok_or(PaintError::SurfaceAllocation { width, height })
}

impl Surface for PixmapSurface {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.pixmap = allocate(width, height)?;
        self.state = State::default();
        self.stack.clear();
        Ok(())
    }

    fn clear(&mut self, color: Color) {
        let [r, g, b, a] = color.to_rgba8();
        self.pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn set_transform(&mut self, transform: Affine2D) {
        self.state.transform = transform;
    }

    fn transform(&self) -> Affine2D {
        self.state.transform
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.state.blend_mode = mode;
    }

    fn set_anti_alias(&mut self, anti_alias: bool) {
        self.state.anti_alias = anti_alias;
    }

    fn clip(&mut self, path: &Path) {
        let transform = self.skia_transform();
        let anti_alias = self.state.anti_alias;
        let mask = match (to_skia_path(path), self.state.clip.take()) {
            (Some(p), Some(mut mask)) => {
                mask.intersect_path(&p, FillRule::Winding, anti_alias, transform);
                Some(mask)
            }
            (Some(p), None) => Mask::new(self.pixmap.width(), self.pixmap.height()).map(|mut mask| {
                mask.fill_path(&p, FillRule::Winding, anti_alias, transform);
                mask
            }),
            // An empty clip path hides everything
            (None, _) => Mask::new(self.pixmap.width(), self.pixmap.height()),
        };
        self.state.clip = mask;
    }

    fn fill_path(&mut self, path: &Path, color: Color) {
        let Some(p) = to_skia_path(path) else { return };
        let paint = self.paint(color);
        let transform = self.skia_transform();
        self.pixmap
            .fill_path(&p, &paint, FillRule::Winding, transform, self.state.clip.as_ref());
    }

    fn stroke_path(&mut self, path: &Path, stroke: &StrokeStyle, dash: Option<&LineDash>) {
        let Some(p) = to_skia_path(path) else { return };
        let paint = self.paint(stroke.color);
        let skia_stroke = tiny_skia::Stroke {
            width: stroke.width,
            miter_limit: stroke.miter_limit,
            line_cap: match stroke.cap {
                LineCap::Butt => tiny_skia::LineCap::Butt,
                LineCap::Round => tiny_skia::LineCap::Round,
                LineCap::Square => tiny_skia::LineCap::Square,
            },
            line_join: match stroke.join {
                LineJoin::Miter => tiny_skia::LineJoin::Miter,
                LineJoin::Round => tiny_skia::LineJoin::Round,
                LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
            },
            dash: dash.and_then(|d| tiny_skia::StrokeDash::new(d.normalized(), d.offset)),
        };
        let transform = self.skia_transform();
        self.pixmap
            .stroke_path(&p, &paint, &skia_stroke, transform, self.state.clip.as_ref());
    }

    fn fill_shadow(&mut self, path: &Path, shadow: &Shadow) {
        let Some(p) = to_skia_path(path) else { return };
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let Some(mut mask) = Mask::new(width, height) else {
            return;
        };
        let transform = self
            .skia_transform()
            .post_translate(shadow.offset_x, shadow.offset_y);
        mask.fill_path(&p, FillRule::Winding, true, transform);

        // Three box passes approximate a gaussian with sigma = blur / 2
        let radius = (shadow.blur / 2.0 / 3f32.sqrt()).round().max(0.0) as usize;
        box_blur(mask.data_mut(), width as usize, height as usize, radius);

        if let Some(clip) = &self.state.clip {
            for (m, c) in mask.data_mut().iter_mut().zip(clip.data()) {
                *m = ((*m as u16 * *c as u16 + 127) / 255) as u8;
            }
        }

        let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, width as f32, height as f32) else {
            return;
        };
        let paint = self.paint(shadow.color);
        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), Some(&mask));
    }

    fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, color: Color) {
        let fonts = Arc::clone(&self.fonts);
        let Some(face) = fonts.face_for(font) else {
            if !self.warned_no_fonts {
                warn!("no font faces registered, text glyphs are not drawn");
                self.warned_no_fonts = true;
            }
            return;
        };
        let scale = face.metrics().scale(1.0, font.size);
        let mut path = Path::new();
        let mut pen_x = origin.x;
        for c in text.chars() {
            let mut sink = GlyphSink {
                path: &mut path,
                origin: Point::new(pen_x, origin.y),
                scale,
            };
            if let Some(advance) = face.outline_char(c, &mut sink) {
                pen_x += advance * scale;
            }
        }
        self.fill_path(&path, color);
    }

    fn draw_image(&mut self, image: &ImageData, dest: Rect) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        let Some(size) = IntSize::from_wh(image.width(), image.height()) else {
            return;
        };
        let Some(source) = Pixmap::from_vec(image.premultiplied(), size) else {
            return;
        };
        let transform = self
            .skia_transform()
            .pre_translate(dest.x(), dest.y())
            .pre_scale(
                dest.width() / image.width() as f32,
                dest.height() / image.height() as f32,
            );
        let paint = PixmapPaint {
            opacity: self.state.alpha,
            blend_mode: skia_blend_mode(self.state.blend_mode),
            quality: FilterQuality::Bilinear,
        };
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, transform, self.state.clip.as_ref());
    }

    fn measurer(&self) -> &dyn TextMeasurer {
        &*self.fonts
    }

    fn read_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        // Pixmap::pixel only bounds-checks the linear index
        if x >= self.pixmap.width() || y >= self.pixmap.height() {
            return None;
        }
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    fn pixels(&self) -> Option<&[u8]> {
        Some(self.pixmap.data())
    }

    fn draw_surface(&mut self, source: &dyn Surface, x: f32, y: f32, opacity: f32) {
        let Some(data) = source.pixels() else { return };
        let Some(src) = PixmapRef::from_bytes(data, source.width(), source.height()) else {
            return;
        };
        let paint = PixmapPaint {
            opacity: opacity.clamp(0.0, 1.0),
            blend_mode: tiny_skia::BlendMode::SourceOver,
            quality: FilterQuality::Nearest,
        };
        self.pixmap.draw_pixmap(
            x.round() as i32,
            y.round() as i32,
            src,
            &paint,
            Transform::identity(),
            None,
        );
    }
}

/// Creates [`PixmapSurface`]s sharing one font library
#[derive(Debug, Clone, Default)]
pub struct PixmapSurfaceFactory {
    fonts: Arc<FontLibrary>,
}

impl PixmapSurfaceFactory {
    pub fn new(fonts: Arc<FontLibrary>) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &Arc<FontLibrary> {
        &self.fonts
    }
}

impl SurfaceFactory for PixmapSurfaceFactory {
    fn create(&self, width: u32, height: u32) -> Result<Box<dyn Surface>> {
        Ok(Box::new(PixmapSurface::with_fonts(
            width,
            height,
            Arc::clone(&self.fonts),
        )?))
    }
}

/// Maps glyph outlines (font units, y up) into a pixel-space path
struct GlyphSink<'a> {
    path: &'a mut Path,
    origin: Point,
    scale: f32,
}

impl GlyphSink<'_> {
    fn map(&self, x: f32, y: f32) -> Point {
        Point::new(self.origin.x + x * self.scale, self.origin.y - y * self.scale)
    }
}

impl OutlineBuilder for GlyphSink<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        self.path.move_to(p);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        self.path.line_to(p);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (c, p) = (self.map(x1, y1), self.map(x, y));
        self.path.quad_to(c, p);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (c1, c2, p) = (self.map(x1, y1), self.map(x2, y2), self.map(x, y));
        self.path.cubic_to(c1, c2, p);
    }

    fn close(&mut self) {
        self.path.close();
    }
}

fn to_skia_path(path: &Path) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for command in path.commands() {
        match *command {
            PathCommand::MoveTo(p) => pb.move_to(p.x, p.y),
            PathCommand::LineTo(p) => pb.line_to(p.x, p.y),
            PathCommand::QuadTo { control, end } => pb.quad_to(control.x, control.y, end.x, end.y),
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => pb.cubic_to(control1.x, control1.y, control2.x, control2.y, end.x, end.y),
            PathCommand::Close => pb.close(),
        }
    }
    pb.finish()
}

fn skia_blend_mode(mode: BlendMode) -> tiny_skia::BlendMode {
    match mode {
        BlendMode::Normal => tiny_skia::BlendMode::SourceOver,
        BlendMode::Multiply => tiny_skia::BlendMode::Multiply,
        BlendMode::Screen => tiny_skia::BlendMode::Screen,
        BlendMode::Overlay => tiny_skia::BlendMode::Overlay,
        BlendMode::Darken => tiny_skia::BlendMode::Darken,
        BlendMode::Lighten => tiny_skia::BlendMode::Lighten,
        BlendMode::ColorDodge => tiny_skia::BlendMode::ColorDodge,
        BlendMode::ColorBurn => tiny_skia::BlendMode::ColorBurn,
        BlendMode::HardLight => tiny_skia::BlendMode::HardLight,
        BlendMode::SoftLight => tiny_skia::BlendMode::SoftLight,
        BlendMode::Difference => tiny_skia::BlendMode::Difference,
        BlendMode::Exclusion => tiny_skia::BlendMode::Exclusion,
    }
}

/// Blur a coverage buffer in place
fn box_blur(data: &mut [u8], width: usize, height: usize, radius: usize) {
    if radius == 0 || width == 0 || height == 0 {
        return;
    }
    let mut tmp = vec![0u8; data.len()];
    for _ in 0..3 {
        for y in 0..height {
            blur_line(data, &mut tmp, y * width, 1, width, radius);
        }
        for x in 0..width {
            blur_line(&tmp, data, x, width, height, radius);
        }
    }
}

/// Running-sum box filter over `len` samples starting at `start`
///
/// Samples outside the buffer count as transparent.
fn blur_line(src: &[u8], dst: &mut [u8], start: usize, stride: usize, len: usize, radius: usize) {
    let window = (2 * radius + 1) as u32;
    let at = |i: usize| start + i * stride;
    let mut sum: u32 = (0..=radius.min(len - 1)).map(|i| src[at(i)] as u32).sum();
    for i in 0..len {
        dst[at(i)] = (sum / window) as u8;
        if i + radius + 1 < len {
            sum += src[at(i + radius + 1)] as u32;
        }
        if i >= radius {
            sum -= src[at(i - radius)] as u32;
        }
    }
}

/// Convert premultiplied alpha to straight alpha
fn unpremultiply_alpha(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    for chunk in data.chunks_exact(4) {
        let a = chunk[3] as f32 / 255.0;
        if a > 0.0 {
            let r = (chunk[0] as f32 / a).round().min(255.0) as u8;
            let g = (chunk[1] as f32 / a).round().min(255.0) as u8;
            let b = (chunk[2] as f32 / a).round().min(255.0) as u8;
            result.extend_from_slice(&[r, g, b, chunk[3]]);
        } else {
            result.extend_from_slice(&[0, 0, 0, 0]);
        }
    }
    result
}
