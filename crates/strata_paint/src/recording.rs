//! Recording surface
//!
//! Captures every drawing call as a [`SurfaceCommand`] so a frame can be
//! inspected, or replayed onto another context later.

use std::sync::Arc;

use strata_core::{Affine2D, BlendMode, Color, Point, Rect};
use strata_text::{EstimatedTextMeasurer, FontSpec, TextMeasurer};

use crate::bitmap::ImageData;
use crate::path::Path;
use crate::style::{LineDash, Shadow, StrokeStyle};
use crate::surface::Surface;
use crate::Result;

/// A recorded surface call
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCommand {
    Clear(Color),
    Save,
    Restore,
    SetTransform(Affine2D),
    SetAlpha(f32),
    SetBlendMode(BlendMode),
    SetAntiAlias(bool),
    Clip(Path),
    FillPath {
        path: Path,
        color: Color,
    },
    StrokePath {
        path: Path,
        stroke: StrokeStyle,
        dash: Option<LineDash>,
    },
    FillShadow {
        path: Path,
        shadow: Shadow,
    },
    FillText {
        text: String,
        origin: Point,
        font: FontSpec,
        color: Color,
    },
    DrawImage {
        width: u32,
        height: u32,
        dest: Rect,
    },
    DrawSurface {
        x: f32,
        y: f32,
        opacity: f32,
    },
}

/// A surface that records commands instead of painting
pub struct RecordingSurface {
    width: u32,
    height: u32,
    commands: Vec<SurfaceCommand>,
    transform: Affine2D,
    transform_stack: Vec<Affine2D>,
    measurer: Arc<dyn TextMeasurer>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_measurer(width, height, Arc::new(EstimatedTextMeasurer))
    }

    pub fn with_measurer(width: u32, height: u32, measurer: Arc<dyn TextMeasurer>) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
            transform: Affine2D::IDENTITY,
            transform_stack: Vec::new(),
            measurer,
        }
    }

    /// Get the recorded commands
    pub fn commands(&self) -> &[SurfaceCommand] {
        &self.commands
    }

    /// Take the recorded commands
    pub fn take_commands(&mut self) -> Vec<SurfaceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Drawing commands only, without state changes
    pub fn draw_commands(&self) -> impl Iterator<Item = &SurfaceCommand> {
        self.commands.iter().filter(|c| {
            matches!(
                c,
                SurfaceCommand::FillPath { .. }
                    | SurfaceCommand::StrokePath { .. }
                    | SurfaceCommand::FillShadow { .. }
                    | SurfaceCommand::FillText { .. }
                    | SurfaceCommand::DrawImage { .. }
                    | SurfaceCommand::DrawSurface { .. }
            )
        })
    }
}

impl std::fmt::Debug for RecordingSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("commands", &self.commands.len())
            .finish()
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.width = width;
        self.height = height;
        self.commands.clear();
        self.transform = Affine2D::IDENTITY;
        self.transform_stack.clear();
        Ok(())
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(SurfaceCommand::Clear(color));
    }

    fn save(&mut self) {
        self.transform_stack.push(self.transform);
        self.commands.push(SurfaceCommand::Save);
    }

    fn restore(&mut self) {
        if let Some(t) = self.transform_stack.pop() {
            self.transform = t;
        }
        self.commands.push(SurfaceCommand::Restore);
    }

    fn set_transform(&mut self, transform: Affine2D) {
        self.transform = transform;
        self.commands.push(SurfaceCommand::SetTransform(transform));
    }

    fn transform(&self) -> Affine2D {
        self.transform
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.commands.push(SurfaceCommand::SetAlpha(alpha));
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.commands.push(SurfaceCommand::SetBlendMode(mode));
    }

    fn set_anti_alias(&mut self, anti_alias: bool) {
        self.commands.push(SurfaceCommand::SetAntiAlias(anti_alias));
    }

    fn clip(&mut self, path: &Path) {
        self.commands.push(SurfaceCommand::Clip(path.clone()));
    }

    fn fill_path(&mut self, path: &Path, color: Color) {
        self.commands.push(SurfaceCommand::FillPath {
            path: path.clone(),
            color,
        });
    }

    fn stroke_path(&mut self, path: &Path, stroke: &StrokeStyle, dash: Option<&LineDash>) {
        self.commands.push(SurfaceCommand::StrokePath {
            path: path.clone(),
            stroke: *stroke,
            dash: dash.cloned(),
        });
    }

    fn fill_shadow(&mut self, path: &Path, shadow: &Shadow) {
        self.commands.push(SurfaceCommand::FillShadow {
            path: path.clone(),
            shadow: *shadow,
        });
    }

    fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, color: Color) {
        self.commands.push(SurfaceCommand::FillText {
            text: text.to_string(),
            origin,
            font: font.clone(),
            color,
        });
    }

    fn draw_image(&mut self, image: &ImageData, dest: Rect) {
        self.commands.push(SurfaceCommand::DrawImage {
            width: image.width(),
            height: image.height(),
            dest,
        });
    }

    fn measurer(&self) -> &dyn TextMeasurer {
        &*self.measurer
    }

    fn draw_surface(&mut self, _source: &dyn Surface, x: f32, y: f32, opacity: f32) {
        self.commands.push(SurfaceCommand::DrawSurface { x, y, opacity });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls_and_transform_stack() {
        let mut surface = RecordingSurface::new(10, 10);
        surface.save();
        surface.set_transform(Affine2D::translation(3.0, 4.0));
        assert_eq!(surface.transform(), Affine2D::translation(3.0, 4.0));
        surface.fill_text("hi", Point::ZERO, &FontSpec::new(12.0), Color::BLACK);
        surface.restore();
        assert!(surface.transform().is_identity());
        assert_eq!(surface.draw_commands().count(), 1);
        assert_eq!(surface.take_commands().len(), 4);
        assert!(surface.commands().is_empty());
        assert!(surface.read_pixel(0, 0).is_none());
    }
}
