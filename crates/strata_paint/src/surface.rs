//! Immediate-mode drawing surface
//!
//! The scene renders through this trait only, so a platform 2D context can
//! be bound by implementing it. [`PixmapSurface`](crate::PixmapSurface) is
//! the built-in CPU backend and [`RecordingSurface`](crate::RecordingSurface)
//! captures calls for inspection.

use strata_core::{Affine2D, BlendMode, Color, Point, Rect};
use strata_text::{FontSpec, TextMeasurer};

use crate::bitmap::ImageData;
use crate::path::Path;
use crate::style::{LineDash, Shadow, StrokeStyle};
use crate::Result;

/// A 2D drawing context
///
/// State (`transform`, alpha, blend mode, clip, anti-aliasing) is saved and
/// restored as a unit by [`save`](Surface::save) / [`restore`](Surface::restore).
pub trait Surface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Reallocate at a new size, dropping contents and state
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Fill every pixel, ignoring transform and clip
    fn clear(&mut self, color: Color);

    fn save(&mut self);

    fn restore(&mut self);

    fn set_transform(&mut self, transform: Affine2D);

    fn transform(&self) -> Affine2D;

    /// Global alpha multiplied into every paint
    fn set_alpha(&mut self, alpha: f32);

    fn set_blend_mode(&mut self, mode: BlendMode);

    fn set_anti_alias(&mut self, anti_alias: bool);

    /// Intersect the clip with `path` under the current transform
    fn clip(&mut self, path: &Path);

    fn fill_path(&mut self, path: &Path, color: Color);

    fn stroke_path(&mut self, path: &Path, stroke: &StrokeStyle, dash: Option<&LineDash>);

    /// Paint the blurred, offset silhouette of `path`
    fn fill_shadow(&mut self, path: &Path, shadow: &Shadow);

    /// Draw one run of glyphs with its baseline starting at `origin`
    fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, color: Color);

    /// Draw `image` scaled into `dest`
    fn draw_image(&mut self, image: &ImageData, dest: Rect);

    /// Text metrics matching what `fill_text` draws
    fn measurer(&self) -> &dyn TextMeasurer;

    /// Straight-alpha RGBA of one pixel, for surfaces that can read back
    fn read_pixel(&self, _x: u32, _y: u32) -> Option<[u8; 4]> {
        None
    }

    /// Premultiplied RGBA contents, for surfaces that can read back
    fn pixels(&self) -> Option<&[u8]> {
        None
    }

    /// Composite another surface's contents at device offset (`x`, `y`)
    fn draw_surface(&mut self, _source: &dyn Surface, _x: f32, _y: f32, _opacity: f32) {}
}

/// Creates the surfaces the scene paints into
pub trait SurfaceFactory {
    fn create(&self, width: u32, height: u32) -> Result<Box<dyn Surface>>;
}
