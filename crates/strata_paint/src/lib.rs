//! Strata Paint
//!
//! Vector drawing for scene nodes:
//!
//! - **Paths**: move/line/quad/cubic paths with arcs lowered to cubics and
//!   exact curve bounds
//! - **Path data**: the SVG `d` mini-language
//! - **Op lists**: replayable per-node drawing operations with a visible
//!   and a flat-color ghost mode
//! - **Surfaces**: the [`Surface`] drawing context trait, a tiny-skia
//!   [`PixmapSurface`] and a [`RecordingSurface`]
//!
//! # Example
//!
//! ```rust
//! use strata_core::Color;
//! use strata_paint::{OpList, PaintMode, PixmapSurface, Surface};
//!
//! let mut ops = OpList::new();
//! ops.begin_fill(Color::RED);
//! ops.svg_path("M0 0 L10 0 L10 10 Z").unwrap();
//! ops.end_fill();
//!
//! let mut surface = PixmapSurface::new(16, 16).unwrap();
//! ops.replay(&mut surface, PaintMode::Visible);
//! assert_eq!(ops.bounds().width(), 10.0);
//! ```

pub mod bitmap;
pub mod ops;
pub mod path;
pub mod path_data;
pub mod raster;
pub mod recording;
pub mod style;
pub mod surface;

pub use bitmap::{ImageData, ImageSource};
pub use ops::{GraphicsOp, OpList, PaintMode};
pub use path::{Path, PathCommand};
pub use path_data::{parse_path_data, SvgCommand};
pub use raster::{PixmapSurface, PixmapSurfaceFactory};
pub use recording::{RecordingSurface, SurfaceCommand};
pub use style::{LineDash, Shadow, StrokeStyle};
pub use surface::{Surface, SurfaceFactory};

use thiserror::Error;

/// Paint errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaintError {
    #[error("Path data syntax error at {position}: {message}")]
    PathSyntax { position: usize, message: String },

    #[error("Failed to allocate a {width}x{height} surface")]
    SurfaceAllocation { width: u32, height: u32 },

    #[error("Image decoding error: {0}")]
    ImageDecode(String),

    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    #[error("Encoding error: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, PaintError>;
