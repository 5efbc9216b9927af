//! Strata text layout
//!
//! This crate provides:
//! - Inline style markup (`[bold #f00]text[/]`) tokenization
//! - Text measurement (estimated metrics or TrueType fonts via ttf-parser)
//! - Line layout with truncate / wrap / fit / hide policies and alignment
//! - Bidi reordering and per-glyph placement along a circle

pub mod bidi;
pub mod font;
pub mod layout;
pub mod markup;
pub mod measure;
pub mod radial;
pub mod style;

pub use font::{FontFace, FontLibrary, FontMetrics, OutlineBuilder};
pub use layout::{
    layout_text, LayoutOptions, Oversized, TextBlock, TextChunk, TextDirection, TextLine,
};
pub use markup::{parse_markup, Directive, MarkupOptions, MarkupToken, WeightChange};
pub use measure::{EstimatedTextMeasurer, TextMeasurer, TextMetrics};
pub use radial::{place_on_circle, GlyphPlacement, RadialOptions};
pub use style::{BaselineShift, FontSpec, FontStyle, FontWeight, TextAlign, TextStyle};

use thiserror::Error;

/// Text errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TextError {
    #[error("Unknown style directive: {0}")]
    UnknownDirective(String),

    #[error("Invalid value '{value}' for directive '{key}'")]
    InvalidDirectiveValue { key: String, value: String },

    #[error("Failed to load font: {0}")]
    FontLoadError(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),
}

pub type Result<T> = std::result::Result<T, TextError>;
