//! Strata Core
//!
//! Foundational types shared by every Strata crate:
//!
//! - **Geometry**: points, sizes, rectangles and min/max bounds
//! - **Transforms**: 2x3 affine matrices with composition and inversion
//! - **Colors**: RGBA colors, string parsing, RGB/HSL interpolation
//! - **Values**: dynamically typed node settings
//! - **Property Store**: per-node settings with dirty keys and change callbacks
//! - **Event Dispatch**: typed listener registries
//!
//! # Example
//!
//! ```rust
//! use strata_core::{Affine2D, Point, PropertyStore};
//!
//! let t = Affine2D::translation(10.0, 10.0);
//! assert_eq!(t.transform_point(Point::new(1.0, 2.0)), Point::new(11.0, 12.0));
//!
//! let mut settings = PropertyStore::new();
//! settings.set("x", 10.0);
//! assert!(settings.is_dirty("x"));
//! ```

pub mod color;
pub mod error;
pub mod events;
pub mod geometry;
pub mod store;
pub mod style;
pub mod transform;
pub mod value;

pub use color::{Color, ColorSpace};
pub use error::{CoreError, Result};
pub use events::{Event, EventDispatcher, ListenerId};
pub use geometry::{Bounds, Point, Rect, Size};
pub use store::{PropertyChange, PropertyStore};
pub use style::{BlendMode, CornerRadius, LineCap, LineJoin};
pub use transform::Affine2D;
pub use value::{Length, Percent, Value, ValueKind};
