//! Strata Scene
//!
//! Retained-mode 2D scene graph:
//!
//! - **Nodes**: containers, vector graphics, text and images, each carrying
//!   a reactive settings store
//! - **Resolution**: settings, container layout, bounds and world positions
//!   are recomputed lazily, only for what changed
//! - **Layers**: nodes paint onto independently repainted z-ordered surfaces
//!   composited into one output
//! - **Ghost hit testing**: interactive nodes are painted again in unique
//!   flat colors so a pointer position maps back to a node with one pixel read
//! - **Frame scheduler**: [`Root`] drives animations, callbacks, resolution,
//!   painting and event delivery once per tick
//!
//! # Example
//!
//! ```rust
//! use strata_core::Point;
//! use strata_scene::{keys, Root, RootConfig, Shape};
//!
//! let mut root = Root::new(RootConfig::new(200, 200)).unwrap();
//! let panel = root.create_container();
//! root.set(panel, keys::X, 10.0).unwrap();
//! root.set(panel, keys::Y, 10.0).unwrap();
//!
//! let button = root.create_graphics(Shape::Rectangle);
//! root.set(button, keys::WIDTH, 100.0).unwrap();
//! root.set(button, keys::HEIGHT, 50.0).unwrap();
//! root.set(button, keys::INTERACTIVE, true).unwrap();
//! root.add_child(panel, button).unwrap();
//! let top = root.root();
//! root.add_child(top, panel).unwrap();
//!
//! root.tick(0.0);
//! assert_eq!(root.hit_test(Point::new(50.0, 30.0)), Some(button));
//! assert_eq!(root.hit_test(Point::new(150.0, 150.0)), None);
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod ghost;
pub mod interaction;
pub mod keys;
pub mod layers;
pub mod layout;
pub mod node;
pub mod render;
mod resolve;
pub mod scene;
pub mod scheduler;
pub mod shapes;

pub use config::{InteractionConfig, RootConfig, TextConfig};
pub use error::{Result, SceneError};
pub use events::{MouseButton, NodeEvent, NodeEventKind};
pub use ghost::{id_to_color, rgb_to_id, GhostRegistry, MAX_GHOST_ID};
pub use layers::{Layer, LayerManager, BASE_LAYER};
pub use layout::{ContainerLayout, Padding};
pub use node::{Node, NodeId, NodeKind};
pub use render::PaintTarget;
pub use scene::{Scene, TextDefaults};
pub use scheduler::{Damage, DirtyQueues, FrameStats, Root, SchedulerState, SizeSensor};
pub use shapes::{build_ops, DrawFn, Shape};

// Re-exports so hosts need only this crate for common types
pub use strata_animation::{AnimationId, Clock, Easing, ManualClock, SystemClock};
pub use strata_core::{Affine2D, Bounds, Color, Length, Point, Rect, Size, Value};
pub use strata_paint::ImageSource;
pub use strata_text::FontLibrary;
