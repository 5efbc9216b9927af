//! Strata Animation System
//!
//! Timed interpolation of node settings.
//!
//! # Features
//!
//! - **Easing**: standard easing curves plus cubic-bezier and steps
//! - **Interpolation by kind**: numbers and percents linearly, colors in RGB
//!   or HSL, everything else as a discrete step at completion
//! - **Animation sets**: running animations keyed by owner and setting,
//!   advanced once per frame by elapsed time
//! - **Clocks**: wall-clock and manually driven time sources

pub mod animation;
pub mod clock;
pub mod easing;
pub mod values;

pub use animation::{Animation, AnimationId, AnimationSet, AnimationState, AnimationStep};
pub use clock::{Clock, ManualClock, SystemClock};
pub use easing::Easing;
pub use values::{interpolate_value, Interpolate};
