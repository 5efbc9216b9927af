//! Node events
//!
//! Pointer events are routed by [`Root`](crate::Root) as input arrives;
//! bounds and position events are collected while a frame resolves and
//! delivered once it completes.

use strata_core::{Bounds, Event, Point};

use crate::node::NodeId;

/// Mouse button identifier (matches platform)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

/// Event types delivered to node listeners
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeEventKind {
    PointerEnter,
    PointerLeave,
    PointerDown,
    PointerMove,
    PointerUp,
    Click,
    DoubleClick,
    Wheel,
    DragStart,
    Dragged,
    DragStop,
    BoundsChanged,
    PositionChanged,
}

impl NodeEventKind {
    pub fn is_pointer(self) -> bool {
        !matches!(
            self,
            NodeEventKind::BoundsChanged | NodeEventKind::PositionChanged
        )
    }
}

/// An event delivered to one node
#[derive(Clone, Debug, PartialEq)]
pub struct NodeEvent {
    pub kind: NodeEventKind,
    /// Node the event originated on
    pub target: NodeId,
    /// Node whose listeners are receiving it (differs while bubbling)
    pub current: NodeId,
    /// Point in the receiving node's local coordinates
    pub point: Point,
    /// Point in root coordinates
    pub global: Point,
    pub button: Option<MouseButton>,
    /// Wheel delta, or pointer travel since the last drag event
    pub delta: Point,
    /// Adjusted bounds, for `BoundsChanged`
    pub bounds: Option<Bounds>,
    /// Generated by the renderer rather than by real input
    pub synthesized: bool,
}

impl NodeEvent {
    pub fn new(kind: NodeEventKind, target: NodeId, global: Point) -> Self {
        Self {
            kind,
            target,
            current: target,
            point: global,
            global,
            button: None,
            delta: Point::ZERO,
            bounds: None,
            synthesized: false,
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn with_delta(mut self, delta: Point) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn synthesized(mut self) -> Self {
        self.synthesized = true;
        self
    }
}

impl Event for NodeEvent {
    type Kind = NodeEventKind;

    fn kind(&self) -> NodeEventKind {
        self.kind
    }
}
