//! Scene nodes
//!
//! Nodes live in the [`Scene`](crate::Scene) arena and are addressed by
//! [`NodeId`]. The node kinds are a closed set, so kind-specific data is a
//! tagged enum rather than a trait object. Parent links are plain ids: a
//! container owns its children, a child only refers back to its parent.

use std::sync::Arc;

use slotmap::{new_key_type, Key};
use smallvec::SmallVec;
use strata_core::{Affine2D, BlendMode, Bounds, EventDispatcher, Point, PropertyStore};
use strata_paint::{ImageData, ImageSource, OpList};
use strata_text::{GlyphPlacement, TextBlock, TextStyle};

use crate::events::NodeEvent;
use crate::keys;
use crate::shapes::Shape;

new_key_type! {
    pub struct NodeId;
}

impl NodeId {
    /// Convert to a raw u64 representation
    pub fn to_raw(self) -> u64 {
        self.data().as_ffi()
    }

    /// Create from a raw u64 representation produced by `to_raw`
    pub fn from_raw(raw: u64) -> Self {
        Self::from(slotmap::KeyData::from_ffi(raw))
    }
}

/// Kind tag of a node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Container,
    Graphics,
    Text,
    Image,
}

/// Children and decorations of a container
#[derive(Debug, Default)]
pub struct ContainerData {
    /// Paint order unless `reverse_children` is set
    pub(crate) children: Vec<NodeId>,
    /// Painted first, sized to the container
    pub(crate) background: Option<NodeId>,
    /// Graphics node whose outline clips the container's content
    pub(crate) mask: Option<NodeId>,
    /// Child layout must run before the container's bounds resolve
    pub(crate) needs_layout: bool,
}

/// Shape and op list of a graphics node
#[derive(Debug, Default)]
pub struct GraphicsData {
    pub(crate) shape: Shape,
    pub(crate) ops: OpList,
}

/// Cached layout of a text node
#[derive(Debug, Default)]
pub struct TextData {
    /// Base style resolved from settings and scene defaults
    pub(crate) style: TextStyle,
    pub(crate) block: Option<TextBlock>,
    /// Glyph runs when the text follows a circle
    pub(crate) radial: Vec<GlyphPlacement>,
}

/// Source and decoded pixels of an image node
#[derive(Debug, Default)]
pub struct ImageNodeData {
    pub(crate) source: Option<ImageSource>,
    pub(crate) image: Option<Arc<ImageData>>,
}

#[derive(Debug)]
pub(crate) enum NodeData {
    Container(ContainerData),
    Graphics(GraphicsData),
    Text(TextData),
    Image(ImageNodeData),
}

impl NodeData {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            NodeData::Container(_) => NodeKind::Container,
            NodeData::Graphics(_) => NodeKind::Graphics,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Image(_) => NodeKind::Image,
        }
    }
}

/// A node in the scene graph
#[derive(Debug)]
pub struct Node {
    pub(crate) data: NodeData,
    pub(crate) settings: PropertyStore,
    pub(crate) events: EventDispatcher<NodeEvent>,
    pub(crate) parent: Option<NodeId>,
    /// Distance from the scene root; detached nodes count from themselves
    pub(crate) depth: u32,
    /// Offset assigned by the parent's child layout, replacing `x`/`y`
    pub(crate) layout_offset: Option<Point>,
    pub(crate) local_transform: Affine2D,
    pub(crate) world_transform: Affine2D,
    /// Lazily computed; `None` when stale
    pub(crate) local_bounds: Option<Bounds>,
    /// Local bounds under the local transform, in parent coordinates
    pub(crate) adjusted_bounds: Bounds,
    pub(crate) world_position: Point,
    pub(crate) ghost_id: Option<u32>,
    /// Op list / text layout / image must be rebuilt in the apply phase
    pub(crate) content_stale: bool,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            data,
            settings: PropertyStore::new(),
            events: EventDispatcher::new(),
            parent: None,
            depth: 0,
            layout_offset: None,
            local_transform: Affine2D::IDENTITY,
            world_transform: Affine2D::IDENTITY,
            local_bounds: None,
            adjusted_bounds: Bounds::EMPTY,
            world_position: Point::ZERO,
            ghost_id: None,
            content_stale: true,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn settings(&self) -> &PropertyStore {
        &self.settings
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Children in insertion order; empty for non-containers
    pub fn children(&self) -> &[NodeId] {
        match &self.data {
            NodeData::Container(c) => &c.children,
            _ => &[],
        }
    }

    pub fn background(&self) -> Option<NodeId> {
        match &self.data {
            NodeData::Container(c) => c.background,
            _ => None,
        }
    }

    pub fn mask(&self) -> Option<NodeId> {
        match &self.data {
            NodeData::Container(c) => c.mask,
            _ => None,
        }
    }

    pub fn shape(&self) -> Option<&Shape> {
        match &self.data {
            NodeData::Graphics(g) => Some(&g.shape),
            _ => None,
        }
    }

    pub fn ops(&self) -> Option<&OpList> {
        match &self.data {
            NodeData::Graphics(g) => Some(&g.ops),
            _ => None,
        }
    }

    pub fn text_block(&self) -> Option<&TextBlock> {
        match &self.data {
            NodeData::Text(t) => t.block.as_ref(),
            _ => None,
        }
    }

    pub fn glyph_placements(&self) -> &[GlyphPlacement] {
        match &self.data {
            NodeData::Text(t) => &t.radial,
            _ => &[],
        }
    }

    pub fn image(&self) -> Option<&ImageData> {
        match &self.data {
            NodeData::Image(i) => i.image.as_deref(),
            _ => None,
        }
    }

    pub fn local_transform(&self) -> Affine2D {
        self.local_transform
    }

    pub fn world_transform(&self) -> Affine2D {
        self.world_transform
    }

    /// Local bounds as of the last resolved frame
    pub fn local_bounds(&self) -> Bounds {
        self.local_bounds.unwrap_or(Bounds::EMPTY)
    }

    /// Bounds in the parent's coordinate space
    pub fn adjusted_bounds(&self) -> Bounds {
        self.adjusted_bounds
    }

    /// Bounds in root coordinates
    pub fn world_bounds(&self) -> Bounds {
        match self.local_bounds {
            Some(b) if !b.is_empty() => self.world_transform.transform_bounds(&b),
            _ => Bounds::EMPTY,
        }
    }

    /// Root-space position of the local origin
    pub fn world_position(&self) -> Point {
        self.world_position
    }

    pub fn ghost_id(&self) -> Option<u32> {
        self.ghost_id
    }

    // =========================================================================
    // Settings shortcuts
    // =========================================================================

    /// Visible unless hidden or forced hidden
    pub fn is_visible(&self) -> bool {
        self.settings.get_bool(keys::VISIBLE, true) && !self.settings.get_bool(keys::FORCE_HIDDEN, false)
    }

    pub fn opacity(&self) -> f32 {
        self.settings.get_number(keys::OPACITY, 1.0).clamp(0.0, 1.0)
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.settings
            .get_text(keys::BLEND_MODE)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Explicitly assigned layer, if any
    pub fn layer(&self) -> Option<i32> {
        self.settings.get(keys::LAYER).and_then(|v| v.as_number()).map(|n| n as i32)
    }

    /// Takes part in hit testing, either by setting or by having pointer listeners
    pub fn is_interactive(&self) -> bool {
        self.settings.get_bool(keys::INTERACTIVE, false) || self.has_pointer_listeners()
    }

    pub fn is_draggable(&self) -> bool {
        self.settings.get_bool(keys::DRAGGABLE, false)
    }

    fn has_pointer_listeners(&self) -> bool {
        use crate::events::NodeEventKind::*;
        [
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
        ]
        .into_iter()
        .any(|kind| self.events.has_listeners(kind))
    }

    /// Background, mask and children, in that order
    pub(crate) fn owned(&self) -> SmallVec<[NodeId; 8]> {
        let mut owned = SmallVec::new();
        if let NodeData::Container(c) = &self.data {
            owned.extend(c.background);
            owned.extend(c.mask);
            owned.extend(c.children.iter().copied());
        }
        owned
    }

    pub(crate) fn container(&self) -> Option<&ContainerData> {
        match &self.data {
            NodeData::Container(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn container_mut(&mut self) -> Option<&mut ContainerData> {
        match &mut self.data {
            NodeData::Container(c) => Some(c),
            _ => None,
        }
    }
}
