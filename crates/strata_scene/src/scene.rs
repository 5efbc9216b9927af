//! Scene arena
//!
//! [`Scene`] owns every node, the root container and the per-frame dirty
//! state. All mutation goes through it: a change is validated first, then
//! stored, then the node is queued for the stages that depend on the
//! changed key. Nothing is recomputed eagerly; the [`Root`](crate::Root)
//! scheduler drains the queues once per tick.
//!
//! # Example
//!
//! ```rust
//! use strata_core::Size;
//! use strata_scene::{Scene, Shape};
//!
//! let mut scene = Scene::new(Size::new(200.0, 100.0));
//! let rect = scene.create_graphics(Shape::Rectangle);
//! scene.set(rect, "width", 100.0).unwrap();
//! scene.set(rect, "height", 50.0).unwrap();
//! scene.add_child(scene.root(), rect).unwrap();
//! assert!(scene.set(rect, "fill", "not a color").is_err());
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use strata_core::{BlendMode, Bounds, Color, LineCap, LineJoin, ListenerId, Point, PropertyChange, PropertyStore, Size, Value};
use strata_paint::{parse_path_data, ImageSource};
use strata_text::{
    parse_markup, EstimatedTextMeasurer, FontStyle, FontWeight, MarkupOptions, Oversized, TextAlign,
    TextDirection, TextMeasurer,
};
use tracing::{debug, trace};

use crate::config::TextConfig;
use crate::error::{Result, SceneError};
use crate::events::{NodeEvent, NodeEventKind};
use crate::ghost::GhostRegistry;
use crate::keys;
use crate::layers::BASE_LAYER;
use crate::layout::ContainerLayout;
use crate::node::{ContainerData, GraphicsData, ImageNodeData, Node, NodeData, NodeId, NodeKind, TextData};
use crate::scheduler::{Damage, DirtyQueues, FrameStats};
use crate::shapes::Shape;

/// Text settings used when a text node does not set its own
#[derive(Debug, Clone, PartialEq)]
pub struct TextDefaults {
    pub font_size: f32,
    pub font_family: Option<String>,
    pub color: Color,
    pub quoted_literals: bool,
}

impl Default for TextDefaults {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            font_family: None,
            color: Color::BLACK,
            quoted_literals: false,
        }
    }
}

impl TextDefaults {
    pub fn from_config(config: &TextConfig) -> Result<Self> {
        Ok(Self {
            font_size: config.font_size,
            font_family: config.font_family.clone(),
            color: Color::parse(&config.color)?,
            quoted_literals: config.quoted_literals,
        })
    }

    pub(crate) fn markup(&self) -> MarkupOptions {
        MarkupOptions {
            quoted_literals: self.quoted_literals,
        }
    }
}

/// Where a node hangs off its container
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Child(usize),
    Background,
    Mask,
}

/// The node arena and its dirty state
pub struct Scene {
    pub(crate) nodes: SlotMap<NodeId, Node>,
    root: NodeId,
    pub(crate) size: Size,
    pub(crate) queues: DirtyQueues,
    pub(crate) damage: Damage,
    pub(crate) ghosts: GhostRegistry,
    pub(crate) stats: FrameStats,
    pub(crate) measurer: Arc<dyn TextMeasurer>,
    pub(crate) text_defaults: TextDefaults,
    /// Bounds and position events waiting for the end of the tick
    pub(crate) outbox: Vec<NodeEvent>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("size", &self.size)
            .field("queues", &self.queues)
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Create a scene measuring text with [`EstimatedTextMeasurer`]
    pub fn new(size: Size) -> Self {
        Self::with_measurer(size, Arc::new(EstimatedTextMeasurer))
    }

    pub fn with_measurer(size: Size, measurer: Arc<dyn TextMeasurer>) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(NodeData::Container(ContainerData::default())));
        let mut scene = Self {
            nodes,
            root,
            size,
            queues: DirtyQueues::default(),
            damage: Damage::default(),
            ghosts: GhostRegistry::new(),
            stats: FrameStats::default(),
            measurer,
            text_defaults: TextDefaults::default(),
            outbox: Vec::new(),
        };
        scene.queues.settings.insert(root);
        scene.queues.bounds.insert(root);
        scene.damage.all = true;
        scene
    }

    /// The root container; it cannot be re-parented or disposed
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Change the viewport, re-resolving everything sized relative to it
    pub fn resize(&mut self, size: Size) {
        if self.size == size {
            return;
        }
        debug!(width = size.width, height = size.height, "scene resized");
        self.size = size;
        self.queues.parents.insert(self.root);
        self.invalidate_relative(self.root, false);
        self.damage.all = true;
    }

    pub fn measurer(&self) -> &dyn TextMeasurer {
        &*self.measurer
    }

    /// Replace the text measurer and re-lay out every text node
    pub fn set_measurer(&mut self, measurer: Arc<dyn TextMeasurer>) {
        self.measurer = measurer;
        self.invalidate_text();
    }

    pub fn text_defaults(&self) -> &TextDefaults {
        &self.text_defaults
    }

    pub fn set_text_defaults(&mut self, defaults: TextDefaults) {
        if self.text_defaults != defaults {
            self.text_defaults = defaults;
            self.invalidate_text();
        }
    }

    pub fn queues(&self) -> &DirtyQueues {
        &self.queues
    }

    pub fn ghosts(&self) -> &GhostRegistry {
        &self.ghosts
    }

    // =========================================================================
    // Node access
    // =========================================================================

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(SceneError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(SceneError::UnknownNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes, the root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root is left
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.node(id)?.children())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// `id` followed by its ancestors up to the topmost one
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut cursor = self.nodes.contains_key(id).then_some(id);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.nodes.get(current).and_then(|n| n.parent);
        }
        chain
    }

    /// True when `id` is the root or hangs below it
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.ancestors(id).last() == Some(&self.root)
    }

    /// Nearest explicit `layer` up the ancestor chain
    pub fn effective_layer(&self, id: NodeId) -> i32 {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(current) else { break };
            if let Some(layer) = node.layer() {
                return layer;
            }
            cursor = node.parent;
        }
        BASE_LAYER
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut cursor = Some(of);
        while let Some(current) = cursor {
            if current == candidate {
                return true;
            }
            cursor = self.nodes.get(current).and_then(|n| n.parent);
        }
        false
    }

    // =========================================================================
    // Creation
    // =========================================================================

    pub fn create_container(&mut self) -> NodeId {
        self.insert(NodeData::Container(ContainerData::default()))
    }

    pub fn create_graphics(&mut self, shape: Shape) -> NodeId {
        self.insert(NodeData::Graphics(GraphicsData {
            shape,
            ..Default::default()
        }))
    }

    /// Create a text node; fails without creating anything if the markup is malformed
    pub fn create_text(&mut self, text: &str) -> Result<NodeId> {
        parse_markup(text, &self.text_defaults.markup())?;
        let id = self.insert(NodeData::Text(TextData::default()));
        if let Some(node) = self.nodes.get_mut(id) {
            node.settings.set(keys::TEXT, text);
        }
        Ok(id)
    }

    /// Create an image node; decoding happens when the node is resolved
    pub fn create_image(&mut self, source: ImageSource) -> NodeId {
        self.insert(NodeData::Image(ImageNodeData {
            source: Some(source),
            image: None,
        }))
    }

    fn insert(&mut self, data: NodeData) -> NodeId {
        let kind = data.kind();
        let id = self.nodes.insert(Node::new(data));
        self.queues.settings.insert(id);
        self.queues.bounds.insert(id);
        trace!(?id, ?kind, "node created");
        id
    }

    // =========================================================================
    // Tree structure
    // =========================================================================

    /// Append `child` to `parent`, moving it from its current parent if any
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let len = self.node(parent)?.children().len();
        let already = self.node(parent)?.children().contains(&child);
        self.add_child_at(parent, child, len - usize::from(already))
    }

    /// Insert `child` at `index` in `parent`'s paint order
    pub fn add_child_at(&mut self, parent: NodeId, child: NodeId, index: usize) -> Result<()> {
        self.check_attach(parent, child)?;
        let siblings = self.node(parent)?.children();
        let len = siblings.len() - usize::from(siblings.contains(&child));
        if index > len {
            return Err(SceneError::IndexOutOfRange { index, len });
        }
        self.detach(child);
        self.attach(parent, child, Slot::Child(index));
        Ok(())
    }

    /// Detach `child` from `parent`; the child stays alive and can be re-added
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(child)?;
        if !self.node(parent)?.children().contains(&child) {
            return Err(SceneError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(())
    }

    /// Set the graphics node painted behind a container's children, sized to it
    ///
    /// Returns the previous background, now detached.
    pub fn set_background(&mut self, container: NodeId, background: Option<NodeId>) -> Result<Option<NodeId>> {
        self.set_decoration(container, background, Slot::Background)
    }

    /// Set the graphics node whose outline clips a container's content
    ///
    /// Returns the previous mask, now detached.
    pub fn set_mask(&mut self, container: NodeId, mask: Option<NodeId>) -> Result<Option<NodeId>> {
        self.set_decoration(container, mask, Slot::Mask)
    }

    fn set_decoration(&mut self, container: NodeId, node: Option<NodeId>, slot: Slot) -> Result<Option<NodeId>> {
        let current = self.node(container)?;
        let previous = match slot {
            Slot::Mask => current.mask(),
            _ => current.background(),
        };
        if let Some(id) = node {
            let kind = self.node(id)?.kind();
            if kind != NodeKind::Graphics {
                return Err(SceneError::WrongKind {
                    id,
                    expected: NodeKind::Graphics,
                    actual: kind,
                });
            }
            self.check_attach(container, id)?;
        }
        if previous == node {
            return Ok(previous);
        }
        if let Some(old) = previous {
            self.detach(old);
        }
        if let Some(id) = node {
            self.detach(id);
            self.attach(container, id, slot);
        }
        Ok(previous)
    }

    fn check_attach(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let container = self.node(parent)?;
        self.node(child)?;
        if container.container().is_none() {
            return Err(SceneError::NotAContainer {
                id: parent,
                kind: container.kind(),
            });
        }
        if child == self.root {
            return Err(SceneError::RootNode("re-parented"));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        Ok(())
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, slot: Slot) {
        let Some(container) = self.nodes.get_mut(parent) else { return };
        let depth = container.depth + 1;
        if let Some(c) = container.container_mut() {
            match slot {
                Slot::Child(index) => c.children.insert(index, child),
                Slot::Background => c.background = Some(child),
                Slot::Mask => c.mask = Some(child),
            }
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        self.set_depth(child, depth);
        self.queues.bounds.insert(child);
        self.queues.positions.insert(child);
        self.invalidate_relative(child, true);
        self.child_list_changed(parent);
        self.damage.layers.insert(self.effective_layer(child));
        trace!(?parent, ?child, ?slot, "node attached");
    }

    /// Unlink `child` from its parent; returns the former parent
    fn detach(&mut self, child: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(child)?.parent?;
        self.damage.layers.insert(self.effective_layer(child));
        if let Some(c) = self.nodes.get_mut(parent).and_then(Node::container_mut) {
            c.children.retain(|&id| id != child);
            if c.background == Some(child) {
                c.background = None;
            }
            if c.mask == Some(child) {
                c.mask = None;
            }
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
            node.layout_offset = None;
        }
        self.set_depth(child, 0);
        self.queues.positions.insert(child);
        self.child_list_changed(parent);
        trace!(?parent, ?child, "node detached");
        Some(parent)
    }

    fn child_list_changed(&mut self, parent: NodeId) {
        self.queues.parents.insert(parent);
        self.damage.layers.insert(self.effective_layer(parent));
        self.damage.ghost = true;
    }

    fn set_depth(&mut self, id: NodeId, depth: u32) {
        let mut stack = vec![(id, depth)];
        while let Some((current, depth)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(current) else { continue };
            node.depth = depth;
            stack.extend(node.owned().into_iter().map(|child| (child, depth + 1)));
        }
    }

    /// `id` and everything it owns, parents before children
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else { continue };
            out.push(current);
            stack.extend(node.owned().into_iter().rev());
        }
        out
    }

    /// Destroy a node and everything it owns
    ///
    /// The removed nodes leave every dirty queue and release their ghost
    /// colors. Returns the ids that were removed.
    pub fn dispose(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        if id == self.root {
            return Err(SceneError::RootNode("disposed"));
        }
        self.node(id)?;
        self.detach(id);
        let removed = self.subtree(id);
        for &node_id in &removed {
            self.queues.remove(node_id);
            self.ghosts.release(node_id);
            if let Some(mut node) = self.nodes.remove(node_id) {
                node.settings.dispose();
                node.events.dispose();
            }
        }
        let gone: FxHashSet<NodeId> = removed.iter().copied().collect();
        self.outbox.retain(|event| !gone.contains(&event.target));
        self.damage.ghost = true;
        debug!(?id, count = removed.len(), "nodes disposed");
        Ok(removed)
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Change one setting; returns whether the stored value changed
    ///
    /// Values with a fixed vocabulary (colors, path data, markup, enum
    /// keywords) are validated first; a rejected value leaves the node
    /// untouched.
    pub fn set(&mut self, id: NodeId, key: &str, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        validate_setting(self.node(id)?, key, &value, self.text_defaults.markup())?;
        let changed = self.node_mut(id)?.settings.set(key, value);
        if changed {
            self.settings_changed(id, key);
        }
        Ok(changed)
    }

    pub fn get(&self, id: NodeId, key: &str) -> Option<&Value> {
        self.nodes.get(id)?.settings.get(key)
    }

    pub fn settings(&self, id: NodeId) -> Result<&PropertyStore> {
        Ok(&self.node(id)?.settings)
    }

    /// Remove a setting, falling back to the key's default
    pub fn unset(&mut self, id: NodeId, key: &str) -> Result<Option<Value>> {
        let old = self.node_mut(id)?.settings.remove(key);
        if old.is_some() {
            self.settings_changed(id, key);
        }
        Ok(old)
    }

    /// Write an interpolated value without notifying change listeners
    pub(crate) fn set_animated(&mut self, id: NodeId, key: &str, value: Value) -> bool {
        let Some(node) = self.nodes.get_mut(id) else { return false };
        if !node.settings.set_raw(key, value) {
            return false;
        }
        node.settings.mark_dirty(key);
        self.settings_changed(id, key);
        true
    }

    /// Check a value against the key's vocabulary without storing it
    pub fn validate(&self, id: NodeId, key: &str, value: &Value) -> Result<()> {
        validate_setting(self.node(id)?, key, value, self.text_defaults.markup())
    }

    fn settings_changed(&mut self, id: NodeId, key: &str) {
        self.queues.settings.insert(id);
        if keys::SIZE_KEYS.contains(&key) {
            if let Some(parent) = self.nodes.get(id).and_then(|n| n.parent) {
                self.queues.parents.insert(parent);
            }
        }
        if key == keys::LAYER || key == keys::LAYER_MARGIN {
            self.damage.all = true;
        }
        trace!(?id, key, "setting changed");
    }

    pub fn set_shape(&mut self, id: NodeId, shape: Shape) -> Result<()> {
        let node = self.node_mut(id)?;
        let actual = node.kind();
        let NodeData::Graphics(graphics) = &mut node.data else {
            return Err(SceneError::WrongKind {
                id,
                expected: NodeKind::Graphics,
                actual,
            });
        };
        graphics.shape = shape;
        node.content_stale = true;
        self.queues.settings.insert(id);
        Ok(())
    }

    pub fn set_image(&mut self, id: NodeId, source: ImageSource) -> Result<()> {
        let node = self.node_mut(id)?;
        let actual = node.kind();
        let NodeData::Image(image) = &mut node.data else {
            return Err(SceneError::WrongKind {
                id,
                expected: NodeKind::Image,
                actual,
            });
        };
        image.source = Some(source);
        image.image = None;
        node.content_stale = true;
        self.queues.settings.insert(id);
        Ok(())
    }

    /// Re-queue every node under `from` whose settings use percentages
    pub(crate) fn invalidate_relative(&mut self, from: NodeId, include_self: bool) {
        let mut stack: Vec<NodeId> = match self.nodes.get(from) {
            Some(_) if include_self => vec![from],
            Some(node) => node.owned().to_vec(),
            None => return,
        };
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id) else { continue };
            stack.extend(node.owned());
            if !uses_relative_lengths(&node.settings) {
                continue;
            }
            node.content_stale = true;
            if let Some(c) = node.container_mut() {
                c.needs_layout = true;
            }
            self.queues.settings.insert(id);
            self.queues.bounds.insert(id);
        }
    }

    fn invalidate_text(&mut self) {
        for (id, node) in self.nodes.iter_mut() {
            if node.kind() == NodeKind::Text {
                node.content_stale = true;
                self.queues.settings.insert(id);
            }
        }
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Listen for `kind` on `id`; pointer listeners make the node hit-testable
    pub fn on<F>(&mut self, id: NodeId, kind: NodeEventKind, callback: F) -> Result<ListenerId>
    where
        F: FnMut(&NodeEvent) + 'static,
    {
        let listener = self.node_mut(id)?.events.on(kind, callback);
        if kind.is_pointer() {
            self.damage.ghost = true;
        }
        Ok(listener)
    }

    pub fn once<F>(&mut self, id: NodeId, kind: NodeEventKind, callback: F) -> Result<ListenerId>
    where
        F: FnMut(&NodeEvent) + 'static,
    {
        let listener = self.node_mut(id)?.events.once(kind, callback);
        if kind.is_pointer() {
            self.damage.ghost = true;
        }
        Ok(listener)
    }

    /// Remove an event listener
    ///
    /// # Panics
    ///
    /// Panics if `listener` is not registered on the node.
    pub fn off(&mut self, id: NodeId, listener: ListenerId) -> Result<()> {
        self.node_mut(id)?.events.off(listener);
        self.damage.ghost = true;
        Ok(())
    }

    /// Observe changes to one setting of `id`
    pub fn on_change<F>(&mut self, id: NodeId, key: &str, callback: F) -> Result<ListenerId>
    where
        F: FnMut(&PropertyChange<'_>) + 'static,
    {
        Ok(self.node_mut(id)?.settings.on_change(key, callback))
    }

    pub fn remove_change_listener(&mut self, id: NodeId, listener: ListenerId) -> Result<bool> {
        Ok(self.node_mut(id)?.settings.remove_listener(listener))
    }

    /// Deliver an event to one node's listeners
    pub(crate) fn deliver(&mut self, event: &NodeEvent) -> usize {
        match self.nodes.get_mut(event.current) {
            Some(node) => node.events.dispatch(event),
            None => 0,
        }
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    pub fn world_bounds(&self, id: NodeId) -> Result<Bounds> {
        Ok(self.node(id)?.world_bounds())
    }

    /// Map a root-space point into `id`'s local space
    pub fn to_local(&self, id: NodeId, point: Point) -> Result<Point> {
        Ok(self.node(id)?.world_transform.transform_point_inverse(point))
    }

    /// Map a point in `id`'s local space to root space
    pub fn to_global(&self, id: NodeId, point: Point) -> Result<Point> {
        Ok(self.node(id)?.world_transform.transform_point(point))
    }
}

// =============================================================================
// Validation
// =============================================================================

fn invalid(key: &str, reason: impl Into<String>) -> SceneError {
    SceneError::InvalidSetting {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn text_of<'a>(key: &str, value: &'a Value) -> Result<&'a str> {
    value.as_text().ok_or_else(|| invalid(key, format!("expected text, got {:?}", value.kind())))
}

fn keyword<T>(key: &str, value: &Value) -> Result<()>
where
    T: FromStr,
    T::Err: ToString,
{
    text_of(key, value)?
        .parse::<T>()
        .map(|_| ())
        .map_err(|e| invalid(key, e.to_string()))
}

fn validate_setting(node: &Node, key: &str, value: &Value, markup: MarkupOptions) -> Result<()> {
    match key {
        k if keys::COLOR_KEYS.contains(&k) => match value {
            Value::Color(_) => Ok(()),
            Value::Text(s) => Color::parse(s).map(|_| ()).map_err(Into::into),
            other => Err(invalid(key, format!("expected a color, got {:?}", other.kind()))),
        },
        keys::SVG_PATH => {
            parse_path_data(text_of(key, value)?)?;
            Ok(())
        }
        keys::STROKE_DASHARRAY | keys::POINTS => match value {
            Value::List(_) => Ok(()),
            other => Err(invalid(key, format!("expected a list of numbers, got {:?}", other.kind()))),
        },
        keys::BLEND_MODE => keyword::<BlendMode>(key, value),
        keys::LINE_JOIN => keyword::<LineJoin>(key, value),
        keys::LINE_CAP => keyword::<LineCap>(key, value),
        keys::LAYOUT => keyword::<ContainerLayout>(key, value),
        keys::OVERSIZED => keyword::<Oversized>(key, value),
        keys::TEXT_ALIGN => keyword::<TextAlign>(key, value),
        keys::DIRECTION => keyword::<TextDirection>(key, value),
        keys::FONT_STYLE => keyword::<FontStyle>(key, value),
        keys::FONT_WEIGHT => match value {
            Value::Number(_) => Ok(()),
            _ => keyword::<FontWeight>(key, value),
        },
        keys::TEXT if node.kind() == NodeKind::Text => match value {
            Value::Number(_) => Ok(()),
            _ if node.settings.get_bool(keys::IGNORE_FORMATTING, false) => text_of(key, value).map(|_| ()),
            _ => {
                parse_markup(text_of(key, value)?, &markup)?;
                Ok(())
            }
        },
        _ => Ok(()),
    }
}

/// True if any setting is a percentage
fn uses_relative_lengths(settings: &PropertyStore) -> bool {
    settings.keys().any(|key| match settings.get(key) {
        Some(Value::Percent(_)) => true,
        Some(Value::Text(s)) => key != keys::TEXT && s.trim_end().ends_with('%'),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Percent;

    fn scene() -> Scene {
        Scene::new(Size::new(200.0, 100.0))
    }

    #[test]
    fn test_add_child_sets_parent_and_depth() {
        let mut scene = scene();
        let group = scene.create_container();
        let rect = scene.create_graphics(Shape::Rectangle);
        scene.add_child(scene.root(), group).unwrap();
        scene.add_child(group, rect).unwrap();

        assert_eq!(scene.parent(rect).unwrap(), Some(group));
        assert_eq!(scene.node(rect).unwrap().depth(), 2);
        assert_eq!(scene.ancestors(rect), vec![rect, group, scene.root()]);
        assert!(scene.is_attached(rect));
    }

    #[test]
    fn test_cycle_is_rejected_and_graph_untouched() {
        let mut scene = scene();
        let outer = scene.create_container();
        let inner = scene.create_container();
        scene.add_child(outer, inner).unwrap();

        let err = scene.add_child(inner, outer).unwrap_err();
        assert_eq!(err, SceneError::Cycle { parent: inner, child: outer });
        assert!(scene.add_child(outer, outer).is_err());
        assert_eq!(scene.children(outer).unwrap(), &[inner]);
        assert_eq!(scene.parent(outer).unwrap(), None);
    }

    #[test]
    fn test_reparenting_moves_child() {
        let mut scene = scene();
        let a = scene.create_container();
        let b = scene.create_container();
        let leaf = scene.create_graphics(Shape::Circle);
        scene.add_child(a, leaf).unwrap();
        scene.add_child(b, leaf).unwrap();

        assert!(scene.children(a).unwrap().is_empty());
        assert_eq!(scene.children(b).unwrap(), &[leaf]);
        assert_eq!(scene.parent(leaf).unwrap(), Some(b));
    }

    #[test]
    fn test_add_child_at_orders_children() {
        let mut scene = scene();
        let group = scene.create_container();
        let a = scene.create_graphics(Shape::Rectangle);
        let b = scene.create_graphics(Shape::Rectangle);
        let c = scene.create_graphics(Shape::Rectangle);
        scene.add_child(group, a).unwrap();
        scene.add_child(group, b).unwrap();
        scene.add_child_at(group, c, 0).unwrap();
        assert_eq!(scene.children(group).unwrap(), &[c, a, b]);

        // Moving within the same parent
        scene.add_child_at(group, c, 2).unwrap();
        assert_eq!(scene.children(group).unwrap(), &[a, b, c]);

        let d = scene.create_graphics(Shape::Rectangle);
        assert_eq!(
            scene.add_child_at(group, d, 7),
            Err(SceneError::IndexOutOfRange { index: 7, len: 3 })
        );
    }

    #[test]
    fn test_misuse_errors() {
        let mut scene = scene();
        let rect = scene.create_graphics(Shape::Rectangle);
        let other = scene.create_graphics(Shape::Rectangle);
        let group = scene.create_container();

        assert!(matches!(
            scene.add_child(rect, other),
            Err(SceneError::NotAContainer { kind: NodeKind::Graphics, .. })
        ));
        assert_eq!(
            scene.remove_child(group, rect),
            Err(SceneError::NotAChild { parent: group, child: rect })
        );
        assert_eq!(scene.dispose(scene.root()), Err(SceneError::RootNode("disposed")));
        assert!(matches!(scene.set_background(group, Some(group)), Err(SceneError::WrongKind { .. })));
    }

    #[test]
    fn test_dispose_removes_subtree_everywhere() {
        let mut scene = scene();
        let group = scene.create_container();
        let rect = scene.create_graphics(Shape::Rectangle);
        scene.add_child(scene.root(), group).unwrap();
        scene.add_child(group, rect).unwrap();
        scene.ghosts.paint_id(rect);

        let removed = scene.dispose(group).unwrap();
        assert_eq!(removed, vec![group, rect]);
        assert!(!scene.contains(rect));
        assert!(!scene.queues.is_queued(rect));
        assert!(scene.ghosts.id_of(rect).is_none());
        assert!(scene.children(scene.root()).unwrap().is_empty());
        assert_eq!(scene.set(rect, keys::X, 1.0), Err(SceneError::UnknownNode(rect)));
    }

    #[test]
    fn test_set_validates_before_storing() {
        let mut scene = scene();
        let rect = scene.create_graphics(Shape::SvgPath);

        assert!(scene.set(rect, keys::FILL, "#ff0000").unwrap());
        assert!(scene.set(rect, keys::FILL, "nope").is_err());
        assert_eq!(scene.get(rect, keys::FILL), Some(&Value::Text("#ff0000".into())));

        assert!(scene.set(rect, keys::SVG_PATH, "M0 0 L10 0 L10 10 Z").unwrap());
        assert!(matches!(scene.set(rect, keys::SVG_PATH, "M0 0 Lx"), Err(SceneError::Paint(_))));
        assert!(scene.set(rect, keys::BLEND_MODE, "multiply").is_ok());
        assert!(matches!(
            scene.set(rect, keys::LINE_JOIN, "pointy"),
            Err(SceneError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_text_markup_validated() {
        let mut scene = scene();
        assert!(scene.create_text("[bold]ok[/]").is_ok());
        let before = scene.len();
        assert!(matches!(scene.create_text("[frobnicate]x"), Err(SceneError::Text(_))));
        assert_eq!(scene.len(), before);

        let text = scene.create_text("plain").unwrap();
        assert!(scene.set(text, keys::TEXT, "[bogus]y").is_err());
        scene.set(text, keys::IGNORE_FORMATTING, true).unwrap();
        assert!(scene.set(text, keys::TEXT, "[bogus]y").is_ok());
    }

    #[test]
    fn test_unchanged_set_queues_nothing() {
        let mut scene = scene();
        let rect = scene.create_graphics(Shape::Rectangle);
        scene.queues.clear();
        assert!(scene.set(rect, keys::WIDTH, 10.0).unwrap());
        assert!(scene.queues.is_queued(rect));
        scene.queues.clear();
        assert!(!scene.set(rect, keys::WIDTH, 10.0).unwrap());
        assert!(scene.queues.is_empty());
    }

    #[test]
    fn test_effective_layer_inherits() {
        let mut scene = scene();
        let group = scene.create_container();
        let rect = scene.create_graphics(Shape::Rectangle);
        scene.add_child(scene.root(), group).unwrap();
        scene.add_child(group, rect).unwrap();
        assert_eq!(scene.effective_layer(rect), BASE_LAYER);

        scene.set(group, keys::LAYER, 3).unwrap();
        assert_eq!(scene.effective_layer(rect), 3);
        scene.set(rect, keys::LAYER, -1).unwrap();
        assert_eq!(scene.effective_layer(rect), -1);
    }

    #[test]
    fn test_relative_lengths_detected() {
        let mut store = PropertyStore::new();
        store.set(keys::X, 10.0);
        assert!(!uses_relative_lengths(&store));
        store.set(keys::WIDTH, Percent(50.0));
        assert!(uses_relative_lengths(&store));

        let mut text = PropertyStore::new();
        text.set(keys::TEXT, "100%");
        assert!(!uses_relative_lengths(&text));
        text.set(keys::HEIGHT, "25%");
        assert!(uses_relative_lengths(&text));
    }
}
