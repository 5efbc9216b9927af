//! Per-frame resolution stages
//!
//! Each stage drains one dirty queue. The scheduler runs them in a fixed
//! order: parents and settings until neither produces more work, then
//! bounds deepest first, then world positions shallowest first.

use std::collections::BinaryHeap;
use std::str::FromStr;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use strata_core::{Affine2D, Bounds, Length, Point, PropertyStore, Rect, Size, Value};
use strata_text::{
    layout_text, markup::plain_text, place_on_circle, FontStyle, FontWeight, GlyphPlacement, LayoutOptions,
    RadialOptions, TextAlign, TextBlock, TextDirection, TextStyle,
};
use tracing::{trace, warn};

use crate::events::{NodeEvent, NodeEventKind};
use crate::keys;
use crate::layout::{arrange, ContainerLayout, Padding};
use crate::node::{Node, NodeData, NodeId};
use crate::scene::{Scene, TextDefaults};
use crate::shapes::build_ops;

const BOUNDS_EPSILON: f32 = 1e-4;

impl Scene {
    // =========================================================================
    // Parents
    // =========================================================================

    /// Mark containers whose child list or child sizes changed for relayout
    pub(crate) fn resolve_parents(&mut self) {
        while !self.queues.parents.is_empty() {
            let batch: Vec<NodeId> = self.queues.parents.drain(..).collect();
            for id in batch {
                let Some(node) = self.nodes.get_mut(id) else { continue };
                if let Some(c) = node.container_mut() {
                    c.needs_layout = true;
                }
                node.local_bounds = None;
                self.queues.bounds.insert(id);
                self.stats.parents_resolved += 1;

                // An auto-sized container resizes with its children
                let auto_sized = !node.settings.contains(keys::WIDTH) || !node.settings.contains(keys::HEIGHT);
                if let Some(parent) = node.parent.filter(|_| auto_sized) {
                    self.queues.parents.insert(parent);
                }
            }
        }
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Run the before-change pass over every dirty node, then the apply pass
    pub(crate) fn resolve_settings(&mut self) {
        while !self.queues.settings.is_empty() {
            let batch: Vec<NodeId> = self.queues.settings.drain(..).collect();
            for &id in &batch {
                self.before_change(id);
            }
            for &id in &batch {
                self.apply_change(id);
            }
        }
    }

    fn before_change(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id) else { return };
        let is_container = node.container().is_some();
        let mut relayout = false;
        let mut resized = false;
        let mut display = false;
        for key in node.settings.dirty_keys() {
            let key = key.as_str();
            if keys::DISPLAY_KEYS.contains(&key) {
                display = true;
                continue;
            }
            if keys::PLACEMENT_KEYS.contains(&key) {
                continue;
            }
            if is_container {
                relayout |= keys::CONTAINER_LAYOUT_KEYS.contains(&key);
                resized = true;
            } else {
                node.content_stale = true;
                resized = true;
            }
        }
        if resized {
            node.local_bounds = None;
        }
        if relayout {
            if let Some(c) = node.container_mut() {
                c.needs_layout = true;
            }
            self.invalidate_relative(id, false);
        }
        // Descendants may paint on other layers
        if display && is_container {
            self.damage.all = true;
        }
        self.queues.bounds.insert(id);
        self.damage.layers.insert(self.effective_layer(id));
    }

    fn apply_change(&mut self, id: NodeId) {
        if self.nodes.get(id).is_some_and(|n| n.content_stale) {
            self.rebuild_content(id);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.settings.clear_dirty();
            self.stats.settings_resolved += 1;
        }
    }

    /// Rebuild the op list, text layout or image of a leaf node
    fn rebuild_content(&mut self, id: NodeId) {
        let available = self.available_size(id);
        let measurer = Arc::clone(&self.measurer);
        let Some(node) = self.nodes.get_mut(id) else { return };
        node.content_stale = false;
        node.local_bounds = None;
        match &mut node.data {
            NodeData::Graphics(graphics) => match build_ops(&graphics.shape, &node.settings, available) {
                Ok(ops) => graphics.ops = ops,
                Err(err) => {
                    warn!(?id, %err, "graphics node could not be built");
                    graphics.ops.clear();
                }
            },
            NodeData::Text(text) => {
                let style = text_style(&node.settings, &self.text_defaults);
                let options = layout_options(&node.settings, available, &self.text_defaults);
                let content = node.settings.get(keys::TEXT).map(display_text).unwrap_or_default();
                text.block = match layout_text(&content, &style, &options, &*measurer) {
                    Ok(block) => Some(block),
                    Err(err) => {
                        warn!(?id, %err, "text node could not be laid out");
                        None
                    }
                };
                text.radial = radial_placements(&node.settings, &content, &style, &options, &*measurer);
                text.style = style;
            }
            NodeData::Image(image) => {
                if image.image.is_none() {
                    image.image = match image.source.as_ref().map(|s| s.load()) {
                        Some(Ok(data)) => Some(Arc::new(data)),
                        Some(Err(err)) => {
                            warn!(?id, %err, "image could not be decoded");
                            None
                        }
                        None => None,
                    };
                }
            }
            NodeData::Container(_) => {}
        }
        trace!(?id, "content rebuilt");
    }

    // =========================================================================
    // Sizes
    // =========================================================================

    /// Inner size of the node's parent, or the scene size for top-level nodes
    pub(crate) fn available_size(&self, id: NodeId) -> Size {
        match self.nodes.get(id).and_then(|n| n.parent) {
            Some(parent) => self.inner_size(parent),
            None => self.size,
        }
    }

    /// Content box of a container: its explicit or inherited size minus padding
    pub(crate) fn inner_size(&self, id: NodeId) -> Size {
        let Some(node) = self.nodes.get(id) else { return self.size };
        let available = self.available_size(id);
        let padding = Padding::from_settings(&node.settings);
        let width = resolve_length(&node.settings, keys::WIDTH, available.width).unwrap_or(available.width);
        let height = resolve_length(&node.settings, keys::HEIGHT, available.height).unwrap_or(available.height);
        Size::new(
            (width - padding.horizontal()).max(0.0),
            (height - padding.vertical()).max(0.0),
        )
    }

    // =========================================================================
    // Bounds
    // =========================================================================

    /// Recompute bounds of queued nodes, deepest first, propagating upward
    pub(crate) fn resolve_bounds(&mut self) {
        let mut heap: BinaryHeap<(u32, NodeId)> = self
            .queues
            .bounds
            .drain(..)
            .filter_map(|id| self.nodes.get(id).map(|n| (n.depth, id)))
            .collect();
        let mut done = FxHashSet::default();
        while let Some((_, id)) = heap.pop() {
            if !done.insert(id) {
                continue;
            }
            if let Some(parent) = self.update_bounds(id) {
                if !done.contains(&parent) {
                    if let Some(node) = self.nodes.get(parent) {
                        heap.push((node.depth, parent));
                    }
                }
            }
        }
    }

    /// Returns the parent when this node's adjusted bounds changed
    fn update_bounds(&mut self, id: NodeId) -> Option<NodeId> {
        self.stats.bounds_resolved += 1;
        let node = self.nodes.get(id)?;
        let is_container = node.container().is_some();
        if node.container().is_some_and(|c| c.needs_layout) {
            self.run_layout(id);
        }

        let node = self.nodes.get(id)?;
        if is_container || node.local_bounds.is_none() {
            let local = self.measure_local(id);
            self.nodes.get_mut(id)?.local_bounds = Some(local);
            self.fit_background(id, local);
        }

        if !self.apply_placement(id) {
            return None;
        }
        let node = self.nodes.get(id)?;
        let event = NodeEvent::new(NodeEventKind::BoundsChanged, id, node.world_position)
            .with_bounds(node.adjusted_bounds)
            .synthesized();
        self.outbox.push(event);
        self.damage.layers.insert(self.effective_layer(id));

        let parent = node.parent?;
        let container = self.nodes.get_mut(parent)?;
        let flows = ContainerLayout::from_settings(&container.settings).is_flow();
        let c = container.container_mut()?;
        if !c.children.contains(&id) {
            return None;
        }
        if flows {
            c.needs_layout = true;
        }
        Some(parent)
    }

    /// Place a container's children according to its layout
    fn run_layout(&mut self, id: NodeId) {
        let inner = self.inner_size(id);
        let Some(node) = self.nodes.get_mut(id) else { return };
        let layout = ContainerLayout::from_settings(&node.settings);
        let padding = Padding::from_settings(&node.settings);
        let gap = node.settings.get_number(keys::GAP, 0.0);
        let columns = node
            .settings
            .get(keys::GRID_COLUMNS)
            .and_then(Value::as_number)
            .filter(|n| *n >= 1.0)
            .map(|n| n as usize);
        let children = node.children().to_vec();
        if let Some(c) = node.container_mut() {
            c.needs_layout = false;
        }

        let offsets: Vec<Option<Point>> = if layout.is_flow() {
            let items: Vec<Bounds> = children.iter().map(|&child| self.layout_item(child)).collect();
            let area = Rect::new(padding.left, padding.top, inner.width, inner.height);
            arrange(layout, &items, area, gap, columns).into_iter().map(Some).collect()
        } else {
            vec![None; children.len()]
        };

        for (child, offset) in children.into_iter().zip(offsets) {
            let Some(node) = self.nodes.get_mut(child) else { continue };
            node.layout_offset = offset;
            if self.apply_placement(child) {
                if let Some(node) = self.nodes.get(child) {
                    let event = NodeEvent::new(NodeEventKind::BoundsChanged, child, node.world_position)
                        .with_bounds(node.adjusted_bounds)
                        .synthesized();
                    self.outbox.push(event);
                }
            }
        }
        self.stats.layouts_run += 1;
        trace!(?id, ?layout, "layout run");
    }

    /// Space a child occupies in a flow: rotation and scale, no translation
    fn layout_item(&mut self, child: NodeId) -> Bounds {
        if self.nodes.get(child).is_some_and(|n| n.local_bounds.is_none()) {
            let local = self.measure_local(child);
            if let Some(node) = self.nodes.get_mut(child) {
                node.local_bounds = Some(local);
            }
        }
        let Some(node) = self.nodes.get(child) else { return Bounds::EMPTY };
        let local = node.local_bounds();
        if !node.is_visible() || local.is_empty() {
            return Bounds::EMPTY;
        }
        let pivot = pivot(&node.settings, local);
        let rotation = node.settings.get_number(keys::ROTATION, 0.0);
        let scale = node.settings.get_number(keys::SCALE, 1.0);
        Affine2D::from_placement(0.0, 0.0, pivot, rotation, scale).transform_bounds(&local)
    }

    fn measure_local(&self, id: NodeId) -> Bounds {
        let Some(node) = self.nodes.get(id) else { return Bounds::EMPTY };
        match &node.data {
            NodeData::Graphics(graphics) => graphics.ops.bounds(),
            NodeData::Text(text) if !text.radial.is_empty() => radial_bounds(&text.radial, text.style.font_size),
            NodeData::Text(text) => text.block.as_ref().map_or(Bounds::EMPTY, TextBlock::bounds),
            NodeData::Image(image) => {
                let available = self.available_size(id);
                let natural = image
                    .image
                    .as_ref()
                    .map_or((0.0, 0.0), |i| (i.width() as f32, i.height() as f32));
                let width = resolve_length(&node.settings, keys::WIDTH, available.width);
                let height = resolve_length(&node.settings, keys::HEIGHT, available.height);
                let (w, h) = match (width, height) {
                    (Some(w), Some(h)) => (w, h),
                    (Some(w), None) if natural.0 > 0.0 => (w, w * natural.1 / natural.0),
                    (None, Some(h)) if natural.1 > 0.0 => (h * natural.0 / natural.1, h),
                    (None, None) => natural,
                    _ => (0.0, 0.0),
                };
                if w <= 0.0 || h <= 0.0 {
                    Bounds::EMPTY
                } else {
                    Bounds::new(0.0, 0.0, w, h)
                }
            }
            NodeData::Container(_) => self.measure_container(id, node),
        }
    }

    /// Union of the children plus padding, overridden by explicit sizes
    fn measure_container(&self, id: NodeId, node: &Node) -> Bounds {
        let settings = &node.settings;
        let available = self.available_size(id);
        let padding = Padding::from_settings(settings);
        let content = node
            .children()
            .iter()
            .filter_map(|&child| self.nodes.get(child))
            .fold(Bounds::EMPTY, |acc, child| acc.union(&child.adjusted_bounds));
        let width = resolve_length(settings, keys::WIDTH, available.width);
        let height = resolve_length(settings, keys::HEIGHT, available.height);

        let mut bounds = if !content.is_empty() {
            Bounds::new(
                content.left - padding.left,
                content.top - padding.top,
                content.right + padding.right,
                content.bottom + padding.bottom,
            )
        } else if width.is_some() || height.is_some() {
            Bounds::ZERO
        } else {
            return Bounds::EMPTY;
        };
        if let Some(w) = width {
            bounds.left = 0.0;
            bounds.right = w;
        }
        if let Some(h) = height {
            bounds.top = 0.0;
            bounds.bottom = h;
        }

        let clamp = |value: f32, min: &str, max: &str, total: f32| {
            let lo = resolve_length(settings, min, total).unwrap_or(0.0);
            let hi = resolve_length(settings, max, total).unwrap_or(f32::INFINITY);
            value.min(hi).max(lo)
        };
        bounds.right = bounds.left + clamp(bounds.width(), keys::MIN_WIDTH, keys::MAX_WIDTH, available.width);
        bounds.bottom = bounds.top + clamp(bounds.height(), keys::MIN_HEIGHT, keys::MAX_HEIGHT, available.height);
        bounds
    }

    /// Stretch the background node over the container's local bounds
    fn fit_background(&mut self, container: NodeId, local: Bounds) {
        let Some(background) = self.nodes.get(container).and_then(Node::background) else {
            return;
        };
        let frame = local.or_zero();
        let Some(node) = self.nodes.get_mut(background) else { return };
        node.settings.set_raw(keys::X, frame.left);
        node.settings.set_raw(keys::Y, frame.top);
        node.settings.set_raw(keys::WIDTH, frame.width());
        node.settings.set_raw(keys::HEIGHT, frame.height());
        node.layout_offset = None;
        if let NodeData::Graphics(graphics) = &mut node.data {
            let size = Size::new(frame.width(), frame.height());
            match build_ops(&graphics.shape, &node.settings, size) {
                Ok(ops) => graphics.ops = ops,
                Err(err) => {
                    warn!(?background, %err, "background could not be built");
                    graphics.ops.clear();
                }
            }
            node.local_bounds = Some(graphics.ops.bounds());
            node.content_stale = false;
        }
        self.apply_placement(background);
    }

    /// Recompute the local transform and adjusted bounds; true if the bounds moved
    fn apply_placement(&mut self, id: NodeId) -> bool {
        let available = self.available_size(id);
        let Some(node) = self.nodes.get_mut(id) else { return false };
        let local = node.local_bounds();
        let transform = placement(&node.settings, node.layout_offset, local, available);
        if transform != node.local_transform {
            node.local_transform = transform;
            self.queues.positions.insert(id);
        }
        let adjusted = if node.is_visible() && !local.is_empty() {
            transform.transform_bounds(&local)
        } else {
            Bounds::EMPTY
        };
        if adjusted.approx_eq(&node.adjusted_bounds, BOUNDS_EPSILON) {
            return false;
        }
        node.adjusted_bounds = adjusted;
        true
    }

    // =========================================================================
    // Positions
    // =========================================================================

    /// Compose world transforms for queued nodes and their subtrees
    pub(crate) fn resolve_positions(&mut self) {
        let mut starts: Vec<(u32, NodeId)> = self
            .queues
            .positions
            .drain(..)
            .filter_map(|id| self.nodes.get(id).map(|n| (n.depth, id)))
            .collect();
        starts.sort_unstable();

        let mut visited = FxHashSet::default();
        for (_, start) in starts {
            if visited.contains(&start) {
                continue;
            }
            let parent_world = self
                .nodes
                .get(start)
                .and_then(|n| n.parent)
                .and_then(|p| self.nodes.get(p))
                .map_or(Affine2D::IDENTITY, |p| p.world_transform);

            let mut stack = vec![(start, parent_world)];
            while let Some((id, parent_world)) = stack.pop() {
                if !visited.insert(id) {
                    continue;
                }
                let Some(node) = self.nodes.get_mut(id) else { continue };
                let world = parent_world.then(&node.local_transform);
                let moved = world != node.world_transform;
                node.world_transform = world;
                self.stats.positions_resolved += 1;

                let position = world.translation_part();
                if !position.approx_eq(node.world_position, BOUNDS_EPSILON) {
                    node.world_position = position;
                    self.outbox
                        .push(NodeEvent::new(NodeEventKind::PositionChanged, id, position).synthesized());
                }
                if moved || id == start {
                    stack.extend(node.owned().into_iter().map(|child| (child, world)));
                    self.damage.layers.insert(self.effective_layer(id));
                }
            }
        }
    }
}

// =============================================================================
// Settings readers
// =============================================================================

fn resolve_length(settings: &PropertyStore, key: &str, total: f32) -> Option<f32> {
    settings.get_length(key).map(|l| l.resolve(total))
}

fn parsed<T: FromStr>(settings: &PropertyStore, key: &str) -> Option<T> {
    settings.get_text(key).and_then(|s| s.parse().ok())
}

/// Pivot in local coordinates: pixels, or a percentage of the local bounds
fn pivot(settings: &PropertyStore, local: Bounds) -> Point {
    let local = local.or_zero();
    let axis = |key: &str, start: f32, extent: f32| match settings.get_length(key) {
        Some(Length::Px(px)) => px,
        Some(Length::Percent(p)) => start + p.resolve(extent),
        None => 0.0,
    };
    Point::new(
        axis(keys::CENTER_X, local.left, local.width()),
        axis(keys::CENTER_Y, local.top, local.height()),
    )
}

/// Local transform from position, pivot, rotation and scale
fn placement(settings: &PropertyStore, layout_offset: Option<Point>, local: Bounds, available: Size) -> Affine2D {
    let origin = layout_offset.unwrap_or_else(|| {
        Point::new(
            resolve_length(settings, keys::X, available.width).unwrap_or(0.0),
            resolve_length(settings, keys::Y, available.height).unwrap_or(0.0),
        )
    });
    let x = origin.x + settings.get_number(keys::DX, 0.0);
    let y = origin.y + settings.get_number(keys::DY, 0.0);
    Affine2D::from_placement(
        x,
        y,
        pivot(settings, local),
        settings.get_number(keys::ROTATION, 0.0),
        settings.get_number(keys::SCALE, 1.0),
    )
}

fn display_text(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn text_style(settings: &PropertyStore, defaults: &TextDefaults) -> TextStyle {
    let mut style = TextStyle::new(settings.get_number(keys::FONT_SIZE, defaults.font_size));
    style.font_family = settings
        .get_text(keys::FONT_FAMILY)
        .map(str::to_string)
        .or_else(|| defaults.font_family.clone());
    style.weight = match settings.get(keys::FONT_WEIGHT) {
        Some(Value::Number(n)) => FontWeight::from_number(*n as u16),
        _ => parsed(settings, keys::FONT_WEIGHT).unwrap_or_default(),
    };
    style.style = parsed::<FontStyle>(settings, keys::FONT_STYLE).unwrap_or_default();
    let color = settings
        .get_color(keys::FILL)
        .map(|c| c.fade(settings.get_number(keys::FILL_OPACITY, 1.0)))
        .unwrap_or(defaults.color);
    style.color = Some(color);
    style
}

fn layout_options(settings: &PropertyStore, available: Size, defaults: &TextDefaults) -> LayoutOptions {
    let mut options = LayoutOptions::new();
    options.max_width = resolve_length(settings, keys::WIDTH, available.width);
    options.max_height = resolve_length(settings, keys::HEIGHT, available.height);
    options.oversized = parsed(settings, keys::OVERSIZED).unwrap_or_default();
    if let Some(ellipsis) = settings.get_text(keys::ELLIPSIS) {
        options.ellipsis = ellipsis.to_string();
    }
    options.break_words = settings.get_bool(keys::BREAK_WORDS, options.break_words);
    options.min_scale = settings.get_number(keys::MIN_SCALE, options.min_scale);
    options.line_height = settings.get_number(keys::LINE_HEIGHT, options.line_height);
    options.paragraph_gap = settings.get_number(keys::PARAGRAPH_GAP, options.paragraph_gap);
    options.text_align = parsed(settings, keys::TEXT_ALIGN).unwrap_or(options.text_align);
    options.direction = parsed(settings, keys::DIRECTION).unwrap_or(options.direction);
    options.markup = defaults.markup();
    options.ignore_formatting = settings.get_bool(keys::IGNORE_FORMATTING, false);
    options
}

/// Glyph placements for text that follows a circle, empty otherwise
fn radial_placements(
    settings: &PropertyStore,
    content: &str,
    style: &TextStyle,
    options: &LayoutOptions,
    measurer: &dyn strata_text::TextMeasurer,
) -> Vec<GlyphPlacement> {
    let radius = settings.get_number(keys::TEXT_RADIUS, 0.0);
    if radius <= 0.0 {
        return Vec::new();
    }
    let plain = if options.ignore_formatting {
        content.to_string()
    } else {
        plain_text(content, &options.markup).unwrap_or_else(|_| content.to_string())
    };
    let radial = RadialOptions {
        radius,
        start_angle: settings.get_number(keys::START_ANGLE, -90.0),
        inside: settings.get_bool(keys::TEXT_INSIDE, false),
        kerning: settings.get_number(keys::TEXT_KERNING, 0.0),
        align: parsed(settings, keys::TEXT_ALIGN).unwrap_or(TextAlign::Center),
        rtl: options.direction == TextDirection::Rtl,
    };
    place_on_circle(&plain, style, &radial, measurer)
}

fn radial_bounds(placements: &[GlyphPlacement], font_size: f32) -> Bounds {
    placements.iter().fold(Bounds::EMPTY, |mut bounds, p| {
        let reach = (p.width / 2.0).max(font_size);
        bounds.include_xy(p.position.x - reach, p.position.y - reach);
        bounds.include_xy(p.position.x + reach, p.position.y + reach);
        bounds
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;

    fn resolve(scene: &mut Scene) {
        loop {
            scene.resolve_parents();
            scene.resolve_settings();
            if scene.queues.parents.is_empty() {
                break;
            }
        }
        scene.resolve_bounds();
        scene.resolve_positions();
    }

    fn rect(scene: &mut Scene, w: f32, h: f32) -> NodeId {
        let id = scene.create_graphics(Shape::Rectangle);
        scene.set(id, keys::WIDTH, w).unwrap();
        scene.set(id, keys::HEIGHT, h).unwrap();
        id
    }

    #[test]
    fn test_world_position_composes() {
        let mut scene = Scene::new(Size::new(400.0, 300.0));
        let group = scene.create_container();
        let r = rect(&mut scene, 100.0, 50.0);
        scene.add_child(scene.root(), group).unwrap();
        scene.add_child(group, r).unwrap();
        scene.set(group, keys::X, 10.0).unwrap();
        scene.set(group, keys::Y, 10.0).unwrap();
        scene.set(r, keys::X, 5.0).unwrap();
        resolve(&mut scene);

        assert_eq!(scene.node(r).unwrap().world_position(), Point::new(15.0, 10.0));
        let world = scene.world_bounds(r).unwrap();
        assert!(world.approx_eq(&Bounds::new(15.0, 10.0, 115.0, 60.0), 1e-4));
        assert!(scene.node(group).unwrap().adjusted_bounds().approx_eq(&Bounds::new(15.0, 10.0, 115.0, 60.0), 1e-4));
    }

    #[test]
    fn test_vertical_layout_stacks_children() {
        let mut scene = Scene::new(Size::new(400.0, 300.0));
        let column = scene.create_container();
        scene.set(column, keys::LAYOUT, "vertical").unwrap();
        scene.set(column, keys::GAP, 4.0).unwrap();
        scene.set(column, keys::PADDING_TOP, 2.0).unwrap();
        let a = rect(&mut scene, 20.0, 10.0);
        let b = rect(&mut scene, 30.0, 10.0);
        scene.add_child(scene.root(), column).unwrap();
        scene.add_child(column, a).unwrap();
        scene.add_child(column, b).unwrap();
        resolve(&mut scene);

        assert_eq!(scene.node(b).unwrap().adjusted_bounds(), Bounds::new(0.0, 16.0, 30.0, 26.0));
        assert_eq!(scene.node(column).unwrap().local_bounds(), Bounds::new(0.0, 0.0, 30.0, 26.0));

        // Growing the first child pushes the second down
        scene.set(a, keys::HEIGHT, 20.0).unwrap();
        resolve(&mut scene);
        assert_eq!(scene.node(b).unwrap().adjusted_bounds().top, 26.0);
    }

    #[test]
    fn test_percent_width_follows_parent() {
        let mut scene = Scene::new(Size::new(400.0, 300.0));
        let box_ = scene.create_container();
        scene.set(box_, keys::WIDTH, 200.0).unwrap();
        scene.set(box_, keys::HEIGHT, 100.0).unwrap();
        let bar = scene.create_graphics(Shape::Rectangle);
        scene.set(bar, keys::WIDTH, "50%").unwrap();
        scene.set(bar, keys::HEIGHT, 10.0).unwrap();
        scene.add_child(scene.root(), box_).unwrap();
        scene.add_child(box_, bar).unwrap();
        resolve(&mut scene);
        assert_eq!(scene.node(bar).unwrap().local_bounds().width(), 100.0);

        scene.set(box_, keys::WIDTH, 300.0).unwrap();
        resolve(&mut scene);
        assert_eq!(scene.node(bar).unwrap().local_bounds().width(), 150.0);
    }

    #[test]
    fn test_hidden_node_has_empty_adjusted_bounds() {
        let mut scene = Scene::new(Size::new(100.0, 100.0));
        let r = rect(&mut scene, 10.0, 10.0);
        scene.add_child(scene.root(), r).unwrap();
        resolve(&mut scene);
        assert!(!scene.node(r).unwrap().adjusted_bounds().is_empty());

        scene.set(r, keys::VISIBLE, false).unwrap();
        resolve(&mut scene);
        assert!(scene.node(r).unwrap().adjusted_bounds().is_empty());
        assert!(scene.node(scene.root()).unwrap().local_bounds().is_empty());
    }

    #[test]
    fn test_pivot_rotation() {
        let mut scene = Scene::new(Size::new(100.0, 100.0));
        let r = rect(&mut scene, 20.0, 10.0);
        scene.set(r, keys::CENTER_X, "50%").unwrap();
        scene.set(r, keys::CENTER_Y, "50%").unwrap();
        scene.set(r, keys::X, 50.0).unwrap();
        scene.set(r, keys::Y, 50.0).unwrap();
        scene.set(r, keys::ROTATION, 90.0).unwrap();
        scene.add_child(scene.root(), r).unwrap();
        resolve(&mut scene);
        assert!(scene
            .node(r)
            .unwrap()
            .adjusted_bounds()
            .approx_eq(&Bounds::new(45.0, 40.0, 55.0, 60.0), 1e-3));
    }

    #[test]
    fn test_background_fits_container() {
        let mut scene = Scene::new(Size::new(100.0, 100.0));
        let panel = scene.create_container();
        scene.set(panel, keys::PADDING_LEFT, 5.0).unwrap();
        scene.set(panel, keys::PADDING_RIGHT, 5.0).unwrap();
        let bg = scene.create_graphics(Shape::Rectangle);
        scene.set(bg, keys::FILL, "#eeeeee").unwrap();
        let r = rect(&mut scene, 40.0, 20.0);
        scene.add_child(scene.root(), panel).unwrap();
        scene.add_child(panel, r).unwrap();
        scene.set_background(panel, Some(bg)).unwrap();
        resolve(&mut scene);

        assert_eq!(scene.node(bg).unwrap().local_bounds(), Bounds::new(0.0, 0.0, 50.0, 20.0));
        assert_eq!(scene.node(bg).unwrap().adjusted_bounds(), Bounds::new(-5.0, 0.0, 45.0, 20.0));
    }

    #[test]
    fn test_bounds_and_position_events_queued() {
        let mut scene = Scene::new(Size::new(100.0, 100.0));
        let r = rect(&mut scene, 10.0, 10.0);
        scene.add_child(scene.root(), r).unwrap();
        scene.set(r, keys::X, 30.0).unwrap();
        resolve(&mut scene);

        assert!(scene
            .outbox
            .iter()
            .any(|e| e.target == r && e.kind == NodeEventKind::BoundsChanged && e.synthesized));
        assert!(scene
            .outbox
            .iter()
            .any(|e| e.target == r && e.kind == NodeEventKind::PositionChanged && e.global == Point::new(30.0, 0.0)));
    }

    #[test]
    fn test_text_layout_uses_defaults() {
        let mut scene = Scene::new(Size::new(300.0, 100.0));
        let text = scene.create_text("[bold]Hi[/] there").unwrap();
        scene.add_child(scene.root(), text).unwrap();
        resolve(&mut scene);

        let node = scene.node(text).unwrap();
        let block = node.text_block().unwrap();
        assert_eq!(block.lines.len(), 1);
        assert_eq!(block.chunks().count(), 2);
        assert_eq!(block.chunks().next().unwrap().style.font_size, 12.0);
        assert!(!node.local_bounds().is_empty());
    }
}
