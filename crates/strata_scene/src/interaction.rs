//! Pointer input
//!
//! Hit testing reads the ghost surface painted by the last tick: the pixel
//! under the pointer carries the ghost color of the topmost interactive
//! node there. Without a ghost surface the scene is searched geometrically
//! instead, topmost child first.
//!
//! Hover is tracked over the whole ancestor chain of the hit node, so
//! moving between two children of an interactive container does not leave
//! the container. Every other pointer event is delivered to the hit node
//! and then bubbles up through its ancestors.

use strata_core::Point;
use tracing::trace;

use crate::events::{MouseButton, NodeEvent, NodeEventKind};
use crate::keys;
use crate::node::{NodeData, NodeId};
use crate::scene::Scene;
use crate::scheduler::Root;

#[derive(Debug, Clone, Copy)]
struct Press {
    target: NodeId,
    button: MouseButton,
    origin: Point,
    last: Point,
}

/// Pointer state carried between input events
#[derive(Debug, Default)]
pub(crate) struct PointerState {
    /// Hovered node and its ancestors, deepest first
    hovered: Vec<NodeId>,
    pressed: Option<Press>,
    dragging: bool,
    last_click: Option<(NodeId, f64)>,
}

impl PointerState {
    /// Drop every reference to disposed nodes
    pub(crate) fn forget(&mut self, removed: &[NodeId]) {
        self.hovered.retain(|id| !removed.contains(id));
        if self.pressed.is_some_and(|p| removed.contains(&p.target)) {
            self.pressed = None;
            self.dragging = false;
        }
        if self.last_click.is_some_and(|(id, _)| removed.contains(&id)) {
            self.last_click = None;
        }
    }
}

impl Scene {
    /// Topmost visible interactive node whose local bounds contain `point`
    pub fn hit_test_bounds(&self, point: Point) -> Option<NodeId> {
        self.hit_bounds_from(self.root(), point)
    }

    fn hit_bounds_from(&self, id: NodeId, point: Point) -> Option<NodeId> {
        let node = self.nodes.get(id)?;
        if !node.is_visible() {
            return None;
        }
        if let NodeData::Container(container) = &node.data {
            let mut children = container.children.clone();
            if !node.settings.get_bool(keys::REVERSE_CHILDREN, false) {
                children.reverse();
            }
            if let Some(hit) = children.into_iter().find_map(|child| self.hit_bounds_from(child, point)) {
                return Some(hit);
            }
        }
        let local = node.world_transform.transform_point_inverse(point);
        (node.is_interactive() && node.local_bounds().contains(local)).then_some(id)
    }
}

impl Root {
    /// Interactive node under `point` (root coordinates)
    ///
    /// Reflects the scene as painted by the last tick.
    pub fn hit_test(&mut self, point: Point) -> Option<NodeId> {
        if self.ghost.is_none() {
            return self.scene.hit_test_bounds(point);
        }
        let ratio = self.config.pixel_ratio;
        let (x, y) = (point.x * ratio, point.y * ratio);
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let rgba = self.ghost_pixel(x as u32, y as u32)?;
        if rgba[3] == 0 {
            return None;
        }
        let hit = self.scene.ghosts.node_at_rgb([rgba[0], rgba[1], rgba[2]]);
        trace!(x = point.x, y = point.y, ?hit, "hit test");
        hit.filter(|id| self.scene.contains(*id))
    }

    fn ghost_pixel(&mut self, x: u32, y: u32) -> Option<[u8; 4]> {
        let ghost = self.ghost.as_deref()?;
        if x >= ghost.width() || y >= ghost.height() {
            return None;
        }
        if !self.config.interaction.ghost_snapshot {
            return ghost.read_pixel(x, y);
        }
        let width = ghost.width();
        if self.hit_snapshot.is_none() {
            self.hit_snapshot = ghost.pixels().map(<[u8]>::to_vec);
        }
        match self.hit_snapshot.as_deref() {
            Some(pixels) => {
                let offset = ((y * width + x) * 4) as usize;
                let px = pixels.get(offset..offset + 4)?;
                Some([px[0], px[1], px[2], px[3]])
            }
            None => ghost.read_pixel(x, y),
        }
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Pointer moved to `point`
    pub fn on_pointer_move(&mut self, point: Point) {
        let hit = self.hit_test(point);
        self.update_hover(hit, point);

        if let Some(mut press) = self.pointer.pressed {
            if !self.pointer.dragging
                && press.origin.distance(point) >= self.config.interaction.drag_threshold
            {
                self.pointer.dragging = true;
                press.last = press.origin;
                let event = NodeEvent::new(NodeEventKind::DragStart, press.target, point).with_button(press.button);
                self.dispatch_bubbling(event);
            }
            if self.pointer.dragging {
                let delta = Point::new(point.x - press.last.x, point.y - press.last.y);
                self.drag_by(press.target, press.last, point);
                let event = NodeEvent::new(NodeEventKind::Dragged, press.target, point)
                    .with_button(press.button)
                    .with_delta(delta);
                self.dispatch_bubbling(event);
            }
            press.last = point;
            self.pointer.pressed = Some(press);
        }

        let target = match self.pointer.pressed {
            Some(press) => Some(press.target),
            None => hit,
        };
        if let Some(target) = target {
            self.dispatch_bubbling(NodeEvent::new(NodeEventKind::PointerMove, target, point));
        }
    }

    /// Button pressed at `point`
    pub fn on_pointer_down(&mut self, point: Point, button: MouseButton) {
        let hit = self.hit_test(point);
        self.update_hover(hit, point);
        let Some(target) = hit else { return };
        self.pointer.pressed = Some(Press {
            target,
            button,
            origin: point,
            last: point,
        });
        self.pointer.dragging = false;
        self.dispatch_bubbling(NodeEvent::new(NodeEventKind::PointerDown, target, point).with_button(button));
    }

    /// Button released at `point`
    pub fn on_pointer_up(&mut self, point: Point, button: MouseButton) {
        let hit = self.hit_test(point);
        let press = self.pointer.pressed.take();
        let dragging = std::mem::take(&mut self.pointer.dragging);

        if let Some(target) = hit.or(press.map(|p| p.target)) {
            self.dispatch_bubbling(NodeEvent::new(NodeEventKind::PointerUp, target, point).with_button(button));
        }
        let Some(press) = press else { return };
        if dragging {
            let event = NodeEvent::new(NodeEventKind::DragStop, press.target, point).with_button(button);
            self.dispatch_bubbling(event);
            return;
        }
        let released_inside = hit.is_some_and(|id| self.scene.ancestors(id).contains(&press.target));
        if !released_inside {
            return;
        }
        self.dispatch_bubbling(NodeEvent::new(NodeEventKind::Click, press.target, point).with_button(button));

        let now = self.now;
        let double = self.pointer.last_click.is_some_and(|(id, at)| {
            id == press.target && now - at <= self.config.interaction.double_click_ms
        });
        if double {
            self.pointer.last_click = None;
            let event = NodeEvent::new(NodeEventKind::DoubleClick, press.target, point).with_button(button);
            self.dispatch_bubbling(event);
        } else {
            self.pointer.last_click = Some((press.target, now));
        }
    }

    /// Wheel scrolled by `delta` over `point`
    pub fn on_wheel(&mut self, point: Point, delta: Point) {
        if let Some(target) = self.hit_test(point) {
            self.dispatch_bubbling(NodeEvent::new(NodeEventKind::Wheel, target, point).with_delta(delta));
        }
    }

    /// Pointer left the viewport
    pub fn on_pointer_leave(&mut self, point: Point) {
        self.update_hover(None, point);
    }

    /// Node currently under the pointer
    pub fn hovered(&self) -> Option<NodeId> {
        self.pointer.hovered.first().copied()
    }

    pub fn is_dragging(&self) -> bool {
        self.pointer.dragging
    }

    fn update_hover(&mut self, hit: Option<NodeId>, point: Point) {
        let chain = hit.map(|id| self.scene.ancestors(id)).unwrap_or_default();
        if chain == self.pointer.hovered {
            return;
        }
        let previous = std::mem::replace(&mut self.pointer.hovered, chain.clone());
        for &id in previous.iter().filter(|id| !chain.contains(id)) {
            self.deliver_direct(NodeEventKind::PointerLeave, id, point);
        }
        for &id in chain.iter().rev().filter(|id| !previous.contains(id)) {
            self.deliver_direct(NodeEventKind::PointerEnter, id, point);
        }
    }

    /// Deliver to `id` only, without bubbling
    fn deliver_direct(&mut self, kind: NodeEventKind, id: NodeId, point: Point) {
        let mut event = NodeEvent::new(kind, id, point);
        if let Ok(local) = self.scene.to_local(id, point) {
            event.point = local;
        }
        self.scene.deliver(&event);
        self.log_event(event);
    }

    /// Move a draggable node by the pointer travel, in its parent's space
    fn drag_by(&mut self, id: NodeId, from: Point, to: Point) {
        let Ok(node) = self.scene.node(id) else { return };
        if !node.is_draggable() {
            return;
        }
        let (from, to) = match node.parent().and_then(|p| self.scene.node(p).ok()) {
            Some(parent) => (
                parent.world_transform.transform_point_inverse(from),
                parent.world_transform.transform_point_inverse(to),
            ),
            None => (from, to),
        };
        let x = node.settings.get_number(keys::X, 0.0) + to.x - from.x;
        let y = node.settings.get_number(keys::Y, 0.0) + to.y - from.y;
        // Both keys are plain numbers, so validation cannot fail
        let _ = self.scene.set(id, keys::X, x);
        let _ = self.scene.set(id, keys::Y, y);
    }
}
