//! Scene painting
//!
//! The tree is walked once per dirty layer and once for the ghost surface.
//! Containers always recurse so descendants on the target layer are found;
//! leaves only draw on the layer they resolve to. The ghost pass ignores
//! layers, opacity and blend modes and paints interactive nodes in their
//! flat ghost color with the same transforms and clips as the visible pass.

use strata_core::{Affine2D, BlendMode, Color, Point, Rect};
use strata_paint::{PaintMode, Path, Surface};
use strata_text::{TextBlock, TextStyle};
use tracing::warn;

use crate::ghost::id_to_color;
use crate::keys;
use crate::layers::BASE_LAYER;
use crate::node::{Node, NodeData, NodeId};
use crate::scene::Scene;

/// What a paint walk draws
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaintTarget {
    /// Visible content of one layer
    Layer(i32),
    /// Flat ghost colors of every interactive node
    Ghost,
}

/// State inherited down the tree
#[derive(Clone, Copy)]
struct Inherited {
    alpha: f32,
    layer: i32,
    blend: BlendMode,
}

impl Scene {
    /// Give every reachable interactive node a ghost color
    pub(crate) fn assign_ghost_ids(&mut self) {
        let mut exhausted = false;
        for id in self.subtree(self.root()) {
            let Some(node) = self.nodes.get(id) else { continue };
            let ghost_id = if node.is_interactive() && node.is_visible() {
                let assigned = self.ghosts.paint_id(id);
                exhausted |= assigned.is_none();
                assigned
            } else {
                None
            };
            if let Some(node) = self.nodes.get_mut(id) {
                node.ghost_id = ghost_id;
            }
        }
        if exhausted {
            warn!("ghost color space exhausted, some nodes are not hit-testable");
        }
    }

    /// Paint the scene for `target`; `base` maps root space to device pixels
    pub fn paint(&self, surface: &mut dyn Surface, target: PaintTarget, base: Affine2D) {
        surface.save();
        surface.set_anti_alias(target != PaintTarget::Ghost);
        let inherited = Inherited {
            alpha: 1.0,
            layer: BASE_LAYER,
            blend: BlendMode::Normal,
        };
        self.paint_node(self.root(), surface, target, base, inherited);
        surface.restore();
    }

    fn paint_node(&self, id: NodeId, surface: &mut dyn Surface, target: PaintTarget, base: Affine2D, inherited: Inherited) {
        let Some(node) = self.nodes.get(id) else { return };
        if !node.is_visible() {
            return;
        }
        let ghost = target == PaintTarget::Ghost;
        let alpha = inherited.alpha * node.opacity();
        if !ghost && alpha <= 0.0 {
            return;
        }
        let here = Inherited {
            alpha,
            layer: node.layer().unwrap_or(inherited.layer),
            blend: if node.settings.contains(keys::BLEND_MODE) {
                node.blend_mode()
            } else {
                inherited.blend
            },
        };
        let transform = base.then(&node.world_transform);

        if let NodeData::Container(container) = &node.data {
            surface.save();
            if let Some(mask) = container.mask.and_then(|m| self.nodes.get(m)) {
                if let Some(ops) = mask.ops() {
                    surface.set_transform(base.then(&mask.world_transform));
                    surface.clip(&ops.outline());
                }
            }
            if ghost {
                self.paint_container_ghost(node, surface, transform);
            }
            if let Some(background) = container.background {
                self.paint_node(background, surface, target, base, here);
            }
            let reverse = node.settings.get_bool(keys::REVERSE_CHILDREN, false);
            let mut children: Vec<NodeId> = container.children.clone();
            if reverse {
                children.reverse();
            }
            for child in children {
                self.paint_node(child, surface, target, base, here);
            }
            surface.restore();
            return;
        }

        match target {
            PaintTarget::Layer(layer) if layer == here.layer => {
                surface.set_transform(transform);
                surface.set_alpha(here.alpha);
                surface.set_blend_mode(here.blend);
                self.paint_leaf(node, surface, transform);
            }
            PaintTarget::Ghost => {
                let Some(color) = node.ghost_id.map(id_to_color) else { return };
                surface.set_transform(transform);
                surface.set_alpha(1.0);
                surface.set_blend_mode(BlendMode::Normal);
                match &node.data {
                    NodeData::Graphics(graphics) if paints_anything(node) => {
                        graphics.ops.replay(surface, PaintMode::Ghost(color))
                    }
                    // Unpainted shapes are still hit-testable by their outline
                    NodeData::Graphics(graphics) => surface.fill_path(&graphics.ops.outline(), color),
                    _ => fill_bounds(node, surface, color),
                }
            }
            PaintTarget::Layer(_) => {}
        }
    }

    /// Silhouette of an interactive container: its background shape, else its bounds
    fn paint_container_ghost(&self, node: &Node, surface: &mut dyn Surface, transform: Affine2D) {
        let Some(color) = node.ghost_id.map(id_to_color) else { return };
        surface.set_alpha(1.0);
        surface.set_blend_mode(BlendMode::Normal);
        let background = node.background().and_then(|b| self.nodes.get(b));
        match background.and_then(|b| b.ops().map(|ops| (b, ops))) {
            Some((b, ops)) if !ops.is_empty() => {
                surface.set_transform(transform.then(&b.local_transform));
                ops.replay(surface, PaintMode::Ghost(color));
            }
            _ => {
                surface.set_transform(transform);
                fill_bounds(node, surface, color);
            }
        }
    }

    fn paint_leaf(&self, node: &Node, surface: &mut dyn Surface, transform: Affine2D) {
        match &node.data {
            NodeData::Graphics(graphics) => graphics.ops.replay(surface, PaintMode::Visible),
            NodeData::Text(text) if !text.radial.is_empty() => {
                let color = text.style.color.unwrap_or(self.text_defaults.color);
                let font = text.style.font();
                for placement in &text.radial {
                    let glyph = transform
                        .then(&Affine2D::translation(placement.position.x, placement.position.y))
                        .then(&Affine2D::rotation(placement.rotation.to_radians()));
                    surface.set_transform(glyph);
                    surface.fill_text(&placement.text, Point::new(-placement.width / 2.0, 0.0), &font, color);
                }
            }
            NodeData::Text(text) => {
                if let Some(block) = text.block.as_ref().filter(|b| !b.hidden) {
                    let scaled = transform.then(&Affine2D::scale(block.scale, block.scale));
                    surface.set_transform(scaled);
                    paint_block(block, &text.style, self.text_defaults.color, surface);
                }
            }
            NodeData::Image(image) => {
                let bounds = node.local_bounds();
                if let (Some(data), false) = (image.image.as_deref(), bounds.is_empty()) {
                    surface.draw_image(data, bounds.to_rect());
                }
            }
            NodeData::Container(_) => {}
        }
    }
}

fn paint_block(block: &TextBlock, base: &TextStyle, fallback: Color, surface: &mut dyn Surface) {
    for line in block.lines.iter().filter(|l| !l.hidden) {
        for chunk in &line.chunks {
            let color = chunk.style.color.or(base.color).unwrap_or(fallback);
            let font = chunk.style.font();
            let origin = Point::new(chunk.x + chunk.text_offset, chunk.baseline);
            surface.fill_text(&chunk.text, origin, &font, color);

            let thickness = (font.size / 14.0).max(1.0);
            let width = chunk.width - chunk.text_offset;
            if chunk.style.underline {
                let rect = Rect::new(origin.x, chunk.baseline + thickness, width, thickness);
                fill_rect(surface, rect, color);
            }
            if chunk.style.line_through {
                let y = chunk.baseline - chunk.ascent * 0.3;
                fill_rect(surface, Rect::new(origin.x, y, width, thickness), color);
            }
        }
    }
}

fn fill_rect(surface: &mut dyn Surface, rect: Rect, color: Color) {
    let mut path = Path::new();
    path.rect(rect);
    surface.fill_path(&path, color);
}

fn paints_anything(node: &Node) -> bool {
    node.settings.contains(keys::FILL) || node.settings.contains(keys::STROKE)
}

fn fill_bounds(node: &Node, surface: &mut dyn Surface, color: Color) {
    let bounds = node.local_bounds();
    if !bounds.is_empty() {
        fill_rect(surface, bounds.to_rect(), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Size;
    use strata_paint::{RecordingSurface, SurfaceCommand};

    use crate::shapes::Shape;

    fn resolved_scene() -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::new(Size::new(100.0, 100.0));
        let a = scene.create_graphics(Shape::Rectangle);
        let b = scene.create_graphics(Shape::Rectangle);
        for id in [a, b] {
            scene.set(id, keys::WIDTH, 10.0).unwrap();
            scene.set(id, keys::HEIGHT, 10.0).unwrap();
            scene.set(id, keys::FILL, "#336699").unwrap();
            scene.add_child(scene.root(), id).unwrap();
        }
        scene.set(b, keys::LAYER, 2).unwrap();
        scene.resolve_parents();
        scene.resolve_settings();
        scene.resolve_bounds();
        scene.resolve_positions();
        (scene, a, b)
    }

    fn fills(surface: &RecordingSurface) -> usize {
        surface
            .commands()
            .iter()
            .filter(|c| matches!(c, SurfaceCommand::FillPath { .. }))
            .count()
    }

    #[test]
    fn test_leaves_paint_on_their_layer_only() {
        let (scene, _, _) = resolved_scene();
        let mut base = RecordingSurface::new(100, 100);
        scene.paint(&mut base, PaintTarget::Layer(BASE_LAYER), Affine2D::IDENTITY);
        assert_eq!(fills(&base), 1);

        let mut empty = RecordingSurface::new(100, 100);
        scene.paint(&mut empty, PaintTarget::Layer(7), Affine2D::IDENTITY);
        assert_eq!(fills(&empty), 0);
    }

    #[test]
    fn test_ghost_pass_paints_interactive_nodes_only() {
        let (mut scene, a, _) = resolved_scene();
        scene.set(a, keys::INTERACTIVE, true).unwrap();
        scene.assign_ghost_ids();
        let color = scene.ghosts.color_of(a).unwrap();

        let mut ghost = RecordingSurface::new(100, 100);
        scene.paint(&mut ghost, PaintTarget::Ghost, Affine2D::IDENTITY);
        let painted: Vec<Color> = ghost
            .commands()
            .iter()
            .filter_map(|c| match c {
                SurfaceCommand::FillPath { color, .. } => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(painted, vec![color]);
    }

    #[test]
    fn test_hidden_nodes_skip_both_passes() {
        let (mut scene, a, _) = resolved_scene();
        scene.set(a, keys::INTERACTIVE, true).unwrap();
        scene.set(a, keys::VISIBLE, false).unwrap();
        scene.assign_ghost_ids();
        let mut surface = RecordingSurface::new(100, 100);
        scene.paint(&mut surface, PaintTarget::Layer(BASE_LAYER), Affine2D::IDENTITY);
        scene.paint(&mut surface, PaintTarget::Ghost, Affine2D::IDENTITY);
        assert_eq!(fills(&surface), 0);
    }
}
