//! Ghost colors for hit testing
//!
//! Every interactive node is painted a second time onto an off-screen
//! surface in a flat color unique to that node. Hit testing then reads one
//! pixel and maps its color back to the node.
//!
//! Ids are spread over the color cube by interleaving their bits across the
//! three channels, most significant channel bit first: bit `i` of the id
//! lands in channel `i % 3` at bit `7 - i / 3`, so consecutive ids differ in
//! the high bits of different channels. Id 0 maps to black, which means
//! "nothing".

use rustc_hash::FxHashMap;
use strata_core::Color;
use tracing::trace;

use crate::node::NodeId;

/// Largest id the 24-bit color space can hold
pub const MAX_GHOST_ID: u32 = (1 << 24) - 1;

/// Map a ghost id to its flat color
pub fn id_to_color(id: u32) -> Color {
    let [r, g, b] = id_to_rgb(id);
    Color::from_rgb8(r, g, b)
}

fn id_to_rgb(id: u32) -> [u8; 3] {
    let mut rgb = [0u8; 3];
    for i in 0..24 {
        if id & (1 << i) != 0 {
            rgb[i % 3] |= 1 << (7 - i / 3);
        }
    }
    rgb
}

/// Inverse of [`id_to_color`] on raw channel bytes
pub fn rgb_to_id(rgb: [u8; 3]) -> u32 {
    let mut id = 0u32;
    for i in 0..24 {
        if rgb[i % 3] & (1 << (7 - i / 3)) != 0 {
            id |= 1 << i;
        }
    }
    id
}

/// Bijective id <-> node mapping for live interactive nodes
#[derive(Debug)]
pub struct GhostRegistry {
    nodes: FxHashMap<u32, NodeId>,
    ids: FxHashMap<NodeId, u32>,
    /// Released ids, reused lowest first
    free: Vec<u32>,
    next: u32,
}

impl Default for GhostRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GhostRegistry {
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            ids: FxHashMap::default(),
            free: Vec::new(),
            next: 1,
        }
    }

    /// Id of `node`, allocating one on first use
    ///
    /// Returns `None` only when all 2^24 - 1 colors are taken.
    pub fn paint_id(&mut self, node: NodeId) -> Option<u32> {
        if let Some(&id) = self.ids.get(&node) {
            return Some(id);
        }
        let id = match self.free.pop() {
            Some(id) => id,
            None if self.next <= MAX_GHOST_ID => {
                self.next += 1;
                self.next - 1
            }
            None => return None,
        };
        trace!(?node, id, "ghost id allocated");
        self.ids.insert(node, id);
        self.nodes.insert(id, node);
        Some(id)
    }

    pub fn id_of(&self, node: NodeId) -> Option<u32> {
        self.ids.get(&node).copied()
    }

    pub fn color_of(&self, node: NodeId) -> Option<Color> {
        self.id_of(node).map(id_to_color)
    }

    /// Node painted with the given pixel color, `None` for black or unknown
    pub fn node_at_rgb(&self, rgb: [u8; 3]) -> Option<NodeId> {
        match rgb_to_id(rgb) {
            0 => None,
            id => self.nodes.get(&id).copied(),
        }
    }

    /// Reclaim the slot of a disposed node
    pub fn release(&mut self, node: NodeId) -> bool {
        let Some(id) = self.ids.remove(&node) else {
            return false;
        };
        self.nodes.remove(&id);
        self.free.push(id);
        self.free.sort_unstable_by(|a, b| b.cmp(a));
        trace!(?node, id, "ghost id released");
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;
    use slotmap::SlotMap;

    fn node_ids(n: usize) -> Vec<NodeId> {
        let mut map = SlotMap::<NodeId, ()>::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_distribution() {
        assert_eq!(id_to_rgb(0), [0, 0, 0]);
        assert_eq!(id_to_rgb(1), [128, 0, 0]);
        assert_eq!(id_to_rgb(2), [0, 128, 0]);
        assert_eq!(id_to_rgb(4), [0, 0, 128]);
        assert_eq!(id_to_rgb(8), [64, 0, 0]);
        assert_eq!(id_to_rgb(MAX_GHOST_ID), [255, 255, 255]);
    }

    #[test]
    fn test_color_round_trip() {
        for id in [1, 2, 3, 77, 4096, 65_535, MAX_GHOST_ID] {
            let [r, g, b, _] = id_to_color(id).to_rgba8();
            assert_eq!(rgb_to_id([r, g, b]), id);
        }
    }

    #[test]
    fn test_unique_colors_never_black() {
        let mut registry = GhostRegistry::new();
        let nodes = node_ids(500);
        let mut colors = FxHashSet::default();
        for &node in &nodes {
            registry.paint_id(node).unwrap();
            let rgba = registry.color_of(node).unwrap().to_rgba8();
            assert_ne!(&rgba[..3], &[0, 0, 0]);
            assert!(colors.insert(rgba));
        }
        assert_eq!(registry.paint_id(nodes[3]), registry.id_of(nodes[3]));
        assert_eq!(registry.len(), 500);
    }

    #[test]
    fn test_lookup_and_reuse() {
        let mut registry = GhostRegistry::new();
        let nodes = node_ids(3);
        let a = registry.paint_id(nodes[0]).unwrap();
        let b = registry.paint_id(nodes[1]).unwrap();
        let [r, g, bl, _] = id_to_color(b).to_rgba8();
        assert_eq!(registry.node_at_rgb([r, g, bl]), Some(nodes[1]));
        assert_eq!(registry.node_at_rgb([0, 0, 0]), None);

        assert!(registry.release(nodes[0]));
        assert!(!registry.release(nodes[0]));
        let [r, g, bl, _] = id_to_color(a).to_rgba8();
        assert_eq!(registry.node_at_rgb([r, g, bl]), None);

        let c = registry.paint_id(nodes[2]).unwrap();
        assert_eq!(c, a);
        assert_ne!(registry.id_of(nodes[2]), registry.id_of(nodes[1]));
    }
}
