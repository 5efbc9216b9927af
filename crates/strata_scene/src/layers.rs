//! Layer manager
//!
//! Every distinct effective `layer` value in the scene gets its own surface.
//! Layers are repainted independently when something on them changes and
//! composited bottom to top into the output surface. A layer with a margin
//! is allocated larger than the viewport so content just outside the edges
//! (shadows, overhanging strokes) survives until composited.

use std::collections::BTreeMap;

use strata_core::{Affine2D, Color};
use strata_paint::{Surface, SurfaceFactory};
use tracing::debug;

use crate::config::scale_dimension;
use crate::error::{Result, SceneError};

/// Layer every node without an explicit `layer` paints on
pub const BASE_LAYER: i32 = 0;

/// One paint surface in the stack
pub struct Layer {
    order: i32,
    /// Logical pixels of overdraw on every side
    margin: u32,
    surface: Box<dyn Surface>,
    dirty: bool,
    visible: bool,
}

impl Layer {
    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn surface(&self) -> &dyn Surface {
        &*self.surface
    }

    pub(crate) fn surface_mut(&mut self) -> &mut dyn Surface {
        &mut *self.surface
    }

    /// Transform from root coordinates to this layer's device pixels
    pub fn base_transform(&self, pixel_ratio: f32) -> Affine2D {
        let offset = self.margin as f32 * pixel_ratio;
        Affine2D::translation(offset, offset).then(&Affine2D::scale(pixel_ratio, pixel_ratio))
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("order", &self.order)
            .field("margin", &self.margin)
            .field("size", &(self.surface.width(), self.surface.height()))
            .field("dirty", &self.dirty)
            .field("visible", &self.visible)
            .finish()
    }
}

/// Z-ordered layer surfaces
pub struct LayerManager {
    layers: BTreeMap<i32, Layer>,
    factory: Box<dyn SurfaceFactory>,
    width: u32,
    height: u32,
    pixel_ratio: f32,
}

impl LayerManager {
    pub fn new(factory: Box<dyn SurfaceFactory>, width: u32, height: u32, pixel_ratio: f32) -> Self {
        Self {
            layers: BTreeMap::new(),
            factory,
            width,
            height,
            pixel_ratio,
        }
    }

    pub fn factory(&self) -> &dyn SurfaceFactory {
        &*self.factory
    }

    /// Make the layer set match `wanted` (order -> margin)
    ///
    /// New layers and layers whose margin changed get fresh, dirty
    /// surfaces; layers no node uses any more are dropped.
    pub fn sync(&mut self, wanted: &BTreeMap<i32, u32>) -> Result<()> {
        self.layers.retain(|order, _| wanted.contains_key(order));
        for (&order, &margin) in wanted {
            if self.layers.get(&order).is_some_and(|l| l.margin == margin) {
                continue;
            }
            let surface = self.allocate(margin)?;
            let visible = self.layers.get(&order).map_or(true, |l| l.visible);
            debug!(order, margin, "layer allocated");
            self.layers.insert(
                order,
                Layer {
                    order,
                    margin,
                    surface,
                    dirty: true,
                    visible,
                },
            );
        }
        Ok(())
    }

    fn allocate(&self, margin: u32) -> Result<Box<dyn Surface>> {
        let (width, height) = self.device_size(margin);
        Ok(self.factory.create(width, height)?)
    }

    fn device_size(&self, margin: u32) -> (u32, u32) {
        (
            scale_dimension(self.width + 2 * margin, self.pixel_ratio),
            scale_dimension(self.height + 2 * margin, self.pixel_ratio),
        )
    }

    pub fn mark_dirty(&mut self, order: i32) {
        if let Some(layer) = self.layers.get_mut(&order) {
            layer.dirty = true;
        }
    }

    pub fn mark_all_dirty(&mut self) {
        for layer in self.layers.values_mut() {
            layer.dirty = true;
        }
    }

    /// Orders of dirty layers, bottom first
    pub fn dirty_layers(&self) -> Vec<i32> {
        self.layers.values().filter(|l| l.dirty).map(|l| l.order).collect()
    }

    pub fn get(&self, order: i32) -> Option<&Layer> {
        self.layers.get(&order)
    }

    pub(crate) fn get_mut(&mut self, order: i32) -> Option<&mut Layer> {
        self.layers.get_mut(&order)
    }

    /// Show or hide a layer in the composite without repainting it
    pub fn set_visible(&mut self, order: i32, visible: bool) -> Result<()> {
        let layer = self.layers.get_mut(&order).ok_or(SceneError::UnknownLayer(order))?;
        layer.visible = visible;
        Ok(())
    }

    /// Reallocate every layer at the new viewport size
    pub fn resize(&mut self, width: u32, height: u32, pixel_ratio: f32) -> Result<()> {
        self.width = width;
        self.height = height;
        self.pixel_ratio = pixel_ratio;
        let orders: Vec<(i32, u32)> = self.layers.values().map(|l| (l.order, l.margin)).collect();
        for (order, margin) in orders {
            let (w, h) = self.device_size(margin);
            if let Some(layer) = self.layers.get_mut(&order) {
                layer.surface.resize(w, h)?;
                layer.dirty = true;
            }
        }
        Ok(())
    }

    /// Clear `output` to `background` and draw the visible layers onto it
    pub fn composite(&self, output: &mut dyn Surface, background: Color) {
        output.clear(background);
        for layer in self.layers.values().filter(|l| l.visible) {
            let offset = -(layer.margin as f32) * self.pixel_ratio;
            output.draw_surface(&*layer.surface, offset, offset, 1.0);
        }
    }

    /// Straight-alpha RGBA pixels of one layer, margin included
    pub fn export_rgba(&self, order: i32) -> Result<Vec<u8>> {
        let layer = self.layers.get(&order).ok_or(SceneError::UnknownLayer(order))?;
        let surface = &*layer.surface;
        let mut out = Vec::with_capacity((surface.width() * surface.height() * 4) as usize);
        for y in 0..surface.height() {
            for x in 0..surface.width() {
                out.extend_from_slice(&surface.read_pixel(x, y).unwrap_or([0; 4]));
            }
        }
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer orders, bottom first
    pub fn orders(&self) -> Vec<i32> {
        self.layers.keys().copied().collect()
    }
}

impl std::fmt::Debug for LayerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerManager")
            .field("layers", &self.layers)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixel_ratio", &self.pixel_ratio)
            .finish_non_exhaustive()
    }
}
