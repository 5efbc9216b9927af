//! Frame scheduler
//!
//! [`Root`] owns a [`Scene`] plus everything needed to turn it into pixels:
//! the layer stack, the ghost surface, running animations and per-frame
//! callbacks. The host drives it by calling [`Root::tick`] once per display
//! refresh (or from [`Root::run_until_idle`] / [`Root::run_fixed_rate`]);
//! a tick returns whether another frame is needed.
//!
//! Each tick runs, in order: size sensor, frame callbacks, deferred
//! callbacks, animations, parents and settings (repeated until no container
//! asks for relayout), bounds, positions, layer repaint, ghost repaint,
//! compositing and finally event delivery.
//!
//! # Example
//!
//! ```rust
//! use strata_scene::{Root, RootConfig, Shape};
//!
//! let mut root = Root::new(RootConfig::new(100, 100)).unwrap();
//! let rect = root.create_graphics(Shape::Rectangle);
//! root.set(rect, "width", 40.0).unwrap();
//! root.set(rect, "height", 20.0).unwrap();
//! root.set(rect, "fill", "#ff0000").unwrap();
//! let parent = root.root();
//! root.add_child(parent, rect).unwrap();
//!
//! assert!(!root.tick(0.0));
//! assert_eq!(root.output_pixel(10, 10), Some([255, 0, 0, 255]));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::hash::BuildHasherDefault;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHasher};
use strata_animation::{Animation, AnimationId, AnimationSet, Clock, Easing};
use strata_core::{Affine2D, Color, Size, Value};
use strata_paint::{PixmapSurfaceFactory, Surface, SurfaceFactory};
use strata_text::{FontLibrary, TextMeasurer};
use tracing::{debug, trace, warn};

use crate::config::RootConfig;
use crate::error::Result;
use crate::events::NodeEvent;
use crate::interaction::PointerState;
use crate::keys;
use crate::layers::{LayerManager, BASE_LAYER};
use crate::node::NodeId;
use crate::render::PaintTarget;
use crate::scene::{Scene, TextDefaults};

pub(crate) type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

// =============================================================================
// Dirty state
// =============================================================================

/// The four per-frame work queues
///
/// Each is an insertion-ordered set, so queuing a node twice before it is
/// resolved has no further effect.
#[derive(Debug, Default)]
pub struct DirtyQueues {
    /// Settings changed since the last tick
    pub(crate) settings: FxIndexSet<NodeId>,
    /// Containers whose children were added, removed or resized
    pub(crate) parents: FxIndexSet<NodeId>,
    pub(crate) bounds: FxIndexSet<NodeId>,
    pub(crate) positions: FxIndexSet<NodeId>,
}

impl DirtyQueues {
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty() && self.parents.is_empty() && self.bounds.is_empty() && self.positions.is_empty()
    }

    /// Total queued entries across all four queues
    pub fn pending(&self) -> usize {
        self.settings.len() + self.parents.len() + self.bounds.len() + self.positions.len()
    }

    pub fn is_queued(&self, id: NodeId) -> bool {
        self.settings.contains(&id)
            || self.parents.contains(&id)
            || self.bounds.contains(&id)
            || self.positions.contains(&id)
    }

    pub(crate) fn remove(&mut self, id: NodeId) {
        self.settings.shift_remove(&id);
        self.parents.shift_remove(&id);
        self.bounds.shift_remove(&id);
        self.positions.shift_remove(&id);
    }

    pub(crate) fn clear(&mut self) {
        self.settings.clear();
        self.parents.clear();
        self.bounds.clear();
        self.positions.clear();
    }
}

/// Layers that must be repainted this frame
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Damage {
    pub(crate) layers: BTreeSet<i32>,
    /// Every layer, e.g. after a resize or a layer assignment change
    pub(crate) all: bool,
    /// Ghost surface only, e.g. a node became interactive
    pub(crate) ghost: bool,
}

impl Damage {
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty() && !self.all && !self.ghost
    }

    pub fn clear(&mut self) {
        *self = Damage::default();
    }
}

/// Work done by the last tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub settings_resolved: usize,
    pub parents_resolved: usize,
    pub layouts_run: usize,
    pub bounds_resolved: usize,
    pub positions_resolved: usize,
    pub layers_painted: usize,
    pub ghost_painted: bool,
    pub events_delivered: usize,
}

/// Scheduler state as seen from outside a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Nothing to do until something changes
    Idle,
    /// Work is pending for the next tick
    Scheduled,
    /// Inside a tick
    Resolving,
    /// Ticks are ignored; queued work is kept
    Paused,
}

// =============================================================================
// Size sensor
// =============================================================================

/// Polls the host for its size once per tick
///
/// Used where the host cannot push resize notifications.
pub struct SizeSensor {
    probe: Box<dyn Fn() -> (u32, u32)>,
    last: (u32, u32),
}

impl SizeSensor {
    pub fn new<F>(probe: F) -> Self
    where
        F: Fn() -> (u32, u32) + 'static,
    {
        let last = probe();
        Self {
            probe: Box::new(probe),
            last,
        }
    }

    /// New size if it changed since the last poll
    fn poll(&mut self) -> Option<(u32, u32)> {
        let size = (self.probe)();
        if size == self.last {
            return None;
        }
        self.last = size;
        Some(size)
    }
}

impl std::fmt::Debug for SizeSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizeSensor").field("last", &self.last).finish_non_exhaustive()
    }
}

// =============================================================================
// Root
// =============================================================================

type FrameCallback = Box<dyn FnMut(&mut Scene, f64) -> bool>;
type SceneCallback = Box<dyn FnOnce(&mut Scene)>;

/// The scene plus its renderer and frame loop
///
/// Dereferences to [`Scene`] for building and mutating the graph.
pub struct Root {
    pub(crate) scene: Scene,
    pub(crate) config: RootConfig,
    layers: LayerManager,
    output: Box<dyn Surface>,
    pub(crate) ghost: Option<Box<dyn Surface>>,
    /// Copy of the ghost pixels taken by the first hit test of a frame
    pub(crate) hit_snapshot: Option<Vec<u8>>,
    background: Color,
    animations: AnimationSet<NodeId>,
    finish_callbacks: FxHashMap<AnimationId, Vec<SceneCallback>>,
    frame_callbacks: Vec<FrameCallback>,
    deferred: Vec<SceneCallback>,
    paused: bool,
    resolving: bool,
    last_tick: Option<f64>,
    /// Time of the last tick
    pub(crate) now: f64,
    pub(crate) pointer: PointerState,
    sensor: Option<SizeSensor>,
    event_log: Option<Vec<NodeEvent>>,
    last_frame: FrameStats,
    frames: u64,
}

impl Deref for Root {
    type Target = Scene;

    fn deref(&self) -> &Scene {
        &self.scene
    }
}

impl DerefMut for Root {
    fn deref_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }
}

impl std::fmt::Debug for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Root")
            .field("scene", &self.scene)
            .field("config", &self.config)
            .field("layers", &self.layers)
            .field("animations", &self.animations.len())
            .field("paused", &self.paused)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl Root {
    /// Create a root rendering with tiny-skia and no registered fonts
    pub fn new(config: RootConfig) -> Result<Self> {
        Self::with_fonts(config, FontLibrary::new())
    }

    /// Create a root whose text is measured and drawn with `fonts`
    pub fn with_fonts(config: RootConfig, fonts: FontLibrary) -> Result<Self> {
        let fonts = Arc::new(fonts);
        let factory = PixmapSurfaceFactory::new(Arc::clone(&fonts));
        Self::with_factory(config, Box::new(factory), fonts)
    }

    /// Create a root on a custom surface backend
    pub fn with_factory(
        config: RootConfig,
        factory: Box<dyn SurfaceFactory>,
        measurer: Arc<dyn TextMeasurer>,
    ) -> Result<Self> {
        config.validate()?;
        let background = config.background_color()?;
        let (device_width, device_height) = config.device_size();
        let output = factory.create(device_width, device_height)?;
        let ghost = if config.interaction.ghost_enabled {
            match factory.create(device_width, device_height) {
                Ok(surface) => Some(surface),
                Err(err) => {
                    warn!(%err, "ghost surface unavailable, hit testing falls back to bounds");
                    None
                }
            }
        } else {
            None
        };

        let mut scene = Scene::with_measurer(Size::new(config.width as f32, config.height as f32), measurer);
        scene.text_defaults = TextDefaults::from_config(&config.text)?;
        let layers = LayerManager::new(factory, config.width, config.height, config.pixel_ratio);
        debug!(width = config.width, height = config.height, ratio = config.pixel_ratio, "root created");

        Ok(Self {
            scene,
            config,
            layers,
            output,
            ghost,
            hit_snapshot: None,
            background,
            animations: AnimationSet::new(),
            finish_callbacks: FxHashMap::default(),
            frame_callbacks: Vec::new(),
            deferred: Vec::new(),
            paused: false,
            resolving: false,
            last_tick: None,
            now: 0.0,
            pointer: PointerState::default(),
            sensor: None,
            event_log: None,
            last_frame: FrameStats::default(),
            frames: 0,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn config(&self) -> &RootConfig {
        &self.config
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut LayerManager {
        &mut self.layers
    }

    /// Composited output
    pub fn output(&self) -> &dyn Surface {
        &*self.output
    }

    /// Straight-alpha RGBA of one output pixel, in device pixels
    pub fn output_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.output.read_pixel(x, y)
    }

    pub fn ghost_surface(&self) -> Option<&dyn Surface> {
        self.ghost.as_deref()
    }

    /// Stats of the most recent tick
    pub fn last_frame(&self) -> FrameStats {
        self.last_frame
    }

    /// Number of ticks run so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Time passed to the most recent tick
    pub fn now(&self) -> f64 {
        self.now
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn state(&self) -> SchedulerState {
        if self.paused {
            SchedulerState::Paused
        } else if self.resolving {
            SchedulerState::Resolving
        } else if self.needs_frame() {
            SchedulerState::Scheduled
        } else {
            SchedulerState::Idle
        }
    }

    /// Whether the next tick has work to do
    pub fn needs_frame(&self) -> bool {
        !self.scene.queues.is_empty()
            || !self.scene.damage.is_empty()
            || !self.scene.outbox.is_empty()
            || self.animations.has_active()
            || !self.frame_callbacks.is_empty()
            || !self.deferred.is_empty()
    }

    /// Stop processing ticks; queued work is kept
    pub fn pause(&mut self) {
        if !self.paused {
            debug!("scheduler paused");
            self.paused = true;
        }
    }

    /// Resume ticking; time spent paused does not advance animations
    pub fn resume(&mut self) {
        if self.paused {
            debug!("scheduler resumed");
            self.paused = false;
            self.last_tick = None;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Run one frame at time `now_ms`; returns whether another frame is needed
    pub fn tick(&mut self, now_ms: f64) -> bool {
        if self.paused {
            return false;
        }
        let dt = self.last_tick.map_or(0.0, |last| (now_ms - last).max(0.0));
        self.last_tick = Some(now_ms);
        self.now = now_ms;
        self.resolving = true;
        self.scene.stats = FrameStats::default();

        self.poll_sensor();
        self.run_frame_callbacks(now_ms);
        self.run_deferred();
        self.advance_animations(dt);

        loop {
            self.scene.resolve_parents();
            self.scene.resolve_settings();
            if self.scene.queues.parents.is_empty() {
                break;
            }
        }
        self.scene.resolve_bounds();
        self.scene.resolve_positions();
        self.render();
        self.hit_snapshot = None;
        self.deliver_events();

        self.resolving = false;
        self.frames += 1;
        self.last_frame = self.scene.stats;
        let more = self.needs_frame();
        trace!(frame = self.frames, dt, more, stats = ?self.last_frame, "tick");
        more
    }

    /// Tick with `clock` until idle or `max_ticks` ran; returns the ticks run
    ///
    /// Does not sleep, so a manual clock must be advanced by the caller or
    /// by frame callbacks.
    pub fn run_until_idle(&mut self, clock: &dyn Clock, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks {
            ticks += 1;
            if !self.tick(clock.now_ms()) {
                break;
            }
        }
        ticks
    }

    /// Fixed-rate fallback loop: tick at the configured fps until idle
    pub fn run_fixed_rate(&mut self, clock: &dyn Clock, max_ticks: usize) -> usize {
        let interval = Duration::from_secs_f64(self.config.frame_interval_ms() / 1000.0);
        let mut ticks = 0;
        while ticks < max_ticks {
            let started = Instant::now();
            ticks += 1;
            if !self.tick(clock.now_ms()) {
                break;
            }
            if let Some(rest) = interval.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        ticks
    }

    fn poll_sensor(&mut self) {
        let Some((width, height)) = self.sensor.as_mut().and_then(SizeSensor::poll) else {
            return;
        };
        if let Err(err) = self.resize(width, height) {
            warn!(%err, width, height, "resize from size sensor failed");
        }
    }

    fn run_frame_callbacks(&mut self, now_ms: f64) {
        if self.frame_callbacks.is_empty() {
            return;
        }
        let mut callbacks = std::mem::take(&mut self.frame_callbacks);
        callbacks.retain_mut(|callback| callback(&mut self.scene, now_ms));
        // Callbacks registered while running go after the survivors
        callbacks.append(&mut self.frame_callbacks);
        self.frame_callbacks = callbacks;
    }

    fn run_deferred(&mut self) {
        for callback in std::mem::take(&mut self.deferred) {
            callback(&mut self.scene);
        }
    }

    fn advance_animations(&mut self, dt: f64) {
        if self.animations.is_empty() {
            return;
        }
        for step in self.animations.tick(dt as f32) {
            if !step.finished {
                self.scene.set_animated(step.owner, &step.key, step.value);
                continue;
            }
            if let Err(err) = self.scene.set(step.owner, &step.key, step.value) {
                warn!(%err, key = %step.key, "final animation value rejected");
            }
            for callback in self.finish_callbacks.remove(&step.id).unwrap_or_default() {
                callback(&mut self.scene);
            }
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Layers in use (order -> margin); the base layer always exists
    fn wanted_layers(&self) -> BTreeMap<i32, u32> {
        let mut wanted = BTreeMap::from([(BASE_LAYER, 0)]);
        for id in self.scene.subtree(self.scene.root()) {
            let Ok(node) = self.scene.node(id) else { continue };
            if let Some(order) = node.layer() {
                let margin = node.settings.get_number(keys::LAYER_MARGIN, 0.0).max(0.0) as u32;
                let entry = wanted.entry(order).or_insert(0);
                *entry = (*entry).max(margin);
            }
        }
        wanted
    }

    fn render(&mut self) {
        let damage = std::mem::take(&mut self.scene.damage);
        // A layered subtree attached after the last sync names a layer with no surface yet
        let unallocated = damage.layers.iter().any(|order| self.layers.get(*order).is_none());
        if damage.all || unallocated {
            let wanted = self.wanted_layers();
            if let Err(err) = self.layers.sync(&wanted) {
                warn!(%err, "layer surface allocation failed");
            }
            self.layers.mark_all_dirty();
        } else {
            for order in &damage.layers {
                self.layers.mark_dirty(*order);
            }
        }

        let ratio = self.config.pixel_ratio;
        let dirty = self.layers.dirty_layers();
        for &order in &dirty {
            let Some(layer) = self.layers.get_mut(order) else { continue };
            let base = layer.base_transform(ratio);
            let surface = layer.surface_mut();
            surface.clear(Color::TRANSPARENT);
            self.scene.paint(surface, PaintTarget::Layer(order), base);
            layer.mark_clean();
            self.scene.stats.layers_painted += 1;
            debug!(order, "layer repainted");
        }

        if self.config.interaction.ghost_enabled && (!dirty.is_empty() || damage.ghost) {
            self.scene.assign_ghost_ids();
            if let Some(ghost) = self.ghost.as_mut() {
                ghost.clear(Color::TRANSPARENT);
                self.scene
                    .paint(&mut **ghost, PaintTarget::Ghost, Affine2D::scale(ratio, ratio));
                self.scene.stats.ghost_painted = true;
            }
        }

        if !dirty.is_empty() {
            self.layers.composite(&mut *self.output, self.background);
        }
    }

    fn deliver_events(&mut self) {
        let events = std::mem::take(&mut self.scene.outbox);
        for event in &events {
            self.scene.stats.events_delivered += self.scene.deliver(event);
        }
        if let Some(log) = self.event_log.as_mut() {
            log.extend(events);
        }
    }

    /// Deliver an input event to its target, then bubble it through the ancestors
    pub(crate) fn dispatch_bubbling(&mut self, event: NodeEvent) {
        let chain = self.scene.ancestors(event.target);
        for current in chain {
            let Ok(node) = self.scene.node(current) else { continue };
            let mut local = event.clone();
            local.current = current;
            local.point = node.world_transform.transform_point_inverse(event.global);
            self.scene.deliver(&local);
            self.log_event(local);
        }
    }

    pub(crate) fn log_event(&mut self, event: NodeEvent) {
        if let Some(log) = self.event_log.as_mut() {
            log.push(event);
        }
    }

    // =========================================================================
    // Animation
    // =========================================================================

    /// Interpolate a setting from its current value to `to`
    ///
    /// The target is validated like [`Scene::set`]. A setting with no value
    /// yet jumps straight to the target when the animation finishes.
    pub fn animate(
        &mut self,
        id: NodeId,
        key: &str,
        to: impl Into<Value>,
        duration_ms: f32,
        easing: Easing,
    ) -> Result<AnimationId> {
        let to = to.into();
        self.scene.validate(id, key, &to)?;
        let from = self.scene.get(id, key).cloned().unwrap_or_else(|| to.clone());
        let animation = Animation::new(key, from, to, duration_ms)
            .easing(easing)
            .color_space(self.config.color_space);
        Ok(self.animations.start(id, animation))
    }

    /// Stop an animation, keeping the value it reached
    pub fn stop_animation(&mut self, id: AnimationId) -> bool {
        self.finish_callbacks.remove(&id);
        self.animations.stop(id).is_some()
    }

    pub fn is_animating(&self, id: NodeId, key: &str) -> bool {
        self.animations.is_animating(id, key)
    }

    pub fn animation_running(&self, id: AnimationId) -> bool {
        self.animations.contains(id)
    }

    pub fn has_animations(&self) -> bool {
        self.animations.has_active()
    }

    /// Run `callback` after the animation writes its final value
    ///
    /// Returns false if the animation is not running; the callback is dropped.
    pub fn when_finished<F>(&mut self, id: AnimationId, callback: F) -> bool
    where
        F: FnOnce(&mut Scene) + 'static,
    {
        if !self.animations.contains(id) {
            return false;
        }
        self.finish_callbacks.entry(id).or_default().push(Box::new(callback));
        true
    }

    // =========================================================================
    // Callbacks
    // =========================================================================

    /// Run `callback` once at the start of the next tick
    pub fn defer<F>(&mut self, callback: F)
    where
        F: FnOnce(&mut Scene) + 'static,
    {
        self.deferred.push(Box::new(callback));
    }

    /// Run `callback` at the start of every tick while it returns true
    pub fn on_frame<F>(&mut self, callback: F)
    where
        F: FnMut(&mut Scene, f64) -> bool + 'static,
    {
        self.frame_callbacks.push(Box::new(callback));
    }

    // =========================================================================
    // Size
    // =========================================================================

    /// Resize the viewport and every surface
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == self.config.width && height == self.config.height {
            return Ok(());
        }
        let mut config = self.config.clone();
        config.width = width;
        config.height = height;
        config.validate()?;
        let (device_width, device_height) = config.device_size();
        self.layers.resize(width, height, config.pixel_ratio)?;
        self.output.resize(device_width, device_height)?;
        if let Some(ghost) = self.ghost.as_mut() {
            ghost.resize(device_width, device_height)?;
        }
        self.config = config;
        self.scene.resize(Size::new(width as f32, height as f32));
        self.hit_snapshot = None;
        debug!(width, height, "root resized");
        Ok(())
    }

    /// Poll the host size every tick instead of waiting for `resize` calls
    pub fn watch_size(&mut self, sensor: SizeSensor) {
        warn!("no resize notifications from the host, polling its size every frame");
        self.sensor = Some(sensor);
    }

    // =========================================================================
    // Disposal and events
    // =========================================================================

    /// Dispose a node, its subtree, their animations and pointer state
    pub fn dispose(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        let removed = self.scene.dispose(id)?;
        for &node in &removed {
            self.animations.remove_owner(node);
        }
        self.finish_callbacks.retain(|anim, _| self.animations.contains(*anim));
        self.pointer.forget(&removed);
        Ok(removed)
    }

    /// Keep a copy of every delivered event for [`drain_events`](Self::drain_events)
    pub fn enable_event_log(&mut self) {
        self.event_log.get_or_insert_with(Vec::new);
    }

    /// Events delivered since the last drain, in delivery order
    pub fn drain_events(&mut self) -> Vec<NodeEvent> {
        self.event_log.as_mut().map(std::mem::take).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;
    use std::cell::Cell;
    use std::rc::Rc;
    use strata_animation::ManualClock;
    use strata_core::{Length, Percent};

    fn root() -> Root {
        Root::new(RootConfig::new(100, 100)).unwrap()
    }

    fn red_rect(root: &mut Root) -> NodeId {
        let rect = root.create_graphics(Shape::Rectangle);
        root.set(rect, keys::WIDTH, 20.0).unwrap();
        root.set(rect, keys::HEIGHT, 20.0).unwrap();
        root.set(rect, keys::FILL, Color::RED).unwrap();
        let parent = root.root();
        root.add_child(parent, rect).unwrap();
        rect
    }

    #[test]
    fn test_tick_reaches_idle() {
        let mut root = root();
        red_rect(&mut root);
        assert_eq!(root.state(), SchedulerState::Scheduled);
        assert!(!root.tick(0.0));
        assert_eq!(root.state(), SchedulerState::Idle);
        assert_eq!(root.output_pixel(5, 5), Some([255, 0, 0, 255]));
        assert!(root.last_frame().layers_painted >= 1);

        // Nothing changed: nothing is repainted
        assert!(!root.tick(16.0));
        assert_eq!(root.last_frame(), FrameStats::default());
    }

    #[test]
    fn test_same_value_twice_resolves_once() {
        let mut root = root();
        let rect = red_rect(&mut root);
        root.tick(0.0);
        root.set(rect, keys::X, 10.0).unwrap();
        root.set(rect, keys::X, 10.0).unwrap();
        root.tick(16.0);
        assert_eq!(root.last_frame().settings_resolved, 1);
    }

    #[test]
    fn test_layer_allocated_when_subtree_attached_later() {
        let mut root = root();
        let rect = root.create_graphics(Shape::Rectangle);
        root.set(rect, keys::WIDTH, 50.0).unwrap();
        root.set(rect, keys::HEIGHT, 50.0).unwrap();
        root.set(rect, keys::FILL, Color::RED).unwrap();
        root.set(rect, keys::LAYER, 1).unwrap();
        root.tick(0.0);
        assert_eq!(root.layers().orders(), vec![BASE_LAYER]);

        let top = root.root();
        root.add_child(top, rect).unwrap();
        root.tick(16.0);
        assert_eq!(root.layers().orders(), vec![BASE_LAYER, 1]);
        assert_eq!(root.output_pixel(25, 25), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_percent_text_animates_linearly() {
        let mut root = root();
        let rect = red_rect(&mut root);
        root.set(rect, keys::WIDTH, "10%").unwrap();
        root.animate(rect, keys::WIDTH, "50%", 1000.0, Easing::Linear).unwrap();
        root.tick(0.0);
        root.tick(500.0);
        assert_eq!(root.get(rect, keys::WIDTH), Some(&Value::Percent(Percent(30.0))));
        root.tick(1000.0);
        let width = root.get(rect, keys::WIDTH).and_then(Value::as_length);
        assert_eq!(width, Some(Length::Percent(Percent(50.0))));
    }

    #[test]
    fn test_pause_keeps_work() {
        let mut root = root();
        let rect = red_rect(&mut root);
        root.tick(0.0);
        root.pause();
        root.set(rect, keys::X, 50.0).unwrap();
        assert!(!root.tick(16.0));
        assert_eq!(root.state(), SchedulerState::Paused);
        assert_eq!(root.node(rect).unwrap().world_position().x, 0.0);

        root.resume();
        assert_eq!(root.state(), SchedulerState::Scheduled);
        root.tick(5000.0);
        assert_eq!(root.node(rect).unwrap().world_position().x, 50.0);
    }

    #[test]
    fn test_animation_samples_injected_time() {
        let mut root = root();
        let rect = red_rect(&mut root);
        root.set(rect, keys::X, 0.0).unwrap();
        let anim = root.animate(rect, keys::X, 100.0, 1000.0, Easing::Linear).unwrap();

        assert!(root.tick(0.0));
        assert!(root.tick(500.0));
        let x = root.get(rect, keys::X).and_then(Value::as_number).unwrap();
        assert!((x - 50.0).abs() < 1e-3);
        assert!(root.animation_running(anim));

        root.tick(1000.0);
        assert_eq!(root.get(rect, keys::X), Some(&Value::Number(100.0)));
        assert!(!root.animation_running(anim));
        assert!(!root.tick(1016.0));
    }

    #[test]
    fn test_animation_target_validated() {
        let mut root = root();
        let rect = red_rect(&mut root);
        assert!(root.animate(rect, keys::FILL, "chartreuse-ish", 100.0, Easing::Linear).is_err());
        assert!(!root.has_animations());
    }

    #[test]
    fn test_when_finished_runs_once() {
        let mut root = root();
        let rect = red_rect(&mut root);
        let anim = root.animate(rect, keys::OPACITY, 0.0, 100.0, Easing::Linear).unwrap();
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        assert!(root.when_finished(anim, move |scene| {
            seen.set(seen.get() + 1);
            scene.set(rect, keys::VISIBLE, false).unwrap();
        }));
        root.tick(0.0);
        root.tick(200.0);
        root.tick(300.0);
        assert_eq!(hits.get(), 1);
        assert!(!root.node(rect).unwrap().is_visible());
    }

    #[test]
    fn test_frame_callbacks_and_deferred() {
        let mut root = root();
        let count = Rc::new(Cell::new(0));
        let frames = Rc::clone(&count);
        root.on_frame(move |_, _| {
            frames.set(frames.get() + 1);
            frames.get() < 3
        });
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        root.defer(move |_| flag.set(true));

        let clock = ManualClock::new(0.0);
        let ticks = root.run_until_idle(&clock, 10);
        assert_eq!(count.get(), 3);
        assert!(ran.get());
        assert_eq!(ticks, 3);
    }

    #[test]
    fn test_dispose_stops_animations() {
        let mut root = root();
        let rect = red_rect(&mut root);
        root.animate(rect, keys::X, 10.0, 100.0, Easing::Linear).unwrap();
        root.dispose(rect).unwrap();
        assert!(!root.has_animations());
        root.tick(0.0);
        root.tick(50.0);
        assert!(!root.contains(rect));
    }

    #[test]
    fn test_resize_repaints_everything() {
        let mut root = root();
        red_rect(&mut root);
        root.tick(0.0);
        root.resize(50, 40).unwrap();
        assert_eq!(root.output().width(), 50);
        assert!(!root.tick(16.0));
        assert_eq!(root.output_pixel(5, 5), Some([255, 0, 0, 255]));
        assert_eq!(root.size(), Size::new(50.0, 40.0));
    }

    #[test]
    fn test_size_sensor_polls() {
        let mut root = root();
        let size = Rc::new(Cell::new((100u32, 100u32)));
        let probe = Rc::clone(&size);
        root.watch_size(SizeSensor::new(move || probe.get()));
        root.tick(0.0);
        size.set((80, 60));
        root.tick(16.0);
        assert_eq!(root.config().width, 80);
        assert_eq!(root.output().height(), 60);
    }
}
