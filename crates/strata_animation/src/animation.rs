//! Timed setting animations
//!
//! An [`Animation`] interpolates one setting key of one owner from a
//! snapshotted start value to a target over a duration. The
//! [`AnimationSet`] holds every running animation and advances them by the
//! frame's elapsed time; the caller writes the produced values back through
//! the property store's raw setter and finalizes with a notifying `set`
//! when a step reports `finished`.

use slotmap::{new_key_type, SlotMap};
use strata_core::{ColorSpace, Value};
use tracing::debug;

use crate::easing::Easing;
use crate::values::interpolate_value;

new_key_type! {
    /// Handle to a running animation
    pub struct AnimationId;
}

/// Lifecycle of an animation record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationState {
    /// Waiting out its delay
    Pending,
    Running,
    /// Reached its target
    Finished,
    /// Stopped before completion
    Stopped,
}

/// One setting interpolation
#[derive(Clone, Debug)]
pub struct Animation {
    pub key: String,
    pub from: Value,
    pub to: Value,
    pub duration_ms: f32,
    pub delay_ms: f32,
    pub easing: Easing,
    pub color_space: ColorSpace,
    elapsed_ms: f32,
    state: AnimationState,
}

impl Animation {
    pub fn new(key: impl Into<String>, from: Value, to: Value, duration_ms: f32) -> Self {
        Self {
            key: key.into(),
            from,
            to,
            duration_ms: duration_ms.max(0.0),
            delay_ms: 0.0,
            easing: Easing::Linear,
            color_space: ColorSpace::Rgb,
            elapsed_ms: 0.0,
            state: AnimationState::Pending,
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn delay(mut self, delay_ms: f32) -> Self {
        self.delay_ms = delay_ms.max(0.0);
        self
    }

    pub fn color_space(mut self, space: ColorSpace) -> Self {
        self.color_space = space;
        self
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, AnimationState::Pending | AnimationState::Running)
    }

    /// Linear progress in `0.0..=1.0`, delay excluded
    pub fn progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            return if self.elapsed_ms >= self.delay_ms { 1.0 } else { 0.0 };
        }
        ((self.elapsed_ms - self.delay_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Interpolated value at the current progress
    pub fn value(&self) -> Value {
        let progress = self.progress();
        if progress >= 1.0 {
            return self.to.clone();
        }
        interpolate_value(&self.from, &self.to, self.easing.apply(progress), self.color_space)
    }

    /// Advance by `dt_ms`; returns the new value while the animation is active
    pub fn advance(&mut self, dt_ms: f32) -> Option<Value> {
        if !self.is_active() {
            return None;
        }
        self.elapsed_ms += dt_ms.max(0.0);
        if self.elapsed_ms < self.delay_ms {
            return None;
        }
        self.state = if self.progress() >= 1.0 {
            AnimationState::Finished
        } else {
            AnimationState::Running
        };
        Some(self.value())
    }

    /// Stop without touching values already written
    pub fn stop(&mut self) {
        if self.is_active() {
            self.state = AnimationState::Stopped;
        }
    }
}

/// Value produced for one animation during a tick
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationStep<O> {
    pub id: AnimationId,
    pub owner: O,
    pub key: String,
    pub value: Value,
    /// The animation reached its target and was removed
    pub finished: bool,
}

struct Entry<O> {
    owner: O,
    animation: Animation,
}

/// All running animations, keyed by owner
pub struct AnimationSet<O> {
    entries: SlotMap<AnimationId, Entry<O>>,
}

impl<O> Default for AnimationSet<O> {
    fn default() -> Self {
        Self {
            entries: SlotMap::with_key(),
        }
    }
}

impl<O: Copy + PartialEq + std::fmt::Debug> AnimationSet<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an animation, replacing any running one for the same owner and key
    pub fn start(&mut self, owner: O, animation: Animation) -> AnimationId {
        self.stop_key(owner, &animation.key);
        debug!(?owner, key = %animation.key, duration_ms = animation.duration_ms, "animation started");
        self.entries.insert(Entry { owner, animation })
    }

    pub fn get(&self, id: AnimationId) -> Option<&Animation> {
        self.entries.get(id).map(|e| &e.animation)
    }

    pub fn contains(&self, id: AnimationId) -> bool {
        self.entries.contains_key(id)
    }

    /// Stop and remove an animation; returns it if it was running
    pub fn stop(&mut self, id: AnimationId) -> Option<Animation> {
        let mut entry = self.entries.remove(id)?;
        entry.animation.stop();
        debug!(key = %entry.animation.key, "animation stopped");
        Some(entry.animation)
    }

    /// Stop the animation of `key` on `owner`, if any
    pub fn stop_key(&mut self, owner: O, key: &str) -> Option<Animation> {
        let id = self
            .entries
            .iter()
            .find(|(_, e)| e.owner == owner && e.animation.key == key)
            .map(|(id, _)| id)?;
        self.stop(id)
    }

    /// Remove every animation belonging to `owner`
    pub fn remove_owner(&mut self, owner: O) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.owner != owner);
        before - self.entries.len()
    }

    pub fn is_animating(&self, owner: O, key: &str) -> bool {
        self.entries
            .values()
            .any(|e| e.owner == owner && e.animation.key == key)
    }

    pub fn has_active(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advance everything by `dt_ms`, removing finished animations
    pub fn tick(&mut self, dt_ms: f32) -> Vec<AnimationStep<O>> {
        let mut steps = Vec::new();
        let mut finished = Vec::new();
        for (id, entry) in self.entries.iter_mut() {
            if let Some(value) = entry.animation.advance(dt_ms) {
                let done = entry.animation.state() == AnimationState::Finished;
                if done {
                    finished.push(id);
                }
                steps.push(AnimationStep {
                    id,
                    owner: entry.owner,
                    key: entry.animation.key.clone(),
                    value,
                    finished: done,
                });
            }
        }
        for id in finished {
            self.entries.remove(id);
        }
        steps
    }
}
