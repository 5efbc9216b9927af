//! Reactive property store
//!
//! Every scene node owns one `PropertyStore` holding its settings. A `set`
//! that actually changes a value records the previous value, marks the key
//! dirty and fires key-scoped change callbacks. The owner drains the dirty
//! keys once per frame to decide what must be recomputed.
//!
//! `set_raw` is the non-notifying path used while an animation is running:
//! the value is updated but no callback fires and the key is not marked.
//!
//! # Example
//!
//! ```rust
//! use strata_core::store::PropertyStore;
//!
//! let mut store = PropertyStore::new();
//! assert!(store.set("width", 100.0));
//! assert!(!store.set("width", 100.0)); // unchanged, no notification
//! assert_eq!(store.get_number("width", 0.0), 100.0);
//! assert_eq!(store.take_dirty(), vec!["width".to_string()]);
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::color::Color;
use crate::events::ListenerId;
use crate::value::{Length, Value};

/// A change observed by a key-scoped callback
#[derive(Debug)]
pub struct PropertyChange<'a> {
    pub key: &'a str,
    pub previous: Option<&'a Value>,
    pub value: &'a Value,
}

type ChangeCallback = Box<dyn FnMut(&PropertyChange<'_>)>;

/// Key/value settings with change tracking
#[derive(Default)]
pub struct PropertyStore {
    values: FxHashMap<String, Value>,
    previous: FxHashMap<String, Value>,
    /// Dirty keys in the order they were first marked
    dirty: Vec<String>,
    dirty_set: FxHashSet<String>,
    listeners: FxHashMap<String, Vec<(ListenerId, ChangeCallback)>>,
    next_listener: u64,
    disposed: bool,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`; returns `true` if the stored value changed
    ///
    /// # Panics
    ///
    /// Panics if the store has been disposed.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> bool {
        self.assert_live(key);
        let value = value.into();
        if self.values.get(key) == Some(&value) {
            return false;
        }
        let old = self.values.insert(key.to_string(), value);
        if let Some(old) = old {
            self.previous.insert(key.to_string(), old);
        } else {
            self.previous.remove(key);
        }
        self.mark_dirty(key);
        self.notify(key);
        true
    }

    /// Store without notifying listeners or marking the key dirty
    ///
    /// # Panics
    ///
    /// Panics if the store has been disposed.
    pub fn set_raw(&mut self, key: &str, value: impl Into<Value>) -> bool {
        self.assert_live(key);
        let value = value.into();
        if self.values.get(key) == Some(&value) {
            return false;
        }
        self.values.insert(key.to_string(), value);
        true
    }

    /// Remove a key, marking it dirty if it existed
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.assert_live(key);
        let old = self.values.remove(key)?;
        self.previous.insert(key.to_string(), old.clone());
        self.mark_dirty(key);
        Some(old)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Value held before the most recent notifying `set`
    pub fn previous(&self, key: &str) -> Option<&Value> {
        self.previous.get(key)
    }

    pub fn get_number(&self, key: &str, default: f32) -> f32 {
        self.get(key).and_then(Value::as_number).unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn get_color(&self, key: &str) -> Option<Color> {
        self.get(key).and_then(Value::as_color)
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_text)
    }

    pub fn get_length(&self, key: &str) -> Option<Length> {
        self.get(key).and_then(Value::as_length)
    }

    pub fn get_list(&self, key: &str) -> Option<&[f32]> {
        self.get(key).and_then(Value::as_list)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Mark a key dirty without changing it (idempotent)
    pub fn mark_dirty(&mut self, key: &str) {
        if self.dirty_set.insert(key.to_string()) {
            trace!(key, "property marked dirty");
            self.dirty.push(key.to_string());
        }
    }

    pub fn is_dirty(&self, key: &str) -> bool {
        self.dirty_set.contains(key)
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Dirty keys, in marking order
    pub fn dirty_keys(&self) -> &[String] {
        &self.dirty
    }

    /// Drain the dirty keys
    pub fn take_dirty(&mut self) -> Vec<String> {
        self.dirty_set.clear();
        std::mem::take(&mut self.dirty)
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
        self.dirty_set.clear();
    }

    /// Register a callback fired after `key` changes through `set`
    ///
    /// Callbacks run synchronously inside `set` and cannot reach back into
    /// the store, so they can never re-trigger the change that fired them.
    pub fn on_change<F>(&mut self, key: &str, callback: F) -> ListenerId
    where
        F: FnMut(&PropertyChange<'_>) + 'static,
    {
        self.assert_live(key);
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners
            .entry(key.to_string())
            .or_default()
            .push((id, Box::new(callback)));
        id
    }

    /// Remove a change callback; returns `false` if it was not registered
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        for list in self.listeners.values_mut() {
            if let Some(index) = list.iter().position(|(lid, _)| *lid == id) {
                list.remove(index);
                return true;
            }
        }
        false
    }

    fn notify(&mut self, key: &str) {
        let Some(list) = self.listeners.get_mut(key) else {
            return;
        };
        let Some(value) = self.values.get(key) else {
            return;
        };
        let change = PropertyChange {
            key,
            previous: self.previous.get(key),
            value,
        };
        for (_, callback) in list.iter_mut() {
            callback(&change);
        }
    }

    /// Drop all values and listeners; any further `set` panics
    pub fn dispose(&mut self) {
        self.values.clear();
        self.previous.clear();
        self.listeners.clear();
        self.clear_dirty();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn assert_live(&self, key: &str) {
        assert!(
            !self.disposed,
            "PropertyStore: attempted to write '{key}' after dispose"
        );
    }
}

impl std::fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyStore")
            .field("values", &self.values)
            .field("dirty", &self.dirty)
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_set_tracks_previous_and_dirty() {
        let mut store = PropertyStore::new();
        assert!(store.set("x", 1.0));
        assert!(store.previous("x").is_none());
        assert!(store.set("x", 2.0));
        assert_eq!(store.previous("x"), Some(&Value::Number(1.0)));
        assert!(store.is_dirty("x"));
        assert_eq!(store.take_dirty(), vec!["x".to_string()]);
        assert!(!store.has_dirty());
    }

    #[test]
    fn test_unchanged_set_is_silent() {
        let calls = Rc::new(RefCell::new(0));
        let mut store = PropertyStore::new();
        let c = calls.clone();
        store.on_change("fill", move |_| *c.borrow_mut() += 1);
        store.set("fill", "#ff0000");
        store.clear_dirty();
        assert!(!store.set("fill", "#ff0000"));
        assert!(!store.has_dirty());
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_callbacks_are_key_scoped() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = PropertyStore::new();
        let sink = seen.clone();
        store.on_change("y", move |change| {
            sink.borrow_mut()
                .push((change.previous.cloned(), change.value.clone()));
        });
        store.set("x", 5.0);
        store.set("y", 1.0);
        store.set("y", 3.0);
        assert_eq!(
            *seen.borrow(),
            vec![
                (None, Value::Number(1.0)),
                (Some(Value::Number(1.0)), Value::Number(3.0)),
            ]
        );
    }

    #[test]
    fn test_raw_set_does_not_notify() {
        let calls = Rc::new(RefCell::new(0));
        let mut store = PropertyStore::new();
        let c = calls.clone();
        store.on_change("opacity", move |_| *c.borrow_mut() += 1);
        assert!(store.set_raw("opacity", 0.5));
        assert_eq!(store.get_number("opacity", 1.0), 0.5);
        assert_eq!(*calls.borrow(), 0);
        assert!(!store.is_dirty("opacity"));
    }

    #[test]
    fn test_dirty_marking_is_idempotent() {
        let mut store = PropertyStore::new();
        store.mark_dirty("a");
        store.mark_dirty("a");
        store.set("b", true);
        store.mark_dirty("b");
        assert_eq!(store.dirty_keys(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_remove_listener() {
        let mut store = PropertyStore::new();
        let id = store.on_change("k", |_| {});
        assert!(store.remove_listener(id));
        assert!(!store.remove_listener(id));
    }

    #[test]
    #[should_panic(expected = "after dispose")]
    fn test_set_after_dispose_panics() {
        let mut store = PropertyStore::new();
        store.set("x", 1.0);
        store.dispose();
        store.set("x", 2.0);
    }
}
