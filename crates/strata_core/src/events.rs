//! Event dispatch
//!
//! An `EventDispatcher` holds typed listeners keyed by an event's kind.
//! Listeners can be persistent (`on`) or fire once (`once`). Using a
//! dispatcher after `dispose` and removing a listener it never handed out
//! are contract violations and panic.

use std::fmt::Debug;
use std::hash::Hash;

use smallvec::SmallVec;

/// Identifier handed out when a listener is registered
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// An event that can be routed by kind
pub trait Event {
    type Kind: Copy + Eq + Hash + Debug;

    fn kind(&self) -> Self::Kind;
}

struct Listener<E: Event> {
    id: ListenerId,
    kind: E::Kind,
    once: bool,
    callback: Box<dyn FnMut(&E)>,
}

/// Dispatches events to the listeners registered for their kind
pub struct EventDispatcher<E: Event> {
    listeners: SmallVec<[Listener<E>; 4]>,
    next_id: u64,
    disposed: bool,
}

impl<E: Event> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> EventDispatcher<E> {
    pub fn new() -> Self {
        Self {
            listeners: SmallVec::new(),
            next_id: 1,
            disposed: false,
        }
    }

    /// Register a listener for every event of `kind`
    ///
    /// # Panics
    ///
    /// Panics if the dispatcher has been disposed.
    pub fn on<F>(&mut self, kind: E::Kind, callback: F) -> ListenerId
    where
        F: FnMut(&E) + 'static,
    {
        self.register(kind, false, Box::new(callback))
    }

    /// Register a listener that removes itself after the first matching event
    ///
    /// # Panics
    ///
    /// Panics if the dispatcher has been disposed.
    pub fn once<F>(&mut self, kind: E::Kind, callback: F) -> ListenerId
    where
        F: FnMut(&E) + 'static,
    {
        self.register(kind, true, Box::new(callback))
    }

    fn register(&mut self, kind: E::Kind, once: bool, callback: Box<dyn FnMut(&E)>) -> ListenerId {
        assert!(!self.disposed, "EventDispatcher used after dispose");
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            kind,
            once,
            callback,
        });
        id
    }

    /// Remove a listener
    ///
    /// # Panics
    ///
    /// Panics if `id` is not currently registered, or the dispatcher has
    /// been disposed.
    pub fn off(&mut self, id: ListenerId) {
        assert!(!self.disposed, "EventDispatcher used after dispose");
        let index = self
            .listeners
            .iter()
            .position(|l| l.id == id)
            .unwrap_or_else(|| panic!("listener {id:?} is not registered"));
        self.listeners.remove(index);
    }

    /// Whether any listener is registered for `kind`
    pub fn has_listeners(&self, kind: E::Kind) -> bool {
        self.listeners.iter().any(|l| l.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `event` to every matching listener, returning how many ran
    ///
    /// # Panics
    ///
    /// Panics if the dispatcher has been disposed.
    pub fn dispatch(&mut self, event: &E) -> usize {
        assert!(!self.disposed, "EventDispatcher used after dispose");
        let kind = event.kind();
        let mut delivered = 0;
        for listener in self.listeners.iter_mut().filter(|l| l.kind == kind) {
            (listener.callback)(event);
            delivered += 1;
        }
        if delivered > 0 {
            self.listeners.retain(|l| !(l.once && l.kind == kind));
        }
        delivered
    }

    /// Drop all listeners; any further use panics
    pub fn dispose(&mut self) {
        self.listeners.clear();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl<E: Event> Debug for EventDispatcher<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug)]
    enum Ping {
        A(u32),
        B,
    }

    impl Event for Ping {
        type Kind = u8;

        fn kind(&self) -> u8 {
            match self {
                Ping::A(_) => 0,
                Ping::B => 1,
            }
        }
    }

    #[test]
    fn test_dispatch_by_kind() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::<Ping>::new();
        let sink = seen.clone();
        dispatcher.on(0, move |e| {
            if let Ping::A(n) = e {
                sink.borrow_mut().push(*n);
            }
        });
        assert_eq!(dispatcher.dispatch(&Ping::A(7)), 1);
        assert_eq!(dispatcher.dispatch(&Ping::B), 0);
        assert_eq!(*seen.borrow(), vec![7]);
    }

    #[test]
    fn test_once_listener() {
        let count = Rc::new(RefCell::new(0));
        let mut dispatcher = EventDispatcher::<Ping>::new();
        let c = count.clone();
        dispatcher.once(1, move |_| *c.borrow_mut() += 1);
        dispatcher.dispatch(&Ping::B);
        dispatcher.dispatch(&Ping::B);
        assert_eq!(*count.borrow(), 1);
        assert!(!dispatcher.has_listeners(1));
    }

    #[test]
    fn test_off_removes_listener() {
        let mut dispatcher = EventDispatcher::<Ping>::new();
        let id = dispatcher.on(1, |_| {});
        dispatcher.off(id);
        assert!(dispatcher.is_empty());
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn test_off_unknown_listener_panics() {
        let mut dispatcher = EventDispatcher::<Ping>::new();
        dispatcher.off(ListenerId(99));
    }

    #[test]
    #[should_panic(expected = "after dispose")]
    fn test_use_after_dispose_panics() {
        let mut dispatcher = EventDispatcher::<Ping>::new();
        dispatcher.dispose();
        dispatcher.on(0, |_| {});
    }
}
