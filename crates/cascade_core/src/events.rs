//! Typed event emitter
//!
//! A small pub/sub bus used for notifications that cross item boundaries:
//! reposition broadcasts, hover changes, open-path changes. Listeners are
//! keyed by a caller-chosen event kind and receive a borrowed payload.
//!
//! ```
//! use cascade_core::events::EventEmitter;
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Kind {
//!     Reposition,
//! }
//!
//! let mut emitter: EventEmitter<Kind, u32> = EventEmitter::new();
//! let id = emitter.add_listener(Kind::Reposition, |pass| {
//!     assert_eq!(*pass, 7);
//! });
//!
//! assert_eq!(emitter.emit(Kind::Reposition, &7), 1);
//! assert!(emitter.remove_listener(id));
//! assert_eq!(emitter.emit(Kind::Reposition, &7), 0);
//! ```

use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Handle returned by [`EventEmitter::add_listener`]
    pub struct ListenerId;
}

/// Listener callback type
pub type Listener<P> = Box<dyn FnMut(&P)>;

struct Registration<K, P> {
    kind: K,
    callback: Listener<P>,
}

/// Dispatches payloads to listeners registered for an event kind
pub struct EventEmitter<K, P> {
    listeners: SlotMap<ListenerId, Registration<K, P>>,
    by_kind: FxHashMap<K, SmallVec<[ListenerId; 4]>>,
}

impl<K, P> EventEmitter<K, P>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    pub fn new() -> Self {
        Self {
            listeners: SlotMap::with_key(),
            by_kind: FxHashMap::default(),
        }
    }

    /// Register a listener for `kind`
    pub fn add_listener<F>(&mut self, kind: K, callback: F) -> ListenerId
    where
        F: FnMut(&P) + 'static,
    {
        let id = self.listeners.insert(Registration {
            kind,
            callback: Box::new(callback),
        });
        self.by_kind.entry(kind).or_default().push(id);
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let Some(registration) = self.listeners.remove(id) else {
            return false;
        };

        if let Some(ids) = self.by_kind.get_mut(&registration.kind) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.by_kind.remove(&registration.kind);
            }
        }
        true
    }

    /// Deliver `payload` to every listener of `kind`, in registration order.
    ///
    /// Returns the number of listeners invoked.
    pub fn emit(&mut self, kind: K, payload: &P) -> usize {
        let Some(ids) = self.by_kind.get(&kind) else {
            return 0;
        };

        let mut delivered = 0;
        for id in ids {
            if let Some(registration) = self.listeners.get_mut(*id) {
                (registration.callback)(payload);
                delivered += 1;
            }
        }

        tracing::trace!(?kind, delivered, "event emitted");
        delivered
    }

    /// Number of listeners registered for `kind`
    pub fn listener_count(&self, kind: K) -> usize {
        self.by_kind.get(&kind).map_or(0, |ids| ids.len())
    }

    /// Total number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Drop every listener
    pub fn clear(&mut self) {
        self.listeners.clear();
        self.by_kind.clear();
    }
}

impl<K, P> Default for EventEmitter<K, P>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, P> fmt::Debug for EventEmitter<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
