//! Listener directory: type-indexed sets of registered listeners

use crate::event::DynListener;
use dashmap::DashMap;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identity of a registered listener
///
/// Derived from the address of the `Arc` allocation the listener was
/// registered with. Registering the same `Arc` again yields the same id
/// (set semantics); a separately allocated listener of the same type is a
/// distinct id. The directory keeps the registered `Arc` alive, so an id
/// cannot be reused by a new allocation while its listener stays registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

impl ListenerId {
    pub fn of<L: ?Sized>(listener: &Arc<L>) -> Self {
        Self(Arc::as_ptr(listener) as *const () as usize)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Mapping from event type to the set of listeners registered for it
///
/// Entries are created lazily on first registration for a type and never
/// removed; an empty set left behind by the last unregister is harmless.
/// The map is sharded (`DashMap`), so snapshot reads and register/unregister
/// writes for different types never contend, and for the same type contend
/// only on that entry's shard lock.
#[derive(Default)]
pub struct ListenerDirectory {
    entries: DashMap<TypeId, HashMap<ListenerId, Arc<dyn DynListener>>>,
}

impl ListenerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener to the set for `type_id`, creating the set if absent.
    ///
    /// Inserting an id already present replaces the entry in place, so
    /// re-registration is idempotent.
    pub fn insert(&self, type_id: TypeId, id: ListenerId, listener: Arc<dyn DynListener>) {
        self.entries.entry(type_id).or_default().insert(id, listener);
    }

    /// Remove a listener from the set for `type_id` if present.
    ///
    /// A no-op when the id is absent or the type was never registered.
    pub fn remove(&self, type_id: TypeId, id: ListenerId) {
        if let Some(mut set) = self.entries.get_mut(&type_id) {
            set.remove(&id);
        }
    }

    /// Point-in-time copy of the listener set for `type_id`.
    ///
    /// The entry lock is held for the duration of the copy, so the snapshot
    /// never observes a half-applied insert or remove. This is the only read
    /// path dispatch uses.
    pub fn snapshot(&self, type_id: TypeId) -> Vec<(ListenerId, Arc<dyn DynListener>)> {
        self.entries
            .get(&type_id)
            .map(|set| set.iter().map(|(id, l)| (*id, l.clone())).collect())
            .unwrap_or_default()
    }

    /// Ids currently registered for `type_id` (introspection only).
    pub fn ids(&self, type_id: TypeId) -> Vec<ListenerId> {
        self.entries
            .get(&type_id)
            .map(|set| set.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of listeners currently registered for `type_id`.
    pub fn len(&self, type_id: TypeId) -> usize {
        self.entries.get(&type_id).map(|set| set.len()).unwrap_or(0)
    }
}
