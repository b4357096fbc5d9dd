/* 📖 # Why a PreferenceStore trait?

The accessor is a thin typed layer; the store behind it decides where values live
and how writes become durable. Two stores ship with the crate:

1. **InMemoryStore**: nothing is persisted, useful for tests and throwaway scopes
2. **FileStore**: one JSON file per store, written through the PAL

Reads are infallible because every store keeps its full contents in memory once
opened. Only writes can fail, and they go through a single `commit` entry point
that receives a whole batch of edits, so a store never sees half a transaction.
*/

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use prefkit_base::PrefResult;

use crate::store::listener::{ChangeListener, ListenerRegistry};
use crate::value::PrefValue;

/// How a committed batch is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Persist before returning.
    Sync,
    /// Update the in-memory view now and persist in the background.
    Deferred,
}

/// The edits collected by one write transaction.
///
/// A later edit to the same key replaces an earlier one. A clear is applied
/// before any put or remove in the same batch, whatever the call order was.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditBatch {
    clear: bool,
    changes: BTreeMap<String, Option<PrefValue>>,
}

impl EditBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: PrefValue) {
        self.changes.insert(key.into(), Some(value));
    }

    pub fn remove(&mut self, key: impl Into<String>) {
        self.changes.insert(key.into(), None);
    }

    pub fn clear(&mut self) {
        self.clear = true;
    }

    /// Returns true if committing this batch cannot change anything.
    pub fn is_empty(&self) -> bool {
        !self.clear && self.changes.is_empty()
    }

    /// Applies the batch to a map of values and returns the keys whose value
    /// actually changed, sorted.
    pub fn apply_to(&self, values: &mut HashMap<String, PrefValue>) -> Vec<String> {
        let mut changed = BTreeSet::new();
        if self.clear {
            changed.extend(values.drain().map(|(key, _)| key));
        }
        for (key, change) in &self.changes {
            let modified = match change {
                Some(value) => values.insert(key.clone(), value.clone()).as_ref() != Some(value),
                None => values.remove(key).is_some(),
            };
            if modified {
                changed.insert(key.clone());
            }
        }
        changed.into_iter().collect()
    }
}

/// Trait for preference store implementations.
pub trait PreferenceStore: Send + Sync + 'static {
    /// Name the store was opened under.
    fn name(&self) -> &str;

    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<PrefValue>;

    fn contains(&self, key: &str) -> bool;

    /// Snapshot of every stored key and value.
    fn all(&self) -> BTreeMap<String, PrefValue>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies a batch of edits.
    ///
    /// With [`WriteMode::Sync`] the batch is durable when this returns `Ok`, and
    /// an `Err` leaves the store unchanged. With [`WriteMode::Deferred`] the
    /// in-memory view is updated immediately and persistence happens later.
    ///
    /// # Returns
    /// The keys whose value changed, sorted.
    fn commit(&mut self, batch: EditBatch, mode: WriteMode) -> PrefResult<Vec<String>>;

    /// Blocks until every deferred write issued so far has been persisted.
    fn flush(&mut self) -> PrefResult<()>;
}

/// A thread-safe handle to a preference store.
///
/// StoreHandle provides cheap cloning (via Arc) and interior mutability (via
/// RwLock). Change listeners are registered on the handle and shared by all of
/// its clones; they fire after a successful commit, outside the store lock.
#[derive(Clone)]
pub struct StoreHandle {
    name: Arc<str>,
    store: Arc<RwLock<dyn PreferenceStore>>,
    listeners: ListenerRegistry,
}

impl StoreHandle {
    /// Create a new StoreHandle wrapping the given store implementation.
    pub fn new<S: PreferenceStore>(store: S) -> Self {
        Self {
            name: Arc::from(store.name()),
            store: Arc::new(RwLock::new(store)),
            listeners: ListenerRegistry::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// See [`PreferenceStore::get`].
    pub fn get(&self, key: &str) -> Option<PrefValue> {
        self.store.read().get(key)
    }

    /// See [`PreferenceStore::contains`].
    pub fn contains(&self, key: &str) -> bool {
        self.store.read().contains(key)
    }

    /// See [`PreferenceStore::all`].
    pub fn all(&self) -> BTreeMap<String, PrefValue> {
        self.store.read().all()
    }

    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Commits a batch and notifies listeners of every changed key.
    ///
    /// See [`PreferenceStore::commit`] for details.
    pub fn commit(&self, batch: EditBatch, mode: WriteMode) -> PrefResult<Vec<String>> {
        let changed = self.store.write().commit(batch, mode)?;
        self.listeners.notify(&self.name, &changed);
        Ok(changed)
    }

    /// See [`PreferenceStore::flush`].
    pub fn flush(&self) -> PrefResult<()> {
        self.store.write().flush()
    }

    /// Registers a change listener. Registering the same listener twice is a no-op.
    pub fn register_listener(&self, listener: &ChangeListener) {
        self.listeners.register(listener);
    }

    /// Unregisters a change listener. Unknown listeners are ignored.
    pub fn unregister_listener(&self, listener: &ChangeListener) {
        self.listeners.unregister(listener);
    }

    /// Returns true if both handles refer to the same underlying store.
    pub fn same_store(&self, other: &StoreHandle) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("name", &self.name)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
