use tracing::warn;

use crate::store::{EditBatch, StoreHandle, WriteMode};
use crate::value::{PrefType, PrefValue};

/* 📖 # Why is an Editor created per write?

An editor collects edits and is consumed by `commit` or `apply`. Nothing about a
pending write outlives the call that finishes it, so two writers on the same
`Preferences` never see each other's half-built batches.
*/

/// A write transaction against one store.
///
/// Obtained from [`crate::Preferences::edit`]; finished by [`Editor::commit`] or
/// [`Editor::apply`]. Dropping an editor discards its edits.
///
/// # Example
///
/// ```
/// use prefkit_store::{PreferenceScope, Preferences};
///
/// let scope = PreferenceScope::in_memory();
/// let prefs = Preferences::prefs(&scope).unwrap();
///
/// let committed = prefs
///     .edit()
///     .put("user_name", "ada".to_string())
///     .put("user_age", 36)
///     .remove("temp_token")
///     .commit();
///
/// assert!(committed);
/// assert_eq!(prefs.get::<i32>("user_age").unwrap(), 36);
/// ```
#[must_use = "edits are discarded unless the editor is committed or applied"]
#[derive(Debug)]
pub struct Editor {
    store: StoreHandle,
    batch: EditBatch,
}

impl Editor {
    pub(crate) fn new(store: StoreHandle) -> Self {
        Self {
            store,
            batch: EditBatch::new(),
        }
    }

    pub fn put<T: PrefType>(mut self, key: impl Into<String>, value: T) -> Self {
        self.batch.put(key, value.into_pref());
        self
    }

    /// Like [`Editor::put`] for values whose kind is only known at runtime.
    pub fn put_value(mut self, key: impl Into<String>, value: PrefValue) -> Self {
        self.batch.put(key, value);
        self
    }

    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.batch.remove(key);
        self
    }

    /// Removes every key. Runs before the other edits of this transaction.
    pub fn clear(mut self) -> Self {
        self.batch.clear();
        self
    }

    /// Persists the edits before returning.
    ///
    /// Returns whether the store accepted the write; failures are logged, not
    /// returned.
    pub fn commit(self) -> bool {
        match self.store.commit(self.batch, WriteMode::Sync) {
            Ok(_) => true,
            Err(e) => {
                warn!(store = self.store.name(), error = %e, "preference commit failed");
                false
            }
        }
    }

    /// Makes the edits visible immediately and persists them in the background.
    pub fn apply(self) {
        if let Err(e) = self.store.commit(self.batch, WriteMode::Deferred) {
            warn!(store = self.store.name(), error = %e, "preference apply failed");
        }
    }
}
