/* 📖 # What does Preferences add on top of a StoreHandle?

Typing. A store only knows PrefValue; Preferences turns that into `get::<bool>`,
`put(key, 3_i64)` and friends, with the fallbacks callers expect:

- `get` falls back to the type's built-in default (`false`, `0`, `0.0`, `""`, empty set)
- `get_or` falls back to a caller-supplied default
- `get_opt` tells an absent key apart from a stored default

An absent key is never an error. A key holding a value of another kind is: the
mismatch is returned to the caller untouched.

Writes come in two flavours. `put` commits synchronously and reports success as a
bool; `apply` returns immediately and leaves persistence to the store.
*/

use std::collections::BTreeMap;

use tracing::debug;

use prefkit_base::PrefResult;

use crate::editor::Editor;
use crate::scope::PreferenceScope;
use crate::store::{ChangeListener, StoreHandle};
use crate::value::{PrefType, PrefValue, type_mismatch};

/// Name of the store opened by [`Preferences::prefs`].
pub const PREFERENCES_NAME: &str = "prefs";

/// Typed access to one named preference store.
///
/// Cloning is cheap; clones share the store.
///
/// # Example
///
/// ```
/// use prefkit_store::{PreferenceScope, Preferences};
///
/// let scope = PreferenceScope::in_memory();
/// let prefs = Preferences::prefs(&scope).unwrap();
///
/// assert!(prefs.put("setting_dark_mode", true));
/// assert!(prefs.get::<bool>("setting_dark_mode").unwrap());
/// assert_eq!(prefs.get_or("setting_font_size", 14).unwrap(), 14);
/// assert_eq!(prefs.get_opt::<String>("user_name").unwrap(), None);
/// ```
#[derive(Debug, Clone)]
pub struct Preferences {
    store: StoreHandle,
}

impl Preferences {
    /// Wraps an already opened store.
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Opens (or creates) the store `name` in the given scope.
    pub fn open(scope: &PreferenceScope, name: &str) -> PrefResult<Self> {
        scope.open(name).map(Self::new)
    }

    /// Opens the scope's default store.
    pub fn open_default(scope: &PreferenceScope) -> PrefResult<Self> {
        scope.open_default().map(Self::new)
    }

    /// Opens the store named [`PREFERENCES_NAME`].
    pub fn prefs(scope: &PreferenceScope) -> PrefResult<Self> {
        Self::open(scope, PREFERENCES_NAME)
    }

    pub fn name(&self) -> &str {
        self.store.name()
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Starts a write transaction for batching several edits.
    pub fn edit(&self) -> Editor {
        Editor::new(self.store.clone())
    }

    /// Returns the stored value, or `default` if the key is absent.
    pub fn get_or<T: PrefType>(&self, key: &str, default: T) -> PrefResult<T> {
        match self.store.get(key) {
            Some(value) => T::from_pref(value).map_err(|found| type_mismatch::<T>(key, &found)),
            None => Ok(default),
        }
    }

    /// Returns the stored value, or the type's built-in default if the key is absent.
    pub fn get<T: PrefType>(&self, key: &str) -> PrefResult<T> {
        self.get_or(key, T::default_pref())
    }

    /// Returns `None` if the key is absent.
    pub fn get_opt<T: PrefType>(&self, key: &str) -> PrefResult<Option<T>> {
        match self.store.get(key) {
            Some(value) => T::from_pref(value)
                .map(Some)
                .map_err(|found| type_mismatch::<T>(key, &found)),
            None => Ok(None),
        }
    }

    /// Writes a value and commits synchronously. Returns whether the commit succeeded.
    pub fn put<T: PrefType>(&self, key: &str, value: T) -> bool {
        self.edit().put(key, value).commit()
    }

    /// Writes a value and leaves persistence to the store's background writer.
    pub fn apply<T: PrefType>(&self, key: &str, value: T) {
        self.edit().put(key, value).apply()
    }

    /// Reads a string preference as a base-10 integer.
    ///
    /// An absent key, an empty string and text that is not a valid `i32` all
    /// yield `default`. A key holding a non-string value is a type mismatch.
    pub fn get_string_as_int(&self, key: &str, default: i32) -> PrefResult<i32> {
        let parsed = self
            .get_opt::<String>(key)?
            .and_then(|text| text.parse::<i32>().ok());
        Ok(parsed.unwrap_or(default))
    }

    /// Like [`Preferences::get_string_as_int`] with a default of `0`, but `None`
    /// if the key is absent.
    pub fn get_string_as_int_opt(&self, key: &str) -> PrefResult<Option<i32>> {
        if !self.contains(key) {
            return Ok(None);
        }
        self.get_string_as_int(key, i32::default_pref()).map(Some)
    }

    /// Reads a value whose kind is chosen by the kind of `default`.
    ///
    /// For call sites that only know the kind at runtime, such as the CLI.
    pub fn get_dynamic(&self, key: &str, default: PrefValue) -> PrefResult<PrefValue> {
        match default {
            PrefValue::Bool(d) => self.get_or(key, d).map(PrefValue::Bool),
            PrefValue::Int(d) => self.get_or(key, d).map(PrefValue::Int),
            PrefValue::Long(d) => self.get_or(key, d).map(PrefValue::Long),
            PrefValue::Float(d) => self.get_or(key, d).map(PrefValue::Float),
            PrefValue::String(d) => self.get_or(key, d).map(PrefValue::String),
            PrefValue::StringSet(d) => self.get_or(key, d).map(PrefValue::StringSet),
        }
    }

    /// Snapshot of every stored key and value.
    pub fn get_all(&self) -> BTreeMap<String, PrefValue> {
        self.store.all()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.contains(key)
    }

    /// Removes `key`. Returns `false` without writing if the key is absent,
    /// otherwise the result of the commit.
    pub fn remove(&self, key: &str) -> bool {
        if !self.contains(key) {
            debug!(store = self.name(), key, "remove skipped, key absent");
            return false;
        }
        self.edit().remove(key).commit()
    }

    /// Removes every key. Returns whether the commit succeeded.
    pub fn clear(&self) -> bool {
        self.edit().clear().commit()
    }

    /// Registers a listener called with `(store name, key)` for each changed key.
    pub fn subscribe(&self, listener: &ChangeListener) {
        self.store.register_listener(listener);
    }

    pub fn unsubscribe(&self, listener: &ChangeListener) {
        self.store.unregister_listener(listener);
    }

    /// Blocks until earlier `apply` calls have been persisted.
    pub fn flush(&self) -> PrefResult<()> {
        self.store.flush()
    }
}
