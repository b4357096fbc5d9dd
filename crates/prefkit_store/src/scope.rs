/* 📖 # Why does every store go through a PreferenceScope?

Two `Preferences` opened with the same name must see the same values and the same
listeners. If each one loaded its own FileStore, a write through one would be
invisible to the other until a reopen, and their writers would overwrite each
other's files.

The scope is the single owner: the first `open(name)` creates the store, later
calls return a clone of the same StoreHandle. Stores stay open as long as the scope
(or any handle) lives.
*/

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, instrument};

use prefkit_base::{ErrorKind, MockPal, PalHandle, PrefError, PrefResult};

use crate::config::{Backend, PrefsConfig};
use crate::store::{FileStore, InMemoryStore, StoreHandle};

/// Registry of open stores sharing one PAL and configuration.
///
/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct PreferenceScope {
    inner: Arc<ScopeInner>,
}

#[derive(Debug)]
struct ScopeInner {
    pal: PalHandle,
    config: PrefsConfig,
    stores: Mutex<HashMap<String, StoreHandle>>,
}

impl PreferenceScope {
    pub fn new(pal: PalHandle, config: PrefsConfig) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                pal,
                config,
                stores: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// A scope whose stores are never persisted.
    pub fn in_memory() -> Self {
        let config = PrefsConfig {
            backend: Backend::Memory,
            ..PrefsConfig::default()
        };
        Self::new(PalHandle::new(MockPal::new()), config)
    }

    pub fn config(&self) -> &PrefsConfig {
        &self.inner.config
    }

    /// Returns the store `name`, opening it on first use.
    #[instrument(skip(self))]
    pub fn open(&self, name: &str) -> PrefResult<StoreHandle> {
        validate_store_name(name)?;
        let mut stores = self.inner.stores.lock();
        if let Some(store) = stores.get(name) {
            return Ok(store.clone());
        }
        let store = match self.inner.config.backend {
            Backend::File => StoreHandle::new(FileStore::open(
                self.inner.pal.clone(),
                &self.inner.config.directory_path(),
                name,
            )?),
            Backend::Memory => StoreHandle::new(InMemoryStore::new(name)),
        };
        debug!(backend = ?self.inner.config.backend, "store opened");
        stores.insert(name.to_string(), store.clone());
        Ok(store)
    }

    /// Returns the store named by `default_name` in the configuration.
    pub fn open_default(&self) -> PrefResult<StoreHandle> {
        self.open(&self.inner.config.default_name)
    }

    /// Names of the stores opened so far, sorted.
    pub fn open_store_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.stores.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

/// Store names become file names, so only `[A-Za-z0-9_.-]` is accepted, and
/// names made of dots alone are rejected.
fn validate_store_name(name: &str) -> PrefResult<()> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-');
    if name.is_empty() || !name.chars().all(allowed) || name.chars().all(|c| c == '.') {
        return Err(Box::new(PrefError::new(ErrorKind::InvalidStoreName {
            name: name.to_string(),
        })));
    }
    Ok(())
}
