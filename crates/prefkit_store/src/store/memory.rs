/* 📖 # Why provide an in-memory store implementation?

InMemoryStore keeps values in a HashMap and never touches the disk. It backs
`PreferenceScope::in_memory()`, and it is the store every accessor test runs
against, since it has no failure modes of its own.
*/

use std::collections::{BTreeMap, HashMap};

use prefkit_base::PrefResult;

use crate::store::traits::{EditBatch, PreferenceStore, WriteMode};
use crate::value::PrefValue;

/// A preference store that lives only as long as the process.
///
/// # Example
///
/// ```
/// use prefkit_store::store::{EditBatch, InMemoryStore, PreferenceStore, WriteMode};
/// use prefkit_store::PrefValue;
///
/// let mut store = InMemoryStore::new("prefs");
/// let mut batch = EditBatch::new();
/// batch.put("volume", PrefValue::Int(7));
/// store.commit(batch, WriteMode::Sync).unwrap();
///
/// assert_eq!(store.get("volume"), Some(PrefValue::Int(7)));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    name: String,
    values: HashMap<String, PrefValue>,
}

impl InMemoryStore {
    /// Create a new, empty in-memory store.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
        }
    }

    /// Create a store pre-populated with values.
    pub fn with_values(
        name: impl Into<String>,
        values: impl IntoIterator<Item = (String, PrefValue)>,
    ) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().collect(),
        }
    }
}

impl PreferenceStore for InMemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.get(key).cloned()
    }

    fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn all(&self) -> BTreeMap<String, PrefValue> {
        self.values
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn commit(&mut self, batch: EditBatch, _mode: WriteMode) -> PrefResult<Vec<String>> {
        Ok(batch.apply_to(&mut self.values))
    }

    fn flush(&mut self) -> PrefResult<()> {
        Ok(())
    }
}
