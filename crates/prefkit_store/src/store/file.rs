/* 📖 # How does FileStore persist values?

Each store is one JSON file, `<directory>/<name>.json`, mapping keys to tagged
values. The whole file is loaded when the store is opened and every read is
served from memory afterwards.

Writes always replace the whole file: the new content goes to `<file>.tmp` and is
then renamed over the old file, so a crash mid-write leaves the previous version
intact.

- Sync commits build the new map on a copy, write it, and only then swap it in.
  A failed write leaves both disk and memory untouched.
- Deferred commits update memory right away and queue a snapshot for a writer
  thread owned by the store. The thread is started on the first deferred commit
  and is drained and joined when the store is dropped.
*/

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::sync::mpsc;
use std::thread::JoinHandle;

use tracing::{debug, instrument, warn};

use prefkit_base::{ErrorKind, FilePath, PalHandle, PrefError, PrefResult, ResultExt};

use crate::store::traits::{EditBatch, PreferenceStore, WriteMode};
use crate::value::PrefValue;

/// Extension of store files.
pub const STORE_FILE_EXTENSION: &str = "json";

/// A preference store persisted as a JSON file through the PAL.
pub struct FileStore {
    name: String,
    path: FilePath,
    pal: PalHandle,
    values: HashMap<String, PrefValue>,
    writer: Option<WriteBehind>,
}

impl FileStore {
    /// Open the store `name` inside `directory`, loading it if the file exists.
    #[instrument(skip(pal), fields(directory = %directory))]
    pub fn open(pal: PalHandle, directory: &FilePath, name: &str) -> PrefResult<Self> {
        let path = directory.join(format!("{}.{}", name, STORE_FILE_EXTENSION));
        let values = if pal.file_exists(&path)? {
            read_store_file(&pal, &path)
                .with_context(|| format!("Failed to load preference store '{}'", name))?
        } else {
            HashMap::new()
        };
        debug!(path = %path, keys = values.len(), "opened preference store");
        Ok(Self {
            name: name.to_string(),
            path,
            pal,
            values,
            writer: None,
        })
    }

    /// Location of the backing file, relative to the PAL base directory.
    pub fn path(&self) -> &FilePath {
        &self.path
    }

    fn write_behind(&mut self) -> PrefResult<&WriteBehind> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => WriteBehind::spawn(self.pal.clone(), self.path.clone(), &self.name)?,
        };
        Ok(self.writer.insert(writer))
    }
}

impl PreferenceStore for FileStore {
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

    #[instrument(skip(self, batch), fields(store = %self.name))]
    fn commit(&mut self, batch: EditBatch, mode: WriteMode) -> PrefResult<Vec<String>> {
        match mode {
            WriteMode::Sync => {
                let mut next = self.values.clone();
                let changed = batch.apply_to(&mut next);
                if changed.is_empty() {
                    return Ok(changed);
                }
                // Earlier deferred writes must not land on top of this one
                self.flush()?;
                write_store_file(&self.pal, &self.path, &next)
                    .with_context(|| format!("Failed to commit preference store '{}'", self.name))?;
                self.values = next;
                Ok(changed)
            }
            WriteMode::Deferred => {
                let changed = batch.apply_to(&mut self.values);
                if changed.is_empty() {
                    return Ok(changed);
                }
                let snapshot = self.values.clone();
                self.write_behind()?.submit(snapshot)?;
                Ok(changed)
            }
        }
    }

    fn flush(&mut self) -> PrefResult<()> {
        match &self.writer {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("keys", &self.values.len())
            .finish()
    }
}

enum WriterCommand {
    Write(HashMap<String, PrefValue>),
    Flush(mpsc::Sender<()>),
}

/// Background writer for deferred commits.
struct WriteBehind {
    sender: Option<mpsc::Sender<WriterCommand>>,
    thread: Option<JoinHandle<()>>,
}

impl WriteBehind {
    fn spawn(pal: PalHandle, path: FilePath, name: &str) -> PrefResult<Self> {
        let (sender, receiver) = mpsc::channel();
        let thread = std::thread::Builder::new()
            .name(format!("prefkit-writer-{}", name))
            .spawn(move || run_writer(pal, path, receiver))
            .map_err(|e| {
                Box::new(PrefError::message(format!(
                    "Failed to start writer thread for store '{}': {}",
                    name, e
                )))
            })?;
        debug!(store = name, "started background writer");
        Ok(Self {
            sender: Some(sender),
            thread: Some(thread),
        })
    }

    fn send(&self, command: WriterCommand) -> PrefResult<()> {
        self.sender
            .as_ref()
            .and_then(|sender| sender.send(command).ok())
            .ok_or_else(|| prefkit_base::err!("Background writer has stopped"))
    }

    fn submit(&self, snapshot: HashMap<String, PrefValue>) -> PrefResult<()> {
        self.send(WriterCommand::Write(snapshot))
    }

    fn flush(&self) -> PrefResult<()> {
        let (ack, done) = mpsc::channel();
        self.send(WriterCommand::Flush(ack))?;
        done.recv()
            .map_err(|_| prefkit_base::err!("Background writer stopped before flushing"))
    }
}

impl Drop for WriteBehind {
    fn drop(&mut self) {
        // Closing the channel ends the writer loop once the queue is drained
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("background writer panicked");
            }
        }
    }
}

fn run_writer(pal: PalHandle, path: FilePath, receiver: mpsc::Receiver<WriterCommand>) {
    while let Ok(command) = receiver.recv() {
        match command {
            WriterCommand::Write(snapshot) => {
                if let Err(e) = write_store_file(&pal, &path, &snapshot) {
                    warn!(path = %path, error = %e, "deferred preference write failed");
                }
            }
            WriterCommand::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    debug!(path = %path, "background writer finished");
}

fn serialization_error(e: serde_json::Error) -> Box<PrefError> {
    Box::new(PrefError::new(ErrorKind::Serialization {
        message: e.to_string(),
    }))
}

#[instrument(skip(pal), fields(path = %path))]
fn read_store_file(pal: &PalHandle, path: &FilePath) -> PrefResult<HashMap<String, PrefValue>> {
    let content = pal.read_file_to_string(path)?;
    serde_json::from_str(&content).map_err(serialization_error)
}

#[instrument(skip(pal, values), fields(path = %path, keys = values.len()))]
fn write_store_file(
    pal: &PalHandle,
    path: &FilePath,
    values: &HashMap<String, PrefValue>,
) -> PrefResult<()> {
    let sorted: BTreeMap<&String, &PrefValue> = values.iter().collect();
    let json = serde_json::to_string_pretty(&sorted).map_err(serialization_error)?;

    if let Some(directory) = path.parent() {
        pal.create_directory_all(&directory)?;
    }
    let temp_path = path.with_added_extension("tmp");
    let mut writer = pal.create_file(&temp_path)?;
    writer
        .write_all(json.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| {
            Box::new(PrefError::new(ErrorKind::FileError {
                path: temp_path.as_path().to_path_buf(),
                source: e,
            }))
        })?;
    drop(writer);
    pal.rename_file(&temp_path, path)?;
    debug!("preference store written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use prefkit_base::{MockPal, RealPal};
    use tempfile::TempDir;

    fn dir() -> FilePath {
        FilePath::from("shared_prefs")
    }

    fn batch(entries: &[(&str, PrefValue)]) -> EditBatch {
        let mut batch = EditBatch::new();
        for (key, value) in entries {
            batch.put(*key, value.clone());
        }
        batch
    }

    fn stored_json(mock: &MockPal) -> String {
        let content = mock
            .file_content(&FilePath::from("shared_prefs/prefs.json"))
            .expect("store file should exist");
        String::from_utf8(content).unwrap()
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let mock = MockPal::new();
        let store = FileStore::open(PalHandle::new(mock), &dir(), "prefs").unwrap();

        assert!(store.is_empty());
        assert_eq!(store.path(), &FilePath::from("shared_prefs/prefs.json"));
    }

    #[test]
    fn test_sync_commit_writes_file() {
        let mock = MockPal::new();
        let mut store = FileStore::open(PalHandle::new(mock.clone()), &dir(), "prefs").unwrap();

        store
            .commit(
                batch(&[("volume", PrefValue::Int(7)), ("name", "ada".into())]),
                WriteMode::Sync,
            )
            .unwrap();

        expect![[r#"
            {
              "name": {
                "type": "string",
                "value": "ada"
              },
              "volume": {
                "type": "int",
                "value": 7
              }
            }"#]]
        .assert_eq(&stored_json(&mock));
        assert!(mock.directory_exists(&dir()));
        assert!(mock.file_content(&FilePath::from("shared_prefs/prefs.json.tmp")).is_none());
    }

    #[test]
    fn test_values_survive_reopen() {
        let mock = MockPal::new();
        let pal = PalHandle::new(mock);
        {
            let mut store = FileStore::open(pal.clone(), &dir(), "prefs").unwrap();
            store
                .commit(
                    batch(&[
                        ("flag", PrefValue::Bool(true)),
                        ("ratio", PrefValue::Float(0.25)),
                        ("tags", PrefValue::StringSet(["a", "b"].map(String::from).into())),
                    ]),
                    WriteMode::Sync,
                )
                .unwrap();
        }

        let store = FileStore::open(pal, &dir(), "prefs").unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.get("ratio"), Some(PrefValue::Float(0.25)));
        assert_eq!(
            store.get("tags"),
            Some(PrefValue::StringSet(["a", "b"].map(String::from).into()))
        );
    }

    #[test]
    fn test_failed_sync_commit_leaves_store_unchanged() {
        let mock = MockPal::new();
        let mut store = FileStore::open(PalHandle::new(mock.clone()), &dir(), "prefs").unwrap();
        mock.fail_writes(true);

        let result = store.commit(batch(&[("volume", PrefValue::Int(7))]), WriteMode::Sync);

        assert!(result.is_err());
        assert!(!store.contains("volume"));
        assert!(mock.file_content(&FilePath::from("shared_prefs/prefs.json")).is_none());
    }

    #[test]
    fn test_unchanged_commit_skips_write() {
        let mock = MockPal::new();
        let mut store = FileStore::open(PalHandle::new(mock.clone()), &dir(), "prefs").unwrap();
        mock.fail_writes(true);

        let changed = store.commit(EditBatch::new(), WriteMode::Sync).unwrap();

        assert!(changed.is_empty());
    }

    #[test]
    fn test_non_finite_floats_survive_reopen() {
        let mock = MockPal::new();
        let pal = PalHandle::new(mock);
        {
            let mut store = FileStore::open(pal.clone(), &dir(), "prefs").unwrap();
            store
                .commit(
                    batch(&[
                        ("nan", PrefValue::Float(f32::NAN)),
                        ("up", PrefValue::Float(f32::INFINITY)),
                        ("down", PrefValue::Float(f32::NEG_INFINITY)),
                    ]),
                    WriteMode::Sync,
                )
                .unwrap();
        }

        let store = FileStore::open(pal, &dir(), "prefs").unwrap();
        assert!(matches!(store.get("nan"), Some(PrefValue::Float(f)) if f.is_nan()));
        assert_eq!(store.get("up"), Some(PrefValue::Float(f32::INFINITY)));
        assert_eq!(store.get("down"), Some(PrefValue::Float(f32::NEG_INFINITY)));
    }

    #[test]
    fn test_sync_commit_after_deferred_nan() {
        let mock = MockPal::new();
        let pal = PalHandle::new(mock);
        let mut store = FileStore::open(pal.clone(), &dir(), "prefs").unwrap();

        store
            .commit(batch(&[("ratio", PrefValue::Float(f32::NAN))]), WriteMode::Deferred)
            .unwrap();
        store.flush().unwrap();
        store
            .commit(batch(&[("unrelated", PrefValue::Int(1))]), WriteMode::Sync)
            .unwrap();

        let reopened = FileStore::open(pal, &dir(), "prefs").unwrap();
        assert_eq!(reopened.get("unrelated"), Some(PrefValue::Int(1)));
        assert!(matches!(reopened.get("ratio"), Some(PrefValue::Float(f)) if f.is_nan()));
    }

    #[test]
    fn test_deferred_commit_persists_after_flush() {
        let mock = MockPal::new();
        let mut store = FileStore::open(PalHandle::new(mock.clone()), &dir(), "prefs").unwrap();

        store
            .commit(batch(&[("count", PrefValue::Long(1))]), WriteMode::Deferred)
            .unwrap();
        assert_eq!(store.get("count"), Some(PrefValue::Long(1)));

        store.flush().unwrap();
        assert!(stored_json(&mock).contains("\"long\""));
    }

    #[test]
    fn test_deferred_commit_persists_on_drop() {
        let mock = MockPal::new();
        let pal = PalHandle::new(mock);
        {
            let mut store = FileStore::open(pal.clone(), &dir(), "prefs").unwrap();
            for i in 0..10 {
                store
                    .commit(batch(&[("count", PrefValue::Int(i))]), WriteMode::Deferred)
                    .unwrap();
            }
        }

        let store = FileStore::open(pal, &dir(), "prefs").unwrap();
        assert_eq!(store.get("count"), Some(PrefValue::Int(9)));
    }

    #[test]
    fn test_sync_commit_lands_after_pending_deferred_writes() {
        let mock = MockPal::new();
        let pal = PalHandle::new(mock);
        let mut store = FileStore::open(pal.clone(), &dir(), "prefs").unwrap();

        store
            .commit(batch(&[("a", PrefValue::Int(1))]), WriteMode::Deferred)
            .unwrap();
        store
            .commit(batch(&[("b", PrefValue::Int(2))]), WriteMode::Sync)
            .unwrap();

        let reopened = FileStore::open(pal, &dir(), "prefs").unwrap();
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_corrupt_file_fails_to_open() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("shared_prefs/prefs.json"), b"not json".to_vec());

        let err = FileStore::open(PalHandle::new(mock), &dir(), "prefs").unwrap_err();

        assert!(
            err.to_string()
                .starts_with("Failed to load preference store 'prefs': Serialization failed:")
        );
    }

    #[test]
    fn test_real_filesystem_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let pal = PalHandle::new(RealPal::new(temp_dir.path().to_path_buf()));
        {
            let mut store = FileStore::open(pal.clone(), &dir(), "settings").unwrap();
            store
                .commit(batch(&[("setting_theme", "dark".into())]), WriteMode::Sync)
                .unwrap();
        }

        assert!(temp_dir.path().join("shared_prefs/settings.json").exists());
        let store = FileStore::open(pal, &dir(), "settings").unwrap();
        assert_eq!(store.get("setting_theme"), Some(PrefValue::from("dark")));
    }
}
