use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::PrefError;
use crate::PrefResult;
use crate::error::ErrorKind;

use super::FilePath;
use super::traits::{Pal, ReadSeek};

/* 📖 # Why can MockPal fail writes on demand?

A commit reports failure as `false`, and the only realistic way a commit fails is
the disk refusing the write. `fail_writes(true)` makes every mutating call return
a FileError so that path can be tested without a read-only filesystem.
*/

/// In-memory PAL implementation for testing.
///
/// # Examples
///
/// ```
/// use prefkit_base::{pal::MockPal, Pal, FilePath};
///
/// let mock = MockPal::new();
/// mock.add_file(FilePath::from("prefs.json"), b"{}".to_vec());
/// let content = mock.read_file_to_string(&FilePath::from("prefs.json")).unwrap();
/// assert_eq!(content, "{}");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockPal {
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    directories: Arc<Mutex<HashSet<FilePath>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MockPal {
    /// Create a new empty MockPal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the mock storage.
    pub fn add_file(&self, path: FilePath, content: Vec<u8>) {
        self.files.lock().insert(path, content);
    }

    /// Returns the content of a file, if present.
    pub fn file_content(&self, path: &FilePath) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }

    /// Returns true if the directory was created through this PAL.
    pub fn directory_exists(&self, path: &FilePath) -> bool {
        self.directories.lock().contains(path)
    }

    /// Make every subsequent write operation fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    fn check_writable(&self, path: &FilePath) -> PrefResult<()> {
        if *self.fail_writes.lock() {
            return Err(Box::new(PrefError::new(ErrorKind::FileError {
                path: path.as_path().to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "writes disabled in MockPal",
                ),
            })));
        }
        Ok(())
    }

    fn not_found(path: &FilePath) -> Box<PrefError> {
        Box::new(PrefError::new(ErrorKind::FileError {
            path: path.as_path().to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path),
            ),
        }))
    }
}

impl Pal for MockPal {
    fn file_exists(&self, path: &FilePath) -> PrefResult<bool> {
        Ok(self.files.lock().contains_key(path))
    }

    fn read_file(&self, path: &FilePath) -> PrefResult<Box<dyn ReadSeek + 'static>> {
        let content = self
            .files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| Self::not_found(path))?;
        Ok(Box::new(Cursor::new(content)))
    }

    fn create_file(&self, path: &FilePath) -> PrefResult<Box<dyn Write>> {
        self.check_writable(path)?;
        // Content lands in the mock storage when the writer is dropped
        Ok(Box::new(MockFileWriter {
            path: path.clone(),
            files: Arc::clone(&self.files),
            buffer: Vec::new(),
        }))
    }

    fn create_directory_all(&self, path: &FilePath) -> PrefResult<()> {
        self.check_writable(path)?;
        self.directories.lock().insert(path.clone());
        Ok(())
    }

    fn rename_file(&self, from: &FilePath, to: &FilePath) -> PrefResult<()> {
        self.check_writable(to)?;
        let mut files = self.files.lock();
        let content = files.remove(from).ok_or_else(|| Self::not_found(from))?;
        files.insert(to.clone(), content);
        Ok(())
    }
}

/// Helper struct for writing files to MockPal.
struct MockFileWriter {
    path: FilePath,
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    buffer: Vec<u8>,
}

impl Write for MockFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for MockFileWriter {
    fn drop(&mut self) {
        self.files
            .lock()
            .insert(self.path.clone(), std::mem::take(&mut self.buffer));
    }
}
