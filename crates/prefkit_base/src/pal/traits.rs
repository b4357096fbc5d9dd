use std::io::{Read, Seek, Write};
use std::sync::Arc;

use crate::PrefResult;

use super::file_path::FilePath;

/// Trait combining Read + Seek for file operations.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/* 📖 # Why is Pal a trait instead of a struct?

The file-backed preference store only needs a handful of filesystem operations.
Putting them behind a trait lets the store be tested against MockPal, including
injected write failures that are hard to provoke on a real disk.
*/

/// Platform Abstraction Layer (PAL) trait providing filesystem operations.
///
/// Two implementations are provided:
/// - `RealPal`: Uses the real filesystem via `std::fs`
/// - `MockPal`: In-memory implementation for testing
pub trait Pal: std::fmt::Debug + Send + Sync + 'static {
    /// Check if a file exists at the given path.
    fn file_exists(&self, path: &FilePath) -> PrefResult<bool>;

    /// Open a file for reading.
    fn read_file(&self, path: &FilePath) -> PrefResult<Box<dyn ReadSeek + 'static>>;

    /// Read entire file contents as a UTF-8 string.
    fn read_file_to_string(&self, path: &FilePath) -> PrefResult<String> {
        let mut reader = self.read_file(path)?;
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).map_err(|e| {
            Box::new(crate::PrefError::new(crate::error::ErrorKind::FileError {
                path: path.as_path().to_path_buf(),
                source: e,
            }))
        })?;
        String::from_utf8(contents).map_err(|_e| crate::err!("File is not valid UTF-8: {}", path))
    }

    /// Create a new file, overwriting if it exists.
    fn create_file(&self, path: &FilePath) -> PrefResult<Box<dyn Write>>;

    /// Create a directory and all parent directories.
    fn create_directory_all(&self, path: &FilePath) -> PrefResult<()>;

    /// Atomically replace `to` with `from`.
    fn rename_file(&self, from: &FilePath, to: &FilePath) -> PrefResult<()>;
}

/// Handle to a PAL implementation, enabling shared ownership.
///
/// # Examples
///
/// ```no_run
/// use prefkit_base::{PalHandle, RealPal};
///
/// let pal = PalHandle::new(RealPal::new(".".into()));
/// let pal_clone = pal.clone(); // Cheap clone, shares the same implementation
/// ```
#[derive(Debug, Clone)]
pub struct PalHandle(Arc<dyn Pal>);

impl PalHandle {
    /// Create a new PalHandle from a Pal implementation.
    pub fn new(pal: impl Pal + 'static) -> Self {
        Self(Arc::new(pal))
    }
}

impl std::ops::Deref for PalHandle {
    type Target = dyn Pal;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pal::MockPal;

    #[test]
    fn test_pal_handle_shares_implementation() {
        let mock = MockPal::new();
        let pal = PalHandle::new(mock.clone());
        let pal_clone = pal.clone();

        mock.add_file(FilePath::from("prefs.json"), b"{}".to_vec());
        assert!(pal.file_exists(&FilePath::from("prefs.json")).unwrap());
        assert!(pal_clone.file_exists(&FilePath::from("prefs.json")).unwrap());
    }

    #[test]
    fn test_read_file_to_string_invalid_utf8() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("bad.json"), vec![0xFF, 0xFE]);

        let result = mock.read_file_to_string(&FilePath::from("bad.json"));
        assert_eq!(
            result.unwrap_err().to_string(),
            "File is not valid UTF-8: bad.json"
        );
    }
}
