use relative_path::{RelativePath, RelativePathBuf};
use std::path::Path;

/* 📖 # Why use RelativePathBuf for FilePath?

Store files always live below the PAL's base directory. Wrapping RelativePathBuf
makes that explicit in the type: a FilePath cannot carry an absolute system path,
and store names are validated before they are ever joined onto a directory.
*/

/// Type-safe wrapper for file paths relative to the PAL base directory.
///
/// # Examples
///
/// ```
/// use prefkit_base::FilePath;
///
/// let dir = FilePath::from("shared_prefs");
/// let file = dir.join("prefs.json");
/// assert_eq!(file.to_string(), "shared_prefs/prefs.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePath(RelativePathBuf);

impl FilePath {
    /// Returns the underlying RelativePath.
    pub fn as_relative(&self) -> &RelativePath {
        &self.0
    }

    /// Converts to a regular Path, without any base directory.
    pub fn as_path(&self) -> &Path {
        Path::new(self.as_relative().as_str())
    }

    /// Appends a path component.
    pub fn join(&self, name: impl AsRef<str>) -> FilePath {
        Self(self.0.join(name.as_ref()))
    }

    /// Returns the containing directory, if there is one.
    pub fn parent(&self) -> Option<FilePath> {
        self.0
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .map(|parent| Self(parent.to_relative_path_buf()))
    }

    /// Returns a sibling path with the given extension appended to the file name.
    ///
    /// Used for temporary files written next to their target.
    pub fn with_added_extension(&self, extension: &str) -> FilePath {
        Self(RelativePathBuf::from(format!("{}.{}", self.0, extension)))
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<&RelativePath> for FilePath {
    fn from(p: &RelativePath) -> Self {
        Self(p.to_relative_path_buf())
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<RelativePath> for FilePath {
    fn as_ref(&self) -> &RelativePath {
        &self.0
    }
}
