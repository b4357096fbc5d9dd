use serde::Deserialize;
use tracing::{debug, instrument};

use prefkit_base::{ErrorKind, FilePath, PalHandle, PrefError, PrefResult, ResultExt};

/// Where a scope keeps its stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One JSON file per store below `directory`.
    #[default]
    File,
    /// Nothing is persisted.
    Memory,
}

/// Configuration for a [`crate::PreferenceScope`], usually read from `prefkit.toml`.
///
/// ```toml
/// directory = "shared_prefs"
/// default_name = "default_preferences"
/// backend = "file"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrefsConfig {
    /// Directory holding the store files, relative to the PAL base directory.
    pub directory: String,
    /// Name of the store returned by `open_default`.
    pub default_name: String,
    pub backend: Backend,
}

impl Default for PrefsConfig {
    fn default() -> Self {
        Self {
            directory: "shared_prefs".to_string(),
            default_name: "default_preferences".to_string(),
            backend: Backend::File,
        }
    }
}

impl PrefsConfig {
    pub fn directory_path(&self) -> FilePath {
        FilePath::from(self.directory.as_str())
    }
}

/// Loads the configuration at `path`, falling back to the defaults if the file
/// does not exist.
#[instrument(skip(pal), fields(path = %path))]
pub fn load_config(pal: &PalHandle, path: &FilePath) -> PrefResult<PrefsConfig> {
    if !pal.file_exists(path)? {
        debug!("no configuration file, using defaults");
        return Ok(PrefsConfig::default());
    }
    let text = pal.read_file_to_string(path)?;
    let config = toml::from_str::<PrefsConfig>(&text)
        .map_err(|e| {
            Box::new(PrefError::new(ErrorKind::Serialization {
                message: e.message().to_string(),
            }))
        })
        .with_context(|| format!("Failed to parse configuration '{}'", path))?;
    debug!(?config, "loaded configuration");
    Ok(config)
}
