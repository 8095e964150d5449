//! Small JSON state files kept next to the settings file.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

use super::load::config_dir;

const FOLDER_FILE: &str = "folder.json";

/// The music folder choice made inside the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedConfig {
    pub music_folder: Option<PathBuf>,
    pub first_run: bool,
}

impl Default for PersistedConfig {
    fn default() -> Self {
        Self {
            music_folder: None,
            first_run: true,
        }
    }
}

impl PersistedConfig {
    pub fn default_path() -> Option<PathBuf> {
        config_dir().map(|d| d.join(FOLDER_FILE))
    }

    /// Load from `path`; a missing file is the first run.
    pub fn load_from(path: &Path) -> Result<Self, PersistenceError> {
        Ok(read_json(path)?.unwrap_or_default())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), PersistenceError> {
        write_json(path, self)
    }

    /// Record a chosen folder; the setup prompt is not shown again.
    pub fn set_music_folder(&mut self, folder: PathBuf) {
        self.music_folder = Some(folder);
        self.first_run = false;
    }
}

/// Read a JSON file. `Ok(None)` when it does not exist.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    Ok(Some(serde_json::from_str(&text)?))
}

/// Write `value` as pretty JSON through a temporary file and a rename, so a
/// crash never leaves a truncated file behind.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let io_err = |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let text = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    debug!("saved {}", path.display());
    Ok(())
}
