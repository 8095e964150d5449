//! The session file: pad assignments, channel volumes and playback mode,
//! restored at startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{config_dir, read_json, write_json};
use crate::error::PersistenceError;
use crate::player::PlaybackMode;

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PadEntry {
    pub index: usize,
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub pads: Vec<PadEntry>,
    pub music_volume: f32,
    pub effects_volume: f32,
    pub playback_mode: PlaybackMode,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            pads: Vec::new(),
            music_volume: 0.7,
            effects_volume: 0.7,
            playback_mode: PlaybackMode::Sequential,
        }
    }
}

impl SessionSnapshot {
    pub fn default_path() -> Option<PathBuf> {
        config_dir().map(|d| d.join(SESSION_FILE))
    }

    /// `Ok(None)` when no session has been saved yet.
    pub fn load_from(path: &Path) -> Result<Option<Self>, PersistenceError> {
        read_json(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), PersistenceError> {
        write_json(path, self)
    }
}
