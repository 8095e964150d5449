//! Error taxonomy for the sound desk.
//!
//! Every expected failure is converted into a severity-tagged status line at
//! the component boundary; nothing here is meant to terminate the process.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The music folder is missing or unusable. Recoverable by reconfiguring.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("No music folder selected")]
    NotConfigured,

    #[error("Music folder does not exist: {0}")]
    FolderMissing(PathBuf),

    #[error("Music folder is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Music folder could not be read: {path}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A track or pad file could not be opened or decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Cannot open {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("Cannot decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Unsupported audio file: {0}")]
    Unsupported(PathBuf),

    #[error("Audio output is not available")]
    NoDevice,
}

/// Playback could not be started or broke down mid-play.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Nothing is loaded for this resource")]
    NotLoaded,

    #[error("Audio device failure: {0}")]
    Device(String),
}

/// Session state could not be saved or restored. Always degrades to defaults.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("State file I/O failed for {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("State file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures starting the audio engine itself.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No audio output device: {0}")]
    NoOutputDevice(String),

    #[error("Failed to spawn audio thread")]
    ThreadSpawn(#[source] std::io::Error),
}

/// Severity attached to every status message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}
