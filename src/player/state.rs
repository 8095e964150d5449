use serde::{Deserialize, Serialize};

use crate::config::PlaybackModeSetting;
use crate::library::Track;

/// What happens when the current track ends.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Advance to the next track, wrapping to the first.
    #[default]
    Sequential,
    /// Repeat the current track.
    Loop,
    /// Stop after the current track.
    Single,
}

impl PlaybackMode {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackMode::Sequential => "sequential",
            PlaybackMode::Loop => "loop",
            PlaybackMode::Single => "single",
        }
    }

    /// Cycle `Sequential -> Loop -> Single`.
    pub fn cycle(self) -> Self {
        match self {
            PlaybackMode::Sequential => PlaybackMode::Loop,
            PlaybackMode::Loop => PlaybackMode::Single,
            PlaybackMode::Single => PlaybackMode::Sequential,
        }
    }

    pub fn loops(self) -> bool {
        self == PlaybackMode::Loop
    }
}

impl From<PlaybackModeSetting> for PlaybackMode {
    fn from(m: PlaybackModeSetting) -> Self {
        match m {
            PlaybackModeSetting::Sequential => PlaybackMode::Sequential,
            PlaybackModeSetting::Loop => PlaybackMode::Loop,
            PlaybackModeSetting::Single => PlaybackMode::Single,
        }
    }
}

/// The playback state of the music channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub current_track: Option<Track>,
    pub index: Option<usize>,
    pub mode: PlaybackMode,
    pub status: PlaybackStatus,
    pub volume: f32,
    pub muted: bool,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            current_track: None,
            index: None,
            mode: PlaybackMode::default(),
            status: PlaybackStatus::default(),
            volume: 0.7,
            muted: false,
        }
    }
}
