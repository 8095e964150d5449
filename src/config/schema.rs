use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/stagemix/config.toml` or `~/.config/stagemix/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `STAGEMIX__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub playback: PlaybackSettings,
    pub ui: UiSettings,
    pub library: LibrarySettings,
    pub media_keys: MediaKeySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
    /// Volume change per arrow key press, in percent.
    pub volume_step_percent: u8,
    /// Quiet period before a volume change is written to the session file (milliseconds).
    pub volume_save_debounce_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            quit_fade_out_ms: 500,
            volume_step_percent: 1,
            volume_save_debounce_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Mode used when no saved session says otherwise.
    pub default_mode: PlaybackModeSetting,
    /// Music volume used when no saved session exists (0.0 - 1.0).
    pub music_volume: f32,
    /// Effects volume used when no saved session exists (0.0 - 1.0).
    pub effects_volume: f32,
    /// Delay before skipping past a track that failed to load (milliseconds).
    pub auto_advance_delay_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            default_mode: PlaybackModeSetting::Sequential,
            music_volume: 0.7,
            effects_volume: 0.7,
            auto_advance_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackModeSetting {
    #[serde(alias = "seq", alias = "next", alias = "loop-all")]
    Sequential,
    #[serde(alias = "repeat", alias = "repeat-one", alias = "loop-one")]
    Loop,
    #[serde(alias = "once", alias = "stop")]
    Single,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,

    /// Target time per frame (milliseconds).
    pub frame_ms: u64,

    /// Minimum interval between updates of the textual time display (milliseconds).
    pub time_text_refresh_ms: u64,

    /// Pad progress refresh interval (milliseconds).
    pub pad_progress_ms: u64,

    /// Remaining seconds at or below which time displays turn to warning.
    pub warning_secs: u64,

    /// Remaining seconds at or below which time displays turn to danger.
    pub danger_secs: u64,

    /// Which time fields to show for the now-playing line, and in what order.
    ///
    /// Example: ["elapsed", "total", "remaining"]
    pub now_playing_time_fields: Vec<TimeField>,

    /// Separator used to join `now_playing_time_fields`.
    pub now_playing_time_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ stagemix ~ ".to_string(),
            frame_ms: 16,
            time_text_refresh_ms: 250,
            pad_progress_ms: 50,
            warning_secs: 30,
            danger_secs: 10,
            now_playing_time_fields: vec![TimeField::Elapsed, TimeField::Total, TimeField::Remaining],
            now_playing_time_separator: " / ".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeField {
    Elapsed,
    Total,
    Remaining,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Music folder to use instead of the one chosen in the app.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_folder: Option<PathBuf>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: ["mp3", "wav", "ogg", "flac", "m4a", "aac", "opus", "webm"]
                .into_iter()
                .map(String::from)
                .collect(),
            include_hidden: false,
            music_folder: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaKeySettings {
    /// Register an MPRIS player on the session bus.
    pub enabled: bool,
}

impl Default for MediaKeySettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}
