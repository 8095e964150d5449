use std::path::{Path, PathBuf};

use crate::audio::ResourceId;

/// Number of effect pads on the desk.
pub const PAD_COUNT: usize = 12;

/// One effect pad.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PadSlot {
    pub index: usize,
    pub assigned_path: Option<PathBuf>,
    pub display_name: String,
    pub(super) resource: Option<ResourceId>,
    pub(super) pending_load: bool,
    pub(super) is_playing: bool,
    pub(super) progress: f64,
}

impl PadSlot {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            display_name: default_name(index),
            ..Self::default()
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_path.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.pending_load
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Playback progress of the running trigger in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn resource(&self) -> Option<ResourceId> {
        self.resource
    }
}

/// "Pad 1" for index 0.
pub fn default_name(index: usize) -> String {
    format!("Pad {}", index + 1)
}

/// File stem of `path`, or the default pad name.
pub fn name_from_path(path: &Path, index: usize) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| default_name(index), str::to_string)
}

/// Result of pressing a pad.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Nothing assigned; no resource was created.
    NotConfigured,
    /// First trigger: the sound is loading and plays when ready.
    Loading,
    /// A load is already in flight; the press was ignored.
    AlreadyLoading,
    /// Still playing from an earlier press; the press was ignored.
    AlreadyPlaying,
    Playing,
    /// No such pad.
    OutOfRange,
}
