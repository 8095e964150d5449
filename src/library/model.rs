use std::path::PathBuf;
use std::time::Duration;

use super::metadata::UNKNOWN_PERFORMER;

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// File stem, shown in the track list.
    pub display_name: String,
    pub filename: String,
    pub path: PathBuf,
    /// Lowercase, without the dot.
    pub extension: String,
    /// Resolved lazily; `None` until probed or when the format hides it.
    pub duration: Option<Duration>,
    /// Resolved lazily; `None` until probed or when the file has no tag.
    pub artist: Option<String>,
    /// Set once the background lookup has run for this track.
    pub resolved: bool,
}

impl Track {
    pub fn artist_or_unknown(&self) -> &str {
        self.artist.as_deref().unwrap_or(UNKNOWN_PERFORMER)
    }
}

/// One playlist folder with its tracks in natural order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playlist {
    pub name: String,
    pub path: PathBuf,
    /// Bumped on every switch so late metadata for an old list is ignored.
    pub generation: u64,
    pub tracks: Vec<Track>,
}

impl Playlist {
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Write resolved metadata into the track at `index`. Ignored when it
    /// belongs to another generation.
    pub fn apply(&mut self, resolved: &Resolved) -> bool {
        if resolved.generation != self.generation {
            return false;
        }
        let Some(track) = self.tracks.get_mut(resolved.index) else {
            return false;
        };
        if track.path != resolved.path {
            return false;
        }
        track.artist = resolved.artist.clone();
        track.resolved = true;
        if resolved.duration.is_some() {
            track.duration = resolved.duration;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistInfo {
    pub name: String,
    pub path: PathBuf,
    pub track_count: usize,
}

/// Metadata resolved in the background for one track.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub generation: u64,
    pub index: usize,
    pub path: PathBuf,
    pub artist: Option<String>,
    pub duration: Option<Duration>,
}
