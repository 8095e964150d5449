use std::path::Path;
use std::time::Duration;

use lofty::prelude::*;

/// Shown wherever a track has no artist tag.
pub const UNKNOWN_PERFORMER: &str = "Unknown performer";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioMetadata {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
}

/// Read tag fields and the duration from `path`. Unreadable files yield
/// empty metadata.
pub fn read_audio_metadata(path: &Path) -> AudioMetadata {
    let Ok(tagged) = lofty::read_from_path(path) else {
        return AudioMetadata::default();
    };
    let duration = Some(tagged.properties().duration()).filter(|d| !d.is_zero());
    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return AudioMetadata {
            duration,
            ..AudioMetadata::default()
        };
    };

    AudioMetadata {
        artist: non_empty(tag.artist().as_deref()),
        title: non_empty(tag.title().as_deref()),
        album: non_empty(tag.album().as_deref()),
        duration,
    }
}

/// Duration from container properties, when the file can be parsed.
pub fn probe_duration(path: &Path) -> Option<Duration> {
    let tagged = lofty::read_from_path(path).ok()?;
    let d = tagged.properties().duration();
    (!d.is_zero()).then_some(d)
}

fn non_empty(v: Option<&str>) -> Option<String> {
    v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
