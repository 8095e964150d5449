use crate::audio::AudioEngine;
use crate::library::Track;
use crate::mpris::MediaSession;
use crate::player::PlaybackStatus;
use crate::session::Controller;

/// Last now-playing state published to the desktop.
#[derive(Debug, Default)]
pub struct MprisSync {
    last: Option<(PlaybackStatus, Option<usize>, Option<Track>)>,
}

impl MprisSync {
    /// Publish when the status, the track or its resolved metadata changed.
    pub fn update<E: AudioEngine>(&mut self, media: &dyn MediaSession, desk: &Controller<E>) {
        let player = desk.player();
        let current = (
            player.status(),
            player.index(),
            player.current_track().cloned(),
        );
        if self.last.as_ref() == Some(&current) {
            return;
        }
        media.set_track_metadata(current.1, current.2.as_ref());
        media.set_playback(current.0);
        self.last = Some(current);
    }
}
