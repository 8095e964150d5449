use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::audio::{AudioEngine, EngineEvent, LoadOptions, ResourceId, clamp_volume};
use crate::error::Severity;
use crate::library::{Playlist, Track};

use super::progress::{ProgressView, Thresholds};
use super::state::{PlaybackMode, PlaybackSession, PlaybackStatus};

/// Something the session controller should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// A track started loading.
    Loading { index: usize, name: String },
    /// A track went from Stopped to Playing. Resumes are not reported.
    Started { index: usize, track: Track },
    /// The engine learned the duration of the track at `index`.
    DurationResolved { index: usize, duration: Duration },
    Status { message: String, severity: Severity },
    /// Skip to the next track after this delay.
    AdvanceAfter(Duration),
}

impl PlayerEvent {
    fn status(message: impl Into<String>, severity: Severity) -> Self {
        PlayerEvent::Status {
            message: message.into(),
            severity,
        }
    }
}

/// Identifies one music load. A completion only applies while its ticket is
/// still the current one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct LoadTicket {
    id: ResourceId,
    generation: u64,
}

#[derive(Debug, Copy, Clone)]
struct Pending {
    ticket: LoadTicket,
    autoplay: bool,
}

/// The single music channel: one current track, its mode and progress.
#[derive(Debug)]
pub struct MusicPlayer {
    session: PlaybackSession,
    resource: Option<ResourceId>,
    generation: u64,
    pending: Option<Pending>,
    progress: ProgressView,
    thresholds: Thresholds,
    advance_delay: Duration,
}

impl MusicPlayer {
    pub fn new(
        mode: PlaybackMode,
        volume: f32,
        text_interval: Duration,
        thresholds: Thresholds,
        advance_delay: Duration,
    ) -> Self {
        Self {
            session: PlaybackSession {
                mode,
                volume: clamp_volume(volume),
                ..PlaybackSession::default()
            },
            resource: None,
            generation: 0,
            pending: None,
            progress: ProgressView::new(text_interval),
            thresholds,
            advance_delay,
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn status(&self) -> PlaybackStatus {
        self.session.status
    }

    pub fn is_playing(&self) -> bool {
        self.session.status == PlaybackStatus::Playing
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn mode(&self) -> PlaybackMode {
        self.session.mode
    }

    pub fn index(&self) -> Option<usize> {
        self.session.index
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.session.current_track.as_ref()
    }

    pub fn progress(&self) -> &ProgressView {
        &self.progress
    }

    /// Whether `id` is the resource this player currently holds.
    pub fn owns(&self, id: ResourceId) -> bool {
        self.resource == Some(id)
    }

    /// Replace the current track with `playlist[index]` and start loading it.
    /// Out-of-range indices are ignored.
    pub fn load_track<E: AudioEngine>(
        &mut self,
        engine: &mut E,
        playlist: &Playlist,
        index: usize,
    ) -> Vec<PlayerEvent> {
        let Some(track) = playlist.get(index) else {
            debug!("load_track({index}) out of range ({} tracks)", playlist.len());
            return Vec::new();
        };

        self.release(engine);
        self.generation += 1;

        let options = LoadOptions::music(
            self.session.volume,
            self.session.muted,
            self.session.mode.loops(),
        );
        let id = engine.load(&track.path, options);
        self.resource = Some(id);
        self.pending = Some(Pending {
            ticket: LoadTicket {
                id,
                generation: self.generation,
            },
            autoplay: false,
        });

        self.session.current_track = Some(track.clone());
        self.session.index = Some(index);
        self.session.status = PlaybackStatus::Stopped;
        self.progress.reset();

        info!("loading track {index}: {}", track.display_name);
        vec![PlayerEvent::Loading {
            index,
            name: track.display_name.clone(),
        }]
    }

    /// Load `playlist[index]` and start it as soon as it is ready.
    pub fn load_and_play<E: AudioEngine>(
        &mut self,
        engine: &mut E,
        playlist: &Playlist,
        index: usize,
    ) -> Vec<PlayerEvent> {
        let events = self.load_track(engine, playlist, index);
        if let Some(p) = self.pending.as_mut() {
            p.autoplay = true;
        }
        events
    }

    /// Start or resume. While a load is pending this arms autoplay; after
    /// `stop` released the resource the current track is reloaded.
    pub fn play<E: AudioEngine>(&mut self, engine: &mut E, playlist: &Playlist) -> Vec<PlayerEvent> {
        match self.session.status {
            PlaybackStatus::Playing => Vec::new(),
            PlaybackStatus::Paused => {
                if let Some(id) = self.resource {
                    engine.play(id);
                    self.session.status = PlaybackStatus::Playing;
                }
                Vec::new()
            }
            PlaybackStatus::Stopped => {
                if let Some(p) = self.pending.as_mut() {
                    p.autoplay = true;
                    return Vec::new();
                }
                match (self.resource, self.session.index) {
                    (Some(id), _) => self.start(engine, id),
                    (None, Some(index)) => self.load_and_play(engine, playlist, index),
                    (None, None) => Vec::new(),
                }
            }
        }
    }

    pub fn pause<E: AudioEngine>(&mut self, engine: &mut E) {
        if self.session.status != PlaybackStatus::Playing {
            return;
        }
        if let Some(id) = self.resource {
            engine.pause(id);
        }
        self.session.status = PlaybackStatus::Paused;
    }

    /// Stop and release the resource. The current track stays selected.
    pub fn stop<E: AudioEngine>(&mut self, engine: &mut E) {
        self.release(engine);
        self.session.status = PlaybackStatus::Stopped;
        self.progress.reset();
    }

    /// Stop and forget the current track (used when the playlist goes away).
    pub fn clear<E: AudioEngine>(&mut self, engine: &mut E) {
        self.stop(engine);
        self.session.current_track = None;
        self.session.index = None;
    }

    /// Jump to `percent` (0-100) of the track. No-op while the duration is
    /// unknown.
    pub fn seek<E: AudioEngine>(&mut self, engine: &mut E, percent: f64) {
        let Some(id) = self.resource.filter(|_| self.pending.is_none()) else {
            return;
        };
        let Some(duration) = self.duration(engine, id) else {
            return;
        };
        let target = duration * (percent.clamp(0.0, 100.0) / 100.0);
        let actual = engine.seek(id, target);
        debug!("seek to {actual:.1}s of {duration:.1}s");
        self.progress
            .update(actual, Some(duration), Instant::now(), self.thresholds);
    }

    pub fn next<E: AudioEngine>(&mut self, engine: &mut E, playlist: &Playlist) -> Vec<PlayerEvent> {
        if playlist.is_empty() {
            return Vec::new();
        }
        let target = self.session.index.map_or(0, |i| (i + 1) % playlist.len());
        self.load_and_play(engine, playlist, target)
    }

    pub fn previous<E: AudioEngine>(
        &mut self,
        engine: &mut E,
        playlist: &Playlist,
    ) -> Vec<PlayerEvent> {
        if playlist.is_empty() {
            return Vec::new();
        }
        let len = playlist.len();
        let target = self.session.index.map_or(0, |i| (i + len - 1) % len);
        self.load_and_play(engine, playlist, target)
    }

    pub fn set_mode<E: AudioEngine>(&mut self, engine: &mut E, mode: PlaybackMode) {
        self.session.mode = mode;
        if let Some(id) = self.resource {
            engine.set_looping(id, mode.loops());
        }
    }

    pub fn set_volume<E: AudioEngine>(&mut self, engine: &mut E, volume: f32) {
        self.session.volume = clamp_volume(volume);
        if let Some(id) = self.resource {
            engine.set_volume(id, self.session.volume);
        }
    }

    pub fn set_muted<E: AudioEngine>(&mut self, engine: &mut E, muted: bool) {
        self.session.muted = muted;
        if let Some(id) = self.resource {
            engine.set_muted(id, muted);
        }
    }

    /// Refresh progress from the engine. Called every frame while playing.
    pub fn tick<E: AudioEngine>(&mut self, engine: &E, now: Instant) {
        let Some(id) = self.resource else {
            return;
        };
        let position = engine.position(id);
        let duration = self.duration(engine, id);
        self.progress.update(position, duration, now, self.thresholds);
    }

    /// Apply an engine event. Events for loads that are no longer current are
    /// dropped, and a late `Loaded` releases the orphaned resource.
    pub fn handle_event<E: AudioEngine>(
        &mut self,
        engine: &mut E,
        playlist: &Playlist,
        event: &EngineEvent,
    ) -> Vec<PlayerEvent> {
        let id = event.id();
        let current = self.pending.filter(|p| {
            p.ticket
                == LoadTicket {
                    id,
                    generation: self.generation,
                }
        });

        match event {
            EngineEvent::Loaded { duration, .. } => match current {
                Some(pending) => self.on_loaded(engine, pending, *duration),
                None => {
                    if !self.owns(id) {
                        debug!("discarding stale load {id}");
                        engine.unload(id);
                    }
                    Vec::new()
                }
            },
            EngineEvent::LoadFailed { error, .. } => {
                if current.is_none() {
                    debug!("ignoring failure of stale load {id}");
                    return Vec::new();
                }
                self.pending = None;
                self.resource = None;
                engine.unload(id);
                self.session.status = PlaybackStatus::Stopped;

                let name = self.track_name();
                warn!("failed to load {name}: {error}");
                let mut events = vec![PlayerEvent::status(
                    format!("Cannot load {name}: {error}"),
                    Severity::Error,
                )];
                if self.session.mode == PlaybackMode::Sequential && playlist.len() > 1 {
                    events.push(PlayerEvent::AdvanceAfter(self.advance_delay));
                }
                events
            }
            EngineEvent::PlayFailed { error, .. } => {
                if !self.owns(id) {
                    return Vec::new();
                }
                self.session.status = PlaybackStatus::Stopped;
                self.progress.reset();
                let name = self.track_name();
                warn!("failed to play {name}: {error}");
                vec![PlayerEvent::status(
                    format!("Cannot play {name}: {error}"),
                    Severity::Error,
                )]
            }
            EngineEvent::Ended { .. } => {
                if !self.owns(id) {
                    return Vec::new();
                }
                self.on_track_end(engine, playlist)
            }
        }
    }

    fn on_loaded<E: AudioEngine>(
        &mut self,
        engine: &mut E,
        pending: Pending,
        duration: Option<f64>,
    ) -> Vec<PlayerEvent> {
        self.pending = None;
        let mut events = Vec::new();

        if let (Some(secs), Some(index)) = (duration.filter(|d| *d > 0.0), self.session.index) {
            let d = Duration::from_secs_f64(secs);
            if let Some(track) = self.session.current_track.as_mut() {
                track.duration = Some(d);
            }
            events.push(PlayerEvent::DurationResolved { index, duration: d });
        }

        if pending.autoplay {
            events.extend(self.start(engine, pending.ticket.id));
        }
        events
    }

    fn on_track_end<E: AudioEngine>(
        &mut self,
        engine: &mut E,
        playlist: &Playlist,
    ) -> Vec<PlayerEvent> {
        match self.session.mode {
            PlaybackMode::Sequential => self.next(engine, playlist),
            PlaybackMode::Single => {
                self.session.status = PlaybackStatus::Stopped;
                self.progress.reset();
                vec![PlayerEvent::status(
                    format!("Finished: {}", self.track_name()),
                    Severity::Info,
                )]
            }
            // The engine loops on its own; an end here means the flag was
            // cleared too late. Keep going.
            PlaybackMode::Loop => {
                if let Some(id) = self.resource {
                    engine.play(id);
                }
                Vec::new()
            }
        }
    }

    fn start<E: AudioEngine>(&mut self, engine: &mut E, id: ResourceId) -> Vec<PlayerEvent> {
        engine.play(id);
        self.session.status = PlaybackStatus::Playing;
        match (self.session.index, self.session.current_track.clone()) {
            (Some(index), Some(track)) => vec![PlayerEvent::Started { index, track }],
            _ => Vec::new(),
        }
    }

    fn release<E: AudioEngine>(&mut self, engine: &mut E) {
        if let Some(id) = self.resource.take() {
            engine.stop(id);
            engine.unload(id);
        }
        self.pending = None;
    }

    fn duration<E: AudioEngine>(&self, engine: &E, id: ResourceId) -> Option<f64> {
        engine
            .duration(id)
            .or_else(|| {
                self.session
                    .current_track
                    .as_ref()
                    .and_then(|t| t.duration)
                    .map(|d| d.as_secs_f64())
            })
            .filter(|d| *d > 0.0)
    }

    fn track_name(&self) -> String {
        self.session
            .current_track
            .as_ref()
            .map_or_else(|| "track".to_string(), |t| t.display_name.clone())
    }
}
