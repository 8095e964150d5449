use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Local;
use log::{debug, error, info, warn};

use crate::audio::{AudioEngine, clamp_volume};
use crate::config::{PersistedConfig, Settings};
use crate::error::{SetupError, Severity};
use crate::library::{self, MetadataResolver, Playlist, PlaylistInfo};
use crate::meter::{ChannelState, LevelMeter, Levels};
use crate::pads::{PAD_COUNT, PadBank, PadEvent, TriggerOutcome};
use crate::player::{MusicPlayer, PlaybackMode, PlayerEvent, RemainingLevel, Thresholds, format_clock};
use crate::scheduler::{Cadence, Scheduler};

use super::countdown::{Countdown, CountdownTick};
use super::history::{HistoryEntry, PlayHistory};
use super::hotkeys::Hotkey;
use super::snapshot::{PadEntry, SessionSnapshot};
use super::stats::SessionStats;
use super::status::StatusLine;

const SECOND: Duration = Duration::from_secs(1);

/// Every timer the session runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimerKey {
    /// Music progress, redrawn every frame while playing.
    MusicFrame,
    PadProgress(usize),
    /// Debounced write of the volumes to the session file.
    VolumeCommit,
    /// Skip past a track that failed to load.
    AutoAdvance,
    Clock,
    Countdown,
}

/// Where the session keeps its files. `None` disables that file.
#[derive(Debug, Clone, Default)]
pub struct SessionPaths {
    pub snapshot: Option<PathBuf>,
    pub folder: Option<PathBuf>,
}

impl SessionPaths {
    pub fn default_locations() -> Self {
        Self {
            snapshot: SessionSnapshot::default_path(),
            folder: PersistedConfig::default_path(),
        }
    }
}

/// What the playlist panel can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryState {
    /// No usable music folder; the setup prompt is shown.
    NeedsSetup(String),
    /// The folder is valid but holds no playlists.
    Empty,
    Ready,
    Error(String),
}

/// The sound desk session. All state lives here and is passed down into the
/// player and the pad bank; nothing is global.
pub struct Controller<E: AudioEngine> {
    engine: E,
    settings: Settings,
    paths: SessionPaths,
    folder_config: PersistedConfig,
    folder_override: Option<PathBuf>,
    library_state: LibraryState,
    playlists: Vec<PlaylistInfo>,
    playlist_index: Option<usize>,
    playlist: Playlist,
    next_generation: u64,
    resolver: Option<MetadataResolver>,
    player: MusicPlayer,
    pads: PadBank,
    meter: LevelMeter,
    scheduler: Scheduler<TimerKey>,
    music_volume: f32,
    effects_volume: f32,
    panic_muted: bool,
    locked: bool,
    history: PlayHistory,
    stats: SessionStats,
    countdown: Countdown,
    thresholds: Thresholds,
    status: StatusLine,
    clock_text: String,
}

impl<E: AudioEngine> Controller<E> {
    /// Restore the saved session and scan the music folder.
    /// `folder_override` (the command line) wins over the configured and the
    /// persisted folder for this run.
    pub fn new(
        engine: E,
        settings: Settings,
        paths: SessionPaths,
        folder_override: Option<PathBuf>,
    ) -> Self {
        let snapshot = paths
            .snapshot
            .as_deref()
            .and_then(|p| match SessionSnapshot::load_from(p) {
                Ok(s) => s,
                Err(e) => {
                    warn!("could not restore session from {}: {e}", p.display());
                    None
                }
            })
            .unwrap_or_else(|| SessionSnapshot {
                music_volume: settings.playback.music_volume,
                effects_volume: settings.playback.effects_volume,
                playback_mode: settings.playback.default_mode.into(),
                ..SessionSnapshot::default()
            });

        let folder_config = match paths.folder.as_deref() {
            Some(p) => PersistedConfig::load_from(p).unwrap_or_else(|e| {
                warn!("could not read {}: {e}", p.display());
                PersistedConfig::default()
            }),
            None => PersistedConfig::default(),
        };

        let thresholds = Thresholds {
            warning_secs: settings.ui.warning_secs,
            danger_secs: settings.ui.danger_secs,
        };
        let music_volume = clamp_volume(snapshot.music_volume);
        let effects_volume = clamp_volume(snapshot.effects_volume);

        let player = MusicPlayer::new(
            snapshot.playback_mode,
            music_volume,
            Duration::from_millis(settings.ui.time_text_refresh_ms),
            thresholds,
            Duration::from_millis(settings.playback.auto_advance_delay_ms),
        );
        let mut pads = PadBank::new(effects_volume, false);
        for entry in snapshot.pads.iter().filter(|e| e.index < PAD_COUNT) {
            pads.restore(entry.index, entry.path.clone(), &entry.name);
        }

        let mut scheduler = Scheduler::new();
        scheduler.schedule(TimerKey::Clock, Cadence::Every(SECOND), Instant::now());

        let folder_override = folder_override.or_else(|| settings.library.music_folder.clone());

        let mut controller = Self {
            engine,
            settings,
            paths,
            folder_config,
            folder_override,
            library_state: LibraryState::NeedsSetup(SetupError::NotConfigured.to_string()),
            playlists: Vec::new(),
            playlist_index: None,
            playlist: Playlist::default(),
            next_generation: 0,
            resolver: None,
            player,
            pads,
            meter: LevelMeter::new(),
            scheduler,
            music_volume,
            effects_volume,
            panic_muted: false,
            locked: false,
            history: PlayHistory::new(),
            stats: SessionStats::default(),
            countdown: Countdown::default(),
            thresholds,
            status: StatusLine::default(),
            clock_text: clock_now(),
        };
        controller.refresh_playlists();
        controller
    }

    /// Resolve artists and durations in the background for every playlist
    /// opened from now on.
    pub fn with_resolver(mut self, resolver: MetadataResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    // ----- read access for the UI -------------------------------------

    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[cfg(test)]
    pub(crate) fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    #[cfg(test)]
    pub(crate) fn scheduler(&self) -> &Scheduler<TimerKey> {
        &self.scheduler
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn library_state(&self) -> &LibraryState {
        &self.library_state
    }

    pub fn playlists(&self) -> &[PlaylistInfo] {
        &self.playlists
    }

    pub fn playlist_index(&self) -> Option<usize> {
        self.playlist_index
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn player(&self) -> &MusicPlayer {
        &self.player
    }

    pub fn pads(&self) -> &PadBank {
        &self.pads
    }

    pub fn levels(&self) -> Levels {
        self.meter.levels()
    }

    pub fn music_volume(&self) -> f32 {
        self.music_volume
    }

    pub fn effects_volume(&self) -> f32 {
        self.effects_volume
    }

    pub fn is_panic_muted(&self) -> bool {
        self.panic_muted
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn history(&self) -> &PlayHistory {
        &self.history
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn countdown_level(&self) -> RemainingLevel {
        self.countdown.level(self.thresholds)
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Local wall clock, refreshed every second.
    pub fn clock_text(&self) -> &str {
        &self.clock_text
    }

    pub fn session_time(&self, now: Instant) -> String {
        format_clock(self.stats.elapsed(now).as_secs_f64())
    }

    /// `(position, total)` of the current track, 1-based.
    pub fn track_counter(&self) -> Option<(usize, usize)> {
        let index = self.player.index()?;
        (!self.playlist.is_empty()).then(|| (index + 1, self.playlist.len()))
    }

    /// The folder in use: the command line or config override, else the
    /// folder chosen in the app.
    pub fn music_folder(&self) -> Option<PathBuf> {
        self.folder_override
            .clone()
            .or_else(|| self.folder_config.music_folder.clone())
    }

    pub fn is_first_run(&self) -> bool {
        self.folder_config.first_run && self.music_folder().is_none()
    }

    // ----- library ------------------------------------------------------

    /// Rescan the music folder. The open playlist stays loaded.
    pub fn refresh_playlists(&mut self) {
        let Some(root) = self.music_folder() else {
            self.playlists.clear();
            self.playlist_index = None;
            self.library_state = LibraryState::NeedsSetup(SetupError::NotConfigured.to_string());
            return;
        };

        match library::list_playlists(&root, &self.settings.library) {
            Ok(found) => {
                let open = self
                    .playlist_index
                    .and_then(|i| self.playlists.get(i))
                    .map(|p| p.path.clone());
                self.playlists = found;
                self.playlist_index =
                    open.and_then(|path| self.playlists.iter().position(|p| p.path == path));
                self.library_state = if self.playlists.is_empty() {
                    LibraryState::Empty
                } else {
                    LibraryState::Ready
                };
                info!("{} playlists in {}", self.playlists.len(), root.display());
            }
            Err(e) => {
                self.playlists.clear();
                self.playlist_index = None;
                let message = e.to_string();
                if matches!(e, SetupError::Unreadable { .. }) {
                    self.library_state = LibraryState::Error(message.clone());
                    self.set_status(message, Severity::Error);
                } else {
                    self.library_state = LibraryState::NeedsSetup(message.clone());
                    self.set_status(message, Severity::Warning);
                }
            }
        }
    }

    /// Choose a new music folder and remember it.
    pub fn set_music_folder(&mut self, folder: PathBuf) -> bool {
        if let Err(e) = library::check_music_folder(&folder) {
            self.set_status(e.to_string(), Severity::Error);
            return false;
        }
        self.folder_config.set_music_folder(folder.clone());
        if let Some(path) = self.paths.folder.as_deref() {
            if let Err(e) = self.folder_config.save_to(path) {
                warn!("could not save music folder: {e}");
            }
        }
        self.folder_override = None;
        self.playlist_index = None;
        self.refresh_playlists();
        if self.library_state == LibraryState::Ready || self.library_state == LibraryState::Empty {
            self.set_status(format!("Music folder: {}", folder.display()), Severity::Success);
        }
        true
    }

    /// Open playlist `index`. Current music stops and the first track is
    /// loaded, ready to play.
    pub fn select_playlist(&mut self, index: usize) {
        let Some(info) = self.playlists.get(index).cloned() else {
            return;
        };
        let tracks = library::list_tracks(&info.path, &self.settings.library);

        self.player.clear(&mut self.engine);
        self.scheduler.cancel(TimerKey::AutoAdvance);
        self.next_generation += 1;
        self.playlist = Playlist {
            name: info.name.clone(),
            path: info.path,
            generation: self.next_generation,
            tracks,
        };
        self.playlist_index = Some(index);
        if let Some(resolver) = &self.resolver {
            resolver.resolve(&self.playlist);
        }

        if self.playlist.is_empty() {
            self.sync_music_timer(Instant::now());
            self.set_status(format!("{} has no tracks", info.name), Severity::Warning);
            return;
        }
        let events = self.player.load_track(&mut self.engine, &self.playlist, 0);
        self.apply_player_events(events, Instant::now());
        self.set_status(
            format!("Playlist: {} ({} tracks)", info.name, self.playlist.len()),
            Severity::Info,
        );
    }

    // ----- music --------------------------------------------------------

    pub fn toggle_play(&mut self) {
        if self.player.is_playing() {
            self.pause_music();
        } else {
            self.play_music();
        }
    }

    /// Start or resume. With nothing selected the first track is loaded.
    pub fn play_music(&mut self) {
        if self.player.current_track().is_none() {
            if self.playlist.is_empty() {
                self.set_status("Choose a playlist first", Severity::Warning);
            } else {
                self.play_track(0);
            }
            return;
        }
        let events = self.player.play(&mut self.engine, &self.playlist);
        self.apply_player_events(events, Instant::now());
    }

    pub fn play_track(&mut self, index: usize) {
        let events = self.player.load_and_play(&mut self.engine, &self.playlist, index);
        self.apply_player_events(events, Instant::now());
    }

    pub fn pause_music(&mut self) {
        if !self.player.is_playing() {
            return;
        }
        self.player.pause(&mut self.engine);
        self.sync_music_timer(Instant::now());
        self.set_status("Paused", Severity::Info);
    }

    pub fn stop_music(&mut self) {
        self.player.stop(&mut self.engine);
        self.scheduler.cancel(TimerKey::AutoAdvance);
        self.sync_music_timer(Instant::now());
    }

    /// Stop the music and every pad.
    pub fn stop_everything(&mut self) {
        self.stop_music();
        self.stop_all_effects();
        self.set_status("Stopped", Severity::Info);
    }

    pub fn next_track(&mut self) {
        self.scheduler.cancel(TimerKey::AutoAdvance);
        let events = self.player.next(&mut self.engine, &self.playlist);
        self.apply_player_events(events, Instant::now());
    }

    pub fn previous_track(&mut self) {
        self.scheduler.cancel(TimerKey::AutoAdvance);
        let events = self.player.previous(&mut self.engine, &self.playlist);
        self.apply_player_events(events, Instant::now());
    }

    /// Jump to `percent` (0-100) of the current track.
    pub fn seek_percent(&mut self, percent: f64) {
        self.player.seek(&mut self.engine, percent);
    }

    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.player.set_mode(&mut self.engine, mode);
        self.set_status(format!("Mode: {}", mode.label()), Severity::Info);
        self.save_snapshot();
    }

    pub fn cycle_mode(&mut self) {
        self.set_mode(self.player.mode().cycle());
    }

    // ----- volumes ------------------------------------------------------

    /// The engine gain follows at once; the session file is written after
    /// the debounce.
    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = clamp_volume(volume);
        self.player.set_volume(&mut self.engine, self.music_volume);
        self.schedule_volume_commit();
    }

    pub fn set_effects_volume(&mut self, volume: f32) {
        self.effects_volume = clamp_volume(volume);
        self.pads.set_volume_all(&mut self.engine, self.effects_volume);
        self.schedule_volume_commit();
    }

    pub fn set_music_volume_percent(&mut self, percent: f64) {
        self.set_music_volume(percent_to_volume(percent));
    }

    pub fn set_effects_volume_percent(&mut self, percent: f64) {
        self.set_effects_volume(percent_to_volume(percent));
    }

    /// Move the music volume by `steps` configured increments.
    pub fn nudge_music_volume(&mut self, steps: i32) {
        let step = self.settings.audio.volume_step_percent;
        self.set_music_volume_percent(stepped_percent(self.music_volume, steps, step));
    }

    pub fn nudge_effects_volume(&mut self, steps: i32) {
        let step = self.settings.audio.volume_step_percent;
        self.set_effects_volume_percent(stepped_percent(self.effects_volume, steps, step));
    }

    /// Silence both channels without touching the stored volumes.
    pub fn toggle_panic_mute(&mut self) {
        self.panic_muted = !self.panic_muted;
        self.player.set_muted(&mut self.engine, self.panic_muted);
        self.pads.set_muted_all(&mut self.engine, self.panic_muted);
        if self.panic_muted {
            self.set_status("Panic mute: all sound off", Severity::Warning);
        } else {
            self.set_status("Sound restored", Severity::Info);
        }
    }

    pub fn toggle_lock(&mut self) {
        self.locked = !self.locked;
        let message = if self.locked {
            "Interface locked"
        } else {
            "Interface unlocked"
        };
        self.set_status(message, Severity::Info);
    }

    /// Run a hotkey. Returns `false` when the lock swallowed it.
    pub fn handle_hotkey(&mut self, hotkey: Hotkey) -> bool {
        if self.locked && !hotkey.allowed_while_locked() {
            debug!("{hotkey:?} blocked by the lock");
            return false;
        }
        match hotkey {
            Hotkey::TogglePlay => self.toggle_play(),
            Hotkey::StopAll => self.stop_everything(),
            Hotkey::TriggerPad(index) => {
                if index < PAD_COUNT {
                    self.trigger_pad(index);
                }
            }
            Hotkey::PreviousTrack => self.previous_track(),
            Hotkey::NextTrack => self.next_track(),
            Hotkey::MusicVolumeUp => self.nudge_music_volume(1),
            Hotkey::MusicVolumeDown => self.nudge_music_volume(-1),
            Hotkey::EffectsVolumeUp => self.nudge_effects_volume(1),
            Hotkey::EffectsVolumeDown => self.nudge_effects_volume(-1),
            Hotkey::ToggleLock => self.toggle_lock(),
            Hotkey::TogglePanicMute => self.toggle_panic_mute(),
        }
        true
    }

    // ----- pads ---------------------------------------------------------

    pub fn trigger_pad(&mut self, index: usize) {
        let outcome = self.pads.trigger(&mut self.engine, index);
        let name = self
            .pads
            .slot(index)
            .map(|s| s.display_name.clone())
            .unwrap_or_default();
        match outcome {
            TriggerOutcome::NotConfigured => {
                self.set_status(format!("Pad {} is not configured", index + 1), Severity::Warning)
            }
            TriggerOutcome::Loading => self.set_status(format!("Loading {name}"), Severity::Info),
            TriggerOutcome::AlreadyLoading => debug!("pad {} is still loading", index + 1),
            TriggerOutcome::AlreadyPlaying => {
                self.set_status(format!("{name} is already playing"), Severity::Info)
            }
            TriggerOutcome::Playing => {
                self.start_pad_progress(index, Instant::now());
                self.set_status(format!("Effect: {name}"), Severity::Info);
            }
            TriggerOutcome::OutOfRange => {}
        }
    }

    /// Bind a sound file to pad `index`. The file must exist and have a
    /// supported extension.
    pub fn assign_pad(&mut self, index: usize, path: PathBuf) -> bool {
        if let Err(message) = self.check_sound_file(&path) {
            self.set_status(message, Severity::Error);
            return false;
        }
        self.scheduler.cancel(TimerKey::PadProgress(index));
        if !self.pads.assign(&mut self.engine, index, path) {
            return false;
        }
        let name = self
            .pads
            .slot(index)
            .map(|s| s.display_name.clone())
            .unwrap_or_default();
        self.set_status(format!("Pad {}: {name}", index + 1), Severity::Success);
        self.save_snapshot();
        true
    }

    pub fn clear_pad(&mut self, index: usize) {
        if index >= PAD_COUNT {
            return;
        }
        self.scheduler.cancel(TimerKey::PadProgress(index));
        self.pads.clear(&mut self.engine, index);
        self.set_status(format!("Pad {} cleared", index + 1), Severity::Info);
        self.save_snapshot();
    }

    pub fn rename_pad(&mut self, index: usize, name: &str) {
        if self.pads.rename(index, name) {
            self.save_snapshot();
        }
    }

    /// Stop every pad. Returns how many were playing.
    pub fn stop_all_effects(&mut self) -> usize {
        let stopped = self.pads.stop_all(&mut self.engine);
        self.scheduler
            .cancel_where(|k| matches!(k, TimerKey::PadProgress(_)));
        stopped
    }

    // ----- countdown ----------------------------------------------------

    /// Start the countdown from `secs`. Zero is refused with a warning.
    pub fn start_countdown(&mut self, secs: u64) -> bool {
        if !self.countdown.start(secs) {
            self.set_status("Set a time for the countdown", Severity::Warning);
            return false;
        }
        self.scheduler
            .schedule(TimerKey::Countdown, Cadence::Every(SECOND), Instant::now());
        self.set_status(format!("Countdown: {}", self.countdown.text()), Severity::Info);
        true
    }

    pub fn stop_countdown(&mut self) {
        self.countdown.stop();
        self.scheduler.cancel(TimerKey::Countdown);
    }

    pub fn reset_countdown(&mut self) {
        self.countdown.reset();
        self.scheduler.cancel(TimerKey::Countdown);
    }

    // ----- event loop ---------------------------------------------------

    /// One pass of the cooperative loop: engine events, background
    /// metadata, due timers, then the meters.
    pub fn tick(&mut self, now: Instant) {
        self.dispatch_engine_events(now);
        self.apply_metadata();
        for key in self.scheduler.due(now) {
            self.fire(key, now);
        }
        self.sample_levels();
    }

    /// Show an unexpected failure without stopping the show.
    pub fn report_error(&mut self, err: &anyhow::Error) {
        error!("unexpected error: {err:#}");
        self.set_status("Application error", Severity::Error);
    }

    pub fn set_status(&mut self, message: impl Into<String>, severity: Severity) {
        self.status.set(message, severity);
    }

    /// Save, cancel every timer and fade the engine out.
    pub fn shutdown(&mut self) {
        self.save_snapshot();
        self.scheduler.clear();
        let fade = Duration::from_millis(self.settings.audio.quit_fade_out_ms);
        self.engine.shutdown(fade);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            pads: self
                .pads
                .slots()
                .iter()
                .filter_map(|s| {
                    s.assigned_path.as_ref().map(|path| PadEntry {
                        index: s.index,
                        name: s.display_name.clone(),
                        path: path.clone(),
                    })
                })
                .collect(),
            music_volume: self.music_volume,
            effects_volume: self.effects_volume,
            playback_mode: self.player.mode(),
        }
    }

    /// Persist the session. Failures are logged and otherwise ignored.
    pub fn save_snapshot(&self) {
        let Some(path) = self.paths.snapshot.as_deref() else {
            return;
        };
        if let Err(e) = self.snapshot().save_to(path) {
            warn!("could not save session to {}: {e}", path.display());
        }
    }

    fn dispatch_engine_events(&mut self, now: Instant) {
        for event in self.engine.poll_events() {
            if self.pads.owner_of(event.id()).is_some() {
                let events = self.pads.handle_event(&mut self.engine, &event);
                self.apply_pad_events(events, now);
            } else {
                let events = self.player.handle_event(&mut self.engine, &self.playlist, &event);
                self.apply_player_events(events, now);
            }
        }
    }

    fn apply_metadata(&mut self) {
        let Some(resolver) = &self.resolver else {
            return;
        };
        for resolved in resolver.poll() {
            self.playlist.apply(&resolved);
        }
    }

    fn fire(&mut self, key: TimerKey, now: Instant) {
        match key {
            TimerKey::MusicFrame => {
                if self.player.is_playing() {
                    self.player.tick(&self.engine, now);
                } else {
                    self.scheduler.cancel(key);
                }
            }
            TimerKey::PadProgress(index) => {
                if !self.pads.tick_progress(&self.engine, index) {
                    self.scheduler.cancel(key);
                }
            }
            TimerKey::VolumeCommit => self.save_snapshot(),
            TimerKey::AutoAdvance => self.next_track(),
            TimerKey::Clock => self.clock_text = clock_now(),
            TimerKey::Countdown => match self.countdown.tick() {
                CountdownTick::Running => {}
                CountdownTick::Finished => {
                    self.scheduler.cancel(key);
                    self.set_status("Timer finished", Severity::Warning);
                }
                CountdownTick::Idle => {
                    self.scheduler.cancel(key);
                }
            },
        }
    }

    fn sample_levels(&mut self) {
        let music = ChannelState {
            volume: self.music_volume,
            muted: self.panic_muted,
            active: self.player.is_playing(),
        };
        let effects = ChannelState {
            volume: self.effects_volume,
            muted: self.panic_muted,
            active: self.pads.any_playing(),
        };
        self.meter.sample(self.engine.signal(), music, effects);
    }

    fn apply_player_events(&mut self, events: Vec<PlayerEvent>, now: Instant) {
        for event in events {
            match event {
                PlayerEvent::Loading { name, .. } => {
                    self.set_status(format!("Loading: {name}"), Severity::Info)
                }
                PlayerEvent::Started { index, track } => {
                    let artist = self
                        .playlist
                        .get(index)
                        .map_or_else(|| track.artist_or_unknown(), |t| t.artist_or_unknown())
                        .to_string();
                    self.stats.record_play();
                    self.history.push(HistoryEntry {
                        track_name: track.display_name.clone(),
                        artist,
                        timestamp: Local::now(),
                    });
                    self.set_status(format!("Playing: {}", track.display_name), Severity::Success);
                }
                PlayerEvent::DurationResolved { index, duration } => {
                    if let Some(track) = self.playlist.tracks.get_mut(index) {
                        track.duration = Some(duration);
                    }
                }
                PlayerEvent::Status { message, severity } => self.set_status(message, severity),
                PlayerEvent::AdvanceAfter(delay) => {
                    self.scheduler
                        .schedule(TimerKey::AutoAdvance, Cadence::Once(delay), now)
                }
            }
        }
        self.sync_music_timer(now);
    }

    fn apply_pad_events(&mut self, events: Vec<PadEvent>, now: Instant) {
        for event in events {
            match event {
                PadEvent::Started(index) => self.start_pad_progress(index, now),
                PadEvent::Finished(index) => {
                    self.scheduler.cancel(TimerKey::PadProgress(index));
                }
                PadEvent::Status { message, severity } => self.set_status(message, severity),
            }
        }
    }

    fn start_pad_progress(&mut self, index: usize, now: Instant) {
        let period = Duration::from_millis(self.settings.ui.pad_progress_ms);
        self.scheduler
            .schedule(TimerKey::PadProgress(index), Cadence::Every(period), now);
    }

    /// The frame timer runs exactly while the music plays.
    fn sync_music_timer(&mut self, now: Instant) {
        if self.player.is_playing() {
            self.scheduler
                .ensure(TimerKey::MusicFrame, Cadence::EveryFrame, now);
        } else {
            self.scheduler.cancel(TimerKey::MusicFrame);
        }
    }

    fn schedule_volume_commit(&mut self) {
        let delay = Duration::from_millis(self.settings.audio.volume_save_debounce_ms);
        self.scheduler
            .schedule(TimerKey::VolumeCommit, Cadence::Once(delay), Instant::now());
    }

    fn check_sound_file(&self, path: &Path) -> Result<(), String> {
        if !path.is_file() {
            return Err(format!("Not a file: {}", path.display()));
        }
        if !library::is_audio_file(path, &self.settings.library) {
            return Err(format!("Unsupported audio file: {}", path.display()));
        }
        Ok(())
    }
}

/// `150` percent is stored as `1.0`.
pub fn percent_to_volume(percent: f64) -> f32 {
    if percent.is_finite() {
        (percent / 100.0).clamp(0.0, 1.0) as f32
    } else {
        0.0
    }
}

/// Step in whole percents so repeated nudges do not drift.
fn stepped_percent(current: f32, steps: i32, step_percent: u8) -> f64 {
    let percent = (f64::from(current) * 100.0).round() + f64::from(steps) * f64::from(step_percent);
    percent.clamp(0.0, 100.0)
}

fn clock_now() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
