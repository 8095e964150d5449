//! Audio-related small types and handles.
//!
//! Resource ids, channels, load options, the events the engine reports back
//! to the session, and the shared per-resource table the audio thread
//! publishes so queries never wait on it.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::{LoadError, PlaybackError};

/// Handle to one loaded (or loading) sound. Ids are never reused, so an id
/// doubles as the generation of the load that produced it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two mixing channels. All pads share `Effects`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Music,
    Effects,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LoadOptions {
    pub channel: Channel,
    pub volume: f32,
    pub muted: bool,
    /// Restart from the top on natural end instead of reporting `Ended`.
    pub looping: bool,
}

impl LoadOptions {
    pub fn music(volume: f32, muted: bool, looping: bool) -> Self {
        Self {
            channel: Channel::Music,
            volume: clamp_volume(volume),
            muted,
            looping,
        }
    }

    pub fn effect(volume: f32, muted: bool) -> Self {
        Self {
            channel: Channel::Effects,
            volume: clamp_volume(volume),
            muted,
            looping: false,
        }
    }
}

/// Asynchronous outcomes reported by the engine, drained by the session on
/// the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Decoding is ready; `duration` in seconds when the format exposes it.
    Loaded { id: ResourceId, duration: Option<f64> },
    LoadFailed { id: ResourceId, error: LoadError },
    PlayFailed { id: ResourceId, error: PlaybackError },
    /// Natural end of playback. Never sent for explicit stops or while looping.
    Ended { id: ResourceId },
}

impl EngineEvent {
    pub fn id(&self) -> ResourceId {
        match self {
            EngineEvent::Loaded { id, .. }
            | EngineEvent::LoadFailed { id, .. }
            | EngineEvent::PlayFailed { id, .. }
            | EngineEvent::Ended { id } => *id,
        }
    }
}

/// Clamp a gain into `[0, 1]`, mapping NaN to silence.
pub fn clamp_volume(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[derive(Debug)]
pub(crate) enum EngineCmd {
    Load {
        id: ResourceId,
        path: PathBuf,
        options: LoadOptions,
    },
    Play(ResourceId),
    Pause(ResourceId),
    Stop(ResourceId),
    Seek(ResourceId, Duration),
    SetVolume(ResourceId, f32),
    SetMuted(ResourceId, bool),
    SetLooping(ResourceId, bool),
    Unload(ResourceId),
    /// A decoder prepared by the loader thread.
    Prepared(super::loader::Prepared),
    /// Fade every sink out over `fade_out_ms` and end the audio thread.
    Quit { fade_out_ms: u64 },
}

/// Playback facts the audio thread publishes for one resource.
#[derive(Debug, Clone)]
pub(crate) struct ResourceInfo {
    pub channel: Channel,
    pub loaded: bool,
    pub duration: Option<Duration>,
    pub playing: bool,
    pub muted: bool,
    pub volume: f32,
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl ResourceInfo {
    pub fn new(options: &LoadOptions) -> Self {
        Self {
            channel: options.channel,
            loaded: false,
            duration: None,
            playing: false,
            muted: options.muted,
            volume: options.volume,
            started_at: None,
            accumulated: Duration::ZERO,
        }
    }

    pub fn position(&self) -> Duration {
        self.position_at(Instant::now())
    }

    pub fn position_at(&self, now: Instant) -> Duration {
        let running = self
            .started_at
            .map_or(Duration::ZERO, |st| now.saturating_duration_since(st));
        let pos = self.accumulated + running;
        match self.duration {
            Some(d) => pos.min(d),
            None => pos,
        }
    }

    pub fn mark_playing(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.playing = true;
    }

    pub fn mark_paused(&mut self, now: Instant) {
        if let Some(st) = self.started_at.take() {
            self.accumulated += now.saturating_duration_since(st);
        }
        self.playing = false;
    }

    pub fn mark_stopped(&mut self) {
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        self.playing = false;
    }

    pub fn set_position(&mut self, pos: Duration, now: Instant) {
        self.accumulated = pos;
        self.started_at = if self.playing { Some(now) } else { None };
    }
}

pub(crate) type ResourceTable = Arc<Mutex<HashMap<ResourceId, ResourceInfo>>>;

/// Clamp a seek target in seconds into `[0, duration]` (`[0, ∞)` when the
/// duration is unknown).
pub fn clamp_seek(seconds: f64, duration: Option<f64>) -> f64 {
    let s = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    match duration {
        Some(d) if d.is_finite() => s.min(d.max(0.0)),
        _ => s,
    }
}
