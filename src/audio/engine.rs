use std::path::Path;
use std::time::Duration;

use super::types::{Channel, EngineEvent, LoadOptions, ResourceId};

/// Control surface over the audio backend.
///
/// Every operation returns immediately. Loads, natural ends and failed plays
/// are reported later through [`AudioEngine::poll_events`], which the session
/// drains once per frame on the UI thread. Operations on unknown or unloaded
/// ids are no-ops (queries return neutral values).
pub trait AudioEngine {
    /// Start decoding `path`. The outcome arrives as `Loaded` or `LoadFailed`.
    fn load(&mut self, path: &Path, options: LoadOptions) -> ResourceId;

    /// Start or resume. A resource that already ran to its end restarts from
    /// the top.
    fn play(&mut self, id: ResourceId);
    fn pause(&mut self, id: ResourceId);
    /// Halt and rewind. Never reported as `Ended`.
    fn stop(&mut self, id: ResourceId);

    /// Jump to `seconds`, clamped to `[0, duration]`. Returns the position
    /// actually requested.
    fn seek(&mut self, id: ResourceId, seconds: f64) -> f64;

    fn set_volume(&mut self, id: ResourceId, volume: f32);
    fn set_muted(&mut self, id: ResourceId, muted: bool);
    fn set_looping(&mut self, id: ResourceId, looping: bool);

    fn duration(&self, id: ResourceId) -> Option<f64>;
    fn position(&self, id: ResourceId) -> f64;
    fn is_playing(&self, id: ResourceId) -> bool;
    fn is_muted(&self, id: ResourceId) -> bool;

    /// Release everything held for `id`. Idempotent.
    fn unload(&mut self, id: ResourceId);

    /// Drain pending events, oldest first.
    fn poll_events(&mut self) -> Vec<EngineEvent>;

    /// Live frequency data, when the backend can provide it.
    fn signal(&self) -> Option<&dyn SignalAccess> {
        None
    }

    /// Fade everything out over `fade_out` and release the device.
    fn shutdown(&mut self, fade_out: Duration);
}

/// Optional live-signal capability used by the level meter.
pub trait SignalAccess {
    /// Fill `bins` with byte-scaled magnitudes (0..=255) for `channel`.
    /// Returns `false` when no live signal could be read.
    fn frequency_bins(&self, channel: Channel, bins: &mut Vec<u8>) -> bool;
}
