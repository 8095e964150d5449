//! Scripted in-memory engine for exercising the playback core in tests.
//!
//! Loads stay pending until the test completes or fails them; natural ends
//! happen only when the test calls [`FakeEngine::finish`].

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{LoadError, PlaybackError};

use super::engine::{AudioEngine, SignalAccess};
use super::types::{Channel, EngineEvent, LoadOptions, ResourceId, clamp_seek, clamp_volume};

#[derive(Debug, Clone)]
pub(crate) struct FakeResource {
    pub path: PathBuf,
    pub options: LoadOptions,
    pub loaded: bool,
    pub playing: bool,
    pub duration: Option<f64>,
    pub position: f64,
}

#[derive(Debug, Default)]
pub(crate) struct FakeEngine {
    next_id: u64,
    resources: BTreeMap<ResourceId, FakeResource>,
    events: VecDeque<EngineEvent>,
    pub loads: usize,
    pub unloads: usize,
    pub shut_down: Option<Duration>,
    pub bins: Option<Vec<u8>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bins(bins: Vec<u8>) -> Self {
        Self {
            bins: Some(bins),
            ..Self::default()
        }
    }

    pub fn resource(&self, id: ResourceId) -> Option<&FakeResource> {
        self.resources.get(&id)
    }

    pub fn last_id(&self) -> Option<ResourceId> {
        self.resources.keys().next_back().copied()
    }

    pub fn live_count(&self) -> usize {
        self.resources.len()
    }

    pub fn playing_ids(&self) -> Vec<ResourceId> {
        self.resources
            .iter()
            .filter(|(_, r)| r.playing)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn complete_load(&mut self, id: ResourceId, duration: Option<f64>) {
        if let Some(r) = self.resources.get_mut(&id) {
            r.loaded = true;
            r.duration = duration;
        }
        self.events.push_back(EngineEvent::Loaded { id, duration });
    }

    pub fn fail_load(&mut self, id: ResourceId) {
        let path = self
            .resources
            .get(&id)
            .map(|r| r.path.clone())
            .unwrap_or_default();
        if let Some(r) = self.resources.get_mut(&id) {
            r.playing = false;
        }
        self.events.push_back(EngineEvent::LoadFailed {
            id,
            error: LoadError::Decode {
                path,
                reason: "scripted failure".into(),
            },
        });
    }

    pub fn fail_play(&mut self, id: ResourceId) {
        if let Some(r) = self.resources.get_mut(&id) {
            r.playing = false;
        }
        self.events.push_back(EngineEvent::PlayFailed {
            id,
            error: PlaybackError::Device("scripted failure".into()),
        });
    }

    /// Natural end of playback. Looping resources rewind and keep playing.
    pub fn finish(&mut self, id: ResourceId) {
        let Some(r) = self.resources.get_mut(&id) else {
            return;
        };
        r.position = 0.0;
        if r.options.looping {
            return;
        }
        r.playing = false;
        self.events.push_back(EngineEvent::Ended { id });
    }

    pub fn set_position(&mut self, id: ResourceId, seconds: f64) {
        if let Some(r) = self.resources.get_mut(&id) {
            r.position = seconds;
        }
    }
}

impl AudioEngine for FakeEngine {
    fn load(&mut self, path: &Path, options: LoadOptions) -> ResourceId {
        self.next_id += 1;
        self.loads += 1;
        let id = ResourceId::new(self.next_id);
        self.resources.insert(
            id,
            FakeResource {
                path: path.to_path_buf(),
                options,
                loaded: false,
                playing: false,
                duration: None,
                position: 0.0,
            },
        );
        id
    }

    fn play(&mut self, id: ResourceId) {
        match self.resources.get_mut(&id) {
            Some(r) => r.playing = true,
            None => self.events.push_back(EngineEvent::PlayFailed {
                id,
                error: PlaybackError::NotLoaded,
            }),
        }
    }

    fn pause(&mut self, id: ResourceId) {
        if let Some(r) = self.resources.get_mut(&id) {
            r.playing = false;
        }
    }

    fn stop(&mut self, id: ResourceId) {
        if let Some(r) = self.resources.get_mut(&id) {
            r.playing = false;
            r.position = 0.0;
        }
    }

    fn seek(&mut self, id: ResourceId, seconds: f64) -> f64 {
        let target = clamp_seek(seconds, self.duration(id));
        self.set_position(id, target);
        target
    }

    fn set_volume(&mut self, id: ResourceId, volume: f32) {
        if let Some(r) = self.resources.get_mut(&id) {
            r.options.volume = clamp_volume(volume);
        }
    }

    fn set_muted(&mut self, id: ResourceId, muted: bool) {
        if let Some(r) = self.resources.get_mut(&id) {
            r.options.muted = muted;
        }
    }

    fn set_looping(&mut self, id: ResourceId, looping: bool) {
        if let Some(r) = self.resources.get_mut(&id) {
            r.options.looping = looping;
        }
    }

    fn duration(&self, id: ResourceId) -> Option<f64> {
        self.resources.get(&id).and_then(|r| r.duration)
    }

    fn position(&self, id: ResourceId) -> f64 {
        self.resources.get(&id).map_or(0.0, |r| r.position)
    }

    fn is_playing(&self, id: ResourceId) -> bool {
        self.resources.get(&id).is_some_and(|r| r.playing)
    }

    fn is_muted(&self, id: ResourceId) -> bool {
        self.resources.get(&id).is_some_and(|r| r.options.muted)
    }

    fn unload(&mut self, id: ResourceId) {
        if self.resources.remove(&id).is_some() {
            self.unloads += 1;
        }
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    fn signal(&self) -> Option<&dyn SignalAccess> {
        self.bins.as_ref().map(|_| self as &dyn SignalAccess)
    }

    fn shutdown(&mut self, fade_out: Duration) {
        self.shut_down = Some(fade_out);
        self.resources.values_mut().for_each(|r| r.playing = false);
    }
}

impl SignalAccess for FakeEngine {
    fn frequency_bins(&self, _channel: Channel, bins: &mut Vec<u8>) -> bool {
        match &self.bins {
            Some(b) => {
                bins.clear();
                bins.extend_from_slice(b);
                true
            }
            None => false,
        }
    }
}
