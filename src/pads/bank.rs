use std::path::PathBuf;

use log::{debug, info, warn};

use crate::audio::{AudioEngine, EngineEvent, LoadOptions, ResourceId, clamp_volume};
use crate::error::Severity;

use super::slot::{PAD_COUNT, PadSlot, TriggerOutcome, default_name, name_from_path};

/// Something the session controller should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum PadEvent {
    /// Pad started sounding; progress tracking should begin.
    Started(usize),
    /// Pad finished on its own; progress tracking can stop.
    Finished(usize),
    Status { message: String, severity: Severity },
}

/// The twelve effect pads, all on the effects channel.
#[derive(Debug)]
pub struct PadBank {
    slots: Vec<PadSlot>,
    volume: f32,
    muted: bool,
}

impl PadBank {
    pub fn new(volume: f32, muted: bool) -> Self {
        Self {
            slots: (0..PAD_COUNT).map(PadSlot::new).collect(),
            volume: clamp_volume(volume),
            muted,
        }
    }

    pub fn slots(&self) -> &[PadSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&PadSlot> {
        self.slots.get(index)
    }

    pub fn any_playing(&self) -> bool {
        self.slots.iter().any(|s| s.is_playing)
    }

    pub fn playing_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_playing).count()
    }

    /// Index of the pad holding `id`.
    pub fn owner_of(&self, id: ResourceId) -> Option<usize> {
        self.slots.iter().position(|s| s.resource == Some(id))
    }

    /// Point pad `index` at `path`. Any sound loaded for the old file is
    /// released; the new one loads on the next trigger.
    pub fn assign<E: AudioEngine>(&mut self, engine: &mut E, index: usize, path: PathBuf) -> bool {
        if index >= self.slots.len() {
            return false;
        }
        self.release(engine, index);
        let slot = &mut self.slots[index];
        slot.display_name = name_from_path(&path, index);
        info!("pad {} assigned to {}", index + 1, path.display());
        slot.assigned_path = Some(path);
        true
    }

    /// Stop, unload and forget the assignment. Idempotent.
    pub fn clear<E: AudioEngine>(&mut self, engine: &mut E, index: usize) {
        if index >= self.slots.len() {
            return;
        }
        self.release(engine, index);
        let slot = &mut self.slots[index];
        slot.assigned_path = None;
        slot.display_name = default_name(index);
    }

    /// Change the label only. Blank names keep the current label.
    pub fn rename(&mut self, index: usize, name: &str) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        let name = name.trim();
        if !name.is_empty() {
            slot.display_name = name.to_string();
        } else if slot.display_name.trim().is_empty() {
            slot.display_name = default_name(index);
        }
        true
    }

    /// Restore a label without touching the assignment (session restore).
    pub(crate) fn restore(&mut self, index: usize, path: PathBuf, name: &str) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        slot.display_name = name_from_path(&path, index);
        slot.assigned_path = Some(path);
        self.rename(index, name);
    }

    pub fn trigger<E: AudioEngine>(&mut self, engine: &mut E, index: usize) -> TriggerOutcome {
        let (volume, muted) = (self.volume, self.muted);
        let Some(slot) = self.slots.get_mut(index) else {
            return TriggerOutcome::OutOfRange;
        };
        let Some(path) = slot.assigned_path.as_ref() else {
            return TriggerOutcome::NotConfigured;
        };
        if slot.pending_load {
            return TriggerOutcome::AlreadyLoading;
        }
        if slot.is_playing {
            return TriggerOutcome::AlreadyPlaying;
        }

        match slot.resource {
            Some(id) => {
                engine.play(id);
                slot.is_playing = true;
                slot.progress = 0.0;
                TriggerOutcome::Playing
            }
            None => {
                let id = engine.load(path, LoadOptions::effect(volume, muted));
                debug!("pad {} loading as {id}", index + 1);
                slot.resource = Some(id);
                slot.pending_load = true;
                TriggerOutcome::Loading
            }
        }
    }

    /// Apply an engine event for one of the pads. Events for other
    /// resources are ignored.
    pub fn handle_event<E: AudioEngine>(&mut self, engine: &mut E, event: &EngineEvent) -> Vec<PadEvent> {
        let Some(index) = self.owner_of(event.id()) else {
            return Vec::new();
        };
        let slot = &mut self.slots[index];

        match event {
            EngineEvent::Loaded { id, .. } => {
                if !slot.pending_load {
                    // Stopped while loading: keep it cached, stay quiet.
                    return Vec::new();
                }
                slot.pending_load = false;
                engine.play(*id);
                slot.is_playing = true;
                slot.progress = 0.0;
                vec![PadEvent::Started(index)]
            }
            EngineEvent::LoadFailed { id, error } => {
                warn!("pad {} failed to load: {error}", index + 1);
                engine.unload(*id);
                slot.resource = None;
                slot.pending_load = false;
                slot.is_playing = false;
                vec![PadEvent::Status {
                    message: format!("{}: {error}", slot.display_name),
                    severity: Severity::Error,
                }]
            }
            EngineEvent::PlayFailed { error, .. } => {
                warn!("pad {} failed to play: {error}", index + 1);
                slot.is_playing = false;
                slot.progress = 0.0;
                vec![
                    PadEvent::Finished(index),
                    PadEvent::Status {
                        message: format!("{}: {error}", slot.display_name),
                        severity: Severity::Error,
                    },
                ]
            }
            EngineEvent::Ended { .. } => {
                slot.is_playing = false;
                slot.progress = 0.0;
                vec![PadEvent::Finished(index)]
            }
        }
    }

    /// Recompute the progress of pad `index`. Returns `false` once the pad
    /// is no longer playing, so its timer can be cancelled.
    pub fn tick_progress<E: AudioEngine>(&mut self, engine: &E, index: usize) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        let Some(id) = slot.resource.filter(|_| slot.is_playing) else {
            slot.progress = 0.0;
            return false;
        };
        slot.progress = match engine.duration(id).filter(|d| *d > 0.0) {
            Some(d) => (engine.position(id) / d).clamp(0.0, 1.0),
            None => 0.0,
        };
        true
    }

    /// Stop pad `index`. Returns whether it was playing.
    pub fn stop<E: AudioEngine>(&mut self, engine: &mut E, index: usize) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        // A pending autoplay is cancelled too.
        slot.pending_load = false;
        slot.progress = 0.0;
        if !slot.is_playing {
            return false;
        }
        if let Some(id) = slot.resource {
            engine.stop(id);
        }
        slot.is_playing = false;
        true
    }

    /// Stop every pad. Returns how many were playing.
    pub fn stop_all<E: AudioEngine>(&mut self, engine: &mut E) -> usize {
        (0..self.slots.len())
            .filter(|&i| self.stop(engine, i))
            .count()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume_all<E: AudioEngine>(&mut self, engine: &mut E, volume: f32) {
        self.volume = clamp_volume(volume);
        for id in self.slots.iter().filter_map(|s| s.resource) {
            engine.set_volume(id, self.volume);
        }
    }

    pub fn set_muted_all<E: AudioEngine>(&mut self, engine: &mut E, muted: bool) {
        self.muted = muted;
        for id in self.slots.iter().filter_map(|s| s.resource) {
            engine.set_muted(id, muted);
        }
    }

    /// Stop and unload whatever pad `index` holds, keeping the assignment.
    fn release<E: AudioEngine>(&mut self, engine: &mut E, index: usize) {
        self.stop(engine, index);
        let slot = &mut self.slots[index];
        if let Some(id) = slot.resource.take() {
            engine.unload(id);
        }
        slot.pending_load = false;
        slot.is_playing = false;
        slot.progress = 0.0;
    }
}
