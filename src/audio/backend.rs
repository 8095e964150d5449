use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{info, warn};

use crate::error::EngineError;

use super::analyser::{FFT_SIZE, SpectrumAnalyser};
use super::engine::{AudioEngine, SignalAccess};
use super::loader::{PrepareJob, spawn_loader};
use super::thread::{Shared, TapTable, spawn_audio_thread};
use super::types::{
    Channel, EngineCmd, EngineEvent, LoadOptions, ResourceId, ResourceInfo, ResourceTable,
    clamp_seek, clamp_volume,
};

/// `rodio`-backed engine: a handle that forwards commands to the audio
/// thread and answers queries from the table that thread publishes.
pub struct RodioEngine {
    tx: Sender<EngineCmd>,
    events: Receiver<EngineEvent>,
    table: ResourceTable,
    signal: LiveSignal,
    next_id: u64,
    join: Option<JoinHandle<()>>,
}

impl RodioEngine {
    /// Open the default output device and start the audio and loader threads.
    pub fn spawn() -> Result<Self, EngineError> {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let (event_tx, event_rx) = mpsc::channel::<EngineEvent>();
        let (job_tx, job_rx) = mpsc::channel::<PrepareJob>();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let table: ResourceTable = Arc::new(Mutex::new(HashMap::new()));
        let taps: TapTable = Arc::new(Mutex::new(HashMap::new()));

        let shared = Shared {
            table: table.clone(),
            taps: taps.clone(),
            events: event_tx,
            jobs: job_tx,
        };
        let join = spawn_audio_thread(rx, shared, ready_tx).map_err(EngineError::ThreadSpawn)?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => return Err(EngineError::NoOutputDevice(reason)),
            Err(_) => {
                return Err(EngineError::NoOutputDevice(
                    "audio thread exited during startup".into(),
                ));
            }
        }

        // The loader exits on its own once the audio thread drops the job sender.
        spawn_loader(job_rx, tx.clone()).map_err(EngineError::ThreadSpawn)?;

        Ok(Self {
            tx,
            events: event_rx,
            table,
            signal: LiveSignal::new(taps),
            next_id: 0,
            join: Some(join),
        })
    }

    fn send(&self, cmd: EngineCmd) {
        if self.tx.send(cmd).is_err() {
            warn!("audio thread is not running; command dropped");
        }
    }

    fn with_info<T>(&self, id: ResourceId, f: impl FnOnce(&ResourceInfo) -> T) -> Option<T> {
        let table = self.table.lock().ok()?;
        table.get(&id).map(f)
    }
}

impl AudioEngine for RodioEngine {
    fn load(&mut self, path: &Path, options: LoadOptions) -> ResourceId {
        self.next_id += 1;
        let id = ResourceId::new(self.next_id);
        self.send(EngineCmd::Load {
            id,
            path: path.to_path_buf(),
            options,
        });
        id
    }

    fn play(&mut self, id: ResourceId) {
        self.send(EngineCmd::Play(id));
    }

    fn pause(&mut self, id: ResourceId) {
        self.send(EngineCmd::Pause(id));
    }

    fn stop(&mut self, id: ResourceId) {
        self.send(EngineCmd::Stop(id));
    }

    fn seek(&mut self, id: ResourceId, seconds: f64) -> f64 {
        let target = clamp_seek(seconds, self.duration(id));
        self.send(EngineCmd::Seek(id, Duration::from_secs_f64(target)));
        target
    }

    fn set_volume(&mut self, id: ResourceId, volume: f32) {
        self.send(EngineCmd::SetVolume(id, clamp_volume(volume)));
    }

    fn set_muted(&mut self, id: ResourceId, muted: bool) {
        self.send(EngineCmd::SetMuted(id, muted));
    }

    fn set_looping(&mut self, id: ResourceId, looping: bool) {
        self.send(EngineCmd::SetLooping(id, looping));
    }

    fn duration(&self, id: ResourceId) -> Option<f64> {
        self.with_info(id, |info| info.duration.map(|d| d.as_secs_f64()))
            .flatten()
    }

    fn position(&self, id: ResourceId) -> f64 {
        self.with_info(id, |info| info.position().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn is_playing(&self, id: ResourceId) -> bool {
        self.with_info(id, |info| info.playing).unwrap_or(false)
    }

    fn is_muted(&self, id: ResourceId) -> bool {
        self.with_info(id, |info| info.muted).unwrap_or(false)
    }

    fn unload(&mut self, id: ResourceId) {
        self.send(EngineCmd::Unload(id));
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        self.events.try_iter().collect()
    }

    fn signal(&self) -> Option<&dyn SignalAccess> {
        Some(&self.signal)
    }

    fn shutdown(&mut self, fade_out: Duration) {
        let Some(handle) = self.join.take() else {
            return;
        };
        self.send(EngineCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });
        let _ = handle.join();
        info!("audio engine shut down");
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        if self.join.is_some() {
            let _ = self.tx.send(EngineCmd::Quit { fade_out_ms: 0 });
        }
    }
}

/// Live frequency data computed from the level taps of every resource on a
/// channel.
struct LiveSignal {
    taps: TapTable,
    analysers: Mutex<HashMap<Channel, SpectrumAnalyser>>,
}

impl LiveSignal {
    fn new(taps: TapTable) -> Self {
        Self {
            taps,
            analysers: Mutex::new(HashMap::new()),
        }
    }
}

impl SignalAccess for LiveSignal {
    fn frequency_bins(&self, channel: Channel, bins: &mut Vec<u8>) -> bool {
        let mut mix = vec![0.0f32; FFT_SIZE];
        {
            let Ok(taps) = self.taps.lock() else {
                return false;
            };
            let mut any = false;
            for (ch, ring) in taps.values() {
                if *ch == channel {
                    ring.mix_latest_into(&mut mix);
                    any = true;
                }
            }
            if !any {
                return false;
            }
        }

        let Ok(mut analysers) = self.analysers.lock() else {
            return false;
        };
        analysers.entry(channel).or_default().analyse(&mix, bins);
        true
    }
}
