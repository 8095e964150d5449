use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::error::{LoadError, PlaybackError};

use super::loader::{PrepareJob, Prepared};
use super::sink::{attach_sink, fade_out_sinks};
use super::tap::SampleRing;
use super::types::{
    Channel, EngineCmd, EngineEvent, LoadOptions, ResourceId, ResourceInfo, ResourceTable,
};

/// How often natural ends are checked for.
const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// Samples kept per resource for analysis (a little over 100 ms of stereo 44.1k).
const RING_CAPACITY: usize = 8192;

pub(crate) type TapTable = Arc<Mutex<HashMap<ResourceId, (Channel, Arc<SampleRing>)>>>;

pub(super) struct Shared {
    pub table: ResourceTable,
    pub taps: TapTable,
    pub events: Sender<EngineEvent>,
    pub jobs: Sender<PrepareJob>,
}

struct Slot {
    path: PathBuf,
    options: LoadOptions,
    ring: Arc<SampleRing>,
    sink: Option<Sink>,
    ticket: u64,
    preparing: bool,
    /// The first prepare succeeded and `Loaded` was sent.
    loaded: bool,
    /// The first prepare failed; the resource is unusable.
    failed: bool,
    want_playing: bool,
}

impl Slot {
    fn gain(&self) -> f32 {
        if self.options.muted {
            0.0
        } else {
            self.options.volume
        }
    }
}

/// What a play command does to a slot that loaded successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PlayAction {
    /// The sink still holds audio: unpause it.
    Resume,
    /// A prepare is in flight; it starts playing when it lands.
    Wait,
    /// Ended or stopped: reopen from the top.
    Rebuild,
}

pub(super) fn play_action(sink_has_audio: bool, preparing: bool) -> PlayAction {
    if sink_has_audio {
        PlayAction::Resume
    } else if preparing {
        PlayAction::Wait
    } else {
        PlayAction::Rebuild
    }
}

/// What the end check does with a slot whose sink ran dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FinishAction {
    Restart,
    Ended,
}

/// `drained` is `None` when the slot has no sink. Only a slot that is
/// meant to be playing can finish, so a stopped or already ended slot
/// never reports again.
pub(super) fn finish_action(
    want_playing: bool,
    drained: Option<bool>,
    looping: bool,
) -> Option<FinishAction> {
    if !want_playing || drained != Some(true) {
        return None;
    }
    Some(if looping {
        FinishAction::Restart
    } else {
        FinishAction::Ended
    })
}

pub(super) fn spawn_audio_thread(
    rx: Receiver<EngineCmd>,
    shared: Shared,
    ready: SyncSender<Result<(), String>>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("stagemix-audio".into())
        .spawn(move || {
            let mut stream = match OutputStreamBuilder::open_default_stream() {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready.send(Err(e.to_string()));
                    return;
                }
            };
            // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
            // but noisy for a TUI app.
            stream.log_on_drop(false);
            let _ = ready.send(Ok(()));
            info!("audio output opened");

            let mut audio = AudioThread {
                stream,
                slots: HashMap::new(),
                shared,
                last_check: Instant::now(),
            };
            audio.run(rx);
        })
}

struct AudioThread {
    stream: OutputStream,
    slots: HashMap<ResourceId, Slot>,
    shared: Shared,
    last_check: Instant,
}

impl AudioThread {
    fn run(&mut self, rx: Receiver<EngineCmd>) {
        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(EngineCmd::Quit { fade_out_ms }) => {
                    self.quit(fade_out_ms);
                    break;
                }
                Ok(cmd) => self.handle(cmd),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            // A steady stream of commands must not starve end detection.
            if self.last_check.elapsed() >= POLL_INTERVAL {
                self.check_finished();
                self.last_check = Instant::now();
            }
        }
        debug!("audio thread exiting");
    }

    fn handle(&mut self, cmd: EngineCmd) {
        match cmd {
            EngineCmd::Load { id, path, options } => self.load(id, path, options),
            EngineCmd::Prepared(prepared) => self.on_prepared(prepared),
            EngineCmd::Play(id) => self.play(id),
            EngineCmd::Pause(id) => self.pause(id),
            EngineCmd::Stop(id) => self.stop(id),
            EngineCmd::Seek(id, pos) => self.seek(id, pos),
            EngineCmd::SetVolume(id, volume) => {
                if let Some(slot) = self.slots.get_mut(&id) {
                    slot.options.volume = volume;
                    if let Some(sink) = &slot.sink {
                        sink.set_volume(slot.gain());
                    }
                }
                self.update_info(id, |info| info.volume = volume);
            }
            EngineCmd::SetMuted(id, muted) => {
                if let Some(slot) = self.slots.get_mut(&id) {
                    slot.options.muted = muted;
                    if let Some(sink) = &slot.sink {
                        sink.set_volume(slot.gain());
                    }
                }
                self.update_info(id, |info| info.muted = muted);
            }
            EngineCmd::SetLooping(id, looping) => {
                if let Some(slot) = self.slots.get_mut(&id) {
                    slot.options.looping = looping;
                }
            }
            EngineCmd::Unload(id) => self.unload(id),
            EngineCmd::Quit { .. } => {}
        }
    }

    fn load(&mut self, id: ResourceId, path: PathBuf, options: LoadOptions) {
        let ring = Arc::new(SampleRing::new(RING_CAPACITY));
        if let Ok(mut taps) = self.shared.taps.lock() {
            taps.insert(id, (options.channel, ring.clone()));
        }
        if let Ok(mut table) = self.shared.table.lock() {
            table.insert(id, ResourceInfo::new(&options));
        }
        self.slots.insert(
            id,
            Slot {
                path,
                options,
                ring,
                sink: None,
                ticket: 0,
                preparing: false,
                loaded: false,
                failed: false,
                want_playing: false,
            },
        );
        self.request_prepare(id, Duration::ZERO);
    }

    /// Drop the current sink (if any) and ask the loader for a fresh source
    /// positioned at `start_at`.
    fn request_prepare(&mut self, id: ResourceId, start_at: Duration) {
        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        if let Some(old) = slot.sink.take() {
            old.stop();
        }
        slot.ring.clear();
        slot.ticket += 1;
        slot.preparing = true;

        let job = PrepareJob {
            id,
            ticket: slot.ticket,
            path: slot.path.clone(),
            start_at,
        };
        if self.shared.jobs.send(job).is_err() {
            error!("loader thread is gone; cannot prepare {id}");
            slot.preparing = false;
            let event = if slot.loaded {
                EngineEvent::PlayFailed {
                    id,
                    error: PlaybackError::Device("loader thread stopped".into()),
                }
            } else {
                slot.failed = true;
                EngineEvent::LoadFailed {
                    id,
                    error: LoadError::NoDevice,
                }
            };
            self.emit(event);
        }
    }

    fn on_prepared(&mut self, prepared: Prepared) {
        let Prepared {
            id,
            ticket,
            start_at,
            result,
        } = prepared;

        let Some(slot) = self.slots.get_mut(&id) else {
            debug!("dropping prepared source for unloaded {id}");
            return;
        };
        if ticket != slot.ticket {
            debug!("dropping stale prepare {ticket} for {id}");
            return;
        }
        slot.preparing = false;

        match result {
            Ok(source) => {
                let first = !slot.loaded;
                slot.loaded = true;

                let sink = attach_sink(&self.stream, source.source, slot.ring.clone(), slot.gain());
                let playing = slot.want_playing;
                if playing {
                    sink.play();
                }
                slot.sink = Some(sink);

                let now = Instant::now();
                self.update_info(id, |info| {
                    info.loaded = true;
                    if source.duration.is_some() {
                        info.duration = source.duration;
                    }
                    info.mark_stopped();
                    info.set_position(start_at, now);
                    if playing {
                        info.mark_playing(now);
                    }
                });

                if first {
                    self.emit(EngineEvent::Loaded {
                        id,
                        duration: source.duration.map(|d| d.as_secs_f64()),
                    });
                }
            }
            Err(error) => {
                if slot.loaded {
                    warn!("reopening {id} failed: {error}");
                    let was_playing = slot.want_playing;
                    slot.want_playing = false;
                    self.update_info(id, |info| info.mark_stopped());
                    if was_playing {
                        self.emit(EngineEvent::PlayFailed {
                            id,
                            error: PlaybackError::Device(error.to_string()),
                        });
                    }
                } else {
                    warn!("loading {id} failed: {error}");
                    slot.failed = true;
                    slot.want_playing = false;
                    self.emit(EngineEvent::LoadFailed { id, error });
                }
            }
        }
    }

    fn play(&mut self, id: ResourceId) {
        let Some(slot) = self.slots.get_mut(&id).filter(|s| !s.failed) else {
            self.emit(EngineEvent::PlayFailed {
                id,
                error: PlaybackError::NotLoaded,
            });
            return;
        };

        slot.want_playing = true;
        let sink_has_audio = slot.sink.as_ref().is_some_and(|s| !s.empty());
        match play_action(sink_has_audio, slot.preparing) {
            PlayAction::Resume => {
                if let Some(sink) = &slot.sink {
                    sink.play();
                }
                let now = Instant::now();
                self.update_info(id, |info| info.mark_playing(now));
            }
            PlayAction::Wait => {}
            PlayAction::Rebuild => self.request_prepare(id, Duration::ZERO),
        }
    }

    fn pause(&mut self, id: ResourceId) {
        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        slot.want_playing = false;
        if let Some(sink) = &slot.sink {
            sink.pause();
        }
        let now = Instant::now();
        self.update_info(id, |info| info.mark_paused(now));
    }

    fn stop(&mut self, id: ResourceId) {
        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        slot.want_playing = false;
        if let Some(sink) = slot.sink.take() {
            sink.stop();
        }
        // A rebuild in flight is abandoned; the initial load is not.
        if slot.loaded && slot.preparing {
            slot.ticket += 1;
            slot.preparing = false;
        }
        slot.ring.clear();
        self.update_info(id, |info| info.mark_stopped());
    }

    fn seek(&mut self, id: ResourceId, pos: Duration) {
        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        if !slot.loaded {
            return;
        }

        let seeked = match &slot.sink {
            Some(sink) if !sink.empty() => match sink.try_seek(pos) {
                Ok(()) => true,
                Err(e) => {
                    debug!("in-place seek refused for {id}: {e}; reopening");
                    false
                }
            },
            _ => false,
        };

        if seeked {
            let now = Instant::now();
            self.update_info(id, |info| info.set_position(pos, now));
        } else {
            self.request_prepare(id, pos);
        }
    }

    fn unload(&mut self, id: ResourceId) {
        if let Some(slot) = self.slots.remove(&id) {
            if let Some(sink) = slot.sink {
                sink.stop();
            }
            debug!("unloaded {id}");
        }
        if let Ok(mut taps) = self.shared.taps.lock() {
            taps.remove(&id);
        }
        if let Ok(mut table) = self.shared.table.lock() {
            table.remove(&id);
        }
    }

    fn check_finished(&mut self) {
        let mut restart = Vec::new();
        let mut finished = Vec::new();

        for (id, slot) in &self.slots {
            let drained = slot.sink.as_ref().map(Sink::empty);
            match finish_action(slot.want_playing, drained, slot.options.looping) {
                Some(FinishAction::Restart) => restart.push(*id),
                Some(FinishAction::Ended) => finished.push(*id),
                None => {}
            }
        }

        for id in restart {
            debug!("looping {id}");
            self.request_prepare(id, Duration::ZERO);
        }

        for id in finished {
            if let Some(slot) = self.slots.get_mut(&id) {
                slot.want_playing = false;
                slot.sink = None;
                slot.ring.clear();
            }
            self.update_info(id, |info| info.mark_stopped());
            self.emit(EngineEvent::Ended { id });
        }
    }

    fn quit(&mut self, fade_out_ms: u64) {
        let sinks: Vec<&Sink> = self
            .slots
            .values()
            .filter(|s| s.want_playing)
            .filter_map(|s| s.sink.as_ref())
            .collect();
        fade_out_sinks(&sinks, fade_out_ms);

        for slot in self.slots.values() {
            if let Some(sink) = &slot.sink {
                sink.stop();
            }
        }
        // Update shared state so the UI doesn't keep showing Playing.
        if let Ok(mut table) = self.shared.table.lock() {
            table.values_mut().for_each(|info| info.playing = false);
        }
    }

    fn update_info(&self, id: ResourceId, f: impl FnOnce(&mut ResourceInfo)) {
        if let Ok(mut table) = self.shared.table.lock() {
            if let Some(info) = table.get_mut(&id) {
                f(info);
            }
        }
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.shared.events.send(event);
    }
}
