//! Utilities for wiring prepared sources into `rodio` sinks.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rodio::{OutputStream, Sink, Source};

use super::tap::{LevelTap, SampleRing};

/// Create a paused `Sink` on `stream` playing `source` through a level tap.
pub(super) fn attach_sink(
    stream: &OutputStream,
    source: Box<dyn Source + Send>,
    ring: Arc<SampleRing>,
    gain: f32,
) -> Sink {
    let sink = Sink::connect_new(stream.mixer());
    sink.pause();
    sink.set_volume(gain);
    sink.append(LevelTap::new(source, ring));
    sink
}

/// Ramp every sink from its current gain to silence over `fade_out_ms`.
pub(super) fn fade_out_sinks(sinks: &[&Sink], fade_out_ms: u64) {
    if sinks.is_empty() {
        return;
    }
    if fade_out_ms == 0 {
        sinks.iter().for_each(|s| s.set_volume(0.0));
        return;
    }

    let start: Vec<f32> = sinks.iter().map(|s| s.volume()).collect();
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        for (sink, gain) in sinks.iter().zip(&start) {
            sink.set_volume(gain * (1.0 - t));
        }
        thread::sleep(Duration::from_millis(step_ms));
    }
    sinks.iter().for_each(|s| s.set_volume(0.0));
}
