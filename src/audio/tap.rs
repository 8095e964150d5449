//! Sample taps feeding the analyser.
//!
//! `LevelTap` wraps a playing source and copies what it yields into a
//! per-resource `SampleRing`. The mixer thread never blocks on the ring: it
//! batches samples locally and only flushes when the lock is free.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rodio::Source;
use rodio::source::SeekError;

const FLUSH_EVERY: usize = 512;

#[derive(Debug)]
pub(crate) struct SampleRing {
    samples: Mutex<VecDeque<f32>>,
    capacity: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append `batch`, dropping the oldest samples beyond capacity. Returns
    /// `false` (and keeps nothing) when the ring is busy.
    pub fn try_push(&self, batch: &[f32]) -> bool {
        let Ok(mut ring) = self.samples.try_lock() else {
            return false;
        };
        let keep = &batch[batch.len().saturating_sub(self.capacity)..];
        let overflow = (ring.len() + keep.len()).saturating_sub(self.capacity);
        ring.drain(..overflow);
        ring.extend(keep.iter().copied());
        true
    }

    /// Add the most recent `out.len()` samples into `out`, aligned to its end.
    pub fn mix_latest_into(&self, out: &mut [f32]) {
        let Ok(ring) = self.samples.lock() else {
            return;
        };
        let n = out.len().min(ring.len());
        let start_out = out.len() - n;
        let start_ring = ring.len() - n;
        for (dst, src) in out[start_out..].iter_mut().zip(ring.range(start_ring..)) {
            *dst += *src;
        }
    }

    pub fn clear(&self) {
        if let Ok(mut ring) = self.samples.lock() {
            ring.clear();
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.lock().map(|r| r.len()).unwrap_or(0)
    }
}

pub(crate) struct LevelTap<S> {
    inner: S,
    ring: Arc<SampleRing>,
    pending: Vec<f32>,
}

impl<S> LevelTap<S> {
    pub fn new(inner: S, ring: Arc<SampleRing>) -> Self {
        Self {
            inner,
            ring,
            pending: Vec::with_capacity(FLUSH_EVERY),
        }
    }
}

impl<S: Source> Iterator for LevelTap<S> {
    type Item = rodio::Sample;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.inner.next()?;
        self.pending.push(sample);
        if self.pending.len() >= FLUSH_EVERY {
            // Busy ring: keep the batch and try again next flush.
            if self.ring.try_push(&self.pending) || self.pending.len() >= FLUSH_EVERY * 8 {
                self.pending.clear();
            }
        }
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S: Source> Source for LevelTap<S> {
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> rodio::ChannelCount {
        self.inner.channels()
    }

    fn sample_rate(&self) -> rodio::SampleRate {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.pending.clear();
        self.ring.clear();
        self.inner.try_seek(pos)
    }
}
