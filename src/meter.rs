//! VU levels for the music and effects channels.
//!
//! Levels are recomputed every display frame. With a live signal the level
//! follows the frequency bins; without one the meter falls back to a
//! decorative jitter scaled by the channel volume.

use crate::audio::{Channel, SignalAccess};

const MEAN_WEIGHT: f32 = 0.7;
const PEAK_WEIGHT: f32 = 0.3;
const GAIN: f32 = 1.5;

/// Per-frame inputs for one channel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ChannelState {
    pub volume: f32,
    pub muted: bool,
    /// Audibly active: music is Playing, or any pad is playing.
    pub active: bool,
}

impl ChannelState {
    fn audible(&self) -> bool {
        self.active && !self.muted
    }
}

/// Level from byte-scaled frequency bins, in `[0, 1]`.
pub fn level_from_bins(bins: &[u8], state: ChannelState) -> f32 {
    if !state.audible() || bins.is_empty() {
        return 0.0;
    }
    let sum: u32 = bins.iter().map(|&b| u32::from(b)).sum();
    let mean = sum as f32 / bins.len() as f32 / 255.0;
    let peak = f32::from(bins.iter().copied().max().unwrap_or(0)) / 255.0;

    let level = ((MEAN_WEIGHT * mean + PEAK_WEIGHT * peak) * GAIN).min(1.0) * state.volume;
    level.clamp(0.0, 1.0)
}

/// Synthetic level used when no live signal is available. `jitter` is in
/// `[0, 1)`.
pub fn fallback_level(state: ChannelState, jitter: f32) -> f32 {
    if !state.audible() {
        return 0.0;
    }
    (state.volume * (0.7 + 0.3 * jitter.clamp(0.0, 1.0))).clamp(0.0, 1.0)
}

/// Latest levels for both channels.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Levels {
    pub music: f32,
    pub effects: f32,
}

#[derive(Debug, Default)]
pub struct LevelMeter {
    bins: Vec<u8>,
    levels: Levels,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute both channels from `signal` (when present) and return them.
    pub fn sample(
        &mut self,
        signal: Option<&dyn SignalAccess>,
        music: ChannelState,
        effects: ChannelState,
    ) -> Levels {
        self.levels = Levels {
            music: self.channel_level(signal, Channel::Music, music),
            effects: self.channel_level(signal, Channel::Effects, effects),
        };
        self.levels
    }

    pub fn levels(&self) -> Levels {
        self.levels
    }

    fn channel_level(
        &mut self,
        signal: Option<&dyn SignalAccess>,
        channel: Channel,
        state: ChannelState,
    ) -> f32 {
        if !state.audible() {
            return 0.0;
        }
        match signal {
            Some(signal) if signal.frequency_bins(channel, &mut self.bins) => {
                level_from_bins(&self.bins, state)
            }
            _ => fallback_level(state, rand::random::<f32>()),
        }
    }
}
