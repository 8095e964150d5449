//! Cooperative timer scheduler.
//!
//! All periodic work (progress redraws, pad fills, clocks, countdowns,
//! debounces, delayed retries) is registered here under a key and fired from
//! the single event-loop tick. Replacing or cancelling a key is the only way
//! a timer goes away, so teardown is a matter of cancelling keys.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cadence {
    /// Fire on every tick (frame-synchronized).
    EveryFrame,
    /// Fire repeatedly with a fixed period.
    Every(Duration),
    /// Fire once after the delay, then unregister.
    Once(Duration),
}

#[derive(Debug, Clone)]
struct Entry {
    cadence: Cadence,
    next_due: Instant,
}

#[derive(Debug, Clone)]
pub struct Scheduler<K: Ord + Copy> {
    entries: BTreeMap<K, Entry>,
}

impl<K: Ord + Copy> Default for Scheduler<K> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy> Scheduler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key`, replacing (and restarting) any timer under the same key.
    pub fn schedule(&mut self, key: K, cadence: Cadence, now: Instant) {
        let next_due = match cadence {
            Cadence::EveryFrame => now,
            Cadence::Every(period) | Cadence::Once(period) => now + period,
        };
        self.entries.insert(key, Entry { cadence, next_due });
    }

    /// Register `key` only if it is not already active.
    pub fn ensure(&mut self, key: K, cadence: Cadence, now: Instant) {
        if !self.entries.contains_key(&key) {
            self.schedule(key, cadence, now);
        }
    }

    /// Remove `key`. Returns whether a timer was registered.
    pub fn cancel(&mut self, key: K) -> bool {
        self.entries.remove(&key).is_some()
    }

    /// Remove every key matching `pred`.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&K) -> bool) {
        self.entries.retain(|k, _| !pred(k));
    }

    #[cfg(test)]
    pub fn is_active(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Collect the keys due at `now`, in key order, advancing periodic timers
    /// and dropping one-shots.
    pub fn due(&mut self, now: Instant) -> Vec<K> {
        let mut fired = Vec::new();
        let mut finished = Vec::new();

        for (key, entry) in self.entries.iter_mut() {
            if now < entry.next_due {
                continue;
            }
            fired.push(*key);
            match entry.cadence {
                Cadence::EveryFrame => entry.next_due = now,
                Cadence::Every(period) => {
                    entry.next_due += period;
                    // Skip missed periods instead of firing in a burst.
                    if entry.next_due <= now {
                        entry.next_due = now + period;
                    }
                }
                Cadence::Once(_) => finished.push(*key),
            }
        }

        for key in finished {
            self.entries.remove(&key);
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
    enum Key {
        Frame,
        Tick,
        Retry,
    }

    #[test]
    fn every_frame_fires_on_each_call() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(Key::Frame, Cadence::EveryFrame, t0);
        assert_eq!(s.due(t0), vec![Key::Frame]);
        assert_eq!(s.due(t0 + Duration::from_millis(1)), vec![Key::Frame]);
    }

    #[test]
    fn periodic_timer_waits_for_its_period() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(Key::Tick, Cadence::Every(Duration::from_millis(50)), t0);
        assert!(s.due(t0 + Duration::from_millis(49)).is_empty());
        assert_eq!(s.due(t0 + Duration::from_millis(50)), vec![Key::Tick]);
        assert!(s.due(t0 + Duration::from_millis(60)).is_empty());
        // A long stall fires once, not once per missed period.
        assert_eq!(s.due(t0 + Duration::from_secs(5)), vec![Key::Tick]);
        assert!(s.due(t0 + Duration::from_millis(5010)).is_empty());
    }

    #[test]
    fn once_unregisters_after_firing() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(Key::Retry, Cadence::Once(Duration::from_secs(1)), t0);
        assert!(s.is_active(Key::Retry));
        assert_eq!(s.due(t0 + Duration::from_secs(1)), vec![Key::Retry]);
        assert!(!s.is_active(Key::Retry));
        assert!(s.due(t0 + Duration::from_secs(2)).is_empty());
    }

    #[test]
    fn rescheduling_restarts_the_delay() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(Key::Retry, Cadence::Once(Duration::from_millis(50)), t0);
        s.schedule(
            Key::Retry,
            Cadence::Once(Duration::from_millis(50)),
            t0 + Duration::from_millis(40),
        );
        assert!(s.due(t0 + Duration::from_millis(60)).is_empty());
        assert_eq!(s.due(t0 + Duration::from_millis(90)), vec![Key::Retry]);
    }

    #[test]
    fn cancel_and_clear_remove_timers() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(Key::Frame, Cadence::EveryFrame, t0);
        s.schedule(Key::Tick, Cadence::Every(Duration::from_millis(10)), t0);
        assert!(s.cancel(Key::Frame));
        assert!(!s.cancel(Key::Frame));
        assert_eq!(s.len(), 1);
        s.clear();
        assert!(s.due(t0 + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn ensure_does_not_restart_an_active_timer() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(Key::Tick, Cadence::Every(Duration::from_millis(50)), t0);
        s.ensure(
            Key::Tick,
            Cadence::Every(Duration::from_millis(50)),
            t0 + Duration::from_millis(30),
        );
        assert_eq!(s.due(t0 + Duration::from_millis(50)), vec![Key::Tick]);
    }
}
