//! Stage countdown timer, ticked once per second by the scheduler.

use crate::player::{RemainingLevel, Thresholds};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CountdownTick {
    Running,
    Finished,
    Idle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining_secs: u64,
    running: bool,
}

impl Countdown {
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start counting down from `secs`. Zero is refused.
    pub fn start(&mut self, secs: u64) -> bool {
        if secs == 0 {
            return false;
        }
        self.remaining_secs = secs;
        self.running = true;
        true
    }

    /// Pause, keeping the remaining time.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.remaining_secs = 0;
    }

    /// One second elapsed.
    pub fn tick(&mut self) -> CountdownTick {
        if !self.running {
            return CountdownTick::Idle;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.running = false;
            CountdownTick::Finished
        } else {
            CountdownTick::Running
        }
    }

    /// Colour band of the display. A finished or unset timer is normal.
    pub fn level(&self, thresholds: Thresholds) -> RemainingLevel {
        if self.remaining_secs == 0 {
            RemainingLevel::Normal
        } else {
            thresholds.level(self.remaining_secs as f64)
        }
    }

    pub fn text(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }
}

/// Parse `mm:ss` or plain minutes into seconds.
pub fn parse_countdown(input: &str) -> Option<u64> {
    let input = input.trim();
    match input.split_once(':') {
        Some((m, s)) => {
            let minutes: u64 = m.trim().parse().ok()?;
            let seconds: u64 = s.trim().parse().ok()?;
            if seconds >= 60 {
                return None;
            }
            minutes.checked_mul(60)?.checked_add(seconds)
        }
        None => input.parse::<u64>().ok()?.checked_mul(60),
    }
}
