use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

#[derive(Debug, Clone)]
pub struct SessionStats {
    pub tracks_played: u64,
    pub session_start: Instant,
    pub started_at: DateTime<Local>,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self {
            tracks_played: 0,
            session_start: Instant::now(),
            started_at: Local::now(),
        }
    }
}

impl SessionStats {
    pub fn record_play(&mut self) {
        self.tracks_played += 1;
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.session_start)
    }
}
