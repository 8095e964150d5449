use std::collections::VecDeque;

use chrono::{DateTime, Local};

/// How many plays the history keeps.
pub const HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub track_name: String,
    pub artist: String,
    pub timestamp: DateTime<Local>,
}

impl HistoryEntry {
    /// `HH:MM` of the moment the track started.
    pub fn time_text(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

/// Recently started tracks, newest first.
#[derive(Debug, Clone, Default)]
pub struct PlayHistory {
    entries: VecDeque<HistoryEntry>,
}

impl PlayHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a play, evicting the oldest entry past capacity.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
