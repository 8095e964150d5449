//! View state for the TUI: which panel has focus, the cursors, the track
//! filter and the open prompt. Everything about the show itself lives in
//! the session controller.

use crate::library::Playlist;
use crate::pads::PAD_COUNT;

/// The panel that receives navigation keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Playlists,
    Tracks,
    Pads,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Playlists => Focus::Tracks,
            Focus::Tracks => Focus::Pads,
            Focus::Pads => Focus::Playlists,
        }
    }
}

/// What a line-input prompt is asking for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PromptKind {
    SetFolder,
    AssignPad(usize),
    RenamePad(usize),
    Countdown,
}

impl PromptKind {
    pub fn title(self) -> String {
        match self {
            PromptKind::SetFolder => " music folder ".to_string(),
            PromptKind::AssignPad(i) => format!(" sound file for pad {} ", i + 1),
            PromptKind::RenamePad(i) => format!(" name for pad {} ", i + 1),
            PromptKind::Countdown => " countdown (m:ss or minutes) ".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

/// The main view model.
#[derive(Debug, Default)]
pub struct App {
    pub focus: Focus,
    pub playlist_cursor: usize,
    /// Index into the playlist's tracks, always one of the visible ones.
    pub selected: usize,
    pub pad_cursor: usize,

    pub filter_mode: bool,
    pub filter_query: String,

    pub prompt: Option<Prompt>,
    pub metadata_window: bool,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cycle_focus(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    /// Track indices that pass the filter, in playlist order.
    pub fn display_indices(&self, playlist: &Playlist) -> Vec<usize> {
        let query = self.filter_query.trim().to_lowercase();
        if query.is_empty() {
            return (0..playlist.len()).collect();
        }
        playlist
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                t.display_name.to_lowercase().contains(&query)
                    || t
                        .artist
                        .as_deref()
                        .is_some_and(|a| a.to_lowercase().contains(&query))
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// The next visible track after `current`, wrapping to the first.
    pub fn next_in_view_from(&self, playlist: &Playlist, current: usize) -> Option<usize> {
        let display = self.display_indices(playlist);
        if display.is_empty() {
            return None;
        }
        match display.iter().position(|&i| i == current) {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// The previous visible track before `current`, wrapping to the last.
    pub fn prev_in_view_from(&self, playlist: &Playlist, current: usize) -> Option<usize> {
        let display = self.display_indices(playlist);
        let last = *display.last()?;
        match display.iter().position(|&i| i == current) {
            Some(0) | None => Some(last),
            Some(p) => Some(display[p - 1]),
        }
    }

    /// Move the focused cursor down, wrapping.
    pub fn next(&mut self, playlist: &Playlist, playlist_count: usize) {
        match self.focus {
            Focus::Playlists => {
                if playlist_count > 0 {
                    self.playlist_cursor = (self.playlist_cursor + 1) % playlist_count;
                }
            }
            Focus::Tracks => {
                if let Some(next) = self.next_in_view_from(playlist, self.selected) {
                    self.selected = next;
                }
            }
            Focus::Pads => self.pad_cursor = (self.pad_cursor + 1) % PAD_COUNT,
        }
    }

    /// Move the focused cursor up, wrapping.
    pub fn prev(&mut self, playlist: &Playlist, playlist_count: usize) {
        match self.focus {
            Focus::Playlists => {
                if playlist_count > 0 {
                    self.playlist_cursor =
                        (self.playlist_cursor + playlist_count - 1) % playlist_count;
                }
            }
            Focus::Tracks => {
                if let Some(prev) = self.prev_in_view_from(playlist, self.selected) {
                    self.selected = prev;
                }
            }
            Focus::Pads => self.pad_cursor = (self.pad_cursor + PAD_COUNT - 1) % PAD_COUNT,
        }
    }

    pub fn first(&mut self, playlist: &Playlist) {
        match self.focus {
            Focus::Playlists => self.playlist_cursor = 0,
            Focus::Tracks => {
                if let Some(&first) = self.display_indices(playlist).first() {
                    self.selected = first;
                }
            }
            Focus::Pads => self.pad_cursor = 0,
        }
    }

    pub fn last(&mut self, playlist: &Playlist, playlist_count: usize) {
        match self.focus {
            Focus::Playlists => self.playlist_cursor = playlist_count.saturating_sub(1),
            Focus::Tracks => {
                if let Some(&last) = self.display_indices(playlist).last() {
                    self.selected = last;
                }
            }
            Focus::Pads => self.pad_cursor = PAD_COUNT - 1,
        }
    }

    /// A new playlist was opened: start at its top with no filter.
    pub fn reset_tracks(&mut self) {
        self.selected = 0;
        self.filter_query.clear();
        self.filter_mode = false;
    }

    /// Keep the cursors inside their lists after a rescan.
    pub fn clamp_cursors(&mut self, playlist: &Playlist, playlist_count: usize) {
        self.playlist_cursor = self.playlist_cursor.min(playlist_count.saturating_sub(1));
        self.ensure_selected_visible(playlist);
    }

    pub fn enter_filter_mode(&mut self, playlist: &Playlist) {
        self.filter_mode = true;
        self.focus = Focus::Tracks;
        self.ensure_selected_visible(playlist);
    }

    /// Leave filter mode, keeping the query applied.
    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    pub fn clear_filter(&mut self, playlist: &Playlist) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible(playlist);
    }

    pub fn push_filter_char(&mut self, playlist: &Playlist, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible(playlist);
    }

    pub fn pop_filter_char(&mut self, playlist: &Playlist) {
        self.filter_query.pop();
        self.ensure_selected_visible(playlist);
    }

    /// Move the selection to the first visible track when the filter hid it.
    fn ensure_selected_visible(&mut self, playlist: &Playlist) {
        let display = self.display_indices(playlist);
        match display.first() {
            None => self.selected = 0,
            Some(&first) if !display.contains(&self.selected) => self.selected = first,
            Some(_) => {}
        }
    }

    pub fn open_prompt(&mut self, kind: PromptKind, initial: impl Into<String>) {
        self.prompt = Some(Prompt {
            kind,
            input: initial.into(),
        });
    }

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
    }

    /// Close the prompt and hand back what was typed.
    pub fn take_prompt(&mut self) -> Option<Prompt> {
        self.prompt.take()
    }

    pub fn push_prompt_char(&mut self, c: char) {
        if let Some(p) = self.prompt.as_mut() {
            p.input.push(c);
        }
    }

    pub fn pop_prompt_char(&mut self) {
        if let Some(p) = self.prompt.as_mut() {
            p.input.pop();
        }
    }
}
