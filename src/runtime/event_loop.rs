use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::bail;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::debug;
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, Focus, PromptKind};
use crate::audio::AudioEngine;
use crate::error::Severity;
use crate::mpris::{ControlCmd, MediaSession};
use crate::runtime::mpris_sync::MprisSync;
use crate::session::{Controller, LibraryState, hotkey_for, parse_countdown};
use crate::ui;

/// Seek step for `H`/`L`, in percent of the track.
const SEEK_STEP_PERCENT: f64 = 5.0;

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// Track index the cursor last followed.
    pub last_followed: Option<usize>,
    pub mpris: MprisSync,
}

/// Main terminal event loop: ticks the session, draws, and handles input
/// and media keys. Returns `Ok(())` when the user quits.
pub fn run<E: AudioEngine>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    desk: &mut Controller<E>,
    media: &dyn MediaSession,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> anyhow::Result<()> {
    let frame = Duration::from_millis(desk.settings().ui.frame_ms.max(1));
    loop {
        desk.tick(Instant::now());
        sync_view(app, desk, state);
        state.mpris.update(media, desk);

        terminal.draw(|f| ui::draw(f, app, desk, Instant::now()))?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, desk) {
                return Ok(());
            }
        }

        if event::poll(frame)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key_event(key, app, desk, state) {
                    Ok(true) => return Ok(()),
                    Ok(false) => {}
                    Err(e) => desk.report_error(&e),
                }
            }
        }
    }
}

/// Keep the cursors valid and let the track cursor follow playback.
pub fn sync_view<E: AudioEngine>(app: &mut App, desk: &Controller<E>, state: &mut EventLoopState) {
    let playing = desk.player().index();
    if playing != state.last_followed {
        state.last_followed = playing;
        if let Some(index) = playing {
            if !app.filter_mode {
                app.selected = index;
            }
        }
    }
    app.clamp_cursors(desk.playlist(), desk.playlists().len());
}

/// Media keys. Only Stop and Quit get through the lock.
pub fn handle_control_cmd<E: AudioEngine>(cmd: ControlCmd, desk: &mut Controller<E>) -> bool {
    if desk.is_locked() && !matches!(cmd, ControlCmd::Stop | ControlCmd::Quit) {
        debug!("media key {cmd:?} blocked by the lock");
        return false;
    }
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => desk.play_music(),
        ControlCmd::Pause => desk.pause_music(),
        ControlCmd::PlayPause => desk.toggle_play(),
        ControlCmd::Stop => desk.stop_everything(),
        ControlCmd::Next => desk.next_track(),
        ControlCmd::Prev => desk.previous_track(),
    }
    false
}

/// Returns `Ok(true)` when the user asked to quit.
pub fn handle_key_event<E: AudioEngine>(
    key: KeyEvent,
    app: &mut App,
    desk: &mut Controller<E>,
    state: &mut EventLoopState,
) -> anyhow::Result<bool> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    if app.prompt.is_some() {
        state.pending_gg = false;
        match key.code {
            KeyCode::Esc => app.cancel_prompt(),
            KeyCode::Backspace => app.pop_prompt_char(),
            KeyCode::Enter => submit_prompt(app, desk)?,
            KeyCode::Char(c) if !c.is_control() => app.push_prompt_char(c),
            _ => {}
        }
        return Ok(false);
    }

    if app.filter_mode {
        state.pending_gg = false;
        let playlist = desk.playlist();
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => app.clear_filter(playlist),
            KeyCode::Backspace => app.pop_filter_char(playlist),
            KeyCode::Enter => app.exit_filter_mode(),
            KeyCode::Char('j' | 'n') if ctrl => app.next(playlist, 0),
            KeyCode::Char('k' | 'p') if ctrl => app.prev(playlist, 0),
            KeyCode::Char(c) if !c.is_control() => app.push_filter_char(playlist, c),
            _ => {}
        }
        return Ok(false);
    }

    if let Some(hotkey) = hotkey_for(&key) {
        state.pending_gg = false;
        desk.handle_hotkey(hotkey);
        return Ok(false);
    }

    if desk.is_locked() {
        state.pending_gg = false;
        if matches!(key.code, KeyCode::Char(_) | KeyCode::Enter | KeyCode::Tab) {
            desk.set_status("Interface locked, press l to unlock", Severity::Warning);
        }
        return Ok(false);
    }

    let playlist_count = desk.playlists().len();
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }
    match key.code {
        KeyCode::Char('q') => return Ok(true),
        KeyCode::Tab => app.cycle_focus(),
        KeyCode::Char('j') => app.next(desk.playlist(), playlist_count),
        KeyCode::Char('k') => app.prev(desk.playlist(), playlist_count),
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.first(desk.playlist());
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.last(desk.playlist(), playlist_count),
        KeyCode::Enter => activate(app, desk),
        KeyCode::Char('/') => app.enter_filter_mode(desk.playlist()),
        KeyCode::Char('r') => desk.cycle_mode(),
        KeyCode::Char('R') => desk.refresh_playlists(),
        KeyCode::Char('H') => seek_by(desk, -SEEK_STEP_PERCENT),
        KeyCode::Char('L') => seek_by(desk, SEEK_STEP_PERCENT),
        KeyCode::Char('K') => app.toggle_metadata_window(),
        KeyCode::Char('a') => {
            let initial = desk
                .pads()
                .slot(app.pad_cursor)
                .and_then(|s| s.assigned_path.clone())
                .or_else(|| desk.music_folder())
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            app.open_prompt(PromptKind::AssignPad(app.pad_cursor), initial);
        }
        KeyCode::Char('n') => {
            let name = desk
                .pads()
                .slot(app.pad_cursor)
                .map(|s| s.display_name.clone())
                .unwrap_or_default();
            app.open_prompt(PromptKind::RenamePad(app.pad_cursor), name);
        }
        KeyCode::Char('x') => desk.clear_pad(app.pad_cursor),
        KeyCode::Char('X') => {
            let stopped = desk.stop_all_effects();
            desk.set_status(format!("Stopped {stopped} effects"), Severity::Info);
        }
        KeyCode::Char('f') => {
            let initial = desk
                .music_folder()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            app.open_prompt(PromptKind::SetFolder, initial);
        }
        KeyCode::Char('c') => app.open_prompt(PromptKind::Countdown, ""),
        KeyCode::Char('C') => {
            if desk.countdown().is_running() {
                desk.stop_countdown();
            } else {
                desk.reset_countdown();
            }
        }
        _ => {}
    }
    Ok(false)
}

/// Enter: open a playlist, play a track or fire a pad.
fn activate<E: AudioEngine>(app: &mut App, desk: &mut Controller<E>) {
    match app.focus {
        Focus::Playlists => {
            if *desk.library_state() != LibraryState::Ready
                || app.playlist_cursor >= desk.playlists().len()
            {
                return;
            }
            desk.select_playlist(app.playlist_cursor);
            app.reset_tracks();
            app.focus = Focus::Tracks;
        }
        Focus::Tracks => {
            if app.display_indices(desk.playlist()).contains(&app.selected) {
                desk.play_track(app.selected);
            }
        }
        Focus::Pads => desk.trigger_pad(app.pad_cursor),
    }
}

fn seek_by<E: AudioEngine>(desk: &mut Controller<E>, delta_percent: f64) {
    let player = desk.player();
    if player.current_track().is_none() {
        return;
    }
    let target = (player.progress().fraction() * 100.0 + delta_percent).clamp(0.0, 100.0);
    desk.seek_percent(target);
}

fn submit_prompt<E: AudioEngine>(app: &mut App, desk: &mut Controller<E>) -> anyhow::Result<()> {
    let Some(prompt) = app.take_prompt() else {
        return Ok(());
    };
    let input = prompt.input.trim();
    match prompt.kind {
        PromptKind::SetFolder => {
            if input.is_empty() {
                return Ok(());
            }
            if desk.set_music_folder(expand_path(input)?) {
                app.playlist_cursor = 0;
                app.reset_tracks();
                app.focus = Focus::Playlists;
            }
        }
        PromptKind::AssignPad(index) => {
            if !input.is_empty() {
                desk.assign_pad(index, expand_path(input)?);
            }
        }
        PromptKind::RenamePad(index) => desk.rename_pad(index, input),
        PromptKind::Countdown => match parse_countdown(input) {
            Some(secs) => {
                desk.start_countdown(secs);
            }
            None => desk.set_status("Enter the time as m:ss or minutes", Severity::Warning),
        },
    }
    Ok(())
}

/// Turn typed or dropped text into a path: strips surrounding quotes and
/// expands a leading `~`.
pub fn expand_path(input: &str) -> anyhow::Result<PathBuf> {
    let trimmed = input.trim();
    let unquoted = ['\'', '"']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|s| s.strip_suffix(*q))
        })
        .unwrap_or(trimmed);

    let rest = match unquoted.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return Ok(PathBuf::from(unquoted)),
    };
    let Some(home) = std::env::var_os("HOME") else {
        bail!("cannot expand ~ without HOME");
    };
    Ok(PathBuf::from(home).join(rest.trim_start_matches('/')))
}
