use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::{TempDir, tempdir};

use super::event_loop::{
    EventLoopState, expand_path, handle_control_cmd, handle_key_event, sync_view,
};
use super::mpris_sync::MprisSync;
use super::startup::{Cli, parse_args, render_config};
use crate::app::{App, Focus, PromptKind};
use crate::audio::fake::FakeEngine;
use crate::config::Settings;
use crate::library::Track;
use crate::mpris::{ControlCmd, MediaSession};
use crate::player::PlaybackStatus;
use crate::session::{Controller, SessionPaths};

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"not really audio").unwrap();
}

fn stage() -> TempDir {
    let dir = tempdir().unwrap();
    for f in ["Act 1/01 Overture.mp3", "Act 1/02 Storm.mp3", "Act 2/Interval.wav"] {
        touch(&dir.path().join("music").join(f));
    }
    touch(&dir.path().join("fx/thunder.wav"));
    dir
}

fn desk(dir: &Path) -> Controller<FakeEngine> {
    Controller::new(
        FakeEngine::new(),
        Settings::default(),
        SessionPaths {
            snapshot: Some(dir.join("state/session.json")),
            folder: Some(dir.join("state/folder.json")),
        },
        Some(dir.join("music")),
    )
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn press(
    app: &mut App,
    desk: &mut Controller<FakeEngine>,
    state: &mut EventLoopState,
    code: KeyCode,
) -> bool {
    handle_key_event(key(code), app, desk, state).unwrap()
}

fn type_text(
    app: &mut App,
    desk: &mut Controller<FakeEngine>,
    state: &mut EventLoopState,
    text: &str,
) {
    for c in text.chars() {
        press(app, desk, state, KeyCode::Char(c));
    }
}

// ----- command line ---------------------------------------------------------

#[test]
fn folder_and_print_config_are_parsed() {
    let args = ["/show/music", "--print-config", "--verbose", "extra"].map(String::from);
    let (cli, ignored) = parse_args(args);
    assert_eq!(
        cli,
        Cli {
            folder: Some(PathBuf::from("/show/music")),
            print_config: true,
        }
    );
    assert_eq!(ignored, vec!["--verbose".to_string(), "extra".to_string()]);

    let (cli, ignored) = parse_args(Vec::<String>::new());
    assert_eq!(cli, Cli::default());
    assert!(ignored.is_empty());
}

#[test]
fn printed_config_is_valid_toml() {
    let text = render_config(&Settings::default()).unwrap();
    assert!(text.contains("[audio]"));
    assert!(text.contains("quit_fade_out_ms = 500"));
    let back: Settings = toml::from_str(&text).unwrap();
    assert_eq!(back.ui.frame_ms, Settings::default().ui.frame_ms);
}

#[test]
fn typed_paths_lose_quotes_and_expand_home() {
    assert_eq!(
        expand_path("  '/show/fx/thunder.wav' ").unwrap(),
        PathBuf::from("/show/fx/thunder.wav")
    );
    assert_eq!(
        expand_path("\"/a b/c.mp3\"").unwrap(),
        PathBuf::from("/a b/c.mp3")
    );
    assert_eq!(expand_path("~user/x").unwrap(), PathBuf::from("~user/x"));
    if let Some(home) = std::env::var_os("HOME") {
        assert_eq!(
            expand_path("~/Music").unwrap(),
            PathBuf::from(home).join("Music")
        );
    }
}

// ----- keys -----------------------------------------------------------------

#[test]
fn enter_opens_the_playlist_and_moves_to_tracks() {
    let dir = stage();
    let mut d = desk(dir.path());
    let mut app = App::new();
    let mut state = EventLoopState::default();

    press(&mut app, &mut d, &mut state, KeyCode::Char('j'));
    assert_eq!(app.playlist_cursor, 1);
    press(&mut app, &mut d, &mut state, KeyCode::Char('k'));
    press(&mut app, &mut d, &mut state, KeyCode::Enter);

    assert_eq!(d.playlist_index(), Some(0));
    assert_eq!(d.playlist().len(), 2);
    assert_eq!(app.focus, Focus::Tracks);
    assert_eq!(app.selected, 0);
}

#[test]
fn countdown_prompt_starts_the_timer() {
    let dir = stage();
    let mut d = desk(dir.path());
    let mut app = App::new();
    let mut state = EventLoopState::default();

    press(&mut app, &mut d, &mut state, KeyCode::Char('c'));
    assert_eq!(app.prompt.as_ref().map(|p| p.kind), Some(PromptKind::Countdown));
    // Digits go to the prompt, not the pads.
    type_text(&mut app, &mut d, &mut state, "1:30");
    assert_eq!(d.engine().loads, 0);
    press(&mut app, &mut d, &mut state, KeyCode::Enter);

    assert!(app.prompt.is_none());
    assert!(d.countdown().is_running());
    assert_eq!(d.countdown().remaining_secs(), 90);

    press(&mut app, &mut d, &mut state, KeyCode::Char('C'));
    assert!(!d.countdown().is_running());
    assert_eq!(d.countdown().remaining_secs(), 90);
    press(&mut app, &mut d, &mut state, KeyCode::Char('C'));
    assert_eq!(d.countdown().remaining_secs(), 0);
}

#[test]
fn unparsable_countdown_warns() {
    let dir = stage();
    let mut d = desk(dir.path());
    let mut app = App::new();
    let mut state = EventLoopState::default();

    press(&mut app, &mut d, &mut state, KeyCode::Char('c'));
    type_text(&mut app, &mut d, &mut state, "soon");
    press(&mut app, &mut d, &mut state, KeyCode::Enter);
    assert!(!d.countdown().is_running());
    assert_eq!(d.status().message, "Enter the time as m:ss or minutes");
}

#[test]
fn assign_prompt_binds_the_selected_pad() {
    let dir = stage();
    let mut d = desk(dir.path());
    let mut app = App::new();
    let mut state = EventLoopState::default();
    app.focus = Focus::Pads;
    app.pad_cursor = 2;

    press(&mut app, &mut d, &mut state, KeyCode::Char('a'));
    let prompt = app.prompt.as_mut().unwrap();
    assert_eq!(prompt.kind, PromptKind::AssignPad(2));
    prompt.input = dir.path().join("fx/thunder.wav").display().to_string();
    press(&mut app, &mut d, &mut state, KeyCode::Enter);

    let slot = d.pads().slot(2).unwrap();
    assert_eq!(slot.display_name, "thunder");

    press(&mut app, &mut d, &mut state, KeyCode::Char('n'));
    app.prompt.as_mut().unwrap().input = "Storm FX".into();
    press(&mut app, &mut d, &mut state, KeyCode::Enter);
    assert_eq!(d.pads().slot(2).unwrap().display_name, "Storm FX");

    press(&mut app, &mut d, &mut state, KeyCode::Enter);
    assert_eq!(d.engine().loads, 1);
}

#[test]
fn escape_cancels_a_prompt_before_stopping_anything() {
    let dir = stage();
    let mut d = desk(dir.path());
    let mut app = App::new();
    let mut state = EventLoopState::default();

    press(&mut app, &mut d, &mut state, KeyCode::Char('f'));
    assert!(app.prompt.is_some());
    press(&mut app, &mut d, &mut state, KeyCode::Esc);
    assert!(app.prompt.is_none());
    assert_eq!(d.status().message, "Ready");
}

#[test]
fn filter_mode_swallows_hotkeys() {
    let dir = stage();
    let mut d = desk(dir.path());
    d.select_playlist(0);
    let mut app = App::new();
    let mut state = EventLoopState::default();

    press(&mut app, &mut d, &mut state, KeyCode::Char('/'));
    assert!(app.filter_mode);
    type_text(&mut app, &mut d, &mut state, "2 storm");
    assert_eq!(app.filter_query, "2 storm");
    assert!(!d.is_panic_muted());
    assert_eq!(app.display_indices(d.playlist()), vec![1]);
    assert_eq!(app.selected, 1);

    press(&mut app, &mut d, &mut state, KeyCode::Enter);
    assert!(!app.filter_mode);
    assert_eq!(app.filter_query, "2 storm");
}

#[test]
fn lock_blocks_app_keys_but_not_ctrl_c() {
    let dir = stage();
    let mut d = desk(dir.path());
    let mut app = App::new();
    let mut state = EventLoopState::default();

    press(&mut app, &mut d, &mut state, KeyCode::Char('l'));
    assert!(d.is_locked());

    assert!(!press(&mut app, &mut d, &mut state, KeyCode::Char('q')));
    press(&mut app, &mut d, &mut state, KeyCode::Char('f'));
    assert!(app.prompt.is_none());
    assert_eq!(d.status().message, "Interface locked, press l to unlock");

    let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert!(handle_key_event(ctrl_c, &mut app, &mut d, &mut state).unwrap());
}

#[test]
fn q_quits_when_unlocked() {
    let dir = stage();
    let mut d = desk(dir.path());
    let mut app = App::new();
    let mut state = EventLoopState::default();
    assert!(press(&mut app, &mut d, &mut state, KeyCode::Char('q')));
}

#[test]
fn gg_jumps_to_the_top() {
    let dir = stage();
    let mut d = desk(dir.path());
    let mut app = App::new();
    let mut state = EventLoopState::default();

    press(&mut app, &mut d, &mut state, KeyCode::Char('G'));
    assert_eq!(app.playlist_cursor, 1);
    press(&mut app, &mut d, &mut state, KeyCode::Char('g'));
    assert_eq!(app.playlist_cursor, 1);
    press(&mut app, &mut d, &mut state, KeyCode::Char('g'));
    assert_eq!(app.playlist_cursor, 0);
}

// ----- media keys -----------------------------------------------------------

#[test]
fn media_keys_drive_the_player() {
    let dir = stage();
    let mut d = desk(dir.path());
    d.select_playlist(0);

    assert!(!handle_control_cmd(ControlCmd::Next, &mut d));
    assert_eq!(d.player().index(), Some(1));
    assert!(!handle_control_cmd(ControlCmd::Prev, &mut d));
    assert_eq!(d.player().index(), Some(0));
    assert!(handle_control_cmd(ControlCmd::Quit, &mut d));
}

#[test]
fn lock_lets_only_stop_and_quit_through() {
    let dir = stage();
    let mut d = desk(dir.path());
    d.select_playlist(0);
    d.toggle_lock();

    handle_control_cmd(ControlCmd::Next, &mut d);
    assert_eq!(d.player().index(), Some(0));
    handle_control_cmd(ControlCmd::Stop, &mut d);
    assert_eq!(d.status().message, "Stopped");
    assert!(handle_control_cmd(ControlCmd::Quit, &mut d));
}

// ----- view sync ------------------------------------------------------------

#[test]
fn cursor_follows_the_playing_track() {
    let dir = stage();
    let mut d = desk(dir.path());
    d.select_playlist(0);
    let mut app = App::new();
    let mut state = EventLoopState::default();

    d.next_track();
    sync_view(&mut app, &d, &mut state);
    assert_eq!(app.selected, 1);

    // Moving the cursor by hand sticks until the track changes again.
    app.selected = 0;
    sync_view(&mut app, &d, &mut state);
    assert_eq!(app.selected, 0);
}

#[derive(Default)]
struct RecordingSession {
    updates: RefCell<Vec<(PlaybackStatus, Option<usize>, Option<String>)>>,
    pending: RefCell<Option<(Option<usize>, Option<String>)>>,
}

impl MediaSession for RecordingSession {
    fn set_playback(&self, status: PlaybackStatus) {
        if let Some((index, name)) = self.pending.borrow_mut().take() {
            self.updates.borrow_mut().push((status, index, name));
        }
    }

    fn set_track_metadata(&self, index: Option<usize>, track: Option<&Track>) {
        *self.pending.borrow_mut() = Some((index, track.map(|t| t.display_name.clone())));
    }
}

#[test]
fn mpris_is_told_only_about_changes() {
    let dir = stage();
    let mut d = desk(dir.path());
    let media = RecordingSession::default();
    let mut sync = MprisSync::default();

    sync.update(&media, &d);
    sync.update(&media, &d);
    assert_eq!(media.updates.borrow().len(), 1);

    d.select_playlist(0);
    sync.update(&media, &d);
    d.tick(Instant::now());
    sync.update(&media, &d);

    let updates = media.updates.borrow();
    assert_eq!(updates.len(), 2);
    assert_eq!(
        updates[1],
        (
            PlaybackStatus::Stopped,
            Some(0),
            Some("01 Overture".to_string())
        )
    );
}

#[test]
fn control_channel_round_trip() {
    let (tx, rx) = mpsc::channel::<ControlCmd>();
    tx.send(ControlCmd::PlayPause).unwrap();
    assert_eq!(rx.try_recv().unwrap(), ControlCmd::PlayPause);
}
