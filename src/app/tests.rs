use super::*;
use crate::library::{Playlist, Track};
use crate::pads::PAD_COUNT;

fn t(name: &str, artist: Option<&str>) -> Track {
    Track {
        display_name: name.into(),
        filename: format!("{name}.mp3"),
        path: std::path::PathBuf::from(format!("/show/{name}.mp3")),
        extension: "mp3".into(),
        duration: None,
        artist: artist.map(Into::into),
        resolved: artist.is_some(),
    }
}

fn playlist(tracks: Vec<Track>) -> Playlist {
    Playlist {
        name: "Act 1".into(),
        tracks,
        ..Playlist::default()
    }
}

#[test]
fn display_indices_respects_filter_query() {
    let pl = playlist(vec![t("Alpha", None), t("Beta", None), t("Gamma", None)]);
    let mut app = App::new();
    app.push_filter_char(&pl, 'm');
    assert_eq!(app.display_indices(&pl), vec![2]);
}

#[test]
fn filter_is_substring_not_fuzzy() {
    let pl = playlist(vec![
        t("Metallica - Blackened", None),
        t("Black Sabbath - Paranoid", None),
    ]);
    let mut app = App::new();
    app.filter_query = "mtbk".into();
    assert!(app.display_indices(&pl).is_empty());

    app.filter_query = "BLACK".into();
    assert_eq!(app.display_indices(&pl), vec![0, 1]);
}

#[test]
fn filter_matches_artist_too() {
    let pl = playlist(vec![
        t("Overture", Some("House Band")),
        t("Storm", Some("Foley")),
    ]);
    let mut app = App::new();
    app.filter_query = "house".into();
    assert_eq!(app.display_indices(&pl), vec![0]);
}

#[test]
fn trimming_filter_query_affects_matching() {
    let pl = playlist(vec![t("Black Sabbath - Paranoid", None)]);
    let mut app = App::new();
    app.filter_query = "Black ".into();
    assert_eq!(app.display_indices(&pl), vec![0]);

    app.filter_query = "   ".into();
    assert_eq!(app.display_indices(&pl), vec![0]);
}

#[test]
fn next_prev_in_view_helpers_work() {
    let pl = playlist(vec![t("Alpha", None), t("Beta", None), t("Gamma", None)]);
    let mut app = App::new();
    app.filter_query = "et".into(); // only Beta is visible

    assert_eq!(app.next_in_view_from(&pl, 0), Some(1));
    assert_eq!(app.prev_in_view_from(&pl, 0), Some(1));
    assert_eq!(app.next_in_view_from(&pl, 1), Some(1));
    assert_eq!(app.prev_in_view_from(&pl, 1), Some(1));
}

#[test]
fn filtering_moves_a_hidden_selection() {
    let pl = playlist(vec![t("Alpha", None), t("Beta", None), t("Gamma", None)]);
    let mut app = App::new();
    app.selected = 0;
    app.enter_filter_mode(&pl);
    assert_eq!(app.focus, Focus::Tracks);

    for c in "gam".chars() {
        app.push_filter_char(&pl, c);
    }
    assert_eq!(app.selected, 2);

    app.clear_filter(&pl);
    assert!(!app.filter_mode);
    assert_eq!(app.display_indices(&pl).len(), 3);
}

#[test]
fn cursors_wrap_per_panel() {
    let pl = playlist(vec![t("A", None), t("B", None)]);
    let mut app = App::new();

    app.prev(&pl, 3);
    assert_eq!(app.playlist_cursor, 2);
    app.next(&pl, 3);
    assert_eq!(app.playlist_cursor, 0);

    app.cycle_focus();
    app.prev(&pl, 3);
    assert_eq!(app.selected, 1);
    app.next(&pl, 3);
    assert_eq!(app.selected, 0);

    app.cycle_focus();
    assert_eq!(app.focus, Focus::Pads);
    app.prev(&pl, 3);
    assert_eq!(app.pad_cursor, PAD_COUNT - 1);
    app.first(&pl);
    assert_eq!(app.pad_cursor, 0);

    app.cycle_focus();
    assert_eq!(app.focus, Focus::Playlists);
}

#[test]
fn empty_lists_leave_cursors_alone() {
    let pl = Playlist::default();
    let mut app = App::new();
    app.next(&pl, 0);
    app.focus = Focus::Tracks;
    app.next(&pl, 0);
    app.last(&pl, 0);
    assert_eq!(app.playlist_cursor, 0);
    assert_eq!(app.selected, 0);
}

#[test]
fn rescans_clamp_the_playlist_cursor() {
    let pl = Playlist::default();
    let mut app = App::new();
    app.playlist_cursor = 5;
    app.clamp_cursors(&pl, 2);
    assert_eq!(app.playlist_cursor, 1);
}

#[test]
fn prompt_collects_input_until_taken() {
    let mut app = App::new();
    app.open_prompt(PromptKind::RenamePad(3), "Pad 4");
    app.pop_prompt_char();
    app.push_prompt_char('!');

    let prompt = app.take_prompt().unwrap();
    assert_eq!(prompt.kind, PromptKind::RenamePad(3));
    assert_eq!(prompt.input, "Pad !");
    assert!(app.prompt.is_none());

    app.open_prompt(PromptKind::Countdown, "");
    app.cancel_prompt();
    assert!(app.take_prompt().is_none());
}
