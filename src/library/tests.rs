use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tempfile::tempdir;

use super::*;
use crate::config::LibrarySettings;
use crate::error::SetupError;

fn names(tracks: &[Track]) -> Vec<&str> {
    tracks.iter().map(|t| t.display_name.as_str()).collect()
}

#[test]
fn is_audio_file_matches_configured_extensions_case_insensitive() {
    let settings = LibrarySettings::default();
    for ok in ["a.mp3", "a.MP3", "a.flac", "a.wav", "a.ogg", "a.m4a", "a.aac", "a.opus", "a.webm"] {
        assert!(is_audio_file(&PathBuf::from("/tmp").join(ok), &settings), "{ok}");
    }
    assert!(!is_audio_file(&PathBuf::from("/tmp/a.txt"), &settings));
    assert!(!is_audio_file(&PathBuf::from("/tmp/a"), &settings));

    let dotted = LibrarySettings {
        extensions: vec![".MP3".into()],
        ..LibrarySettings::default()
    };
    assert!(is_audio_file(&PathBuf::from("/tmp/x.mp3"), &dotted));
    assert!(!is_audio_file(&PathBuf::from("/tmp/x.wav"), &dotted));
}

#[test]
fn natural_order_is_numeric_and_case_insensitive() {
    let mut v = vec!["Cue 10", "cue 2", "Cue 1", "intro", "Act 2 - 03", "Act 2 - 003b", "act 10"];
    v.sort_by(|a, b| natural_cmp(a, b));
    assert_eq!(
        v,
        vec!["Act 2 - 03", "Act 2 - 003b", "act 10", "Cue 1", "cue 2", "Cue 10", "intro"]
    );
    assert_eq!(natural_cmp("track007", "track7"), Ordering::Less);
    assert_eq!(natural_cmp("a", "a"), Ordering::Equal);
    assert_eq!(natural_cmp("a", "ab"), Ordering::Less);
}

#[test]
fn list_tracks_filters_non_audio_and_sorts_naturally() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("10 Finale.MP3"), b"not a real mp3").unwrap();
    fs::write(dir.path().join("2 Overture.ogg"), b"not a real ogg").unwrap();
    fs::write(dir.path().join("1 doors.wav"), b"not a real wav").unwrap();
    fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();
    fs::write(dir.path().join(".hidden.mp3"), b"ignore me").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("deep.mp3"), b"not listed").unwrap();

    let tracks = list_tracks(dir.path(), &LibrarySettings::default());
    assert_eq!(names(&tracks), vec!["1 doors", "2 Overture", "10 Finale"]);

    let finale = &tracks[2];
    assert_eq!(finale.filename, "10 Finale.MP3");
    assert_eq!(finale.extension, "mp3");
    assert_eq!(finale.path, dir.path().join("10 Finale.MP3"));
    assert_eq!(finale.artist, None);
    assert_eq!(finale.artist_or_unknown(), UNKNOWN_PERFORMER);
}

#[test]
fn list_tracks_of_missing_dir_is_empty() {
    let dir = tempdir().unwrap();
    assert!(list_tracks(&dir.path().join("gone"), &LibrarySettings::default()).is_empty());
}

#[test]
fn list_playlists_keeps_only_folders_with_audio() {
    let root = tempdir().unwrap();
    for (folder, file) in [("Act 10", "a.mp3"), ("Act 2", "b.wav"), ("Docs", "readme.txt")] {
        let d = root.path().join(folder);
        fs::create_dir(&d).unwrap();
        fs::write(d.join(file), b"x").unwrap();
    }
    fs::create_dir(root.path().join("Empty")).unwrap();
    fs::write(root.path().join("loose.mp3"), b"x").unwrap();

    let playlists = list_playlists(root.path(), &LibrarySettings::default()).unwrap();
    let names: Vec<&str> = playlists.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Act 2", "Act 10"]);
    assert_eq!(playlists[0].track_count, 1);
    assert_eq!(playlists[0].path, root.path().join("Act 2"));
}

#[test]
fn empty_music_folder_has_no_playlists_but_is_not_an_error() {
    let root = tempdir().unwrap();
    let playlists = list_playlists(root.path(), &LibrarySettings::default()).unwrap();
    assert!(playlists.is_empty());
}

#[test]
fn invalid_music_folders_need_setup() {
    let root = tempdir().unwrap();
    let missing = root.path().join("nope");
    assert!(matches!(
        list_playlists(&missing, &LibrarySettings::default()),
        Err(SetupError::FolderMissing(p)) if p == missing
    ));

    let file = root.path().join("file.mp3");
    fs::write(&file, b"x").unwrap();
    assert!(matches!(
        list_playlists(&file, &LibrarySettings::default()),
        Err(SetupError::NotADirectory(_))
    ));
}

#[test]
fn unreadable_tags_yield_empty_metadata() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("junk.mp3");
    fs::write(&path, b"not audio").unwrap();

    let meta = read_audio_metadata(&path);
    assert_eq!(meta, AudioMetadata::default());
    assert_eq!(probe_duration(&path), None);
}

#[test]
fn playlist_apply_ignores_other_generations_and_moved_tracks() {
    let track = Track {
        display_name: "a".into(),
        filename: "a.mp3".into(),
        path: PathBuf::from("/show/a.mp3"),
        extension: "mp3".into(),
        duration: None,
        artist: None,
        resolved: false,
    };
    let mut playlist = Playlist {
        name: "show".into(),
        path: PathBuf::from("/show"),
        generation: 3,
        tracks: vec![track],
    };

    let mut resolved = Resolved {
        generation: 2,
        index: 0,
        path: PathBuf::from("/show/a.mp3"),
        artist: Some("Band".into()),
        duration: Some(Duration::from_secs(90)),
    };
    assert!(!playlist.apply(&resolved));

    resolved.generation = 3;
    resolved.index = 5;
    assert!(!playlist.apply(&resolved));

    resolved.index = 0;
    assert!(playlist.apply(&resolved));
    assert_eq!(playlist.tracks[0].artist.as_deref(), Some("Band"));
    assert_eq!(playlist.tracks[0].duration, Some(Duration::from_secs(90)));
    assert!(playlist.tracks[0].resolved);
}

#[test]
fn untagged_track_stays_without_artist_after_resolving() {
    let mut playlist = Playlist {
        name: "show".into(),
        path: PathBuf::from("/show"),
        generation: 1,
        tracks: vec![Track {
            display_name: "b".into(),
            filename: "b.wav".into(),
            path: PathBuf::from("/show/b.wav"),
            extension: "wav".into(),
            duration: None,
            artist: None,
            resolved: false,
        }],
    };
    let resolved = Resolved {
        generation: 1,
        index: 0,
        path: PathBuf::from("/show/b.wav"),
        artist: None,
        duration: None,
    };

    assert!(playlist.apply(&resolved));
    let track = &playlist.tracks[0];
    assert!(track.resolved);
    assert_eq!(track.artist, None);
    assert_eq!(track.artist_or_unknown(), UNKNOWN_PERFORMER);
}

#[test]
fn resolver_leaves_untagged_artists_empty() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("one.mp3"), b"x").unwrap();
    fs::write(dir.path().join("two.mp3"), b"x").unwrap();

    let playlist = Playlist {
        name: "p".into(),
        path: dir.path().to_path_buf(),
        generation: 1,
        tracks: list_tracks(dir.path(), &LibrarySettings::default()),
    };

    let resolver = MetadataResolver::spawn().unwrap();
    resolver.resolve(&playlist);

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut got = Vec::new();
    while got.len() < 2 && Instant::now() < deadline {
        got.extend(resolver.poll());
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(got.len(), 2);
    assert!(got.iter().all(|r| r.generation == 1 && r.artist.is_none()));
}
