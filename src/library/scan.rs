use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use log::debug;
use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::error::SetupError;

use super::model::{PlaylistInfo, Track};

pub fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .any(|e| !e.is_empty() && e == ext)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Validate `root` as a music folder.
pub fn check_music_folder(root: &Path) -> Result<(), SetupError> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SetupError::NotADirectory(root.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SetupError::FolderMissing(root.to_path_buf()))
        }
        Err(source) => Err(SetupError::Unreadable {
            path: root.to_path_buf(),
            source,
        }),
    }
}

/// Immediate subdirectories of `root` that hold at least one audio file,
/// in natural order. A valid folder with nothing in it is `Ok(vec![])`.
pub fn list_playlists(
    root: &Path,
    settings: &LibrarySettings,
) -> Result<Vec<PlaylistInfo>, SetupError> {
    check_music_folder(root)?;

    let entries = fs::read_dir(root).map_err(|source| SetupError::Unreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let mut playlists: Vec<PlaylistInfo> = entries
        .filter_map(Result::ok)
        .filter(|e| e.path().is_dir())
        .filter(|e| settings.include_hidden || !is_hidden(&e.path()))
        .filter_map(|e| {
            let path = e.path();
            let track_count = list_tracks(&path, settings).len();
            if track_count == 0 {
                debug!("skipping {} (no audio files)", path.display());
                return None;
            }
            Some(PlaylistInfo {
                name: e.file_name().to_string_lossy().into_owned(),
                path,
                track_count,
            })
        })
        .collect();

    playlists.sort_by(|a, b| natural_cmp(&a.name, &b.name));
    Ok(playlists)
}

/// Audio files directly inside `dir`, in natural order by display name.
/// Unreadable directories yield an empty list.
pub fn list_tracks(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| settings.include_hidden || !is_hidden(path))
        .filter(|path| is_audio_file(path, settings))
        .map(|path| {
            let display_name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("UNKNOWN")
                .to_string();
            let filename = path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let extension = path
                .extension()
                .and_then(|s| s.to_str())
                .map(str::to_ascii_lowercase)
                .unwrap_or_default();
            Track {
                display_name,
                filename,
                path,
                extension,
                duration: None,
                artist: None,
                resolved: false,
            }
        })
        .collect();

    tracks.sort_by(|a, b| natural_cmp(&a.display_name, &b.display_name));
    tracks
}

/// Case-insensitive comparison that orders embedded numbers by value, so
/// "Cue 2" sorts before "Cue 10".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut x = Chunks::new(a);
    let mut y = Chunks::new(b);
    loop {
        match (x.next(), y.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(p), Some(q)) => {
                let ord = match (p, q) {
                    (Chunk::Number(p), Chunk::Number(q)) => cmp_digits(p, q),
                    (Chunk::Text(p), Chunk::Text(q)) => cmp_folded(p, q),
                    (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
                    (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

#[derive(Debug, Copy, Clone)]
enum Chunk<'a> {
    Number(&'a str),
    Text(&'a str),
}

struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(if digits {
            Chunk::Number(head)
        } else {
            Chunk::Text(head)
        })
    }
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
}

fn cmp_folded(a: &str, b: &str) -> Ordering {
    let fold = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<Vec<_>>();
    fold(a).cmp(&fold(b))
}
