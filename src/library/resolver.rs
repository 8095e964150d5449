//! Background metadata resolution for the visible playlist.
//!
//! Tag parsing is slow enough to stall the UI on large folders, so artists
//! and durations are read on a worker thread and applied as they arrive.
//! Switching playlists abandons the previous job between files.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use log::debug;

use super::metadata::read_audio_metadata;
use super::model::{Playlist, Resolved};

struct Job {
    generation: u64,
    tracks: Vec<(usize, PathBuf)>,
}

pub struct MetadataResolver {
    jobs: Sender<Job>,
    results: Receiver<Resolved>,
    latest: Arc<AtomicU64>,
}

impl MetadataResolver {
    pub fn spawn() -> io::Result<Self> {
        let (jobs, job_rx) = mpsc::channel::<Job>();
        let (result_tx, results) = mpsc::channel::<Resolved>();
        let latest = Arc::new(AtomicU64::new(0));
        let worker_latest = latest.clone();

        thread::Builder::new()
            .name("stagemix-metadata".into())
            .spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    for (index, path) in job.tracks {
                        if worker_latest.load(Ordering::Relaxed) != job.generation {
                            debug!("abandoning metadata job {}", job.generation);
                            break;
                        }
                        let meta = read_audio_metadata(&path);
                        let resolved = Resolved {
                            generation: job.generation,
                            index,
                            path,
                            artist: meta.artist,
                            duration: meta.duration,
                        };
                        if result_tx.send(resolved).is_err() {
                            return;
                        }
                    }
                }
            })?;

        Ok(Self {
            jobs,
            results,
            latest,
        })
    }

    /// Queue every track of `playlist` still missing metadata.
    pub fn resolve(&self, playlist: &Playlist) {
        self.latest.store(playlist.generation, Ordering::Relaxed);
        let tracks: Vec<(usize, PathBuf)> = playlist
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.resolved)
            .map(|(i, t)| (i, t.path.clone()))
            .collect();
        if tracks.is_empty() {
            return;
        }
        let _ = self.jobs.send(Job {
            generation: playlist.generation,
            tracks,
        });
    }

    /// Drain whatever has been resolved so far.
    pub fn poll(&self) -> Vec<Resolved> {
        self.results.try_iter().collect()
    }
}
