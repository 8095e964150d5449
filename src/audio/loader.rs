//! Background decoder preparation.
//!
//! Opening and probing a file can take a noticeable amount of time on large
//! or remote files, so it happens on a dedicated loader thread. Prepared
//! sources are handed back to the audio thread through its command channel.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::debug;
use rodio::decoder::DecoderError;
use rodio::{Decoder, Source};

use crate::error::LoadError;
use crate::library::probe_duration;

use super::types::{EngineCmd, ResourceId};

pub(crate) struct PrepareJob {
    pub id: ResourceId,
    /// Matches the slot's current request; older results are dropped.
    pub ticket: u64,
    pub path: PathBuf,
    pub start_at: Duration,
}

pub(crate) struct PreparedSource {
    pub source: Box<dyn Source + Send>,
    pub duration: Option<Duration>,
}

pub(crate) struct Prepared {
    pub id: ResourceId,
    pub ticket: u64,
    pub start_at: Duration,
    pub result: Result<PreparedSource, LoadError>,
}

impl fmt::Debug for Prepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prepared")
            .field("id", &self.id)
            .field("ticket", &self.ticket)
            .field("start_at", &self.start_at)
            .field("ok", &self.result.is_ok())
            .finish()
    }
}

pub(super) fn spawn_loader(
    jobs: Receiver<PrepareJob>,
    done: Sender<EngineCmd>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("stagemix-loader".into())
        .spawn(move || {
            while let Ok(job) = jobs.recv() {
                debug!("preparing {} from {:?} at {:?}", job.id, job.path, job.start_at);
                let result = prepare(&job.path, job.start_at);
                let prepared = Prepared {
                    id: job.id,
                    ticket: job.ticket,
                    start_at: job.start_at,
                    result,
                };
                if done.send(EngineCmd::Prepared(prepared)).is_err() {
                    break;
                }
            }
        })
}

/// Open and decode `path`, positioned at `start_at`.
pub(crate) fn prepare(path: &Path, start_at: Duration) -> Result<PreparedSource, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::Open {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| match e {
        DecoderError::UnrecognizedFormat => LoadError::Unsupported(path.to_path_buf()),
        other => LoadError::Decode {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })?;

    let duration = decoder.total_duration().or_else(|| probe_duration(path));

    // `skip_duration` is the fallback seeking primitive; zero needs no wrapper.
    let source: Box<dyn Source + Send> = if start_at.is_zero() {
        Box::new(decoder)
    } else {
        Box::new(decoder.skip_duration(start_at))
    };

    Ok(PreparedSource { source, duration })
}
