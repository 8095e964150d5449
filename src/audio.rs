//! Audio engine: the control surface the playback core programs against,
//! and its `rodio` implementation.
//!
//! The `rodio` engine runs one audio thread that owns the output stream and
//! every sink, plus a loader thread that opens and decodes files. The UI
//! thread only ever sends commands and reads the shared resource table.

mod analyser;
mod backend;
mod engine;
mod loader;
mod sink;
mod tap;
mod thread;
mod types;

pub use backend::RodioEngine;
pub use engine::{AudioEngine, SignalAccess};
pub use types::*;

#[cfg(test)]
pub(crate) mod fake;
