//! Music player state machine.
//!
//! One current track at a time: `Stopped -> Playing -> {Paused <-> Playing,
//! Stopped}`. Loads are asynchronous, so every load gets a ticket and only
//! the completion matching the newest ticket is applied.

mod machine;
mod progress;
mod state;

pub use machine::*;
pub use progress::*;
pub use state::*;
