//! Session controller: binds hotkeys, volumes, panic-mute and the lock to
//! the music player and the pad bank, and runs every timer from one
//! scheduler.

mod controller;
mod countdown;
mod history;
mod hotkeys;
mod snapshot;
mod stats;
mod status;

pub use controller::*;
pub use countdown::*;
pub use history::*;
pub use hotkeys::*;
pub use snapshot::*;
pub use stats::*;
pub use status::*;
