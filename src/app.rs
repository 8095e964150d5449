//! Application module: the view state used by the TUI and the runtime.
//!
//! `App` lives in `app::model` and tracks focus, cursors, the track filter
//! and prompts. The show state is owned by `session::Controller`.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
