//! Configuration loader, schema types and persisted app state.
//!
//! `Settings` is the layered, read-only configuration (TOML file plus
//! environment). `PersistedConfig` is what the app itself writes back: the
//! chosen music folder and whether first-run setup is done.

mod load;
mod schema;
mod store;

pub use load::{config_dir, state_dir};
pub use schema::*;
pub use store::PersistedConfig;
pub(crate) use store::{read_json, write_json};
