//! Library collaborators: playlist folders, track listing, tag metadata.
//!
//! A music folder holds one playlist per immediate subdirectory; each
//! playlist is the audio files directly inside it, in natural order.

mod metadata;
mod model;
mod resolver;
mod scan;

pub use metadata::*;
pub use model::*;
pub use resolver::MetadataResolver;
pub use scan::{check_music_folder, is_audio_file, list_playlists, list_tracks, natural_cmp};

#[cfg(test)]
mod tests;
