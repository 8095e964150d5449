use std::{env, path::PathBuf};

use super::schema::Settings;

const APP_DIR: &str = "stagemix";

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file, lets environment variables
/// (prefix `STAGEMIX__`) override it, and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("STAGEMIX")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        let p = &self.playback;
        for (name, v) in [
            ("playback.music_volume", p.music_volume),
            ("playback.effects_volume", p.effects_volume),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(format!("{name} must be between 0.0 and 1.0"));
            }
        }
        if !(1..=100).contains(&self.audio.volume_step_percent) {
            return Err("audio.volume_step_percent must be between 1 and 100".to_string());
        }
        if self.ui.frame_ms == 0 || self.ui.frame_ms > 1000 {
            return Err("ui.frame_ms must be between 1 and 1000".to_string());
        }
        if self.ui.pad_progress_ms == 0 {
            return Err("ui.pad_progress_ms must be >= 1".to_string());
        }
        if self.ui.danger_secs > self.ui.warning_secs {
            return Err("ui.danger_secs must not exceed ui.warning_secs".to_string());
        }
        if self.library.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err("library.extensions must name at least one extension".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `STAGEMIX_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("STAGEMIX_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/stagemix/config.toml`
/// or `~/.config/stagemix/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// `$XDG_CONFIG_HOME/stagemix` (or `~/.config/stagemix`). Holds the
/// settings file, the persisted folder choice and the session snapshot.
pub fn config_dir() -> Option<PathBuf> {
    xdg_home("XDG_CONFIG_HOME", ".config").map(|d| d.join(APP_DIR))
}

/// `$XDG_STATE_HOME/stagemix` (or `~/.local/state/stagemix`). Holds the log.
pub fn state_dir() -> Option<PathBuf> {
    xdg_home("XDG_STATE_HOME", ".local/state").map(|d| d.join(APP_DIR))
}

fn xdg_home(var: &str, fallback: &str) -> Option<PathBuf> {
    match env::var_os(var) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => env::var_os("HOME").map(|home| PathBuf::from(home).join(fallback)),
    }
}
