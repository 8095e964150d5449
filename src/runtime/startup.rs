use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anyhow::Context;
use env_logger::{Builder, Env, Target};
use log::{info, warn};

use crate::config::{self, Settings};

/// Command line: `stagemix [MUSIC_FOLDER] [--print-config]`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Cli {
    pub folder: Option<PathBuf>,
    pub print_config: bool,
}

/// Parse the arguments after the program name. Unknown flags are ignored
/// with a warning once logging is up.
pub fn parse_args<I>(args: I) -> (Cli, Vec<String>)
where
    I: IntoIterator<Item = String>,
{
    let mut cli = Cli::default();
    let mut ignored = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--print-config" => cli.print_config = true,
            s if s.starts_with('-') => ignored.push(arg),
            _ if cli.folder.is_none() => cli.folder = Some(PathBuf::from(arg)),
            _ => ignored.push(arg),
        }
    }
    (cli, ignored)
}

/// The effective settings as TOML.
pub fn render_config(settings: &Settings) -> anyhow::Result<String> {
    toml::to_string_pretty(settings).context("could not render settings as TOML")
}

/// Log to `$XDG_STATE_HOME/stagemix/stagemix.log`; the terminal belongs to
/// the UI. Falls back to stderr when the file cannot be opened.
pub fn init_logging() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();

    let log_path = config::state_dir().map(|dir| dir.join("stagemix.log"));
    let file = log_path.as_ref().and_then(|path| {
        let parent = path.parent()?;
        fs::create_dir_all(parent).ok()?;
        OpenOptions::new().create(true).append(true).open(path).ok()
    });
    match file {
        Some(file) => {
            builder.target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(Target::Stderr);
        }
    }
    if builder.try_init().is_err() {
        return;
    }
    match log_path {
        Some(path) => info!("logging to {}", path.display()),
        None => warn!("no state directory, logging to stderr"),
    }
}
