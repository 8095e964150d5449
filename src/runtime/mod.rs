use std::sync::mpsc;

use anyhow::Context;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use log::{info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::RodioEngine;
use crate::library::MetadataResolver;
use crate::mpris::{ControlCmd, MediaSession, NoMediaSession};
use crate::session::{Controller, SessionPaths};

mod event_loop;
mod mpris_sync;
mod settings;
mod startup;

#[cfg(test)]
mod tests;

pub fn run() -> anyhow::Result<()> {
    let (cli, ignored) = startup::parse_args(std::env::args().skip(1));
    if !cli.print_config {
        startup::init_logging();
    }
    let settings = settings::load_settings();
    if cli.print_config {
        print!("{}", startup::render_config(&settings)?);
        return Ok(());
    }
    for arg in ignored {
        warn!("ignoring argument {arg:?}");
    }

    let engine = RodioEngine::spawn().context("could not open the audio output")?;
    let mut desk = Controller::new(
        engine,
        settings.clone(),
        SessionPaths::default_locations(),
        cli.folder,
    );
    match MetadataResolver::spawn() {
        Ok(resolver) => desk = desk.with_resolver(resolver),
        Err(e) => warn!("metadata lookups disabled: {e}"),
    }

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let media: Box<dyn MediaSession> = if settings.media_keys.enabled {
        Box::new(crate::mpris::spawn_mpris(control_tx))
    } else {
        Box::new(NoMediaSession)
    };

    install_panic_hook();
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    let mut state = event_loop::EventLoopState::default();
    let run_result = event_loop::run(
        &mut terminal,
        &mut app,
        &mut desk,
        media.as_ref(),
        &control_rx,
        &mut state,
    );

    desk.shutdown();
    info!("session ended");

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}

/// Put the terminal back before the default hook prints the panic.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
        log::error!("panic: {panic_info}");
        default_hook(panic_info);
    }));
}
