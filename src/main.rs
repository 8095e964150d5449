mod app;
mod audio;
mod config;
mod error;
mod library;
mod meter;
mod mpris;
mod pads;
mod player;
mod runtime;
mod scheduler;
mod session;
mod ui;

fn main() -> anyhow::Result<()> {
    runtime::run()
}
