// shardscope - live terminal map of an actor cluster's sharding topology
//
// Connects to a snapshot server over a websocket push channel and renders
// the cluster hierarchy, HTTP activity links and traffic statistics,
// animating the changes between consecutive snapshots.

mod address;
mod app;
mod feed;
mod layout;
mod links;
mod model;
mod reconcile;
mod selection;
mod stats;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::{
    config::{Cli, FRAME_INTERVAL},
    event::{handle_key_event, handle_mouse_event},
    AppState,
};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use feed::WsFeed;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let (config, refresh_config) = Cli::parse().into_config();
    init_logging(&config.log_file)?;

    let feed = WsFeed::new(&config.server, &config.feed_path, config.connect_timeout);
    info!(url = feed.url(), "Starting shardscope");
    let app = AppState::new(config, refresh_config, Box::new(feed), Instant::now());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, mut app: AppState) -> Result<()> {
    loop {
        let now = Instant::now();
        app.on_tick(now);
        terminal.draw(|f| ui::draw(f, &mut app, now))?;

        if !app.running {
            info!("Shutting down");
            return Ok(());
        }

        if event::poll(FRAME_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key_event(&mut app, key.code, Instant::now());
                }
                Event::Mouse(mouse) => handle_mouse_event(&mut app, mouse, Instant::now()),
                _ => {}
            }
        }
    }
}
