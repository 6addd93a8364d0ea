// src/main.rs
mod app;
mod config;
mod input;
mod loader;
mod models;
mod network;
mod selection;
mod theme;
mod ui;
mod utils;

use std::{fs, io, path::PathBuf, sync::{Arc, Mutex}, time::Duration};
use anyhow::{Context, anyhow};
use chrono::{Datelike, Local};
use clap::Parser;
use crossterm::{event::{self, Event, KeyEventKind}, execute, terminal::{self, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::prelude::*;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::{App, AppEvent, Dispatcher};
use crate::config::{Settings, ensure_user_config, get_user_config_path, save_api_key, validate_api_key};
use crate::loader::YearWindowLoader;
use crate::network::{ImageHost, TmdbClient};
use crate::theme::Theme;

#[derive(Parser, Debug)]
#[command(version, about = "Browse TMDB movies by genre, one release year at a time")]
struct Cli {
    /// TMDB API key, overrides config and environment
    #[arg(long)]
    api_key: Option<String>,
    /// Year the list starts at
    #[arg(long)]
    seed_year: Option<i32>,
    /// Extra config file merged over the user config
    #[arg(long)]
    config: Option<PathBuf>,
    /// Store a TMDB API key in the user config and exit
    #[arg(long, value_name = "KEY")]
    save_api_key: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let user_config_path = get_user_config_path().ok_or_else(|| anyhow!("could not determine home directory"))?;

    if let Some(key) = cli.save_api_key.as_deref() {
        validate_api_key(key).map_err(anyhow::Error::msg)?;
        save_api_key(&user_config_path, key.trim())?;
        println!("API key saved to {}", user_config_path.display());
        return Ok(());
    }

    ensure_user_config(&user_config_path)
        .with_context(|| format!("could not create {}", user_config_path.display()))?;
    let settings = Settings::load_from(&user_config_path, cli.config.as_deref())
        .context("failed to load configuration")?
        .with_overrides(cli.api_key, cli.seed_year);
    let current_year = Local::now().year();
    settings.validate(current_year).context("invalid configuration")?;

    init_logging(&settings)?;

    let api_key = settings.resolve_api_key().ok_or_else(|| {
        anyhow!(
            "no TMDB API key configured; pass --api-key, set MOVIESCROLL_API_KEY, or run with --save-api-key <KEY>"
        )
    })?;
    validate_api_key(&api_key).map_err(anyhow::Error::msg)?;

    let rt = Runtime::new()?;
    let client = TmdbClient::new(&settings, api_key)?;
    let (tx, rx) = unbounded_channel();
    let dispatcher = Dispatcher::new(rt.handle().clone(), Arc::new(client), tx, settings.min_vote_count);

    info!(seed_year = settings.seed_year, current_year, "starting");
    let loader = YearWindowLoader::new(settings.seed_year, current_year);
    let mut app = App::new(loader, settings.scroll_threshold, ImageHost::from(&settings));

    dispatcher.load_genres();
    dispatcher.dispatch(app.start());

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app, &dispatcher, rx);

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    dispatcher: &Dispatcher,
    mut rx: UnboundedReceiver<AppEvent>,
) -> anyhow::Result<()> {
    let theme = Theme::default();
    loop {
        while let Ok(event) = rx.try_recv() {
            app.apply(event);
        }
        app.viewport = utils::get_movielist_height()?;

        terminal.draw(|f| ui::render(f, app, &theme))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Release {
                    continue;
                }
                if !input::handle_key(key_event.code, app, dispatcher)? {
                    break;
                }
            }
        } else {
            app.on_tick();
        }
    }
    Ok(())
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(settings: &Settings) -> anyhow::Result<()> {
    let path = settings.log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("could not open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("{}=info", env!("CARGO_CRATE_NAME")))))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
