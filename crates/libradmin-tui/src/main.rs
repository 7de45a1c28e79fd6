//! Library Admin - a terminal front end for the library service.
//!
//! Staff log in, browse and add books, list users, record loans and
//! returns, and read the availability and overdue reports.

mod app;
mod form;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use libradmin_core::auth::Route;
use libradmin_core::utils::format_remaining;
use libradmin_core::{ApiClient, Config};

use app::{open_session, App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name prefix; the appender adds the date
const LOG_FILE: &str = "libradmin.log";

/// Initialize the tracing subscriber for logging.
///
/// The terminal belongs to the UI, so logs go to a daily file in the cache
/// directory. Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {:#}. Using default settings.", e);
            Config::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = load_config();
    let log_dir = config
        .cache_dir()
        .unwrap_or_else(|_| PathBuf::from("./cache"));
    std::fs::create_dir_all(&log_dir)?;
    let _log_guard = init_tracing(&log_dir);

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--status") => return print_status(&config),
        Some("--logout") => return logout(&config).await,
        Some(other) => {
            eprintln!("Unknown option: {}", other);
            eprintln!("Usage: libradmin [--status | --logout]");
            std::process::exit(2);
        }
        None => {}
    }

    info!(api = %config.api_base_url, "libradmin starting");

    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // The guard decides between the dashboard and the login view
    app.navigate(Route::HOME);

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("libradmin shutting down");
    Ok(())
}

/// Print whether the stored session would pass the guard
fn print_status(config: &Config) -> Result<()> {
    let session = open_session(config);
    println!("Service: {}", config.api_base_url);

    match session.claims() {
        None => println!("Not logged in"),
        Some(Err(e)) => println!("Stored session is unusable: {}", e),
        Some(Ok(claims)) => {
            let who = claims.display_name().unwrap_or("unknown user");
            let now = Utc::now();
            match claims.expires_at() {
                Some(at) if !claims.is_expired_at(now) => println!(
                    "Logged in as {} ({} remaining, expires {})",
                    who,
                    format_remaining(at, now),
                    at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
                ),
                _ => println!("Session for {} has expired", who),
            }
        }
    }
    Ok(())
}

/// Log out from the command line; the local session is cleared either way
async fn logout(config: &Config) -> Result<()> {
    let session = open_session(config);
    if session.token().is_none() {
        println!("Not logged in");
        return Ok(());
    }

    let api = ApiClient::with_timeout(&config.api_base_url, session, config.request_timeout())?;
    match api.logout().await {
        Ok(_) => println!("Logged out"),
        Err(e) => println!("Logged out locally ({})", e.user_message()),
    }
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Apply finished view loads and submissions
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
