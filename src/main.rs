//! userdesk binary entry point.
//!
//! Resolves settings (config file, then flags), starts file logging and the
//! tokio runtime, puts the terminal in raw mode, runs the TUI event loop,
//! and restores the terminal state on exit.
//!
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use userdesk::api::HttpUserApi;
use userdesk::app::config::{AppConfig, CONFIG_FILE};
use userdesk::app::controller::{Controller, ControllerSettings};
use userdesk::app::keymap::Keymap;
use userdesk::app::{self, AppState, Theme};
use userdesk::error::{Context, Result};

#[derive(Parser, Debug)]
#[command(name = "userdesk", version, about = "Manage users of a REST backend from the terminal")]
struct Cli {
    /// Settings file (key = value).
    #[arg(long, env = "USERDESK_CONFIG", default_value = CONFIG_FILE)]
    config: String,
    /// Backend base address, e.g. http://localhost:5000
    #[arg(long, env = "USERDESK_BASE_URL")]
    base_url: Option<String>,
    /// Single-user response shape.
    #[arg(long, env = "USERDESK_ENVELOPE", value_parser = ["wrapped", "raw"])]
    envelope: Option<String>,
    /// Key holding the user when the envelope is `wrapped`.
    #[arg(long, env = "USERDESK_ENVELOPE_KEY")]
    envelope_key: Option<String>,
    #[arg(long, env = "USERDESK_LOG_FILE")]
    log_file: Option<PathBuf>,
}

fn resolve_config(cli: &Cli) -> AppConfig {
    let mut cfg = AppConfig::load_or_init(&cli.config);
    cfg.apply_overrides(
        cli.base_url.as_deref(),
        cli.envelope.as_deref(),
        cli.envelope_key.as_deref(),
        cli.log_file.as_deref(),
    );
    cfg
}

/// Log to a file; the terminal belongs to the UI.
fn init_tracing(cfg: &AppConfig) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.log_file)
        .with_ctx(|| format!("open log file {}", cfg.log_file.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = resolve_config(&cli);
    init_tracing(&cfg)?;

    let api = HttpUserApi::new(&cfg.base_url, cfg.envelope.clone())?;
    tracing::info!(base_url = %api.base_url(), envelope = api.envelope().kind(), "configured");

    let runtime = tokio::runtime::Runtime::new().with_ctx(|| "start tokio runtime".to_string())?;
    let _guard = runtime.enter();

    let controller = Controller::new(
        Arc::new(api),
        ControllerSettings {
            banner_ttl: cfg.success_banner,
        },
    );
    let mut state = AppState::new(
        controller,
        Theme::load_or_init("theme.conf"),
        Keymap::load_or_init("keybinds.conf"),
        cfg.base_url.clone(),
    );

    let mut terminal = init_terminal().map_err(|e| format!("init terminal: {}", e))?;

    let res = app::run(&mut terminal, &mut state);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture).ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        tracing::error!(error = %err, "application error");
        eprintln!("application error: {err}");
    }
    Ok(())
}
