//! steuern - "Projekt steuern" panel for the terminal
//!
//! Opens the steering panel of one NEXUS project. The project is taken from
//! the page address, the same address the browser panel lives at.
//!
//! ## Usage
//!
//! ```bash
//! # Open project 7 on the local backend
//! steuern http://127.0.0.1:5000/projekt/7/steuern
//!
//! # Path only, with an explicit backend
//! steuern /projekt/7 --base-url http://nexus.internal:5000
//!
//! # With verbose logging and a custom log directory
//! steuern /projekt/7 -v --log-dir /tmp/steuern-logs
//! ```

use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use steuern_client::HttpProjectApi;
use steuern_core::{LogGuard, SteuernConfig, SteuernError, init_logging};
use steuern_tui::{App, PageController};
use tracing::{error, info};

/// Terminal panel for steering a NEXUS project
///
/// Fetch tasks, report errors, run analyses and manage handoff documents
/// of a single project.
#[derive(Parser, Debug)]
#[command(name = "steuern")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Page address of the project, e.g. http://127.0.0.1:5000/projekt/7/steuern
    address: String,

    /// Backend base URL (overrides the config file and the address origin)
    #[arg(long)]
    base_url: Option<String>,

    /// Config file (defaults to ~/.steuern/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files (defaults to ~/.steuern/logs/)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::from(1);
        }
    };

    let config = match SteuernConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            report_config_error(&e);
            return ExitCode::from(2);
        }
    };

    install_panic_hook();

    info!(address = %cli.address, "Starting steuern panel");

    match run_app(&cli, config) {
        Ok(()) => {
            info!("steuern panel exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("steuern panel error: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn report_config_error(err: &SteuernError) {
    eprintln!("Error: {}", err);
    eprintln!("Hint: {}", err.suggested_action());
}

/// Install a panic hook that restores the terminal before printing the panic message.
fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Restore terminal to its normal state.
fn restore_terminal() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();

    let _ = crossterm::terminal::disable_raw_mode();

    crossterm::execute!(
        stdout,
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::event::DisableBracketedPaste,
        crossterm::cursor::Show
    )?;

    stdout.flush()?;

    Ok(())
}

/// Set up logging based on CLI arguments.
fn setup_logging(cli: &Cli) -> steuern_core::Result<LogGuard> {
    let debug = cli.verbose > 0;
    init_logging(cli.log_dir.clone(), debug)
}

/// Build the runtime and backend client, then run the TUI.
fn run_app(cli: &Cli, config: SteuernConfig) -> steuern_tui::AppResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("steuern-io")
        .enable_all()
        .build()?;

    let base_url = config.resolve_base_url(cli.base_url.as_deref(), &cli.address);
    info!(base_url = %base_url, "Using backend");
    let api = HttpProjectApi::new(base_url, &config.server)?;

    let controller = PageController::new(
        cli.address.clone(),
        config.panel,
        Arc::new(api),
        runtime.handle().clone(),
    );

    let mut app = App::new(controller);
    let result = app.run();

    // Requests are aborted by the controller; do not wait on stragglers.
    drop(app);
    runtime.shutdown_background();
    result
}
