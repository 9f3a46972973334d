//! Scramble TUI Entry Point
//!
//! Usage:
//!   scramble-tui [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>        Configuration file (default: ~/.config/scramble/animator.toml)
//!   -t, --trigger <MODE>       Trigger for the configurable label (hover, click, auto)
//!       --auto-delay-ms <MS>   Auto trigger delay
//!   -p, --palette <COLORS>     Comma-separated scramble colors
//!       --title <TEXT>         Header text
//!   -l, --log-file <FILE>      Write logs to a file

use std::fs::File;
use std::io::{self, IsTerminal};
use std::panic;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use scramble_core::config::{default_config_path, load_config_from_path};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scramble_tui::{App, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: scramble-tui requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means stdin or stdout is piped, or the session");
        eprintln!("has no terminal (CI, ssh without -t).");
        std::process::exit(1);
    }

    let mut config = load_config_from_path(args.config.clone().or_else(default_config_path))
        .context("Failed to load configuration")?;
    args.overrides().apply(&mut config);
    tracing::info!(
        source = %config.source(),
        trigger = %config.animator.trigger,
        "Configuration resolved"
    );

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(&config.animator, args.title.clone());
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// Log to a file when requested; otherwise stay silent so the UI owns the screen
fn init_logging(args: &Args) -> anyhow::Result<()> {
    let file_layer = match args.log_file {
        Some(ref path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    Ok(())
}
