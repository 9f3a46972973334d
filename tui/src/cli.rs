//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;
use scramble_core::{ConfigOverrides, TriggerMode};

/// Scramble TUI - character-scramble text reveal in the terminal
#[derive(Parser, Debug)]
#[command(name = "scramble-tui")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "SCRAMBLE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Trigger for the configurable label (hover, click, auto)
    #[arg(short = 't', long, value_name = "MODE")]
    pub trigger: Option<TriggerMode>,

    /// Auto trigger delay in milliseconds
    #[arg(long, value_name = "MS", allow_negative_numbers = true)]
    pub auto_delay_ms: Option<i64>,

    /// Comma-separated scramble colors
    #[arg(short = 'p', long, value_name = "COLORS", value_delimiter = ',')]
    pub palette: Option<Vec<String>>,

    /// Header text
    #[arg(long, default_value = "Geo OSINT Tool")]
    pub title: String,

    /// Write logs to this file (the terminal is in use by the UI)
    #[arg(short = 'l', long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// CLI values as configuration overrides
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(trigger) = self.trigger {
            overrides = overrides.with_trigger(trigger);
        }
        if let Some(ms) = self.auto_delay_ms {
            overrides = overrides.with_auto_delay_ms(ms);
        }
        if let Some(ref palette) = self.palette {
            overrides = overrides.with_palette(palette.clone());
        }
        overrides
    }
}
