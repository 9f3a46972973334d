//! TOML Configuration File Support
//!
//! Loads animator defaults from `~/.config/scramble/animator.toml`.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/scramble/animator.toml` (typically `~/.config/scramble/animator.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [animation]
//! trigger = "auto"
//! auto_delay_ms = 1000
//! palette = ["#667eea", "#764ba2", "rgb(240, 147, 251)"]
//!
//! [timing]
//! stagger_unit_ms = 80
//! flicker_interval_ms = 30
//! flicker_repeat = 3
//! inter_flicker_pause_ms = 100
//! ```
//!
//! Bad values (negative delays, unparsable colors, an empty palette) are
//! replaced by defaults and logged. Only an unreadable file, TOML syntax
//! errors and an unknown trigger name in the file are reported as errors.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animator::{sanitize_delay_ms, AnimatorConfig};
use crate::palette::Palette;
use crate::trigger::TriggerMode;

/// Environment variable for the trigger mode
pub const ENV_TRIGGER: &str = "SCRAMBLE_TRIGGER";
/// Environment variable for the auto delay in milliseconds
pub const ENV_AUTO_DELAY_MS: &str = "SCRAMBLE_AUTO_DELAY_MS";
/// Environment variable for a comma-separated palette
pub const ENV_PALETTE: &str = "SCRAMBLE_PALETTE";
/// Environment variable for the stagger unit in milliseconds
pub const ENV_STAGGER_MS: &str = "SCRAMBLE_STAGGER_MS";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where the configuration came from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Animation section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationToml {
    /// Trigger mode: hover, click or auto
    pub trigger: Option<String>,

    /// Delay before the auto activation; negative values become 0
    pub auto_delay_ms: Option<i64>,

    /// Palette entries (`#rrggbb`, `#rgb` or `rgb(r, g, b)`)
    pub palette: Option<Vec<String>>,
}

/// Timing section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingToml {
    /// Offset between consecutive units
    pub stagger_unit_ms: Option<u64>,

    /// Length of one scramble frame
    pub flicker_interval_ms: Option<u64>,

    /// Extra frames after the first
    pub flicker_repeat: Option<u32>,

    /// Pause between frames
    pub inter_flicker_pause_ms: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrambleToml {
    /// Animation section
    pub animation: AnimationToml,

    /// Timing section
    pub timing: TimingToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved configuration plus where it came from
///
/// Use [`load_config`] to resolve the file and environment layers, then
/// [`ConfigOverrides::apply`] for CLI values.
#[derive(Clone, Debug, Default)]
pub struct ScrambleConfigFile {
    /// Animator settings
    pub animator: AnimatorConfig,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl ScrambleConfigFile {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest-priority layer that contributed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/scramble/animator.toml` or
/// `~/.config/scramble/animator.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("scramble").join("animator.toml"))
}

/// Load configuration from the default path and the process environment
///
/// A missing file is not an error.
pub fn load_config() -> Result<ScrambleConfigFile, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from `path` (if it exists) and the process environment
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ScrambleConfigFile, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with a custom environment lookup
///
/// `env` is called with each `SCRAMBLE_*` variable name.
pub fn load_config_with_env<F>(
    path: Option<PathBuf>,
    env: F,
) -> Result<ScrambleConfigFile, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ScrambleConfigFile::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ScrambleToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);

    Ok(config)
}

fn apply_toml_config(
    config: &mut ScrambleConfigFile,
    toml: &ScrambleToml,
) -> Result<(), ConfigError> {
    let animator = &mut config.animator;

    if let Some(ref trigger) = toml.animation.trigger {
        animator.trigger = trigger
            .parse::<TriggerMode>()
            .map_err(|e| ConfigError::ValidationError(format!("animation.trigger: {e}")))?;
    }
    if let Some(delay_ms) = toml.animation.auto_delay_ms {
        animator.auto_delay = sanitize_delay_ms(delay_ms);
    }
    if let Some(ref entries) = toml.animation.palette {
        animator.palette = Palette::parse(entries);
    }

    let timing = &mut animator.timing;
    if let Some(ms) = toml.timing.stagger_unit_ms {
        timing.stagger_unit = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.timing.flicker_interval_ms {
        timing.flicker_interval = Duration::from_millis(ms);
    }
    if let Some(repeat) = toml.timing.flicker_repeat {
        timing.flicker_repeat = repeat;
    }
    if let Some(ms) = toml.timing.inter_flicker_pause_ms {
        timing.inter_flicker_pause = Duration::from_millis(ms);
    }
    *timing = timing.sanitized();

    Ok(())
}

fn apply_env_config<F>(config: &mut ScrambleConfigFile, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let animator = &mut config.animator;

    if let Some(value) = env(ENV_TRIGGER) {
        match value.parse::<TriggerMode>() {
            Ok(trigger) => {
                animator.trigger = trigger;
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(var = ENV_TRIGGER, error = %e, "Ignoring invalid value"),
        }
    }

    if let Some(value) = env(ENV_AUTO_DELAY_MS) {
        match value.trim().parse::<i64>() {
            Ok(ms) => {
                animator.auto_delay = sanitize_delay_ms(ms);
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(var = ENV_AUTO_DELAY_MS, error = %e, "Ignoring invalid value"),
        }
    }

    if let Some(value) = env(ENV_PALETTE) {
        animator.palette = Palette::parse(value.split(',').map(str::trim));
        config.source = ConfigSource::Env;
    }

    if let Some(value) = env(ENV_STAGGER_MS) {
        match value.trim().parse::<u64>() {
            Ok(ms) => {
                animator.timing.stagger_unit = Duration::from_millis(ms);
                animator.timing = animator.timing.sanitized();
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(var = ENV_STAGGER_MS, error = %e, "Ignoring invalid value"),
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Trigger mode override
    pub trigger: Option<TriggerMode>,

    /// Auto delay override (milliseconds, may be negative)
    pub auto_delay_ms: Option<i64>,

    /// Palette override (raw entries)
    pub palette: Option<Vec<String>>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set trigger override
    #[must_use]
    pub fn with_trigger(mut self, trigger: TriggerMode) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Set auto delay override
    #[must_use]
    pub fn with_auto_delay_ms(mut self, ms: i64) -> Self {
        self.auto_delay_ms = Some(ms);
        self
    }

    /// Set palette override
    #[must_use]
    pub fn with_palette(mut self, entries: Vec<String>) -> Self {
        self.palette = Some(entries);
        self
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trigger.is_none() && self.auto_delay_ms.is_none() && self.palette.is_none()
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut ScrambleConfigFile) {
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }

        if let Some(trigger) = self.trigger {
            config.animator.trigger = trigger;
        }

        if let Some(ms) = self.auto_delay_ms {
            config.animator.auto_delay = sanitize_delay_ms(ms);
        }

        if let Some(ref entries) = self.palette {
            config.animator.palette = Palette::parse(entries);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
