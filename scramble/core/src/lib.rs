//! Scramble Core - Headless Character-Scramble Text Reveal
//!
//! This crate animates a text label by splitting it into per-grapheme units
//! and flickering each unit through random symbols and palette colors before
//! it settles back to its original character. Units start in a left-to-right
//! wavefront. It has no rendering dependency: hosts read unit state and draw
//! it however they like.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                           Hosts                               │
//! │   ┌──────────────┐   ┌────────────────┐   ┌───────────────┐   │
//! │   │ scramble-tui │   │ AnimatorHandle │   │ manual tick() │   │
//! │   │  (ratatui)   │   │  (tokio task)  │   │   (tests)     │   │
//! │   └──────┬───────┘   └───────┬────────┘   └──────┬────────┘   │
//! │          └──── TriggerSignal / tick(now) ────────┘            │
//! └────────────────────────────┬──────────────────────────────────┘
//!                              │
//! ┌────────────────────────────┼──────────────────────────────────┐
//! │                       TextAnimator                            │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌─────────────────┐   │
//! │  │ LabelText   │  │ FlickerScheduler │  │ TriggerAdapter  │   │
//! │  │ (units)     │◀─│ (step queue)     │  │ (hover/click/   │   │
//! │  └─────────────┘  └────────┬─────────┘  │  auto)          │   │
//! │                            │            └─────────────────┘   │
//! │                     RandomSource (symbols, Palette)           │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`TextAnimator`]: one animated label; owns everything below
//! - [`SplitText`] / [`CharacterUnit`]: the unit arena with immutable originals
//! - [`FlickerScheduler`] / [`FlickerTiming`]: per-unit frame state machine
//! - [`TriggerMode`] / [`TriggerSignal`]: activation
//! - [`AnimatorHandle`]: tokio driver for hosts that prefer not to tick
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//! use scramble_core::{AnimatorConfig, TextAnimator, TriggerSignal};
//!
//! let mut animator = TextAnimator::new("Geo OSINT Tool", AnimatorConfig::default());
//! animator.signal(TriggerSignal::PointerEnter, Duration::ZERO);
//!
//! while let Some(deadline) = animator.next_deadline() {
//!     animator.tick(deadline);
//! }
//! assert_eq!(animator.display_text(), "Geo OSINT Tool");
//! ```

#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animator;
pub mod config;
pub mod palette;
pub mod random;
pub mod runtime;
pub mod scheduler;
pub mod trigger;
pub mod units;

pub use animator::{AnimatorConfig, CompletionCallback, RunStats, StartOutcome, TextAnimator};
pub use config::{
    default_config_path, load_config, load_config_from_path, load_config_with_env, ConfigError,
    ConfigOverrides,
    ConfigSource, ScrambleConfigFile,
};
pub use palette::{ColorParseError, Palette, Rgb, DEFAULT_PALETTE};
pub use random::{PaletteRandom, RandomSource, SCRAMBLE_SYMBOLS};
pub use runtime::{AnimatorHandle, DriverError};
pub use scheduler::{FlickerScheduler, FlickerTiming, RunId};
pub use trigger::{TriggerAdapter, TriggerMode, TriggerParseError, TriggerSignal};
pub use units::{CharacterUnit, LabelText, SplitText, UnitState};
