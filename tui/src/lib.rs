//! Scramble TUI - Terminal host for character-scramble labels
//!
//! Mounts a header and two body labels, each driven by its own
//! [`scramble_core::AnimatorHandle`], and maps terminal input to trigger
//! signals.
//!
//! # Architecture
//!
//! - **App**: event loop, input mapping, dirty-checked redraws
//! - **Label**: word-wrapped unit layout, per-unit colors, hover edges
//! - **Theme**: terminal colors
//! - **Cli**: command-line arguments and config overrides

pub mod app;
pub mod cli;
pub mod label;
pub mod theme;

pub use app::App;
pub use cli::Args;
