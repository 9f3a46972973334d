//! Theme and Colors
//!
//! Terminal colors for the scramble demo, plus the conversion from engine
//! colors to ratatui colors.

use ratatui::style::Color;
use scramble_core::Rgb;

// ============================================================================
// Label Colors
// ============================================================================

/// Header label - near white
pub const HEADER_TEXT: Rgb = Rgb::new(0xf5, 0xf5, 0xf7);

/// Body labels - soft lavender
pub const BODY_TEXT: Rgb = Rgb::new(0xc8, 0xc6, 0xf0);

/// Click affordance accent
pub const CLICK_ACCENT: Color = Color::Rgb(0x4f, 0xac, 0xfe);

// ============================================================================
// UI Colors
// ============================================================================

/// Status line and hints
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Status line background
pub const STATUS_BG: Color = Color::Rgb(30, 30, 40);

/// Engine color as a terminal color
#[must_use]
pub fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}
