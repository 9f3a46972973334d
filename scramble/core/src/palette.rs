//! Colors and Palettes
//!
//! Surface-agnostic RGB colors plus the ordered palette that scramble frames
//! draw from. Hosts translate [`Rgb`] into their native color type.
//!
//! Palette construction never fails: entries that do not parse are dropped,
//! and an empty result falls back to [`DEFAULT_PALETTE`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Built-in palette used when a configured palette is empty or invalid
pub const DEFAULT_PALETTE: [Rgb; 5] = [
    Rgb::new(0x66, 0x7e, 0xea),
    Rgb::new(0x76, 0x4b, 0xa2),
    Rgb::new(0xf0, 0x93, 0xfb),
    Rgb::new(0x4f, 0xac, 0xfe),
    Rgb::new(0x00, 0xf2, 0xfe),
];

/// Error returned when a color string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    /// Input was empty after trimming
    #[error("empty color value")]
    Empty,

    /// Hex notation with the wrong number of digits or a bad digit
    #[error("invalid hex color: {0}")]
    InvalidHex(String),

    /// `rgb(...)` notation that could not be read
    #[error("invalid rgb() color: {0}")]
    InvalidFunction(String),

    /// Anything else
    #[error("unrecognized color format: {0}")]
    Unrecognized(String),
}

/// An opaque 24-bit color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    /// Red component (0-255)
    pub r: u8,
    /// Green component (0-255)
    pub g: u8,
    /// Blue component (0-255)
    pub b: u8,
}

impl Rgb {
    /// Create a color from components
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or the `#rgb` shorthand
    ///
    /// # Errors
    ///
    /// Returns [`ColorParseError::InvalidHex`] for anything else.
    pub fn from_hex(value: &str) -> Result<Self, ColorParseError> {
        let invalid = || ColorParseError::InvalidHex(value.to_string());
        let digits = value.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        match digits.len() {
            6 => {
                let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
                match (channel(0), channel(2), channel(4)) {
                    (Ok(r), Ok(g), Ok(b)) => Ok(Self::new(r, g, b)),
                    _ => Err(invalid()),
                }
            }
            3 => {
                let mut out = [0u8; 3];
                for (slot, c) in out.iter_mut().zip(digits.chars()) {
                    let v = c.to_digit(16).ok_or_else(invalid)? as u8;
                    *slot = v * 17;
                }
                Ok(Self::new(out[0], out[1], out[2]))
            }
            _ => Err(invalid()),
        }
    }

    /// Parse the `rgb(r, g, b)` functional notation
    ///
    /// # Errors
    ///
    /// Returns [`ColorParseError::InvalidFunction`] when the arguments are not
    /// three integers in `0..=255`.
    pub fn from_function(value: &str) -> Result<Self, ColorParseError> {
        let invalid = || ColorParseError::InvalidFunction(value.to_string());
        let inner = value
            .trim()
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;

        let channels: Vec<u8> = inner
            .split(',')
            .map(|part| part.trim().parse::<u8>())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;

        match channels.as_slice() {
            [r, g, b] => Ok(Self::new(*r, *g, *b)),
            _ => Err(invalid()),
        }
    }

    /// Format as lowercase `#rrggbb`
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Err(ColorParseError::Empty)
        } else if trimmed.starts_with('#') {
            Self::from_hex(trimmed)
        } else if trimmed.starts_with("rgb(") {
            Self::from_function(trimmed)
        } else {
            Err(ColorParseError::Unrecognized(trimmed.to_string()))
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Non-empty ordered set of colors for scramble frames
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Build a palette, falling back to the default when `colors` is empty
    #[must_use]
    pub fn new(colors: Vec<Rgb>) -> Self {
        if colors.is_empty() {
            tracing::warn!("Empty palette supplied, using default palette");
            return Self::default();
        }
        Self { colors }
    }

    /// Parse palette entries, skipping values that are not colors
    ///
    /// Unparsable entries are logged and dropped. If nothing valid remains the
    /// default palette is used.
    pub fn parse<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let colors = entries
            .into_iter()
            .filter_map(|entry| match entry.as_ref().parse::<Rgb>() {
                Ok(color) => Some(color),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring invalid palette entry");
                    None
                }
            })
            .collect();
        Self::new(colors)
    }

    /// The palette colors in order
    #[must_use]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Number of colors (always at least one)
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`; kept for API symmetry with collections
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Whether `color` is one of the palette entries
    #[must_use]
    pub fn contains(&self, color: Rgb) -> bool {
        self.colors.contains(&color)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE.to_vec(),
        }
    }
}
