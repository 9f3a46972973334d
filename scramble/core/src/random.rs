//! Random Source
//!
//! Supplies the randomized content of scramble frames: a symbol drawn
//! uniformly from [`SCRAMBLE_SYMBOLS`] and a color drawn uniformly from the
//! instance palette. Draws are independent of unit position and of each
//! other; no seeding is required, but [`PaletteRandom::seeded`] exists for
//! reproducible demos.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::palette::{Palette, Rgb};

/// Alphabet for scramble frames: lowercase letters, punctuation, digits
pub const SCRAMBLE_SYMBOLS: [char; 53] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z', '!', '@', '#', '$', '%', '^', '&', '*', '-', '_', '+', '=',
    ';', ':', '<', '>', ',', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Source of randomized frame content
///
/// The animator owns one source per instance. Implementations must be
/// `Send` so an animator can move onto the async driver task.
pub trait RandomSource: Send {
    /// Draw a symbol for one frame of one unit
    fn next_symbol(&mut self) -> char;

    /// Draw a color for one frame of one unit
    fn next_color(&mut self) -> Rgb;
}

/// Default [`RandomSource`] backed by a `rand` generator and a [`Palette`]
#[derive(Debug)]
pub struct PaletteRandom {
    rng: StdRng,
    palette: Palette,
}

impl PaletteRandom {
    /// Create a source seeded from OS entropy
    #[must_use]
    pub fn new(palette: Palette) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            palette,
        }
    }

    /// Create a reproducible source
    #[must_use]
    pub fn seeded(palette: Palette, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            palette,
        }
    }
}

impl RandomSource for PaletteRandom {
    fn next_symbol(&mut self) -> char {
        let idx = self.rng.gen_range(0..SCRAMBLE_SYMBOLS.len());
        SCRAMBLE_SYMBOLS[idx]
    }

    fn next_color(&mut self) -> Rgb {
        // Palette is never empty; the fallback only guards the type
        self.palette
            .colors()
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(crate::palette::DEFAULT_PALETTE[0])
    }
}
