//! Unit Decomposer
//!
//! Splits a label into an arena of [`CharacterUnit`]s, one per visible
//! grapheme, grouped into words so hosts can wrap lines on the same
//! boundaries as the unsplit text. Whitespace is kept as inert gaps between
//! words and never animates.
//!
//! # Snapshot and restore
//!
//! Every unit records its original content and color at split time. Those
//! fields are never written again; the animation only touches the `current`
//! fields. [`SplitText::restore`] rebuilds the exact source text from the
//! originals, and [`LabelText::revert`] swaps the split view back to plain
//! text. Reverting twice, or reverting text that was never split, does
//! nothing.

use std::borrow::Cow;
use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use crate::palette::Rgb;

/// Animation state of a single unit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnitState {
    /// Showing its original content and color
    #[default]
    Settled,
    /// Showing randomized frames
    Flickering,
}

/// One animated grapheme and its display state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterUnit {
    position: usize,
    word: usize,
    original_content: String,
    original_color: Rgb,
    current_content: String,
    current_color: Rgb,
    state: UnitState,
}

impl CharacterUnit {
    fn new(position: usize, word: usize, content: &str, color: Rgb) -> Self {
        Self {
            position,
            word,
            original_content: content.to_string(),
            original_color: color,
            current_content: content.to_string(),
            current_color: color,
            state: UnitState::Settled,
        }
    }

    /// Zero-based index in display order
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Index of the word group this unit belongs to
    #[must_use]
    pub fn word(&self) -> usize {
        self.word
    }

    /// Content captured at split time
    #[must_use]
    pub fn original_content(&self) -> &str {
        &self.original_content
    }

    /// Color captured at split time
    #[must_use]
    pub fn original_color(&self) -> Rgb {
        self.original_color
    }

    /// Content currently displayed
    #[must_use]
    pub fn current_content(&self) -> &str {
        &self.current_content
    }

    /// Color currently displayed
    #[must_use]
    pub fn current_color(&self) -> Rgb {
        self.current_color
    }

    /// Current animation state
    #[must_use]
    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Whether the unit currently shows exactly its original content and color
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.current_content == self.original_content && self.current_color == self.original_color
    }

    /// Display one randomized frame
    pub(crate) fn show_frame(&mut self, symbol: char, color: Rgb) {
        self.current_content.clear();
        self.current_content.push(symbol);
        self.current_color = color;
        self.state = UnitState::Flickering;
    }

    /// Snap back to the original content and color
    pub(crate) fn settle(&mut self) {
        if self.current_content != self.original_content {
            self.current_content.clone_from(&self.original_content);
        }
        self.current_color = self.original_color;
        self.state = UnitState::Settled;
    }
}

/// Structural piece of the source text
#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    /// A run of non-whitespace graphemes, as a range into the unit arena
    Word(Range<usize>),
    /// Whitespace kept verbatim between words
    Gap(String),
}

/// A label decomposed into words and character units
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitText {
    units: Vec<CharacterUnit>,
    segments: Vec<Segment>,
}

impl SplitText {
    /// Split plain text whose characters all display in `color`
    #[must_use]
    pub fn split(text: &str, color: Rgb) -> Self {
        Self::split_styled([(text, color)])
    }

    /// Split text made of styled spans, one original color per span
    ///
    /// A word may continue across a span boundary; only whitespace ends a
    /// word.
    pub fn split_styled<'a, I>(spans: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Rgb)>,
    {
        let mut builder = SplitBuilder::default();
        for (text, color) in spans {
            for grapheme in text.graphemes(true) {
                if grapheme.chars().all(char::is_whitespace) {
                    builder.push_gap(grapheme);
                } else {
                    builder.push_unit(grapheme, color);
                }
            }
        }
        builder.finish()
    }

    /// All units in display order
    #[must_use]
    pub fn units(&self) -> &[CharacterUnit] {
        &self.units
    }

    pub(crate) fn units_mut(&mut self) -> &mut [CharacterUnit] {
        &mut self.units
    }

    /// Number of units
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether there are no units
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Number of word groups
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Word(_)))
            .count()
    }

    /// Units grouped by word, in order
    pub fn words(&self) -> impl Iterator<Item = &[CharacterUnit]> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Word(range) => Some(&self.units[range.clone()]),
            Segment::Gap(_) => None,
        })
    }

    /// Rebuild the exact source text from the captured originals
    #[must_use]
    pub fn restore(&self) -> String {
        self.render_with(CharacterUnit::original_content)
    }

    /// The text as currently displayed, including scrambled units
    #[must_use]
    pub fn current_text(&self) -> String {
        self.render_with(CharacterUnit::current_content)
    }

    /// Whether every unit shows its original content and color
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.units.iter().all(CharacterUnit::is_pristine)
    }

    /// Force every unit back to its original content and color
    pub(crate) fn settle_all(&mut self) {
        for unit in &mut self.units {
            unit.settle();
        }
    }

    fn render_with(&self, content: impl Fn(&CharacterUnit) -> &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Word(range) => {
                    for unit in &self.units[range.clone()] {
                        out.push_str(content(unit));
                    }
                }
                Segment::Gap(gap) => out.push_str(gap),
            }
        }
        out
    }
}

#[derive(Default)]
struct SplitBuilder {
    units: Vec<CharacterUnit>,
    segments: Vec<Segment>,
    word_start: Option<usize>,
    words: usize,
}

impl SplitBuilder {
    fn push_unit(&mut self, grapheme: &str, color: Rgb) {
        let position = self.units.len();
        if self.word_start.is_none() {
            self.word_start = Some(position);
        }
        self.units
            .push(CharacterUnit::new(position, self.words, grapheme, color));
    }

    fn push_gap(&mut self, grapheme: &str) {
        self.close_word();
        match self.segments.last_mut() {
            Some(Segment::Gap(gap)) => gap.push_str(grapheme),
            _ => self.segments.push(Segment::Gap(grapheme.to_string())),
        }
    }

    fn close_word(&mut self) {
        if let Some(start) = self.word_start.take() {
            self.segments.push(Segment::Word(start..self.units.len()));
            self.words += 1;
        }
    }

    fn finish(mut self) -> SplitText {
        self.close_word();
        SplitText {
            units: self.units,
            segments: self.segments,
        }
    }
}

/// A label's text, either plain or decomposed into units
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LabelText {
    /// Unsplit source text
    Plain(String),
    /// Decomposed into animatable units
    Split(SplitText),
}

impl LabelText {
    /// Plain, not yet decomposed text
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain(text.into())
    }

    /// Decompose into units with `color` as every unit's original color
    ///
    /// A previous decomposition is reverted first, so the originals are
    /// always captured from the unsplit text. Returns the unit count.
    pub fn decompose(&mut self, color: Rgb) -> usize {
        let text = match std::mem::replace(self, Self::Plain(String::new())) {
            Self::Plain(text) => text,
            Self::Split(split) => split.restore(),
        };
        let split = SplitText::split(&text, color);
        let units = split.len();
        *self = Self::Split(split);
        units
    }

    /// Restore the exact unsplit text; a no-op if not split
    pub fn revert(&mut self) {
        if let Self::Split(split) = self {
            let restored = split.restore();
            *self = Self::Plain(restored);
        }
    }

    /// Whether the text is currently decomposed
    #[must_use]
    pub fn is_split(&self) -> bool {
        matches!(self, Self::Split(_))
    }

    /// The split view, if decomposed
    #[must_use]
    pub fn as_split(&self) -> Option<&SplitText> {
        match self {
            Self::Split(split) => Some(split),
            Self::Plain(_) => None,
        }
    }

    pub(crate) fn as_split_mut(&mut self) -> Option<&mut SplitText> {
        match self {
            Self::Split(split) => Some(split),
            Self::Plain(_) => None,
        }
    }

    /// The source text (restored from originals when split)
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Plain(text) => Cow::Borrowed(text),
            Self::Split(split) => Cow::Owned(split.restore()),
        }
    }
}
