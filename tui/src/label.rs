//! Animated Label Widget
//!
//! Draws a [`TextAnimator`]'s units into a ratatui buffer, one cell run per
//! unit in that unit's current color. Lines wrap on the word groups the
//! decomposer produced, so wrapping does not move while units scramble.

use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Modifier, Style};
use scramble_core::{
    AnimatorConfig, AnimatorHandle, DriverError, RunStats, SplitText, StartOutcome, TextAnimator,
    TriggerMode, TriggerSignal,
};
use unicode_width::UnicodeWidthStr;

use crate::theme;

/// Where one unit was placed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacedUnit {
    /// Index into the unit arena
    pub index: usize,
    /// Column
    pub x: u16,
    /// Row
    pub y: u16,
    /// Cell width of the unit's original content
    pub width: u16,
}

/// Result of laying out a label inside an area
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelLayout {
    /// Units that fit, in order
    pub placed: Vec<PlacedUnit>,
    /// Occupied span of each row, used for hit testing
    pub rows: Vec<Rect>,
}

impl LabelLayout {
    /// Whether a terminal cell falls on the label's text
    #[must_use]
    pub fn contains(&self, column: u16, row: u16) -> bool {
        let position = Position::new(column, row);
        self.rows.iter().any(|rect| rect.contains(position))
    }

    /// Rows used
    #[must_use]
    pub fn height(&self) -> u16 {
        u16::try_from(self.rows.len()).unwrap_or(u16::MAX)
    }
}

fn unit_width(content: &str) -> u16 {
    u16::try_from(content.width().max(1)).unwrap_or(1)
}

/// Place units word by word, wrapping at the area's right edge
///
/// Words wider than the area are broken between units. Rows past the
/// bottom of the area are dropped.
#[must_use]
pub fn layout(split: &SplitText, area: Rect) -> LabelLayout {
    let mut out = LabelLayout::default();
    if area.width == 0 || area.height == 0 {
        return out;
    }

    let right = area.x.saturating_add(area.width);
    let bottom = area.y.saturating_add(area.height);
    let mut x = area.x;
    let mut y = area.y;
    let mut row_start: Option<u16> = None;

    for word in split.words() {
        let word_width: u16 = word
            .iter()
            .map(|unit| unit_width(unit.original_content()))
            .fold(0, u16::saturating_add);

        if x > area.x {
            // One cell for the gap before this word
            if x.saturating_add(1).saturating_add(word_width) > right {
                close_row(&mut out, row_start.take(), x, y);
                x = area.x;
                y += 1;
            } else {
                x += 1;
            }
        }

        for unit in word {
            let width = unit_width(unit.original_content());
            if x.saturating_add(width) > right && x > area.x {
                close_row(&mut out, row_start.take(), x, y);
                x = area.x;
                y += 1;
            }
            if y >= bottom {
                return out;
            }
            row_start.get_or_insert(x);
            out.placed.push(PlacedUnit {
                index: unit.position(),
                x,
                y,
                width,
            });
            x = x.saturating_add(width);
        }
    }
    close_row(&mut out, row_start.take(), x, y);
    out
}

fn close_row(out: &mut LabelLayout, start: Option<u16>, end: u16, y: u16) {
    if let Some(start) = start {
        out.rows.push(Rect::new(start, y, end - start, 1));
    }
}

/// Draw the placed units with their current content and color
pub fn render(split: &SplitText, layout: &LabelLayout, buf: &mut Buffer, base: Style) {
    let units = split.units();
    for placed in &layout.placed {
        let Some(unit) = units.get(placed.index) else {
            continue;
        };
        let style = base.fg(theme::to_color(unit.current_color()));
        buf.set_stringn(
            placed.x,
            placed.y,
            unit.current_content(),
            usize::from(placed.width),
            style,
        );
    }
}

/// Turns pointer positions into enter edges
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HoverTracker {
    inside: bool,
}

impl HoverTracker {
    /// Record the pointer position; `true` only when it just entered
    pub fn update(&mut self, inside: bool) -> bool {
        let entered = inside && !self.inside;
        self.inside = inside;
        entered
    }

    /// Whether the pointer is currently over the label
    #[must_use]
    pub fn is_inside(&self) -> bool {
        self.inside
    }
}

/// A label on screen: its animator task, last layout and hover state
pub struct AnimatedLabel {
    handle: AnimatorHandle,
    layout: LabelLayout,
    hover: HoverTracker,
    last_generation: u64,
}

impl AnimatedLabel {
    /// Spawn the animator for `content`
    pub fn spawn(content: impl Into<String>, config: AnimatorConfig) -> Self {
        Self::from_animator(TextAnimator::new(content, config))
    }

    /// Spawn a prepared animator (for example one with a completion callback)
    pub fn from_animator(animator: TextAnimator) -> Self {
        Self {
            handle: AnimatorHandle::spawn(animator),
            layout: LabelLayout::default(),
            hover: HoverTracker::default(),
            last_generation: 0,
        }
    }

    /// Height needed to show the label at `width`
    #[must_use]
    pub fn measure(&self, width: u16) -> u16 {
        self.handle.with_animator(|animator| {
            animator.split().map_or(1, |split| {
                layout(split, Rect::new(0, 0, width, u16::MAX)).height().max(1)
            })
        })
    }

    /// Lay out and draw into `area`
    pub fn draw(&mut self, area: Rect, buf: &mut Buffer) {
        let underline = self.trigger_mode().shows_pointer();
        let placed = self.handle.with_animator(|animator| {
            let Some(split) = animator.split() else {
                return LabelLayout::default();
            };
            let laid_out = layout(split, area);
            let mut base = Style::default();
            if underline {
                base = base
                    .add_modifier(Modifier::UNDERLINED)
                    .underline_color(theme::CLICK_ACCENT);
            }
            render(split, &laid_out, buf, base);
            laid_out
        });
        self.layout = placed;
        self.last_generation = self.handle.frame_generation();
    }

    /// Whether a frame changed since the last draw
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.handle.frame_generation() != self.last_generation
    }

    /// Feed a pointer position; sends pointer-enter on the entering edge
    pub async fn pointer_moved(&mut self, column: u16, row: u16) -> Option<StartOutcome> {
        let inside = self.layout.contains(column, row);
        if !self.hover.update(inside) {
            return None;
        }
        self.send(TriggerSignal::PointerEnter).await
    }

    /// Feed a click; sends a click signal when it lands on the label
    pub async fn clicked(&mut self, column: u16, row: u16) -> Option<StartOutcome> {
        if !self.layout.contains(column, row) {
            return None;
        }
        self.send(TriggerSignal::Click).await
    }

    /// Start a run regardless of trigger mode
    pub async fn restart(&self) -> Result<StartOutcome, DriverError> {
        self.handle.start().await
    }

    /// Trigger mode of the underlying animator
    #[must_use]
    pub fn trigger_mode(&self) -> TriggerMode {
        self.handle.with_animator(TextAnimator::trigger_mode)
    }

    /// Run counters
    #[must_use]
    pub fn stats(&self) -> RunStats {
        self.handle.with_animator(TextAnimator::stats)
    }

    /// Whether a run is in progress
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.with_animator(TextAnimator::is_running)
    }

    /// Layout from the most recent draw
    #[must_use]
    pub fn layout(&self) -> &LabelLayout {
        &self.layout
    }

    /// Stop the animator task
    pub async fn shutdown(self) {
        self.handle.shutdown().await;
    }

    async fn send(&self, signal: TriggerSignal) -> Option<StartOutcome> {
        match self.handle.signal(signal).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(error = %e, ?signal, "Label signal dropped");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use scramble_core::Rgb;

    use super::*;

    const WHITE: Rgb = Rgb::new(255, 255, 255);

    fn positions(layout: &LabelLayout) -> Vec<(u16, u16)> {
        layout.placed.iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn test_single_line_layout() {
        let split = SplitText::split("ab cd", WHITE);
        let out = layout(&split, Rect::new(2, 1, 20, 3));
        assert_eq!(positions(&out), vec![(2, 1), (3, 1), (5, 1), (6, 1)]);
        assert_eq!(out.rows, vec![Rect::new(2, 1, 5, 1)]);
    }

    #[test]
    fn test_wraps_on_words() {
        let split = SplitText::split("Geo OSINT Tool", WHITE);
        let out = layout(&split, Rect::new(0, 0, 9, 5));
        let rows: Vec<u16> = out.placed.iter().map(|p| p.y).collect();
        assert_eq!(rows, vec![0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1]);
        assert_eq!(out.height(), 2);
        assert_eq!(out.placed[8].x, 0);
    }

    #[test]
    fn test_long_word_breaks() {
        let split = SplitText::split("abcdef", WHITE);
        let out = layout(&split, Rect::new(0, 0, 4, 5));
        assert_eq!(
            positions(&out),
            vec![(0, 0), (1, 0), (2, 0), (3, 0), (0, 1), (1, 1)]
        );
    }

    #[test]
    fn test_clips_to_height() {
        let split = SplitText::split("one two three", WHITE);
        let out = layout(&split, Rect::new(0, 0, 5, 1));
        assert_eq!(out.placed.len(), 3);
        assert_eq!(out.height(), 1);
    }

    #[test]
    fn test_wide_graphemes() {
        let split = SplitText::split("日本", WHITE);
        let out = layout(&split, Rect::new(0, 0, 10, 1));
        assert_eq!(positions(&out), vec![(0, 0), (2, 0)]);
        assert!(out.contains(3, 0));
        assert!(!out.contains(4, 0));
    }

    #[test]
    fn test_hit_testing() {
        let split = SplitText::split("hi there", WHITE);
        let out = layout(&split, Rect::new(0, 0, 5, 3));
        assert!(out.contains(0, 0));
        assert!(out.contains(1, 0));
        assert!(!out.contains(3, 0));
        assert!(out.contains(4, 1));
        assert!(!out.contains(0, 2));
    }

    #[test]
    fn test_render_uses_unit_colors() {
        let split = SplitText::split_styled([("a", Rgb::new(1, 2, 3)), ("b", WHITE)]);
        let area = Rect::new(0, 0, 4, 1);
        let out = layout(&split, area);
        let mut buf = Buffer::empty(area);
        render(&split, &out, &mut buf, Style::default());

        assert_eq!(buf[(0, 0)].symbol(), "a");
        assert_eq!(buf[(0, 0)].fg, theme::to_color(Rgb::new(1, 2, 3)));
        assert_eq!(buf[(1, 0)].symbol(), "b");
        assert_eq!(buf[(1, 0)].fg, theme::to_color(WHITE));
    }

    #[test]
    fn test_hover_edges() {
        let mut hover = HoverTracker::default();
        assert!(hover.update(true));
        assert!(!hover.update(true));
        assert!(!hover.update(false));
        assert!(hover.update(true));
        assert!(hover.is_inside());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pointer_enter_starts_hover_label() {
        let mut label = AnimatedLabel::spawn("hover me", AnimatorConfig::default());
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);
        label.draw(area, &mut buf);

        assert_eq!(label.pointer_moved(10, 0).await, None);
        let outcome = label.pointer_moved(1, 0).await;
        assert!(matches!(outcome, Some(StartOutcome::Started(_))));
        // Still inside: no new edge
        assert_eq!(label.pointer_moved(2, 0).await, None);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(label.is_dirty());
        label.draw(area, &mut buf);
        assert!(!label.is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_outside_is_ignored() {
        let config = AnimatorConfig::default().with_trigger(TriggerMode::Click);
        let mut label = AnimatedLabel::spawn("click", config);
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);
        label.draw(area, &mut buf);

        assert_eq!(label.clicked(15, 0).await, None);
        assert!(matches!(
            label.clicked(0, 0).await,
            Some(StartOutcome::Started(_))
        ));
        assert!(buf[(0, 0)].modifier.contains(Modifier::UNDERLINED));
    }
}
