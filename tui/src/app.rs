//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin host for animated
//! labels:
//! - Event loop (keyboard, mouse, resize)
//! - One [`AnimatedLabel`] per line of text, each on its own animator task
//! - Redraws only when a label changed or an event arrived
//!
//! Pointer movement onto a label is a pointer-enter signal, a left click on
//! a label is a click signal. `r` restarts every label, `q`/`Esc` quits.

use std::io;
use std::time::Duration;

use crossterm::event::{
    self, Event, EventStream, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Margin, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::Terminal;
use scramble_core::{AnimatorConfig, RunStats, TextAnimator, TriggerMode};

use crate::label::AnimatedLabel;
use crate::theme;

/// How often the loop wakes to check for label frames
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Body text for the label that follows the configured trigger
pub const CONFIGURED_LABEL: &str = "Upload an image to find where it was taken";

/// Body text for the click label
pub const CLICK_LABEL: &str = "Click here to scramble again";

/// Main application state
pub struct App {
    /// Is the app still running?
    running: bool,
    /// Header first, then body labels
    labels: Vec<AnimatedLabel>,
    /// Forces a redraw on the next loop iteration
    needs_redraw: bool,
}

impl App {
    /// Mount the header and body labels
    ///
    /// The header always reveals itself once on startup (auto trigger with
    /// the configured delay). The first body label uses the configured
    /// trigger; the second is always click-triggered.
    pub fn new(config: &AnimatorConfig, title: impl Into<String>) -> Self {
        let header = TextAnimator::new(
            title,
            config
                .clone()
                .with_trigger(TriggerMode::Auto)
                .with_base_color(theme::HEADER_TEXT),
        )
        .on_animation_complete(|| {
            tracing::info!("Header reveal complete");
            Ok(())
        });

        let configured = config.clone().with_base_color(theme::BODY_TEXT);
        let click = config
            .clone()
            .with_trigger(TriggerMode::Click)
            .with_base_color(theme::BODY_TEXT);

        tracing::debug!(trigger = %config.trigger, "Mounting labels");

        Self {
            running: true,
            labels: vec![
                AnimatedLabel::from_animator(header),
                AnimatedLabel::spawn(CONFIGURED_LABEL, configured),
                AnimatedLabel::spawn(CLICK_LABEL, click),
            ],
            needs_redraw: true,
        }
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();

        while self.running {
            if self.needs_redraw || self.labels.iter().any(AnimatedLabel::is_dirty) {
                terminal.draw(|frame| {
                    let area = frame.area();
                    self.draw(area, frame.buffer_mut());
                })?;
                self.needs_redraw = false;
            }

            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    match maybe_event {
                        // Only handle Press events (not Release or Repeat)
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key).await;
                        }
                        Some(Ok(Event::Mouse(mouse))) => self.handle_mouse(mouse).await,
                        Some(Ok(Event::Resize(_, _))) => self.needs_redraw = true,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Terminal event error");
                        }
                        None => self.running = false,
                    }
                }

                () = tokio::time::sleep(FRAME_INTERVAL) => {}
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Is the app still running?
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Mounted labels, header first
    #[must_use]
    pub fn labels(&self) -> &[AnimatedLabel] {
        &self.labels
    }

    /// Handle keyboard input
    pub async fn handle_key(&mut self, key: event::KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.running = false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }
            KeyCode::Char('r') => {
                for label in &self.labels {
                    if let Err(e) = label.restart().await {
                        tracing::warn!(error = %e, "Restart failed");
                    }
                }
            }
            _ => {}
        }
    }

    /// Handle mouse input
    pub async fn handle_mouse(&mut self, mouse: event::MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                for label in &mut self.labels {
                    label.pointer_moved(column, row).await;
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                for label in &mut self.labels {
                    // Terminals without motion reporting only tell us about clicks
                    label.pointer_moved(column, row).await;
                    label.clicked(column, row).await;
                }
            }
            _ => {}
        }
    }

    /// Render everything into `buf`
    pub fn draw(&mut self, area: Rect, buf: &mut Buffer) {
        let inner = area.inner(Margin::new(2, 1));
        let heights: Vec<u16> = self
            .labels
            .iter()
            .map(|label| label.measure(inner.width))
            .collect();

        let mut constraints = Vec::with_capacity(heights.len() * 2 + 1);
        for height in &heights {
            constraints.push(Constraint::Length(*height));
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Min(0));
        let chunks = Layout::vertical(constraints).split(inner);

        for (i, label) in self.labels.iter_mut().enumerate() {
            label.draw(chunks[i * 2], buf);
        }

        let stats = self.labels.iter().map(AnimatedLabel::stats).fold(
            RunStats::default(),
            |mut total, s| {
                total.accepted += s.accepted;
                total.rejected += s.rejected;
                total.completed += s.completed;
                total.callback_failures += s.callback_failures;
                total.frames += s.frames;
                total
            },
        );
        let status_area = Rect::new(area.x, area.bottom().saturating_sub(1), area.width, 1);
        buf.set_style(status_area, Style::default().bg(theme::STATUS_BG));
        buf.set_stringn(
            status_area.x + 1,
            status_area.y,
            status_line(&stats),
            usize::from(status_area.width.saturating_sub(2)),
            Style::default()
                .fg(theme::DIM_GRAY)
                .bg(theme::STATUS_BG)
                .add_modifier(Modifier::DIM),
        );
    }

    async fn shutdown(&mut self) {
        for label in self.labels.drain(..) {
            label.shutdown().await;
        }
    }
}

/// Status bar text
#[must_use]
pub fn status_line(stats: &RunStats) -> String {
    format!(
        "runs {} | ignored {} | frames {} | callback errors {} | r restart | q quit",
        stats.completed, stats.rejected, stats.frames, stats.callback_failures
    )
}
