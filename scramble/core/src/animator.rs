//! Run Controller
//!
//! [`TextAnimator`] owns one label: its decomposed units, its random source,
//! its scheduler and its trigger. It enforces at most one run at a time and
//! guarantees that every unit shows its original content and color whenever
//! no run is active.
//!
//! # Time
//!
//! Every time argument is the elapsed time since the animator was created.
//! Hosts call [`TextAnimator::tick`] whenever [`TextAnimator::next_deadline`]
//! passes (or simply once per frame); the animator never blocks or spawns.
//!
//! # Lifecycle
//!
//! ```text
//!  new() ──▶ idle ──start()──▶ running ──last unit settles──▶ idle
//!             │                   │
//!             └────teardown()─────┴──▶ torn down (text reverted)
//! ```
//!
//! Dropping an animator tears it down.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crate::palette::{Palette, Rgb};
use crate::random::{PaletteRandom, RandomSource};
use crate::scheduler::{FlickerScheduler, FlickerTiming, RunId};
use crate::trigger::{TriggerAdapter, TriggerMode, TriggerSignal};
use crate::units::{CharacterUnit, LabelText};

/// Called once per completed run
///
/// Errors and panics are caught at the run boundary and logged; they never
/// leave the animator stuck in the running state.
pub type CompletionCallback = Box<dyn FnMut() -> anyhow::Result<()> + Send>;

/// Resolved configuration for one animator
#[derive(Clone, Debug, PartialEq)]
pub struct AnimatorConfig {
    /// Activation mode
    pub trigger: TriggerMode,
    /// Delay before the single auto activation
    pub auto_delay: Duration,
    /// Colors for scramble frames
    pub palette: Palette,
    /// Frame timing
    pub timing: FlickerTiming,
    /// Display color captured as every unit's original color
    pub base_color: Rgb,
}

impl AnimatorConfig {
    /// Default label color when the host does not supply one
    pub const DEFAULT_BASE_COLOR: Rgb = Rgb::new(0xff, 0xff, 0xff);

    /// Set the trigger mode
    #[must_use]
    pub fn with_trigger(mut self, trigger: TriggerMode) -> Self {
        self.trigger = trigger;
        self
    }

    /// Set the auto delay
    #[must_use]
    pub fn with_auto_delay(mut self, delay: Duration) -> Self {
        self.auto_delay = delay;
        self
    }

    /// Set the auto delay from signed milliseconds; negative values become zero
    #[must_use]
    pub fn with_auto_delay_ms(mut self, delay_ms: i64) -> Self {
        self.auto_delay = sanitize_delay_ms(delay_ms);
        self
    }

    /// Set the palette
    #[must_use]
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Set frame timing
    #[must_use]
    pub fn with_timing(mut self, timing: FlickerTiming) -> Self {
        self.timing = timing.sanitized();
        self
    }

    /// Set the label's display color
    #[must_use]
    pub fn with_base_color(mut self, color: Rgb) -> Self {
        self.base_color = color;
        self
    }
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            trigger: TriggerMode::default(),
            auto_delay: Duration::ZERO,
            palette: Palette::default(),
            timing: FlickerTiming::default(),
            base_color: Self::DEFAULT_BASE_COLOR,
        }
    }
}

/// Convert a possibly negative millisecond delay, substituting zero
pub(crate) fn sanitize_delay_ms(delay_ms: i64) -> Duration {
    match u64::try_from(delay_ms) {
        Ok(ms) => Duration::from_millis(ms),
        Err(_) => {
            tracing::warn!(delay_ms, "Negative auto delay, using 0");
            Duration::ZERO
        }
    }
}

/// What a call to [`TextAnimator::start`] or [`TextAnimator::signal`] did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new run was accepted
    Started(RunId),
    /// A run is already in progress; nothing changed
    AlreadyRunning,
    /// The label has no units; nothing to animate and nothing to complete
    Empty,
    /// The signal does not activate this trigger mode
    Ignored,
    /// The animator was torn down
    TornDown,
}

impl StartOutcome {
    /// Whether a run was started
    #[must_use]
    pub fn is_started(self) -> bool {
        matches!(self, Self::Started(_))
    }
}

/// Counters over the animator's lifetime
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Starts that began a run
    pub accepted: u64,
    /// Starts rejected because a run was in progress
    pub rejected: u64,
    /// Runs that reached their last settle
    pub completed: u64,
    /// Runs cut short by teardown, revert or a content change
    pub cancelled: u64,
    /// Completion callbacks that returned an error or panicked
    pub callback_failures: u64,
    /// Randomized frames shown
    pub frames: u64,
}

/// Character-scramble animator for one label
pub struct TextAnimator {
    label: LabelText,
    config: AnimatorConfig,
    random: Box<dyn RandomSource>,
    scheduler: FlickerScheduler,
    trigger: TriggerAdapter,
    running: bool,
    torn_down: bool,
    on_complete: Option<CompletionCallback>,
    stats: RunStats,
    last_run_started_at: Option<Duration>,
}

impl TextAnimator {
    /// Mount an animator over `content`
    ///
    /// The text is decomposed immediately and, for `auto`, the single
    /// activation is armed `auto_delay` from now.
    pub fn new(content: impl Into<String>, config: AnimatorConfig) -> Self {
        let random = Box::new(PaletteRandom::new(config.palette.clone()));
        Self::with_random_source(content, config, random)
    }

    /// Mount an animator with a custom random source
    pub fn with_random_source(
        content: impl Into<String>,
        config: AnimatorConfig,
        random: Box<dyn RandomSource>,
    ) -> Self {
        let mut label = LabelText::plain(content);
        let units = label.decompose(config.base_color);
        let trigger = TriggerAdapter::new(config.trigger, config.auto_delay, Duration::ZERO);

        tracing::debug!(
            units,
            trigger = %config.trigger,
            auto_delay_ms = config.auto_delay.as_millis() as u64,
            "Mounted text animator"
        );

        Self {
            label,
            scheduler: FlickerScheduler::new(config.timing),
            config,
            random,
            trigger,
            running: false,
            torn_down: false,
            on_complete: None,
            stats: RunStats::default(),
            last_run_started_at: None,
        }
    }

    /// Register the completion callback
    #[must_use]
    pub fn on_animation_complete<F>(mut self, callback: F) -> Self
    where
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Start a run at `now`
    ///
    /// Frames due at or before `now` are applied first, so a run that has
    /// already ended by `now` does not block the new one. Still a no-op
    /// while a run is in progress. Otherwise stale frames are cancelled,
    /// every unit is reset to its original content and color, and the
    /// scheduler takes over.
    pub fn start(&mut self, now: Duration) -> StartOutcome {
        if self.torn_down {
            return StartOutcome::TornDown;
        }
        self.advance_to(now);
        if self.running {
            self.stats.rejected += 1;
            tracing::debug!(run = ?self.scheduler.active_run(), "Start ignored, run in progress");
            return StartOutcome::AlreadyRunning;
        }

        if !self.label.is_split() {
            self.label.decompose(self.config.base_color);
        }
        let Some(split) = self.label.as_split_mut() else {
            return StartOutcome::Empty;
        };
        if split.is_empty() {
            tracing::debug!("Start on empty label, nothing to animate");
            return StartOutcome::Empty;
        }

        if let Some(stale) = self.scheduler.cancel() {
            tracing::debug!(run = %stale, "Cancelled stale frames");
        }
        split.settle_all();
        self.running = true;

        let units = split.len();
        let id = self.scheduler.schedule(now, units);
        self.stats.accepted += 1;
        self.last_run_started_at = Some(now);

        tracing::debug!(run = %id, units, start_ms = now.as_millis() as u64, "Run started");
        StartOutcome::Started(id)
    }

    /// Deliver a host activation signal
    pub fn signal(&mut self, signal: TriggerSignal, now: Duration) -> StartOutcome {
        if self.torn_down {
            return StartOutcome::TornDown;
        }
        if !self.trigger.accepts(signal) {
            return StartOutcome::Ignored;
        }
        self.start(now)
    }

    /// Advance to `now`: fire a due auto activation and every due frame
    ///
    /// Returns `true` if any unit's displayed content or color changed.
    pub fn tick(&mut self, now: Duration) -> bool {
        if self.torn_down {
            return false;
        }

        let mut changed = false;
        if let Some(due) = self.trigger.poll_auto(now) {
            // Finish whatever ended before the activation
            changed |= self.advance_to(due);
            tracing::debug!(due_ms = due.as_millis() as u64, "Auto trigger fired");
            self.start(due);
        }
        changed | self.advance_to(now)
    }

    /// Apply every frame due at or before `now` and finalize a completed run
    fn advance_to(&mut self, now: Duration) -> bool {
        let Some(split) = self.label.as_split_mut() else {
            return false;
        };
        let advance = self
            .scheduler
            .advance(now, split.units_mut(), self.random.as_mut());
        self.stats.frames += advance.frames;

        if let Some(run) = advance.completed {
            self.finish_run(run);
        }
        advance.changed
    }

    /// Earliest time at which [`tick`](Self::tick) has work to do
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        match (
            self.scheduler.next_deadline(),
            self.trigger.next_auto_deadline(),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Cancel any run and restore the unsplit text
    ///
    /// Idempotent. The label is decomposed again on the next start.
    pub fn revert(&mut self) -> Cow<'_, str> {
        self.cancel_run("revert");
        self.label.revert();
        self.label.text()
    }

    /// Release everything: pending frames, the auto activation and the split
    ///
    /// After teardown the animator ignores starts and ticks. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.trigger.disarm();
        self.cancel_run("teardown");
        self.label.revert();
        tracing::debug!(stats = ?self.stats, "Text animator torn down");
    }

    /// Replace the text; an active run is cancelled without completing
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.cancel_run("content changed");
        self.label.revert();
        self.label = LabelText::plain(content);
        if !self.torn_down {
            self.label.decompose(self.config.base_color);
        }
    }

    /// Change the display color and re-capture originals
    pub fn set_base_color(&mut self, color: Rgb) {
        self.config.base_color = color;
        if self.label.is_split() {
            self.cancel_run("base color changed");
            self.label.decompose(color);
        }
    }

    /// Change trigger mode and auto delay; re-arms auto relative to `now`
    pub fn set_trigger(&mut self, trigger: TriggerMode, auto_delay: Duration, now: Duration) {
        if self.torn_down {
            return;
        }
        self.config.trigger = trigger;
        self.config.auto_delay = auto_delay;
        self.trigger.rearm(trigger, auto_delay, now);
    }

    /// Units in display order (empty when reverted)
    #[must_use]
    pub fn units(&self) -> &[CharacterUnit] {
        self.label.as_split().map_or(&[], |split| split.units())
    }

    /// The decomposed label, if split
    #[must_use]
    pub fn split(&self) -> Option<&crate::units::SplitText> {
        self.label.as_split()
    }

    /// The original text
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        self.label.text()
    }

    /// The text as currently displayed, scrambled units included
    #[must_use]
    pub fn display_text(&self) -> String {
        match self.label.as_split() {
            Some(split) => split.current_text(),
            None => self.label.text().into_owned(),
        }
    }

    /// Whether a run is in progress
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether [`teardown`](Self::teardown) has run
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Whether every unit shows its original content and color
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        match self.label.as_split() {
            Some(split) => split.is_pristine(),
            None => true,
        }
    }

    /// The run in progress, if any
    #[must_use]
    pub fn active_run(&self) -> Option<RunId> {
        self.scheduler.active_run()
    }

    /// When the most recent run started
    #[must_use]
    pub fn last_run_started_at(&self) -> Option<Duration> {
        self.last_run_started_at
    }

    /// Lifetime counters
    #[must_use]
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    /// Current trigger mode
    #[must_use]
    pub fn trigger_mode(&self) -> TriggerMode {
        self.trigger.mode()
    }

    fn cancel_run(&mut self, reason: &'static str) {
        if let Some(run) = self.scheduler.cancel() {
            self.stats.cancelled += 1;
            tracing::debug!(run = %run, reason, "Run cancelled");
        }
        self.running = false;
        if let Some(split) = self.label.as_split_mut() {
            split.settle_all();
        }
    }

    fn finish_run(&mut self, run: RunId) {
        self.running = false;
        self.stats.completed += 1;
        debug_assert!(self.is_pristine(), "units must be settled after a run");

        let _span = tracing::debug_span!("scramble_run", run = %run).entered();
        tracing::debug!("Run complete");

        let Some(callback) = self.on_complete.as_mut() else {
            return;
        };
        let failure = match panic::catch_unwind(AssertUnwindSafe(|| callback())) {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("{e:#}")),
            Err(payload) => Some(format!("panicked: {}", panic_message(payload.as_ref()))),
        };
        if let Some(error) = failure {
            self.stats.callback_failures += 1;
            tracing::error!(run = %run, %error, "Animation complete callback failed");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl fmt::Debug for TextAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextAnimator")
            .field("label", &self.label)
            .field("config", &self.config)
            .field("running", &self.running)
            .field("torn_down", &self.torn_down)
            .field("active_run", &self.scheduler.active_run())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Drop for TextAnimator {
    fn drop(&mut self) {
        self.teardown();
    }
}
