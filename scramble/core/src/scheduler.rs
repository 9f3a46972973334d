//! Per-Unit Flicker Scheduler
//!
//! Drives every unit of a run through an explicit state machine:
//!
//! ```text
//!   Waiting ──(delay(p))──▶ Flickering{0} ──▶ … ──▶ Flickering{last} ──▶ Settled
//! ```
//!
//! Unit `p` starts flickering `delay(p) = (p + 1) * stagger_unit` after the
//! run starts, which produces a left-to-right wavefront. It then shows
//! `flicker_repeat + 1` randomized frames, each lasting `flicker_interval`
//! and separated by `inter_flicker_pause`, and finally snaps back to its
//! original content and color.
//!
//! Steps are kept in a min-heap keyed by `(due, position)`. The scheduler
//! never blocks: hosts call [`FlickerScheduler::advance`] with the current
//! time and sleep until [`FlickerScheduler::next_deadline`]. Every step is
//! tagged with its [`RunId`], so steps left over from a cancelled run are
//! dropped instead of mutating units.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::random::RandomSource;
use crate::units::CharacterUnit;

/// Identifier of one activation-to-completion run
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u64);

impl RunId {
    /// Raw sequence number (runs are numbered from 1 per instance)
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// Timing parameters for one run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlickerTiming {
    /// Offset between consecutive units' flicker start
    pub stagger_unit: Duration,
    /// How long each randomized frame lasts
    pub flicker_interval: Duration,
    /// Extra frames after the first one
    pub flicker_repeat: u32,
    /// Pause between consecutive frames
    pub inter_flicker_pause: Duration,
}

impl FlickerTiming {
    /// Default offset between units (80ms)
    pub const DEFAULT_STAGGER_UNIT: Duration = Duration::from_millis(80);
    /// Default frame length (30ms)
    pub const DEFAULT_FLICKER_INTERVAL: Duration = Duration::from_millis(30);
    /// Default number of repeats (4 frames in total)
    pub const DEFAULT_FLICKER_REPEAT: u32 = 3;
    /// Default pause between frames (100ms)
    pub const DEFAULT_INTER_FLICKER_PAUSE: Duration = Duration::from_millis(100);

    /// Replace values that would break the wavefront ordering
    ///
    /// A zero stagger would start every unit at once, so it falls back to
    /// the default.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if self.stagger_unit.is_zero() {
            tracing::warn!("Zero stagger unit, using default");
            self.stagger_unit = Self::DEFAULT_STAGGER_UNIT;
        }
        self
    }

    /// Frames shown per unit per run
    #[must_use]
    pub fn frame_count(&self) -> u32 {
        self.flicker_repeat.saturating_add(1)
    }

    /// Offset from run start at which `position` begins flickering
    #[must_use]
    pub fn delay(&self, position: usize) -> Duration {
        let steps = u32::try_from(position.saturating_add(1)).unwrap_or(u32::MAX);
        self.stagger_unit.saturating_mul(steps)
    }

    /// Time from the start of one frame to the start of the next
    #[must_use]
    pub fn frame_period(&self) -> Duration {
        self.flicker_interval.saturating_add(self.inter_flicker_pause)
    }

    /// Offset from run start at which `frame` of `position` is shown
    #[must_use]
    pub fn frame_start(&self, position: usize, frame: u32) -> Duration {
        self.delay(position)
            .saturating_add(self.frame_period().saturating_mul(frame))
    }

    /// How long one unit spends flickering
    #[must_use]
    pub fn flicker_span(&self) -> Duration {
        self.flicker_interval
            .saturating_mul(self.frame_count())
            .saturating_add(self.inter_flicker_pause.saturating_mul(self.flicker_repeat))
    }

    /// Offset from run start at which `position` settles
    #[must_use]
    pub fn settle_at(&self, position: usize) -> Duration {
        self.delay(position).saturating_add(self.flicker_span())
    }

    /// Total run length for `units` units (zero for an empty label)
    #[must_use]
    pub fn run_duration(&self, units: usize) -> Duration {
        match units {
            0 => Duration::ZERO,
            n => self.settle_at(n - 1),
        }
    }
}

impl Default for FlickerTiming {
    fn default() -> Self {
        Self {
            stagger_unit: Self::DEFAULT_STAGGER_UNIT,
            flicker_interval: Self::DEFAULT_FLICKER_INTERVAL,
            flicker_repeat: Self::DEFAULT_FLICKER_REPEAT,
            inter_flicker_pause: Self::DEFAULT_INTER_FLICKER_PAUSE,
        }
    }
}

/// Per-unit phase within a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FlickerPhase {
    /// Settled, waiting for its wavefront delay
    Waiting,
    /// Showing randomized frame `frame`
    Flickering { frame: u32 },
    /// Done for this run
    Settled,
}

/// A pending step for one unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct ScheduledStep {
    due: Duration,
    position: usize,
    run: RunId,
}

#[derive(Clone, Copy, Debug)]
struct ActiveRun {
    id: RunId,
    started_at: Duration,
    units: usize,
}

/// Result of advancing the scheduler to a point in time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Advance {
    /// Whether any unit's displayed content or color changed
    pub changed: bool,
    /// Randomized frames shown during this advance
    pub frames: u64,
    /// Units that settled during this advance
    pub settled: usize,
    /// Set when the last unit settled and the run is over
    pub completed: Option<RunId>,
}

/// Frame scheduler for one animator instance
#[derive(Debug)]
pub struct FlickerScheduler {
    timing: FlickerTiming,
    active: Option<ActiveRun>,
    phases: Vec<FlickerPhase>,
    queue: BinaryHeap<Reverse<ScheduledStep>>,
    runs: u64,
}

impl FlickerScheduler {
    /// Create an idle scheduler
    #[must_use]
    pub fn new(timing: FlickerTiming) -> Self {
        Self {
            timing: timing.sanitized(),
            active: None,
            phases: Vec::new(),
            queue: BinaryHeap::new(),
            runs: 0,
        }
    }

    /// Timing used for runs scheduled from now on
    #[must_use]
    pub fn timing(&self) -> FlickerTiming {
        self.timing
    }

    /// The run currently being driven, if any
    #[must_use]
    pub fn active_run(&self) -> Option<RunId> {
        self.active.map(|run| run.id)
    }

    /// Number of steps waiting in the queue
    #[must_use]
    pub fn pending_steps(&self) -> usize {
        self.queue.len()
    }

    /// Time of the earliest pending step
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse(step)| step.due)
    }

    /// Start a new run over `units` units beginning at `started_at`
    ///
    /// Any previous run is cancelled first.
    pub fn schedule(&mut self, started_at: Duration, units: usize) -> RunId {
        self.cancel();

        self.runs += 1;
        let id = RunId(self.runs);
        self.phases = vec![FlickerPhase::Waiting; units];
        self.queue.extend((0..units).map(|position| {
            Reverse(ScheduledStep {
                due: started_at.saturating_add(self.timing.delay(position)),
                position,
                run: id,
            })
        }));
        self.active = Some(ActiveRun {
            id,
            started_at,
            units,
        });

        tracing::trace!(
            run = %id,
            units,
            duration_ms = self.timing.run_duration(units).as_millis() as u64,
            "Scheduled flicker run"
        );
        id
    }

    /// Drop every pending step; returns the run that was cancelled
    pub fn cancel(&mut self) -> Option<RunId> {
        self.queue.clear();
        self.phases.clear();
        self.active.take().map(|run| run.id)
    }

    /// Process every step due at or before `now`
    ///
    /// Steps run in `(due, position)` order. `units` must be the arena the
    /// run was scheduled for; positions outside it are skipped.
    pub fn advance(
        &mut self,
        now: Duration,
        units: &mut [CharacterUnit],
        random: &mut dyn RandomSource,
    ) -> Advance {
        let mut result = Advance::default();

        while let Some(Reverse(step)) = self.queue.peek().copied() {
            if step.due > now {
                break;
            }
            self.queue.pop();

            let Some(run) = self.active.filter(|run| run.id == step.run) else {
                tracing::trace!(run = %step.run, position = step.position, "Dropped stale step");
                continue;
            };
            let (Some(unit), Some(phase)) = (
                units.get_mut(step.position),
                self.phases.get(step.position).copied(),
            ) else {
                continue;
            };

            let next = match phase {
                FlickerPhase::Waiting => Some(0),
                FlickerPhase::Flickering { frame } if frame + 1 < self.timing.frame_count() => {
                    Some(frame + 1)
                }
                FlickerPhase::Flickering { .. } => None,
                FlickerPhase::Settled => continue,
            };

            match next {
                Some(frame) => {
                    unit.show_frame(random.next_symbol(), random.next_color());
                    self.phases[step.position] = FlickerPhase::Flickering { frame };
                    result.frames += 1;

                    let offset = if frame + 1 < self.timing.frame_count() {
                        self.timing.frame_start(step.position, frame + 1)
                    } else {
                        self.timing.settle_at(step.position)
                    };
                    self.queue.push(Reverse(ScheduledStep {
                        due: run.started_at.saturating_add(offset),
                        position: step.position,
                        run: run.id,
                    }));
                }
                None => {
                    unit.settle();
                    self.phases[step.position] = FlickerPhase::Settled;
                    result.settled += 1;

                    if step.position + 1 == run.units {
                        tracing::trace!(run = %run.id, "Last unit settled");
                        result.completed = Some(run.id);
                        self.cancel();
                    }
                }
            }
            result.changed = true;
        }

        result
    }
}

impl Default for FlickerScheduler {
    fn default() -> Self {
        Self::new(FlickerTiming::default())
    }
}
