//! Async driver
//!
//! [`AnimatorHandle`] moves a [`TextAnimator`] onto a tokio task that sleeps
//! until the animator's next deadline and ticks it. Hosts talk to the task
//! through an `mpsc` command channel and read unit state through
//! [`AnimatorHandle::with_animator`]. Every tick that changes a unit bumps a
//! `watch` counter, so renderers can redraw only when something moved.
//!
//! Animator time is the elapsed time since [`AnimatorHandle::spawn`], read
//! from `tokio::time::Instant`, which makes the driver deterministic under
//! `#[tokio::test(start_paused = true)]`.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::animator::{StartOutcome, TextAnimator};
use crate::trigger::{TriggerMode, TriggerSignal};

/// Errors from talking to a driver task
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The task has stopped (shut down or dropped)
    #[error("animator driver has shut down")]
    Closed,
}

enum Command {
    Signal {
        signal: TriggerSignal,
        reply: oneshot::Sender<StartOutcome>,
    },
    Start {
        reply: oneshot::Sender<StartOutcome>,
    },
    SetContent(String),
    SetTrigger {
        mode: TriggerMode,
        auto_delay: Duration,
    },
    Shutdown,
}

/// Handle to an animator running on its own tokio task
///
/// Dropping the handle aborts the task and tears the animator down.
pub struct AnimatorHandle {
    shared: Arc<Mutex<TextAnimator>>,
    commands: mpsc::UnboundedSender<Command>,
    frames: watch::Receiver<u64>,
    epoch: Instant,
    task: Option<JoinHandle<()>>,
}

impl AnimatorHandle {
    /// Spawn the driver task; the animator's clock starts now
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(animator: TextAnimator) -> Self {
        let epoch = Instant::now();
        let shared = Arc::new(Mutex::new(animator));
        let (commands, rx) = mpsc::unbounded_channel();
        let (frames_tx, frames) = watch::channel(0u64);

        let task = tokio::spawn(drive(Arc::clone(&shared), rx, frames_tx, epoch));

        Self {
            shared,
            commands,
            frames,
            epoch,
            task: Some(task),
        }
    }

    /// Elapsed animator time
    #[must_use]
    pub fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Deliver a trigger signal and wait for the outcome
    pub async fn signal(&self, signal: TriggerSignal) -> Result<StartOutcome, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Signal { signal, reply })?;
        rx.await.map_err(|_| DriverError::Closed)
    }

    /// Start a run regardless of trigger mode
    pub async fn start(&self) -> Result<StartOutcome, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start { reply })?;
        rx.await.map_err(|_| DriverError::Closed)
    }

    /// Replace the label text
    pub fn set_content(&self, content: impl Into<String>) -> Result<(), DriverError> {
        self.send(Command::SetContent(content.into()))
    }

    /// Change trigger mode and auto delay
    pub fn set_trigger(&self, mode: TriggerMode, auto_delay: Duration) -> Result<(), DriverError> {
        self.send(Command::SetTrigger { mode, auto_delay })
    }

    /// Run `f` against the animator under the lock
    pub fn with_animator<R>(&self, f: impl FnOnce(&TextAnimator) -> R) -> R {
        f(&self.shared.lock())
    }

    /// Text as currently displayed
    #[must_use]
    pub fn display_text(&self) -> String {
        self.with_animator(TextAnimator::display_text)
    }

    /// Receiver that changes whenever a tick alters a unit
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.frames.clone()
    }

    /// Number of ticks that changed a unit so far
    #[must_use]
    pub fn frame_generation(&self) -> u64 {
        *self.frames.borrow()
    }

    /// Stop the task and wait for it; the animator is torn down
    pub async fn shutdown(mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Animator driver ended abnormally");
            }
        }
    }

    fn send(&self, command: Command) -> Result<(), DriverError> {
        self.commands.send(command).map_err(|_| DriverError::Closed)
    }
}

impl Drop for AnimatorHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.shared.lock().teardown();
    }
}

async fn drive(
    shared: Arc<Mutex<TextAnimator>>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    frames: watch::Sender<u64>,
    epoch: Instant,
) {
    tracing::debug!("Animator driver started");

    loop {
        let deadline = shared.lock().next_deadline();
        let wait = async {
            match deadline {
                Some(at) => sleep_until(epoch + at).await,
                None => future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;

            () = wait => {
                let now = epoch.elapsed();
                let changed = shared.lock().tick(now);
                if changed {
                    frames.send_modify(|generation| *generation += 1);
                }
            }
            command = commands.recv() => {
                let Some(command) = command else { break };
                let now = epoch.elapsed();
                let mut animator = shared.lock();
                // Overdue frames and auto activations happen before the command
                if animator.tick(now) {
                    frames.send_modify(|generation| *generation += 1);
                }
                match command {
                    Command::Signal { signal, reply } => {
                        let _ = reply.send(animator.signal(signal, now));
                    }
                    Command::Start { reply } => {
                        let _ = reply.send(animator.start(now));
                    }
                    Command::SetContent(content) => {
                        animator.set_content(content);
                        frames.send_modify(|generation| *generation += 1);
                    }
                    Command::SetTrigger { mode, auto_delay } => {
                        animator.set_trigger(mode, auto_delay, now);
                    }
                    Command::Shutdown => break,
                }
            }
        }
    }

    shared.lock().teardown();
    tracing::debug!("Animator driver stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::animator::AnimatorConfig;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_start_at_delay() {
        let config = AnimatorConfig::default()
            .with_trigger(TriggerMode::Auto)
            .with_auto_delay(ms(1000));
        let handle = AnimatorHandle::spawn(TextAnimator::new("AB", config));

        tokio::time::sleep(ms(999)).await;
        assert_eq!(handle.with_animator(TextAnimator::last_run_started_at), None);
        assert_eq!(handle.frame_generation(), 0);

        tokio::time::sleep(ms(2)).await;
        assert_eq!(
            handle.with_animator(TextAnimator::last_run_started_at),
            Some(ms(1000))
        );

        // Run over two units ends at 1000 + 580
        tokio::time::sleep(ms(600)).await;
        assert!(!handle.with_animator(TextAnimator::is_running));
        assert_eq!(handle.display_text(), "AB");
        assert!(handle.frame_generation() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_runs_to_completion() {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let animator = TextAnimator::new("abc", AnimatorConfig::default()).on_animation_complete(
            move || {
                inner.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );
        let handle = AnimatorHandle::spawn(animator);

        let outcome = handle.signal(TriggerSignal::PointerEnter).await.unwrap();
        assert!(outcome.is_started());
        assert_eq!(
            handle.signal(TriggerSignal::PointerEnter).await.unwrap(),
            StartOutcome::AlreadyRunning
        );

        tokio::time::sleep(ms(700)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(handle.display_text(), "abc");
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_after_finished_run_starts_fresh() {
        let handle = AnimatorHandle::spawn(TextAnimator::new("ABC", AnimatorConfig::default()));
        assert!(handle.start().await.unwrap().is_started());

        // Run over three units ends at 660
        tokio::time::sleep(ms(2000)).await;
        let outcome = handle.signal(TriggerSignal::PointerEnter).await.unwrap();
        assert!(outcome.is_started());

        let stats = handle.with_animator(TextAnimator::stats);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.rejected, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_notifies_on_frames() {
        let handle = AnimatorHandle::spawn(TextAnimator::new("x", AnimatorConfig::default()));
        let mut frames = handle.subscribe();

        handle.start().await.unwrap();
        frames.changed().await.unwrap();
        assert!(handle.with_animator(TextAnimator::is_running));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_tears_down() {
        let handle = AnimatorHandle::spawn(TextAnimator::new("Tool", AnimatorConfig::default()));
        handle.start().await.unwrap();
        tokio::time::sleep(ms(100)).await;

        let shared = Arc::clone(&handle.shared);
        handle.shutdown().await;

        let animator = shared.lock();
        assert!(animator.is_torn_down());
        assert!(!animator.is_running());
        assert_eq!(animator.text(), "Tool");
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_after_shutdown_fail() {
        let handle = AnimatorHandle::spawn(TextAnimator::new("x", AnimatorConfig::default()));
        let _ = handle.commands.send(Command::Shutdown);
        tokio::time::sleep(ms(1)).await;

        assert_eq!(handle.start().await, Err(DriverError::Closed));
        assert_eq!(handle.set_content("y"), Err(DriverError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_content_cancels_run() {
        let handle = AnimatorHandle::spawn(TextAnimator::new("old", AnimatorConfig::default()));
        handle.start().await.unwrap();
        tokio::time::sleep(ms(100)).await;

        handle.set_content("new text").unwrap();
        tokio::time::sleep(ms(1)).await;
        assert!(!handle.with_animator(TextAnimator::is_running));
        assert_eq!(handle.display_text(), "new text");
    }
}
