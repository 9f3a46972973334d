//! End-to-end behavior of the scramble engine, driven with virtual time

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use scramble_core::{
    load_config_with_env, AnimatorConfig, AnimatorHandle, ConfigSource, Palette, RandomSource,
    Rgb, StartOutcome, TextAnimator, TriggerMode, TriggerSignal, UnitState,
};
use tempfile::NamedTempFile;

const WHITE: Rgb = Rgb::new(255, 255, 255);

/// Deterministic source that cycles through a few symbols
struct CyclingSource {
    next: usize,
}

impl RandomSource for CyclingSource {
    fn next_symbol(&mut self) -> char {
        let symbols = ['#', '@', '%'];
        self.next = (self.next + 1) % symbols.len();
        symbols[self.next]
    }

    fn next_color(&mut self) -> Rgb {
        Rgb::new(0x66, 0x7e, 0xea)
    }
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn animator(content: &str, config: AnimatorConfig) -> TextAnimator {
    TextAnimator::with_random_source(content, config, Box::new(CyclingSource { next: 0 }))
}

fn completion_counter(animator: TextAnimator) -> (TextAnimator, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    let animator = animator.on_animation_complete(move || {
        inner.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    (animator, count)
}

/// Record the first instant each unit leaves its original content
fn flicker_starts(animator: &mut TextAnimator, until: Duration) -> Vec<Option<Duration>> {
    let mut starts = vec![None; animator.units().len()];
    let mut now = Duration::ZERO;
    while now <= until {
        animator.tick(now);
        for (slot, unit) in starts.iter_mut().zip(animator.units()) {
            if slot.is_none() && unit.state() == UnitState::Flickering {
                *slot = Some(now);
            }
        }
        now += ms(1);
    }
    starts
}

#[test]
fn scenario_a_staggered_wavefront_then_restore() {
    let (mut animator, completions) = completion_counter(animator("ABC", AnimatorConfig::default()));
    assert!(animator.start(Duration::ZERO).is_started());

    let starts = flicker_starts(&mut animator, ms(700));
    assert_eq!(starts, vec![Some(ms(80)), Some(ms(160)), Some(ms(240))]);

    assert!(!animator.is_running());
    let settled: Vec<(&str, Rgb)> = animator
        .units()
        .iter()
        .map(|u| (u.current_content(), u.current_color()))
        .collect();
    assert_eq!(settled, vec![("A", WHITE), ("B", WHITE), ("C", WHITE)]);
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

#[test]
fn scenario_b_rapid_starts_complete_once() {
    let (mut animator, completions) = completion_counter(animator("ABC", AnimatorConfig::default()));

    assert!(animator.start(Duration::ZERO).is_started());
    assert_eq!(animator.start(Duration::ZERO), StartOutcome::AlreadyRunning);

    let mut now = Duration::ZERO;
    while let Some(deadline) = animator.next_deadline() {
        now = deadline;
        animator.tick(now);
    }
    assert_eq!(now, ms(660));
    assert_eq!(completions.load(Ordering::SeqCst), 1);
    assert_eq!(animator.stats().accepted, 1);
    assert_eq!(animator.stats().rejected, 1);
}

#[test]
fn scenario_c_empty_content() {
    let (mut animator, completions) = completion_counter(animator("", AnimatorConfig::default()));

    assert_eq!(animator.start(Duration::ZERO), StartOutcome::Empty);
    assert_eq!(animator.next_deadline(), None);
    animator.tick(ms(5_000));
    assert_eq!(animator.stats().frames, 0);
    assert_eq!(completions.load(Ordering::SeqCst), 0);
}

#[test]
fn scenario_d_auto_waits_for_delay() {
    let config = AnimatorConfig::default()
        .with_trigger(TriggerMode::Auto)
        .with_auto_delay(ms(1000));
    let mut animator = animator("Geo OSINT Tool", config);

    let mut now = Duration::ZERO;
    while now < ms(1000) {
        assert!(!animator.tick(now));
        assert!(!animator.is_running());
        now += ms(16);
    }
    animator.tick(now);
    assert_eq!(animator.last_run_started_at(), Some(ms(1000)));

    // Pointer signals never start an auto label
    assert_eq!(
        animator.signal(TriggerSignal::PointerEnter, now),
        StartOutcome::Ignored
    );
}

#[tokio::test(start_paused = true)]
async fn scenario_d_auto_with_async_driver() {
    let config = AnimatorConfig::default()
        .with_trigger(TriggerMode::Auto)
        .with_auto_delay(ms(1000));
    let handle = AnimatorHandle::spawn(TextAnimator::new("Tool", config));
    let mut frames = handle.subscribe();

    tokio::time::sleep(ms(1000)).await;
    assert_eq!(handle.frame_generation(), 0);

    frames.changed().await.unwrap();
    assert_eq!(handle.now(), ms(1080));
    assert_eq!(
        handle.with_animator(TextAnimator::last_run_started_at),
        Some(ms(1000))
    );
}

#[test]
fn scenario_e_teardown_mid_flight() {
    let (mut animator, completions) =
        completion_counter(animator("Upload Image", AnimatorConfig::default()));
    animator.start(Duration::ZERO);
    animator.tick(ms(300));
    assert_ne!(animator.display_text(), "Upload Image");

    animator.teardown();
    for step in 0..100 {
        assert!(!animator.tick(ms(300 + step * 10)));
    }
    assert_eq!(animator.revert(), "Upload Image");
    assert_eq!(completions.load(Ordering::SeqCst), 0);
}

#[test]
fn failing_callback_leaves_instance_usable() {
    let calls = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&calls);
    let mut animator = animator("ok", AnimatorConfig::default()).on_animation_complete(move || {
        inner.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("host rejected completion")
    });

    for round in 0..3u64 {
        let start = ms(round * 1_000);
        assert!(animator.start(start).is_started());
        animator.tick(start + ms(1_000));
        assert!(!animator.is_running());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(animator.stats().callback_failures, 3);
}

#[test]
fn instances_are_independent() {
    let mut first = animator("one", AnimatorConfig::default());
    let mut second = animator("two", AnimatorConfig::default().with_trigger(TriggerMode::Click));

    first.signal(TriggerSignal::PointerEnter, Duration::ZERO);
    second.tick(ms(200));
    assert!(first.is_running());
    assert!(!second.is_running());

    drop(first);
    assert!(second.signal(TriggerSignal::Click, ms(300)).is_started());
}

#[test]
fn config_file_drives_animator() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br##"
[animation]
trigger = "click"
palette = ["#ff0000"]

[timing]
stagger_unit_ms = 10
flicker_interval_ms = 5
flicker_repeat = 0
inter_flicker_pause_ms = 0
"##,
    )
    .unwrap();

    let loaded = load_config_with_env(Some(file.path().to_path_buf()), |_| None).unwrap();
    assert_eq!(loaded.source(), ConfigSource::File);
    assert_eq!(loaded.animator.trigger, TriggerMode::Click);
    assert_eq!(loaded.animator.palette, Palette::new(vec![Rgb::new(255, 0, 0)]));

    let mut animator = TextAnimator::new("ab", loaded.animator.clone());
    assert_eq!(
        animator.signal(TriggerSignal::PointerEnter, Duration::ZERO),
        StartOutcome::Ignored
    );
    assert!(animator.signal(TriggerSignal::Click, Duration::ZERO).is_started());
    // Two units, one 5ms frame each, staggered by 10ms
    animator.tick(ms(10));
    assert_eq!(animator.units()[0].current_color(), Rgb::new(255, 0, 0));
    animator.tick(ms(25));
    assert!(!animator.is_running());
}
