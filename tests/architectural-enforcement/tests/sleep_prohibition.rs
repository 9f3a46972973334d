//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Engine code in `scramble/core` MUST NOT sleep. Animation time
//! only advances through `tick(now)`; the async driver waits with
//! `sleep_until` on the animator's next deadline and nowhere else.
//! **Exceptions**: the driver's deadline wait, frame pacing in the TUI event
//! loop, test code.

use std::path::Path;

use architectural_enforcement::{report, scan};

fn is_sleep_call(code: &str) -> bool {
    code.contains("::sleep(") || code.contains(".sleep(") || code.contains("sleep_until(")
}

/// The one permitted wait: the driver sleeping until the next deadline
fn is_deadline_wait(path: &Path, code: &str) -> bool {
    path.ends_with("scramble/core/src/runtime.rs")
        && code.contains("sleep_until(")
        && code.contains("epoch + ")
}

/// Frame pacing in the TUI loop
fn is_frame_pacing(path: &Path, lines: &[(usize, &str)], idx: usize) -> bool {
    if !path.ends_with("tui/src/app.rs") {
        return false;
    }
    let start = idx.saturating_sub(3);
    let end = (idx + 2).min(lines.len());
    lines[start..end]
        .iter()
        .any(|(_, code)| code.to_lowercase().contains("frame"))
}

#[test]
fn test_no_sleep_in_engine() {
    let violations = scan("scramble/core/src", |path, lines, idx| {
        let code = lines[idx].1;
        is_sleep_call(code) && !is_deadline_wait(path, code)
    });
    report("sleep calls in engine code", &violations);
}

#[test]
fn test_tui_sleeps_only_for_frame_pacing() {
    let violations = scan("tui/src", |path, lines, idx| {
        let code = lines[idx].1;
        is_sleep_call(code) && !is_frame_pacing(path, lines, idx)
    });
    report("sleep calls outside TUI frame pacing", &violations);
}

#[test]
fn test_sleep_detection() {
    assert!(is_sleep_call("    std::thread::sleep(Duration::from_millis(5));"));
    assert!(is_sleep_call("    tokio::time::sleep(d).await;"));
    assert!(is_sleep_call("    sleep_until(deadline).await"));
    assert!(!is_sleep_call("    let asleep = true;"));
}

#[test]
fn test_deadline_wait_exception() {
    let runtime = Path::new("scramble/core/src/runtime.rs");
    assert!(is_deadline_wait(runtime, "Some(at) => sleep_until(epoch + at).await,"));
    assert!(!is_deadline_wait(runtime, "tokio::time::sleep(d).await"));
    assert!(!is_deadline_wait(
        Path::new("scramble/core/src/animator.rs"),
        "sleep_until(epoch + at)"
    ));
}
