//! Integration Test: No Process-Wide Animation Registry
//!
//! **Policy**: Every animator owns its units, scheduler, trigger and random
//! source. The engine crate MUST NOT hold mutable state shared across
//! instances: no `static` items, `static mut`, `lazy_static!`,
//! `thread_local!`, `OnceLock` or `LazyLock`.
//! **Exceptions**: `const` items, `'static` lifetimes, test code.

use architectural_enforcement::{report, scan};

const FORBIDDEN_TOKENS: &[&str] = &[
    "lazy_static!",
    "thread_local!",
    "OnceLock",
    "LazyLock",
    "OnceCell",
    "static mut",
];

fn declares_global(code: &str) -> bool {
    let trimmed = code.trim_start();
    let is_static_item = ["static ", "pub static ", "pub(crate) static "]
        .iter()
        .any(|prefix| trimmed.starts_with(prefix));
    is_static_item || FORBIDDEN_TOKENS.iter().any(|token| code.contains(token))
}

#[test]
fn test_no_global_state_in_engine() {
    let violations = scan("scramble/core/src", |_, lines, idx| declares_global(lines[idx].1));
    report("process-wide state in engine code", &violations);
}

#[test]
fn test_global_detection() {
    assert!(declares_global("static REGISTRY: Mutex<Vec<u64>> = Mutex::new(Vec::new());"));
    assert!(declares_global("    pub static COUNTER: AtomicU64 = AtomicU64::new(0);"));
    assert!(declares_global("static ACTIVE: OnceLock<Registry> = OnceLock::new();"));
    assert!(declares_global("lazy_static! {"));
    assert!(!declares_global("pub type Callback = Box<dyn FnMut() + Send + 'static>;"));
    assert!(!declares_global("pub const DEFAULT_PALETTE: [Rgb; 5] = ["));
}
