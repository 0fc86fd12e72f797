//! test-support: helpers for robust, nextest-friendly tests.
//!
//! Add as a dev-dependency in your top-level `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test_support = { path = "tests/support", features = ["serde"] }
//! ```
//!
//! Then in tests:
//! ```rust
//! use test_support::{init_tracing, fixtures_dir};
//!
//! #[test]
//! fn example() {
//!     init_tracing();
//!     let _root = fixtures_dir();
//! }
//! ```

use once_cell::sync::Lazy;
use tracing_subscriber::{fmt, EnvFilter};

use std::path::{Path, PathBuf};

/// Initialize `tracing` once, honoring `RUST_LOG` and writing via the test writer.
///
/// Safe to call from multiple tests; only the first call configures the global subscriber.
pub fn init_tracing() {
    static INIT: Lazy<()> = Lazy::new(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,issue_cycle_time=info"));
        // with_test_writer() causes logs to appear alongside failing tests only (cargo/nextest)
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
    Lazy::force(&INIT);
}

/// Initialize insta snapshot settings once per test process.
///
/// - Centralizes snapshot files in `tests/snapshots` (relative to the test binary's CWD)
/// - Omits `Expression:` in snapshot headers for cleaner diffs
pub fn init_insta() {
    static INIT: Lazy<()> = Lazy::new(|| {
        let mut settings = insta::Settings::clone_current();
        settings.set_snapshot_path("../snapshots");
        settings.set_omit_expression(true);
        // Bind settings to the thread for the remainder of the test process by leaking the guard
        let guard = settings.bind_to_scope();
        std::mem::forget(guard);
    });
    Lazy::force(&INIT);
}

/// Return the path to the repository's `tests/fixtures` directory.
///
/// This crate lives in `tests/support`, so the fixtures sit next to it; the
/// result does not depend on the runner's working directory (cargo vs nextest).
pub fn fixtures_dir() -> PathBuf {
    let support = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    support
        .parent()
        .map(|tests| tests.join("fixtures"))
        .unwrap_or_else(|| support.join("fixtures"))
}

/// Absolute path of a fixture file.
pub fn fixture_path<P: AsRef<Path>>(rel_path: P) -> PathBuf {
    fixtures_dir().join(rel_path)
}

/// Deserialize a JSON fixture into `T` (enable `serde` feature).
#[cfg(feature = "serde")]
pub fn read_fixture_json<T, P>(rel_path: P) -> T
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = fixture_path(rel_path);
    let file = std::fs::File::open(&path)
        .unwrap_or_else(|e| panic!("failed to open fixture {}: {e}", path.display()));
    serde_json::from_reader::<_, T>(file)
        .unwrap_or_else(|e| panic!("failed to parse JSON fixture {}: {e}", path.display()))
}

/// Create a temp directory that deletes on drop.
pub fn tempdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create tempdir")
}

/// Run a binary target with `assert_cmd`, returning the ready-to-run `Command`.
///
/// Tracker credentials are scrubbed so tests never reach a real tracker.
///
/// Example:
/// ```no_run
/// use test_support::cmd_bin;
///
/// let mut cmd = cmd_bin("my-cli");
/// cmd.arg("--help").assert().success();
/// ```
pub fn cmd_bin(bin: &str) -> assert_cmd::Command {
    init_tracing();
    let mut cmd = assert_cmd::Command::cargo_bin(bin).expect("binary target not found");
    for var in ["JIRA_HOST", "JIRA_EMAIL", "JIRA_API_TOKEN", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}
