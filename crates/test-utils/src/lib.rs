pub mod builders;
pub mod fake_vcs;
pub mod recording;

use std::sync::{Mutex, MutexGuard, Once};
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();
static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Serialise tests that change the process working directory.
///
/// The working directory is process-global and the test harness runs tests
/// on several threads, so every test that enters a directory holds this.
pub fn cwd_lock() -> MutexGuard<'static, ()> {
    CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}
