// vim: tw=80
//! Helpers shared by the scenario suites

use tracing_subscriber::EnvFilter;

/// Send `tracing` output to the test harness.  Set `RUST_LOG=standin=trace`
/// to watch every recorded call and every patch.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
