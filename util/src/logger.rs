//! Logger set up for the workspace binaries.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Formatted logging to stderr at INFO, overridable with `RUST_LOG`
/// (e.g. `RUST_LOG=na_variational=debug`).
pub fn init_logger() {
  init_logger_with_level(Level::INFO)
}

/// Does nothing if a global subscriber is already installed.
pub fn init_logger_with_level(default_level: Level) {
  let filter = EnvFilter::builder()
    .with_default_directive(default_level.into())
    .from_env_lossy();

  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(true)
    .with_writer(::std::io::stderr)
    .try_init();
}

#[test]
fn init_twice() {
  init_logger_with_level(Level::DEBUG);
  init_logger();
  tracing::info!("logger initialised");
}
