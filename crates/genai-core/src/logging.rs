//! Structured logging bootstrap.
//!
//! The client crates only emit `tracing` events; applications decide where they
//! go. These helpers install a process-wide subscriber for binaries and tests
//! that don't bring their own.

use tracing_subscriber::EnvFilter;

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global tracing subscriber with compact stderr output.
///
/// `RUST_LOG` takes precedence over `level`. Subsequent calls are no-ops.
pub fn init_subscriber(level: &str) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init fails if a subscriber is already installed
    let _ = subscriber.try_init();
}

/// Initialize the global tracing subscriber with JSON lines on stderr.
pub fn init_json_subscriber(level: &str) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(std::io::stderr)
        .json();

    let _ = subscriber.try_init();
}
