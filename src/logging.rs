//! Subscriber setup for the `tracing` events the library emits.

use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Install a stderr fmt subscriber. `RUST_LOG` directives win over `level`.
///
/// Unknown levels fall back to `warn`. Installing twice is harmless; the
/// second call leaves the first subscriber in place.
pub fn init_logging(level: &str) {
    let level = level.trim().to_ascii_lowercase();
    let default = if LEVELS.contains(&level.as_str()) {
        level.parse().unwrap_or(LevelFilter::WARN)
    } else {
        LevelFilter::WARN
    };

    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .parse_lossy(std::env::var("RUST_LOG").unwrap_or_default());

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    if tracing_subscriber::registry()
        .with(stderr_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
}
