//! Subscriber setup.

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Pick the filter: `RUST_LOG`, then `-v` count, then the configured level.
fn filter(verbose: u8, configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new(configured),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    })
}

/// Install the global subscriber.
///
/// With `log_dir`, a daily-rolling NDJSON file is written alongside the
/// console output.
pub fn init(verbose: u8, configured: &str, log_dir: Option<&Path>) {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file = log_dir.map(|dir| {
        fmt::layer()
            .json()
            .with_writer(RollingFileAppender::new(Rotation::DAILY, dir, "scanroute.log"))
            .with_ansi(false)
    });

    let _ = tracing_subscriber::registry()
        .with(filter(verbose, configured))
        .with(console)
        .with(file)
        .try_init();
}
