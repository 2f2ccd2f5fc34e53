//! Tracing subscriber setup.
//!
//! Events go to stderr. Subprocess diagnostics are re-emitted as events on the
//! `tubely::subprocess` target, so they end up in the same stream.

use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

const DEFAULT_FILTER: &str = "tubely=debug,tower_http=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Compact console output in development, JSON lines in production.
pub fn init_telemetry(is_production: bool) {
    if is_production {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        let console_fmt = tracing_subscriber::fmt::layer()
            .event_format(
                Format::default()
                    .compact()
                    .with_target(false)
                    .without_time(),
            )
            .with_writer(std::io::stderr);
        tracing_subscriber::registry()
            .with(env_filter())
            .with(console_fmt)
            .init();
    }

    tracing::debug!(is_production, "Telemetry initialized");
}
