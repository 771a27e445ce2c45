//! Logging setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// Production logs are flattened JSON at `info`; the dev profile prints
/// coloured human-readable lines at `debug`. `RUST_LOG` overrides either.
pub fn init(dev: bool) {
    let default_level = if dev { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);

    if dev {
        registry.with(fmt::layer().with_ansi(true).with_target(true)).init();
    } else {
        registry.with(fmt::layer().json().flatten_event(true)).init();
    }
}
