//! Tracing setup for the broker daemon and the integration tests.

use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Filter used when `RUST_LOG` is unset: broker events at info plus one
/// span per HTTP request from the trace layer.
pub const DEFAULT_DIRECTIVES: &str = "warn,simplebroker=info,tower_http=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Installs the global tracing subscriber. Only the first call takes effect.
pub fn init_logging() {
    let formatting_layer = fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .compact();

    let subscriber = Registry::default().with(env_filter()).with(formatting_layer);

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("simplebroker: tracing subscriber already installed: {e}");
    }
}
