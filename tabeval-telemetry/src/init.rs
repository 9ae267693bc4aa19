//! Telemetry initialization

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize console logging to stderr.
///
/// The filter defaults to `info` and follows `RUST_LOG` when set. Only the first
/// call in a process installs a subscriber; later calls are no-ops.
///
/// # Example
/// ```
/// use tabeval_telemetry::init_telemetry;
/// init_telemetry("tabeval").expect("Failed to initialize telemetry");
/// ```
pub fn init_telemetry(service_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut outcome = Ok(());
    INIT.call_once(|| {
        outcome = tracing_subscriber::registry()
            .with(env_filter())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true),
            )
            .try_init();

        tracing::debug!(service.name = service_name, "Telemetry initialized");
    });

    outcome.map_err(Into::into)
}

/// Initialize logging with one JSON object per event, written to stderr.
pub fn init_json_telemetry(service_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut outcome = Ok(());
    INIT.call_once(|| {
        outcome = tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init();

        tracing::debug!(service.name = service_name, "JSON telemetry initialized");
    });

    outcome.map_err(Into::into)
}
