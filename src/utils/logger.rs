//! Tracing subscriber setup for the server binary.

use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::utils::static_object::LOG_FORMAT;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_directive`. With `LOG_FORMAT=json` events are
/// written as bunyan JSON lines, otherwise as human-readable text.
pub fn setup_logger(default_directive: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    if LOG_FORMAT.as_str() == "json" {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(JsonStorageLayer)
            .with(BunyanFormattingLayer::new(
                env!("CARGO_PKG_NAME").to_string(),
                std::io::stdout,
            ))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
