use std::env;
use std::sync::LazyLock;

use tracing::error;

/// Base URL of the notification service, e.g. `http://notification-service:8004`
pub static NOTIFICATION_SERVICE_URL: LazyLock<String> = LazyLock::new(|| {
    env::var("NOTIFICATION_SERVICE_URL").unwrap_or_else(|_| {
        error!(
            "Missing NOTIFICATION_SERVICE_URL env var, using fallback 'http://notification-service:8004'"
        );
        "http://notification-service:8004".to_string()
    })
});

/// Preference value meaning "any candidate value is acceptable"
pub static NO_PREFERENCE_SENTINEL: LazyLock<String> = LazyLock::new(|| {
    env::var("NO_PREFERENCE_SENTINEL").unwrap_or_else(|_| "any".to_string())
});

pub static BIND_ADDR: LazyLock<String> = LazyLock::new(|| {
    env::var("BIND_ADDR").unwrap_or_else(|_| {
        error!("Missing BIND_ADDR env var, using fallback '0.0.0.0:8090'");
        "0.0.0.0:8090".to_string()
    })
});

/// `json` switches log output to bunyan-formatted JSON lines
pub static LOG_FORMAT: LazyLock<String> = LazyLock::new(|| {
    env::var("LOG_FORMAT")
        .map(|val| val.to_ascii_lowercase())
        .unwrap_or_else(|_| "pretty".to_string())
});
