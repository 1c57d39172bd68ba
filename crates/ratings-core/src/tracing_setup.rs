//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize structured logging for the ratings system.
///
/// Reads the `RATINGS_LOG` environment variable for per-module log levels,
/// e.g. `RATINGS_LOG=ratings_engine=debug,ratings_storage=warn`.
/// Falls back to `ratings=info` if unset or invalid.
///
/// Idempotent: later calls are no-ops.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env("RATINGS_LOG").unwrap_or_else(|_| EnvFilter::new("ratings=info"));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}

/// Initialize JSON tracing with a custom filter string (for embedding).
pub fn init_tracing_with_filter(filter: &str) {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_target(true)
            .json()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_a_no_op() {
        init_tracing_with_filter("ratings_core=debug");
        init_tracing();
        init_tracing_with_filter("ratings_core=trace");
        tracing::debug!("tracing initialized once");
    }
}
