//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the bpo tracing/logging system.
///
/// Reads the `BPO_LOG` environment variable for per-target log levels.
/// Format: `BPO_LOG=bpo_storage=debug,bpo_core=warn`
///
/// Falls back to [`DEFAULT_FILTER`] if `BPO_LOG` is not set or is invalid.
/// Calling this more than once is safe.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env("BPO_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        // A subscriber installed by the embedding process wins.
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}

/// Default filter when `BPO_LOG` is absent: info for every bpo crate.
pub const DEFAULT_FILTER: &str = "bpo_core=info,bpo_storage=info";
