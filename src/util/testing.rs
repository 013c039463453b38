//! Shared setup for unit and integration tests.

use std::sync::Once;

use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

static TEST_SETUP: Once = Once::new();

/// Installs a global test subscriber once per test binary.
///
/// `RUST_LOG` wins; otherwise this crate logs at trace and everything else at warn.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,hiertree=trace"));

        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_span_events(FmtSpan::CLOSE)
            .try_init();
        if let Err(e) = installed {
            eprintln!("test subscriber not installed: {}", e);
        }
        info!("test setup complete");
    });
}
