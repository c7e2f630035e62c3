pub mod builders;
pub mod fake_runner;
pub mod flaky_store;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install a per-test tracing subscriber (once per test binary).
///
/// Output goes through `with_test_writer()`, so it only shows up for failing
/// tests or with `-- --nocapture`. The filter comes from `RUST_LOG` and
/// defaults to `warn,taskgate=info`, e.g. `RUST_LOG=taskgate::engine=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,taskgate=info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if it takes longer than 5 seconds.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Poll `check` every few milliseconds until it returns `true`.
///
/// Meant to be wrapped in [`with_timeout`].
pub async fn wait_until<F>(mut check: F)
where
    F: FnMut() -> bool,
{
    while !check() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
