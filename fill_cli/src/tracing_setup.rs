//! Subscriber setup: the CLI owns this so library crates only ever emit
//! through the `tracing` facade and never configure a subscriber
//! themselves.

use tracing_subscriber::EnvFilter;

/// Installs a global subscriber. `log_level` is the default filter when
/// `RUST_LOG` is unset; `json` switches the console formatter.
pub fn init(json: bool, log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
