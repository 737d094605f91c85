//! Tracing initialization shared by the JETDECK binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_directives`. Output goes to stderr so
/// stdout stays clean for tables and JSON.
pub fn init(default_directives: &str) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_directives.into()),
    );
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Directives for a plain verbosity level, e.g. `warn`.
pub fn directives_for(level: &str) -> String {
    format!("jd_hub={level},jd_cli={level}")
}
