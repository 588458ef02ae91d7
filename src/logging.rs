use tracing_subscriber::EnvFilter;

use crate::config::Settings;

/// Install the stderr subscriber. An unparsable filter falls back to `warn`.
pub fn init(settings: &Settings) {
    let filter = EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|e| {
        eprintln!("ignoring invalid log filter '{}': {e}", settings.log_filter);
        EnvFilter::new("warn")
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
