// Log setup for the binaries. Library code only emits `tracing` events.

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format;

/// Install a stderr subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let event_format = format().with_target(false);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(event_format)
        .with_writer(std::io::stderr)
        .init();
}
