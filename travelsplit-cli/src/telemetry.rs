use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use travelsplit_config::{LogFormat, TelemetrySettings};

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Logs always go to stderr so command output on stdout stays machine-readable.
pub fn init_tracing(settings: &TelemetrySettings, verbose: u8) {
    let level = match verbose {
        0 => settings.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    let _ = match settings.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };
}
