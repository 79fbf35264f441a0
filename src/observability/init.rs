//! Tracing initialization and subscriber setup.

use super::exporter::{create_tracer_provider, SCOPE_NAME};
use super::file_writer::RotatingFile;
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::resource::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_TRACE_LEVEL: &str = "info";

/// Installs the global subscriber: an `EnvFilter` plus an OpenTelemetry layer
/// exporting spans to [`Config::trace_file`].
///
/// The filter comes from `RUST_LOG` when set, then `config.trace_level`, then
/// [`DEFAULT_TRACE_LEVEL`].
///
/// Tracing is optional: if the data directory cannot be created, nothing is
/// installed. Only the first successful call takes effect.
///
/// # Example
///
/// ```rust
/// use flight_search::observability::init_tracing;
/// use flight_search::Config;
///
/// let config = Config {
///     data_dir: std::env::temp_dir().join("flight-search-doc"),
///     trace_level: Some("debug".to_string()),
///     ..Config::default()
/// };
/// init_tracing(&config);
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) {
    if std::fs::create_dir_all(&config.data_dir).is_err() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config.trace_level.as_deref().unwrap_or(DEFAULT_TRACE_LEVEL);
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_TRACE_LEVEL))
    });

    let resource = Resource::new(vec![
        KeyValue::new("service.name", SCOPE_NAME),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);
    let provider = create_tracer_provider(RotatingFile::new(config.trace_file()), resource);
    let tracer = provider.tracer(SCOPE_NAME);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(OpenTelemetryLayer::new(tracer))
        .try_init();
}
