//! Tracer setup and management

use dbx_core::{Error, ObservabilityConfig, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::{SimpleSpanProcessor, TracerProvider};
use std::sync::{Arc, Mutex, OnceLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Global tracer provider holder
static TRACER_PROVIDER: OnceLock<Arc<TracerProvider>> = OnceLock::new();

/// Span processor builders registered before initialization
type ProcessorBuilder = Box<dyn FnOnce() -> SimpleSpanProcessor + Send>;
static SPAN_PROCESSOR_BUILDERS: Mutex<Option<Vec<ProcessorBuilder>>> = Mutex::new(Some(Vec::new()));

/// Register a span processor builder to use when telemetry is initialized.
///
/// Exporters (OTLP, Jaeger, an in-memory exporter in tests) plug in here.
/// Must be called BEFORE [`init_telemetry`]; later registrations are
/// dropped with a warning.
///
/// # Example
///
/// ```ignore
/// use dbx_telemetry::{register_span_processor, init_telemetry};
/// use opentelemetry_sdk::trace::SimpleSpanProcessor;
///
/// register_span_processor(Box::new(|| {
///     SimpleSpanProcessor::new(Box::new(/* your exporter */))
/// }));
/// init_telemetry(&config.observability)?;
/// ```
pub fn register_span_processor(builder: ProcessorBuilder) {
    let mut builders = SPAN_PROCESSOR_BUILDERS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(ref mut vec) = *builders {
        vec.push(builder);
    } else {
        tracing::warn!("Attempted to register span processor after telemetry initialization");
    }
}

/// Initialize logging and OpenTelemetry tracing.
///
/// Sets up:
/// - A tracer provider with any registered span processors
/// - The tracing-opentelemetry bridge layer
/// - A `json` or `pretty` fmt layer, per `log_format`
/// - An `EnvFilter` read from `RUST_LOG`, defaulting to `info`
///
/// Fails if a global subscriber is already installed.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let builders = SPAN_PROCESSOR_BUILDERS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take()
        .unwrap_or_default();

    let mut provider_builder = TracerProvider::builder();
    for builder in builders {
        provider_builder = provider_builder.with_span_processor(builder());
    }
    let tracer_provider = provider_builder.build();

    let service_name = config
        .service_name
        .clone()
        .unwrap_or_else(|| crate::attributes::SYSTEM_NAME.to_string());
    let tracer = tracer_provider.tracer(service_name);

    let _ = TRACER_PROVIDER.set(Arc::new(tracer_provider));

    let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    let json = config.log_format.eq_ignore_ascii_case("json");
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
    });
    let pretty_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_line_number(true)
    });

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(json_layer)
        .with(pretty_layer)
        .with(filter)
        .try_init()
        .map_err(|e| Error::config_error(format!("failed to install tracing subscriber: {}", e)))
}

/// Get the global tracer provider if initialized
pub fn tracer_provider() -> Option<Arc<TracerProvider>> {
    TRACER_PROVIDER.get().cloned()
}
