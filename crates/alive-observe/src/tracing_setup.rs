//! Global subscriber for processes embedding the Alive engine.
//!
//! Every agent invocation, backend conversation and tool call is a span;
//! closing a span logs its duration. Output is human-readable or JSON
//! lines, and spans can also be exported through OpenTelemetry.
//!
//! ```no_run
//! use alive_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
//!
//! let options: TracingOptions = toml::from_str("json = true\nfilter = \"alive_core=debug\"")?;
//! init_tracing(&options)?;
//! // ... run agents ...
//! shutdown_tracing();
//! # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
//! ```

use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Kept so [`shutdown_tracing`] can flush exported spans.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

const TRACER_NAME: &str = "alive";

/// How the subscriber reports spans and events.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TracingOptions {
    /// Filter directives used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Also export spans through OpenTelemetry (stdout exporter).
    pub otel: bool,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
            otel: false,
        }
    }
}

impl TracingOptions {
    /// `RUST_LOG` when set and valid, otherwise `self.filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if `self.filter` is not a valid directive list,
    /// whether or not `RUST_LOG` overrides it.
    pub fn env_filter(&self) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
        let fallback = EnvFilter::try_new(&self.filter)?;
        Ok(EnvFilter::try_from_default_env().unwrap_or(fallback))
    }
}

/// Install the global tracing subscriber described by `options`.
///
/// # Errors
///
/// Returns an error if the filter does not parse or a global subscriber
/// is already installed.
pub fn init_tracing(options: &TracingOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = options.env_filter()?;

    let text_layer = (!options.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
    });
    let json_layer = options.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_events(FmtSpan::CLOSE)
    });

    let provider = options.otel.then(|| {
        SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build()
    });
    let otel_layer = provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer(TRACER_NAME)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .with(otel_layer)
        .try_init()?;

    if let Some(provider) = provider {
        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);
    }
    Ok(())
}

/// Flush and shut down the OpenTelemetry provider, if one was installed.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}
