//! Process-wide `tracing` setup.
//!
//! [`init_tracing`] installs one subscriber made of optional layers:
//!
//! | Layer | Enabled when |
//! |---|---|
//! | `EnvFilter` | always; `RUST_LOG`, default `info` |
//! | OTLP/HTTP span export | `OTEL_EXPORTER_OTLP_ENDPOINT` is set |
//! | compact console output | [`LogFormat::Compact`] |
//! | newline-delimited JSON | [`LogFormat::Json`] |
//!
//! Audit records from the router use the `wayguard::audit` target, so
//! `RUST_LOG=info,wayguard::audit=debug` shows every delivery.
//!
//! ```rust,no_run
//! use wayguard_runtime::telemetry::{LogFormat, init_tracing};
//!
//! let _guard = init_tracing("wayguard", LogFormat::Compact);
//! ```

use std::fmt;
use std::str::FromStr;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Console log encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}' (expected 'compact' or 'json')")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        })
    }
}

/// Install the global subscriber and return the guard that flushes span
/// export on drop.
///
/// A second call in the same process leaves the first subscriber in place.
pub fn init_tracing(service_name: &str, format: LogFormat) -> TelemetryGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let provider = span_exporter(service_name);

    let otel = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("wayguard")));
    let (json, compact) = match format {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json().with_target(true)), None),
        LogFormat::Compact => (
            None,
            Some(tracing_subscriber::fmt::layer().compact().with_target(true)),
        ),
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(otel)
        .with(json)
        .with(compact)
        .try_init()
    {
        eprintln!("[wayguard] tracing already initialised: {e}");
    }

    TelemetryGuard { provider }
}

/// Flushes and shuts down span export when dropped.  Hold it in `main`.
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    pub fn exporting(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("[wayguard] span exporter shutdown error: {e}");
        }
    }
}

// Synchronous export: the CLI calls this before its Tokio runtime exists.
fn span_exporter(service_name: &str) -> Option<SdkTracerProvider> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;
    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
    {
        Ok(exporter) => exporter,
        Err(e) => {
            eprintln!("[wayguard] OTLP exporter disabled: {e}");
            return None;
        }
    };
    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();
    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            .with_simple_exporter(exporter)
            .build(),
    )
}
