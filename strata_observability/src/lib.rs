use std::borrow::Cow;
use std::time::Duration;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{InstrumentationScope, global};
use opentelemetry_otlp::{ExporterBuildError, MetricExporter, SpanExporter};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::SdkTracerProvider;
use snafu::{ResultExt, Snafu};
use tracing::Subscriber;
use tracing_opentelemetry::MetricsLayer;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_subscriber::{prelude::*, registry::LookupSpan};

pub use opentelemetry::{
    KeyValue,
    metrics::{Counter, Gauge, Histogram, Meter, UpDownCounter},
};

pub use crate::error_kind::ErrorKind;

mod error_kind;

const OTEL_SDK_DISABLED: &str = "OTEL_SDK_DISABLED";
const RUST_LOG_FORMAT: &str = "RUST_LOG_FORMAT";
const METRICS_EXPORT_INTERVAL: Duration = Duration::from_secs(10);

pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

#[derive(Debug, Snafu)]
pub enum ObservabilityError {
    #[snafu(display("Failed to build exporter"))]
    Exporter { source: ExporterBuildError },
    #[snafu(display("Failed to install the tracing subscriber"))]
    Subscriber {
        source: tracing_subscriber::util::TryInitError,
    },
}

/// Returns a meter from the global meter provider.
///
/// Before [`init_observability`] runs, the global provider is a no-op and
/// instruments created from it record nothing.
pub fn meter(name: &'static str) -> Meter {
    global::meter(name)
}

/// Installs the global tracing subscriber.
///
/// Logs go to stderr, as JSON when `RUST_LOG_FORMAT=json`. Spans and metrics
/// are exported over OTLP only when `OTEL_SDK_DISABLED=false`.
pub fn init_observability(
    package_name: impl Into<Cow<'static, str>>,
    package_version: impl Into<Cow<'static, str>>,
) -> Result<(), ObservabilityError> {
    let export_enabled = std::env::var(OTEL_SDK_DISABLED)
        .map(|value| value == "false")
        .unwrap_or(false);

    let layers = vec![
        log_layer(),
        otel_layer(package_name.into(), package_version.into(), export_enabled)?,
    ];

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context(SubscriberSnafu {})
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("INFO"))
}

fn log_layer<S>() -> BoxedLayer<S>
where
    S: Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let json = std::env::var(RUST_LOG_FORMAT).is_ok_and(|format| format == "json");
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if json {
        layer
            .with_ansi(false)
            .with_target(true)
            .json()
            .with_filter(env_filter())
            .boxed()
    } else {
        layer
            .with_target(false)
            .compact()
            .with_filter(env_filter())
            .boxed()
    }
}

fn otel_layer<S>(
    package_name: Cow<'static, str>,
    package_version: Cow<'static, str>,
    export_enabled: bool,
) -> Result<BoxedLayer<S>, ObservabilityError>
where
    S: Subscriber + Send + Sync,
    for<'a> S: LookupSpan<'a>,
{
    let resource = Resource::builder()
        .with_service_name(package_name.to_string())
        .build();
    let scope = InstrumentationScope::builder(package_name)
        .with_version(package_version)
        .build();

    let mut tracer_provider = SdkTracerProvider::builder().with_resource(resource.clone());
    let mut meter_provider = SdkMeterProvider::builder().with_resource(resource);

    if export_enabled {
        let spans = SpanExporter::builder()
            .with_tonic()
            .build()
            .context(ExporterSnafu {})?;
        tracer_provider = tracer_provider.with_batch_exporter(spans);

        let metrics = MetricExporter::builder()
            .with_tonic()
            .build()
            .context(ExporterSnafu {})?;
        meter_provider = meter_provider.with_reader(
            PeriodicReader::builder(metrics)
                .with_interval(METRICS_EXPORT_INTERVAL)
                .build(),
        );
    }

    let tracer = tracer_provider.build().tracer_with_scope(scope);
    let meter_provider = meter_provider.build();
    global::set_meter_provider(meter_provider.clone());

    Ok(env_filter()
        .and_then(MetricsLayer::new(meter_provider))
        .and_then(tracing_opentelemetry::layer().with_tracer(tracer))
        .boxed())
}
