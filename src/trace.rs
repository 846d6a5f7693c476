//! Logging, and OpenTelemetry export when a collector is configured.
//!
//! Logs are filtered with `RUST_LOG` (default `info`). Traces and metrics are
//! exported over OTLP only when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.

use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::{
	metrics::{
		reader::{DefaultAggregationSelector, DefaultTemporalitySelector},
		Aggregation, Instrument, MeterProviderBuilder, PeriodicReader, SdkMeterProvider, Stream,
	},
	runtime,
	trace::{BatchConfig, Sampler, Tracer},
	Resource,
};
use opentelemetry_semantic_conventions::{
	resource::{DEPLOYMENT_ENVIRONMENT, SERVICE_NAME, SERVICE_VERSION},
	SCHEMA_URL,
};
use tracing_opentelemetry::MetricsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Constructs a [`Resource`] which describes the service.
fn resource() -> Resource {
	Resource::from_schema_url(
		[
			KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
			KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
			KeyValue::new(
				DEPLOYMENT_ENVIRONMENT,
				if cfg!(debug_assertions) {
					"development"
				} else {
					"production"
				},
			),
		],
		SCHEMA_URL,
	)
}

fn init_meter_provider() -> Result<SdkMeterProvider, opentelemetry::metrics::MetricsError> {
	let exporter = opentelemetry_otlp::new_exporter()
		.tonic()
		.build_metrics_exporter(
			Box::new(DefaultAggregationSelector::new()),
			Box::new(DefaultTemporalitySelector::new()),
		)?;

	let reader = PeriodicReader::builder(exporter, runtime::Tokio)
		.with_interval(std::time::Duration::from_secs(5))
		.build();

	// bytes, from 1 KB to 10 MB
	let view_upload_bytes = |instrument: &Instrument| -> Option<Stream> {
		(instrument.name == "upload_bytes").then(|| {
			Stream::new()
				.name("upload_bytes")
				.aggregation(Aggregation::ExplicitBucketHistogram {
					boundaries: vec![1e3, 1e4, 1e5, 1e6, 5e6, 1e7],
					record_min_max: true,
				})
		})
	};

	let meter_provider = MeterProviderBuilder::default()
		.with_resource(resource())
		.with_reader(reader)
		.with_view(view_upload_bytes)
		.build();

	global::set_meter_provider(meter_provider.clone());

	Ok(meter_provider)
}

fn init_tracer() -> Result<Tracer, opentelemetry::trace::TraceError> {
	opentelemetry_otlp::new_pipeline()
		.tracing()
		.with_trace_config(
			opentelemetry_sdk::trace::Config::default()
				.with_sampler(Sampler::TraceIdRatioBased(1.0))
				.with_resource(resource()),
		)
		.with_batch_config(BatchConfig::default())
		.with_exporter(opentelemetry_otlp::new_exporter().tonic())
		.install_batch(runtime::Tokio)
}

/// Installs the global subscriber, returning a guard that flushes exported
/// telemetry when dropped.
///
/// If the exporters cannot be built, only local logging is installed.
pub fn init() -> OtelGuard {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let registry = tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_ansi(true));

	if std::env::var_os(OTLP_ENDPOINT).is_none() {
		registry.init();
		return OtelGuard { meter_provider: None };
	}

	match (init_meter_provider(), init_tracer()) {
		(Ok(meter_provider), Ok(tracer)) => {
			registry
				.with(MetricsLayer::new(meter_provider.clone()))
				.with(tracing_opentelemetry::layer().with_tracer(tracer))
				.init();

			OtelGuard {
				meter_provider: Some(meter_provider),
			}
		}
		(meter_provider, tracer) => {
			registry.init();

			if let Err(error) = meter_provider {
				tracing::error!(%error, "failed to build the metrics exporter");
			}
			if let Err(error) = tracer {
				tracing::error!(%error, "failed to build the trace exporter");
			}

			OtelGuard { meter_provider: None }
		}
	}
}

pub struct OtelGuard {
	meter_provider: Option<SdkMeterProvider>,
}

impl Drop for OtelGuard {
	fn drop(&mut self) {
		let Some(meter_provider) = &self.meter_provider else {
			return;
		};

		if let Err(err) = meter_provider.shutdown() {
			eprintln!("{err:?}");
		}

		global::shutdown_tracer_provider();
	}
}
