use color_eyre::Result;
use color_eyre::eyre::Context;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const SERVICE_NAME: &str = "playlist-server";

/// Install the global subscriber. `log` records are forwarded into it, so the
/// `log::*` macros used across the crate end up in the same output.
///
/// When an OTLP endpoint is given, spans are also exported over gRPC and the
/// returned provider must be shut down before exit to flush them.
pub fn init_tracing(
    service_name: &str,
    otlp_endpoint: Option<&str>,
    tracing_level: &str,
) -> Result<Option<SdkTracerProvider>> {
    let resource = Resource::builder()
        .with_attributes(vec![KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
            service_name.to_string(),
        )])
        .build();

    let (telemetry_layer, tracer_provider) = if let Some(otlp_endpoint) = otlp_endpoint {
        let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(otlp_endpoint)
            .build()
            .wrap_err("Failed to create OTLP span exporter")?;

        let tracer_provider = SdkTracerProvider::builder()
            .with_batch_exporter(otlp_exporter)
            .with_resource(resource)
            .build();

        opentelemetry::global::set_tracer_provider(tracer_provider.clone());
        let tracer = opentelemetry::global::tracer(SERVICE_NAME);

        (
            Some(tracing_opentelemetry::layer().with_tracer(tracer)),
            Some(tracer_provider),
        )
    } else {
        (None, None)
    };

    let fmt_layer = tracing_subscriber::fmt::layer().pretty();
    let filter_layer = EnvFilter::try_new(tracing_level)
        .wrap_err_with(|| format!("Invalid log level '{}'", tracing_level))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(telemetry_layer)
        .try_init()
        .wrap_err("Failed to install tracing subscriber")?;

    Ok(tracer_provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        assert!(init_tracing(SERVICE_NAME, None, "playlist_server=loud").is_err());
    }
}
