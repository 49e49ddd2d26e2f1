//! Logs go to stderr so stdout stays free for the rendered collection. When
//! `OTEL_EXPORTER_OTLP_ENDPOINT` is set, spans from the gateway, store, and
//! deploy pipeline are also exported over OTLP/gRPC.

use anyhow::{anyhow, Result};
use opentelemetry::{trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::{Compression, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
use std::{env, time::Duration};
use tonic::{
    metadata::{Ascii, MetadataKey, MetadataMap, MetadataValue},
    transport::ClientTlsConfig,
};
use tracing::{debug, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};
use ulid::Ulid;
use url::Url;

/// Crates under `HttpGateway` and the exporter. They only get past WARN at
/// `-vvvv`.
const DEPENDENCY_TARGETS: [&str; 7] = [
    "hyper",
    "hyper_util",
    "h2",
    "reqwest",
    "tonic",
    "opentelemetry_sdk",
    "opentelemetry_otlp",
];

const EXPORT_TIMEOUT: Duration = Duration::from_secs(3);

fn dependency_directives(level: Level) -> Vec<String> {
    let dependency_level = if level == Level::TRACE {
        Level::DEBUG
    } else {
        level.min(Level::WARN)
    };

    DEPENDENCY_TARGETS
        .iter()
        .map(|target| format!("{target}={}", dependency_level.as_str().to_ascii_lowercase()))
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
struct ExportSettings {
    endpoint: String,
    tls_domain: Option<String>,
    headers: Vec<(String, String)>,
    instance_id: String,
}

impl ExportSettings {
    /// `None` when no collector endpoint is configured.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let raw = lookup("OTEL_EXPORTER_OTLP_ENDPOINT")?;
        let raw = raw.trim().trim_end_matches('/');
        if raw.is_empty() {
            return None;
        }

        let endpoint = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("https://{raw}")
        };

        let tls_domain = Url::parse(&endpoint)
            .ok()
            .filter(|url| url.scheme() == "https")
            .and_then(|url| url.host_str().map(str::to_string));

        let headers = lookup("OTEL_EXPORTER_OTLP_HEADERS")
            .map(|value| {
                value
                    .split(',')
                    .filter_map(|pair| {
                        let (key, value) = pair.split_once('=')?;
                        Some((key.trim().to_ascii_lowercase(), value.trim().to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let instance_id =
            lookup("OTEL_SERVICE_INSTANCE_ID").unwrap_or_else(|| Ulid::new().to_string());

        Some(Self {
            endpoint,
            tls_domain,
            headers,
            instance_id,
        })
    }

    fn metadata(&self) -> Result<MetadataMap> {
        let mut meta = MetadataMap::with_capacity(self.headers.len());
        for (key, value) in &self.headers {
            let name = MetadataKey::<Ascii>::from_bytes(key.as_bytes())
                .map_err(|e| anyhow!("invalid OTLP header name {key}: {e}"))?;
            let value: MetadataValue<Ascii> = value
                .parse()
                .map_err(|e| anyhow!("invalid OTLP header value for {key}: {e}"))?;
            meta.insert(name, value);
        }
        Ok(meta)
    }

    fn provider(&self) -> Result<SdkTracerProvider> {
        let mut builder = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&self.endpoint)
            .with_compression(Compression::Gzip)
            .with_timeout(EXPORT_TIMEOUT);

        if let Some(domain) = &self.tls_domain {
            builder = builder.with_tls_config(
                ClientTlsConfig::new()
                    .domain_name(domain.clone())
                    .with_native_roots(),
            );
        }
        if !self.headers.is_empty() {
            builder = builder.with_metadata(self.metadata()?);
        }

        let resource = Resource::builder_empty()
            .with_attributes([
                KeyValue::new("service.name", env!("CARGO_PKG_NAME")),
                KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                KeyValue::new("service.instance.id", self.instance_id.clone()),
                KeyValue::new("vcs.revision", crate::GIT_COMMIT_HASH),
            ])
            .build();

        Ok(SdkTracerProvider::builder()
            .with_batch_exporter(builder.build()?)
            .with_resource(resource)
            .build())
    }
}

/// Installed subscriber; keep it until the action finishes, then call
/// [`Telemetry::shutdown`] so batched spans are flushed.
#[derive(Debug)]
pub struct Telemetry {
    provider: Option<SdkTracerProvider>,
}

impl Telemetry {
    /// Install the global subscriber at `level`. `RUST_LOG` can still refine
    /// it per target.
    ///
    /// # Errors
    ///
    /// Returns an error if the exporter cannot be built or a subscriber is
    /// already installed.
    pub fn init(level: Level) -> Result<Self> {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);

        let mut filter = EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy();
        for directive in dependency_directives(level) {
            filter = filter.add_directive(directive.parse()?);
        }

        let Some(settings) = ExportSettings::from_lookup(|key| env::var(key).ok()) else {
            let subscriber = Registry::default().with(fmt_layer).with(filter);
            tracing::subscriber::set_global_default(subscriber)?;
            return Ok(Self { provider: None });
        };

        let provider = settings.provider()?;
        let otel_layer =
            tracing_opentelemetry::layer().with_tracer(provider.tracer(env!("CARGO_PKG_NAME")));
        tracing::subscriber::set_global_default(
            Registry::default()
                .with(fmt_layer)
                .with(otel_layer)
                .with(filter),
        )?;
        debug!(endpoint = %settings.endpoint, "exporting traces");

        Ok(Self {
            provider: Some(provider),
        })
    }

    /// Flush pending spans. Export errors are logged, never returned.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(err) = provider.shutdown() {
                debug!("tracer shutdown: {err}");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn dependencies_stay_quiet_below_trace() {
        assert!(dependency_directives(Level::ERROR).contains(&"reqwest=error".to_string()));
        assert!(dependency_directives(Level::DEBUG).contains(&"hyper=warn".to_string()));
        assert!(dependency_directives(Level::TRACE).contains(&"hyper_util=debug".to_string()));
        assert_eq!(dependency_directives(Level::INFO).len(), DEPENDENCY_TARGETS.len());
    }

    #[test]
    fn no_endpoint_means_no_export() {
        assert_eq!(ExportSettings::from_lookup(lookup(&[])), None);
        assert_eq!(
            ExportSettings::from_lookup(lookup(&[("OTEL_EXPORTER_OTLP_ENDPOINT", "  ")])),
            None
        );
    }

    #[test]
    fn bare_host_defaults_to_tls() {
        let settings = ExportSettings::from_lookup(lookup(&[
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "otel.example.com:4317/"),
            ("OTEL_SERVICE_INSTANCE_ID", "cli-1"),
        ]))
        .unwrap();

        assert_eq!(settings.endpoint, "https://otel.example.com:4317");
        assert_eq!(settings.tls_domain.as_deref(), Some("otel.example.com"));
        assert_eq!(settings.instance_id, "cli-1");
    }

    #[test]
    fn plain_http_endpoint_has_no_tls() {
        let settings = ExportSettings::from_lookup(lookup(&[(
            "OTEL_EXPORTER_OTLP_ENDPOINT",
            "http://localhost:4317",
        )]))
        .unwrap();

        assert_eq!(settings.endpoint, "http://localhost:4317");
        assert_eq!(settings.tls_domain, None);
        assert!(!settings.instance_id.is_empty());
    }

    #[test]
    fn headers_become_metadata() {
        let settings = ExportSettings::from_lookup(lookup(&[
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
            (
                "OTEL_EXPORTER_OTLP_HEADERS",
                "Authorization = Bearer t0k ,malformed, x-tenant=ops",
            ),
        ]))
        .unwrap();

        assert_eq!(
            settings.headers,
            vec![
                ("authorization".to_string(), "Bearer t0k".to_string()),
                ("x-tenant".to_string(), "ops".to_string()),
            ]
        );
        let meta = settings.metadata().unwrap();
        assert_eq!(meta.len(), 2);
        assert_eq!(meta.get("x-tenant").unwrap().to_str().unwrap(), "ops");
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let settings = ExportSettings::from_lookup(lookup(&[
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
            ("OTEL_EXPORTER_OTLP_HEADERS", "bad key=1"),
        ]))
        .unwrap();

        assert!(settings
            .metadata()
            .unwrap_err()
            .to_string()
            .contains("invalid OTLP header name"));
    }

    #[test]
    fn shutdown_without_exporter_is_noop() {
        Telemetry { provider: None }.shutdown();
    }
}
