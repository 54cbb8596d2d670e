use std::io::Write;

use anyhow::Result;
use aws_sdk_s3::primitives::ByteStream;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::{FlightReport, ReportIndex, ReportIndexEntry};

/// Gzip-compresses `body`.
pub fn gzip_bytes(body: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body)?;
    Ok(encoder.finish()?)
}

/// Object key for a published view, with `.gz` appended when compressed.
pub fn object_key(prefix: &str, name: &str, gzip: bool) -> String {
    let prefix = prefix.trim_end_matches('/');
    let suffix = if gzip { ".json.gz" } else { ".json" };
    if prefix.is_empty() {
        format!("{name}{suffix}")
    } else {
        format!("{prefix}/{name}{suffix}")
    }
}

/// Serializes a value to JSON and uploads it to an S3 bucket with
/// `application/json` content type, gzip-encoded when `gzip` is set.
pub async fn write_json_to_s3(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    value: &impl Serialize,
    gzip: bool,
) -> Result<()> {
    let json = serde_json::to_vec(value)?;

    let mut request = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type("application/json");

    let body = if gzip {
        request = request.content_encoding("gzip");
        gzip_bytes(&json)?
    } else {
        json
    };

    request.body(ByteStream::from(body)).send().await?;
    debug!(bucket, key, "Uploaded JSON object");

    Ok(())
}

/// Uploads each view of `report` under `prefix`, then an `index` object
/// listing them.
#[tracing::instrument(skip(client, report))]
pub async fn publish_report(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    prefix: &str,
    report: &FlightReport,
    gzip: bool,
) -> Result<()> {
    let mut views = Vec::new();

    macro_rules! publish_view {
        ($name:expr, $value:expr) => {
            let key = object_key(prefix, $name, gzip);
            write_json_to_s3(client, bucket, &key, $value, gzip).await?;
            views.push(ReportIndexEntry {
                view: $name.to_string(),
                key,
            });
        };
    }

    publish_view!("carrier_volume", &report.carrier_volume);
    publish_view!("cancellation_reasons", &report.cancellation_reasons);
    publish_view!("route_delays", &report.route_delays);
    publish_view!("airport_delays", &report.airport_delays);
    publish_view!("monthly_delays", &report.monthly_delays);
    publish_view!("delay_causes", &report.delay_causes);

    let index = ReportIndex {
        generated_at: report.generated_at,
        source: report.source.clone(),
        total_flights: report.total_flights,
        views,
    };
    let index_key = object_key(prefix, "index", gzip);
    write_json_to_s3(client, bucket, &index_key, &index, gzip).await?;

    info!(objects = index.views.len() + 1, "Report published to S3");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::flights::FlightTable;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region, retry::RetryConfig};
    use flate2::read::GzDecoder;
    use std::fmt;
    use std::io::Read;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id};
    use tracing::subscriber::set_default;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use tracing_subscriber::registry::Registry;

    type Recorded = Arc<Mutex<Vec<(String, String)>>>;

    /// Collects the fields recorded when a `publish_report` span opens.
    struct SpanFields(Recorded);

    impl<S: tracing::Subscriber> Layer<S> for SpanFields {
        fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
            if attrs.metadata().name() == "publish_report" {
                attrs.record(&mut FieldRecorder(&self.0));
            }
        }
    }

    struct FieldRecorder<'a>(&'a Recorded);

    impl Visit for FieldRecorder<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if let Ok(mut fields) = self.0.lock() {
                fields.push((field.name().to_string(), format!("{value:?}")));
            }
        }
    }

    fn unreachable_client() -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "static"))
            .endpoint_url("http://127.0.0.1:9")
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }

    #[tokio::test]
    async fn test_publish_report_span_records_arguments() {
        let recorded: Recorded = Arc::default();
        let subscriber = Registry::default().with(SpanFields(recorded.clone()));
        let _guard = set_default(subscriber);

        let report =
            FlightReport::from_table(&FlightTable::default(), &AnalysisConfig::default(), "empty.csv");
        let result =
            publish_report(&unreachable_client(), "my-bucket", "daily", &report, true).await;
        assert!(result.is_err());

        let fields = recorded.lock().unwrap().clone();
        let value = |name: &str| {
            fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value.clone())
        };
        assert_eq!(value("bucket").as_deref(), Some("\"my-bucket\""));
        assert_eq!(value("prefix").as_deref(), Some("\"daily\""));
        assert_eq!(value("gzip").as_deref(), Some("true"));
    }

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("aggregates", "index", false), "aggregates/index.json");
        assert_eq!(object_key("aggregates/", "index", true), "aggregates/index.json.gz");
        assert_eq!(object_key("", "route_delays", false), "route_delays.json");
    }

    #[test]
    fn test_gzip_bytes_decodes_back() {
        let compressed = gzip_bytes(b"{\"a\":1}").unwrap();
        let mut out = String::new();
        GzDecoder::new(&compressed[..]).read_to_string(&mut out).unwrap();
        assert_eq!(out, "{\"a\":1}");
    }
}
