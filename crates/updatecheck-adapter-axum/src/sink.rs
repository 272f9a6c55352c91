use std::time::Duration;

use http::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::Serialize;
use tokio::runtime::Handle;
use updatecheck_core::analytics::{AnalyticsError, AnalyticsSink, DataPoint};

/// Analytics sink that delivers data points to an HTTP ingest endpoint.
///
/// Every write is handed to a detached tokio task: the caller returns as
/// soon as the point is serialized, and delivery failures are debug-logged
/// and dropped. Nothing here is retried — a lost data point costs one row of
/// telemetry, never a request.
#[derive(Debug)]
pub struct HttpAnalyticsSink {
    client: Client,
    endpoint: Url,
    dataset: String,
}

#[derive(Serialize)]
struct IngestEnvelope<'a> {
    dataset: &'a str,
    #[serde(flatten)]
    point: &'a DataPoint,
}

impl HttpAnalyticsSink {
    pub fn new(endpoint: &str, dataset: impl Into<String>) -> Result<Self, AnalyticsError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|err| AnalyticsError::Validation(format!("invalid ingest endpoint: {err}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| AnalyticsError::Internal(err.into()))?;
        Ok(Self {
            client,
            endpoint,
            dataset: dataset.into(),
        })
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }
}

impl AnalyticsSink for HttpAnalyticsSink {
    fn write_data_point(&self, point: DataPoint) -> Result<(), AnalyticsError> {
        let payload = serde_json::to_vec(&IngestEnvelope {
            dataset: &self.dataset,
            point: &point,
        })?;

        let Ok(runtime) = Handle::try_current() else {
            return Err(AnalyticsError::Unavailable);
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        runtime.spawn(async move {
            let result = client
                .post(endpoint)
                .header(CONTENT_TYPE, "application/json")
                .body(payload)
                .send()
                .await;
            match result {
                Ok(response) if !response.status().is_success() => {
                    tracing::debug!("analytics ingest rejected: {}", response.status());
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!("analytics ingest failed: {}", err);
                }
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, routing::post, Json, Router};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;
    use tokio::net::TcpListener;
    use updatecheck_core::analytics::AnalyticsHandle;

    type Received = Arc<Mutex<Vec<serde_json::Value>>>;

    async fn start_ingest_server(status: axum::http::StatusCode) -> (String, Received) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::clone(&received);
        let app = Router::new()
            .route(
                "/v1/write",
                post(
                    move |State(state): State<Received>, Json(body): Json<serde_json::Value>| async move {
                        state.lock().unwrap().push(body);
                        status
                    },
                ),
            )
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/v1/write", addr), received)
    }

    async fn wait_for_points(received: &Received, count: usize) {
        let start = Instant::now();
        while received.lock().unwrap().len() < count {
            if start.elapsed() > Duration::from_secs(2) {
                panic!(
                    "ingest endpoint received {} points before timeout, wanted {}",
                    received.lock().unwrap().len(),
                    count
                );
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    fn sample_point() -> DataPoint {
        DataPoint {
            blobs: vec!["1.2.0".into(), "darwin".into(), "arm64".into(), "abc123".into()],
            indexes: vec!["abc123".into()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn posts_envelope_with_dataset_and_columns() {
        let (endpoint, received) = start_ingest_server(axum::http::StatusCode::OK).await;
        let sink = HttpAnalyticsSink::new(&endpoint, "codexdns_update_checks").expect("sink");

        sink.write_data_point(sample_point()).expect("enqueue");
        wait_for_points(&received, 1).await;

        let posted = received.lock().unwrap()[0].clone();
        assert_eq!(posted["dataset"], "codexdns_update_checks");
        assert_eq!(posted["blobs"][0], "1.2.0");
        assert_eq!(posted["blobs"][3], "abc123");
        assert_eq!(posted["indexes"][0], "abc123");
    }

    #[tokio::test]
    async fn each_write_is_an_independent_delivery() {
        let (endpoint, received) = start_ingest_server(axum::http::StatusCode::OK).await;
        let sink = HttpAnalyticsSink::new(&endpoint, "codexdns_update_checks").expect("sink");

        sink.write_data_point(sample_point()).expect("first");
        sink.write_data_point(sample_point()).expect("second");
        wait_for_points(&received, 2).await;
    }

    #[tokio::test]
    async fn ingest_rejection_does_not_surface() {
        let (endpoint, received) =
            start_ingest_server(axum::http::StatusCode::INTERNAL_SERVER_ERROR).await;
        let sink = HttpAnalyticsSink::new(&endpoint, "codexdns_update_checks").expect("sink");

        // The enqueue succeeds even though delivery will be rejected.
        sink.write_data_point(sample_point()).expect("enqueue");
        wait_for_points(&received, 1).await;
    }

    #[tokio::test]
    async fn unreachable_endpoint_does_not_surface() {
        let sink =
            HttpAnalyticsSink::new("http://127.0.0.1:1/v1/write", "ds").expect("sink");
        sink.write_data_point(sample_point()).expect("enqueue");
        // Give the detached task a moment to fail quietly.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn works_through_the_handle() {
        let (endpoint, received) = start_ingest_server(axum::http::StatusCode::OK).await;
        let sink = HttpAnalyticsSink::new(&endpoint, "codexdns_update_checks").expect("sink");
        let handle = AnalyticsHandle::with_sink(sink);

        handle.write_data_point(sample_point());
        wait_for_points(&received, 1).await;
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let err = HttpAnalyticsSink::new("not a url", "ds").expect_err("invalid endpoint");
        assert!(matches!(err, AnalyticsError::Validation(_)));
    }

    #[test]
    fn write_outside_runtime_reports_unavailable() {
        let sink = HttpAnalyticsSink::new("http://127.0.0.1:9/v1/write", "ds").expect("sink");
        let err = sink.write_data_point(sample_point()).expect_err("no runtime");
        assert!(matches!(err, AnalyticsError::Unavailable));
    }

    #[test]
    fn dataset_accessor_returns_configured_name() {
        let sink = HttpAnalyticsSink::new("http://127.0.0.1:9/v1/write", "custom_ds").expect("sink");
        assert_eq!(sink.dataset(), "custom_ds");
    }
}
