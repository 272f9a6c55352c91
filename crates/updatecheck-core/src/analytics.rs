//! Provider-neutral analytics-sink binding.
//!
//! # Architecture
//!
//! ```text
//!  Gateway code            AnalyticsHandle (validation + best-effort write)
//!      │                            │
//!      └── write_data_point ───────►│
//!                                   │
//!                            Arc<dyn AnalyticsSink>  (object-safe)
//!                                   │
//!                      ┌────────────┼────────────┐
//!                      ▼            ▼            ▼
//!               HttpAnalyticsSink  MemorySink  NoopSink
//! ```
//!
//! The binding is write-only and append-only: no read path exists, and the
//! sink owns persistence, aggregation, and querying. A `write_data_point`
//! call is a non-blocking enqueue — sink backends must not make the caller
//! wait for delivery, and delivery failures must never reach the caller.
//!
//! The binding is optional at runtime. Code that holds no handle simply
//! skips the write; nothing treats an absent sink as an error.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Errors returned by sink backends and handle validation.
///
/// These never propagate past [`AnalyticsHandle::write_data_point`]; they
/// exist so backends and tests can observe why a point was dropped.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// The sink backend is temporarily unavailable.
    #[error("analytics sink unavailable")]
    Unavailable,

    /// The data point violates a sink limit.
    #[error("validation error: {0}")]
    Validation(String),

    /// A serialization error while encoding the data point.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A general internal error.
    #[error("analytics sink error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// One analytics record: ordered string columns, numeric columns, and the
/// index values used by downstream queries for grouping and sampling.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(default)]
    pub blobs: Vec<String>,
    #[serde(default)]
    pub doubles: Vec<f64>,
    #[serde(default)]
    pub indexes: Vec<String>,
}

impl DataPoint {
    /// Total byte length of all blob values.
    pub fn blob_bytes(&self) -> usize {
        self.blobs.iter().map(|blob| blob.len()).sum()
    }
}

/// Object-safe interface for analytics sink backends.
///
/// `write_data_point` must return without waiting for delivery. Backends
/// that deliver over the network hand the point to a detached task; the
/// in-memory backends complete synchronously.
pub trait AnalyticsSink: Send + Sync {
    fn write_data_point(&self, point: DataPoint) -> Result<(), AnalyticsError>;
}

/// A cloneable handle to an analytics sink.
///
/// The handle enforces the sink's record limits and downgrades every failure
/// to a debug log — a dropped data point must never affect the request that
/// produced it.
#[derive(Clone)]
pub struct AnalyticsHandle {
    sink: Arc<dyn AnalyticsSink>,
}

impl fmt::Debug for AnalyticsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticsHandle").finish_non_exhaustive()
    }
}

impl AnalyticsHandle {
    /// Maximum number of blob columns per data point.
    pub const MAX_BLOBS: usize = 20;

    /// Maximum number of double columns per data point.
    pub const MAX_DOUBLES: usize = 20;

    /// Maximum number of index values per data point.
    pub const MAX_INDEXES: usize = 1;

    /// Maximum total blob size in bytes per data point.
    pub const MAX_BLOB_BYTES: usize = 5120;

    /// Maximum index value size in bytes.
    pub const MAX_INDEX_BYTES: usize = 96;

    /// Create a new handle wrapping a sink implementation.
    pub fn new(sink: Arc<dyn AnalyticsSink>) -> Self {
        Self { sink }
    }

    pub fn with_sink<S>(sink: S) -> Self
    where
        S: AnalyticsSink + 'static,
    {
        Self {
            sink: Arc::new(sink),
        }
    }

    fn validate(point: &DataPoint) -> Result<(), AnalyticsError> {
        if point.blobs.len() > Self::MAX_BLOBS {
            return Err(AnalyticsError::Validation(format!(
                "blob count {} exceeds limit of {}",
                point.blobs.len(),
                Self::MAX_BLOBS
            )));
        }
        if point.doubles.len() > Self::MAX_DOUBLES {
            return Err(AnalyticsError::Validation(format!(
                "double count {} exceeds limit of {}",
                point.doubles.len(),
                Self::MAX_DOUBLES
            )));
        }
        if point.indexes.len() > Self::MAX_INDEXES {
            return Err(AnalyticsError::Validation(format!(
                "index count {} exceeds limit of {}",
                point.indexes.len(),
                Self::MAX_INDEXES
            )));
        }
        if point.blob_bytes() > Self::MAX_BLOB_BYTES {
            return Err(AnalyticsError::Validation(format!(
                "blob size {} exceeds limit of {} bytes",
                point.blob_bytes(),
                Self::MAX_BLOB_BYTES
            )));
        }
        if let Some(index) = point
            .indexes
            .iter()
            .find(|index| index.len() > Self::MAX_INDEX_BYTES)
        {
            return Err(AnalyticsError::Validation(format!(
                "index length {} exceeds limit of {} bytes",
                index.len(),
                Self::MAX_INDEX_BYTES
            )));
        }
        Ok(())
    }

    /// Validate and submit a data point, surfacing the failure.
    pub fn try_write_data_point(&self, point: DataPoint) -> Result<(), AnalyticsError> {
        Self::validate(&point)?;
        self.sink.write_data_point(point)
    }

    /// Submit a data point, fire-and-forget.
    ///
    /// Never blocks on delivery and never fails: validation errors and sink
    /// errors are logged at debug level and discarded.
    pub fn write_data_point(&self, point: DataPoint) {
        if let Err(err) = self.try_write_data_point(point) {
            tracing::debug!("analytics data point dropped: {}", err);
        }
    }
}

/// Sink that records every accepted data point in memory.
///
/// Backs tests and local development; production deployments bind an
/// adapter-provided sink instead.
#[derive(Default)]
pub struct MemorySink {
    points: Mutex<Vec<DataPoint>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every data point written so far, in write order.
    pub fn points(&self) -> Vec<DataPoint> {
        self.points.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.points.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnalyticsSink for MemorySink {
    fn write_data_point(&self, point: DataPoint) -> Result<(), AnalyticsError> {
        self.points.lock().unwrap().push(point);
        Ok(())
    }
}

/// Sink that discards every data point.
pub struct NoopSink;

impl AnalyticsSink for NoopSink {
    fn write_data_point(&self, _point: DataPoint) -> Result<(), AnalyticsError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl AnalyticsSink for FailingSink {
        fn write_data_point(&self, _point: DataPoint) -> Result<(), AnalyticsError> {
            Err(AnalyticsError::Unavailable)
        }
    }

    fn point(blobs: &[&str], indexes: &[&str]) -> DataPoint {
        DataPoint {
            blobs: blobs.iter().map(|blob| blob.to_string()).collect(),
            indexes: indexes.iter().map(|index| index.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn memory_sink_records_points_in_order() {
        let sink = Arc::new(MemorySink::new());
        let handle = AnalyticsHandle::new(sink.clone());

        handle.write_data_point(point(&["1.2.0"], &["abc"]));
        handle.write_data_point(point(&["1.3.0"], &["def"]));

        let points = sink.points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].blobs, vec!["1.2.0"]);
        assert_eq!(points[1].indexes, vec!["def"]);
    }

    #[test]
    fn identical_points_are_not_deduplicated() {
        let sink = Arc::new(MemorySink::new());
        let handle = AnalyticsHandle::new(sink.clone());

        let repeated = point(&["1.2.0", "darwin", "arm64", "abc123"], &["abc123"]);
        handle.write_data_point(repeated.clone());
        handle.write_data_point(repeated);

        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn sink_failure_is_swallowed() {
        let handle = AnalyticsHandle::with_sink(FailingSink);
        handle.write_data_point(point(&["1.2.0"], &["abc"]));
    }

    #[test]
    fn try_write_surfaces_sink_failure() {
        let handle = AnalyticsHandle::with_sink(FailingSink);
        let err = handle
            .try_write_data_point(point(&["1.2.0"], &["abc"]))
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::Unavailable));
    }

    #[test]
    fn validation_rejects_too_many_blobs() {
        let sink = Arc::new(MemorySink::new());
        let handle = AnalyticsHandle::new(sink.clone());

        let blobs = vec!["x".to_string(); AnalyticsHandle::MAX_BLOBS + 1];
        let oversized = DataPoint {
            blobs,
            ..Default::default()
        };

        let err = handle.try_write_data_point(oversized.clone()).unwrap_err();
        assert!(matches!(err, AnalyticsError::Validation(_)));
        assert!(err.to_string().contains("blob count"));

        // Best-effort path drops the point without recording it.
        handle.write_data_point(oversized);
        assert!(sink.is_empty());
    }

    #[test]
    fn validation_rejects_too_many_indexes() {
        let handle = AnalyticsHandle::with_sink(MemorySink::new());
        let err = handle
            .try_write_data_point(point(&["v"], &["a", "b"]))
            .unwrap_err();
        assert!(err.to_string().contains("index count"));
    }

    #[test]
    fn validation_rejects_oversized_blob_total() {
        let handle = AnalyticsHandle::with_sink(MemorySink::new());
        let big = "x".repeat(AnalyticsHandle::MAX_BLOB_BYTES + 1);
        let err = handle
            .try_write_data_point(point(&[big.as_str()], &["abc"]))
            .unwrap_err();
        assert!(err.to_string().contains("blob size"));
    }

    #[test]
    fn validation_rejects_oversized_index() {
        let handle = AnalyticsHandle::with_sink(MemorySink::new());
        let long_index = "i".repeat(AnalyticsHandle::MAX_INDEX_BYTES + 1);
        let err = handle
            .try_write_data_point(point(&["v"], &[long_index.as_str()]))
            .unwrap_err();
        assert!(err.to_string().contains("index length"));
    }

    #[test]
    fn validation_rejects_too_many_doubles() {
        let handle = AnalyticsHandle::with_sink(MemorySink::new());
        let oversized = DataPoint {
            doubles: vec![1.0; AnalyticsHandle::MAX_DOUBLES + 1],
            ..Default::default()
        };
        let err = handle.try_write_data_point(oversized).unwrap_err();
        assert!(err.to_string().contains("double count"));
    }

    #[test]
    fn limit_boundaries_are_accepted() {
        let sink = Arc::new(MemorySink::new());
        let handle = AnalyticsHandle::new(sink.clone());

        let maxed = DataPoint {
            blobs: vec!["b".to_string(); AnalyticsHandle::MAX_BLOBS],
            doubles: vec![0.5; AnalyticsHandle::MAX_DOUBLES],
            indexes: vec!["i".repeat(AnalyticsHandle::MAX_INDEX_BYTES)],
        };
        handle
            .try_write_data_point(maxed)
            .expect("limit-sized point accepted");
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn noop_sink_accepts_and_discards() {
        let handle = AnalyticsHandle::with_sink(NoopSink);
        handle
            .try_write_data_point(point(&["v"], &["i"]))
            .expect("noop accepts");
    }

    #[test]
    fn handle_is_cloneable_and_shares_sink() {
        let sink = Arc::new(MemorySink::new());
        let first = AnalyticsHandle::new(sink.clone());
        let second = first.clone();

        first.write_data_point(point(&["a"], &["1"]));
        second.write_data_point(point(&["b"], &["2"]));

        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn data_point_serialises_with_all_columns() {
        let point = DataPoint {
            blobs: vec!["1.2.0".into(), "darwin".into()],
            doubles: vec![1.0],
            indexes: vec!["abc123".into()],
        };
        let json = serde_json::to_value(&point).expect("serialize");
        assert_eq!(json["blobs"][1], "darwin");
        assert_eq!(json["doubles"][0], 1.0);
        assert_eq!(json["indexes"][0], "abc123");
    }

    #[test]
    fn data_point_deserialises_missing_columns_as_empty() {
        let point: DataPoint = serde_json::from_str(r#"{"blobs":["v"]}"#).expect("deserialize");
        assert_eq!(point.blobs, vec!["v"]);
        assert!(point.doubles.is_empty());
        assert!(point.indexes.is_empty());
    }

    #[test]
    fn blob_bytes_sums_all_blobs() {
        let point = point(&["ab", "cde"], &[]);
        assert_eq!(point.blob_bytes(), 5);
    }

    #[test]
    fn handle_debug_output() {
        let handle = AnalyticsHandle::with_sink(NoopSink);
        assert!(format!("{:?}", handle).contains("AnalyticsHandle"));
    }
}
