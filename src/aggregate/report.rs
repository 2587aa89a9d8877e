use std::fmt::Write as _;
use std::time::Duration;

use crate::error::SinkError;

/// One throughput/latency pair derived from a bucketed sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub throughput: f64,
    pub latency: Duration,
}

/// Bucket-ordered sequence of report points; empty when no samples were
/// supplied.
#[derive(Debug, Default, PartialEq)]
pub struct Report {
    points: Vec<Point>,
}

impl Report {
    #[must_use]
    pub(crate) fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Render as CSV with a `throughput,latency` header; latency in seconds
    /// at fixed six-decimal precision.
    ///
    /// # Errors
    ///
    /// Returns an error if a line fails to format.
    pub fn to_csv(&self) -> Result<String, SinkError> {
        let mut output = String::from("throughput,latency");
        for point in &self.points {
            write!(
                output,
                "\n{},{:.6}",
                point.throughput,
                point.latency.as_secs_f64()
            )
            .map_err(|err| SinkError::FormatLine { source: err })?;
        }
        Ok(output)
    }

    /// Render as a JSON array of `[throughput, latency-seconds]` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, SinkError> {
        let pairs: Vec<(f64, f64)> = self
            .points
            .iter()
            .map(|point| (point.throughput, point.latency.as_secs_f64()))
            .collect();
        serde_json::to_vec(&pairs).map_err(|err| SinkError::SerializeReport { source: err })
    }
}
