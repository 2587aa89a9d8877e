//! Time-bucket aggregation of load-test samples.
//!
//! Samples are grouped into contiguous fixed-width windows anchored at the
//! earliest start time; each sample then yields one report point whose
//! throughput is the sample count of its window divided by the window width.
mod data;
mod report;


pub use data::{Sample, parse_samples, readings_csv};
pub use report::{Point, Report};

use std::time::Duration;

use chrono::TimeDelta;

/// Groups samples into fixed-width, half-open time windows.
pub struct Aggregator {
    buckets: Vec<Vec<Sample>>,
    interval: Duration,
}

impl Aggregator {
    /// Bucket `samples` into contiguous windows of `interval` width.
    ///
    /// Windows are half-open: a sample whose start time lands exactly on a
    /// window boundary opens the next window. Gaps wider than one interval
    /// only advance the window pointer; empty windows are never materialized.
    /// Ties on start time keep their input order. A zero interval is a
    /// caller error and is rejected by the flag layer before reaching here.
    #[must_use]
    pub fn new(mut samples: Vec<Sample>, interval: Duration) -> Self {
        if samples.is_empty() {
            return Self {
                buckets: Vec::new(),
                interval,
            };
        }
        samples.sort_by_key(|sample| sample.start_time);

        let step = TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX);
        let mut window_end = samples
            .first()
            .and_then(|first| first.start_time.checked_add_signed(step));

        let mut buckets: Vec<Vec<Sample>> = Vec::new();
        let mut current: Vec<Sample> = Vec::new();
        for sample in samples {
            while window_end.is_some_and(|end| sample.start_time >= end) {
                if !current.is_empty() {
                    buckets.push(std::mem::take(&mut current));
                }
                window_end = window_end.and_then(|end| end.checked_add_signed(step));
            }
            current.push(sample);
        }
        if !current.is_empty() {
            buckets.push(current);
        }

        Self { buckets, interval }
    }

    /// Derive one throughput/latency point per sample.
    ///
    /// Every point of a window shares the same throughput value; latencies
    /// pass through unchanged.
    #[must_use]
    pub fn report(&self) -> Report {
        let interval_secs = self.interval.as_secs_f64();
        let mut points = Vec::new();
        for bucket in &self.buckets {
            let throughput = bucket.len() as f64 / interval_secs;
            for sample in bucket {
                points.push(Point {
                    throughput,
                    latency: sample.response_time,
                });
            }
        }
        Report::new(points)
    }
}
