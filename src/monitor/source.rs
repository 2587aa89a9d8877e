use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::CollectorError;

/// Point-in-time CPU utilization probe.
#[async_trait]
pub trait CpuSource: Send + Sync + 'static {
    /// Return one utilization percentage per monitored unit.
    ///
    /// `interval` is how long the probe may block to average utilization
    /// over; zero compares against the probe's previous refresh instead.
    ///
    /// # Errors
    ///
    /// Returns an error when no utilization data can be read.
    async fn sample(&self, interval: Duration, per_cpu: bool) -> Result<Vec<f64>, CollectorError>;
}

/// Production source backed by `sysinfo`.
pub struct SystemCpuSource {
    system: Mutex<sysinfo::System>,
}

impl SystemCpuSource {
    #[must_use]
    pub fn new() -> Self {
        let mut system = sysinfo::System::new();
        // Prime the counters so the first zero-interval sample has a baseline.
        system.refresh_cpu_usage();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SystemCpuSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CpuSource for SystemCpuSource {
    async fn sample(&self, interval: Duration, per_cpu: bool) -> Result<Vec<f64>, CollectorError> {
        let mut system = self.system.lock().await;
        if !interval.is_zero() {
            system.refresh_cpu_usage();
            tokio::time::sleep(interval.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)).await;
        }
        system.refresh_cpu_usage();

        let percentages: Vec<f64> = if per_cpu {
            system
                .cpus()
                .iter()
                .map(|cpu| f64::from(cpu.cpu_usage()))
                .collect()
        } else {
            vec![f64::from(system.global_cpu_usage())]
        };
        if percentages.is_empty() {
            return Err(CollectorError::NoCpusDetected);
        }
        Ok(percentages)
    }
}
