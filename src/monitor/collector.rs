use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, oneshot};
use tokio::time::MissedTickBehavior;

use crate::error::CollectorError;

use super::source::CpuSource;

/// One CPU utilization snapshot, tagged with the wall-clock time it was
/// taken. Field names follow the wire shape clients already parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(rename = "Percentage")]
    pub percentage: Vec<f64>,
    #[serde(rename = "TimeStamp")]
    pub timestamp: DateTime<Utc>,
}

struct RunHandle {
    stop_tx: oneshot::Sender<()>,
    done_rx: oneshot::Receiver<Result<Vec<Reading>, CollectorError>>,
}

/// Start/stop-controlled periodic CPU sampler.
///
/// At most one sampling loop runs per collector. `start` while running and
/// `stop` while idle are rejected; `stop` blocks until the loop has observed
/// the stop signal and handed back every reading it accumulated, so no
/// reading is lost or duplicated across the handoff.
pub struct CpuCollector<S> {
    source: Arc<S>,
    run_interval: Duration,
    cpu_interval: Duration,
    per_cpu: bool,
    run: Mutex<Option<RunHandle>>,
}

impl<S: CpuSource> CpuCollector<S> {
    #[must_use]
    pub fn new(
        source: Arc<S>,
        run_interval: Duration,
        cpu_interval: Option<Duration>,
        per_cpu: bool,
    ) -> Self {
        Self {
            source,
            run_interval,
            cpu_interval: cpu_interval.unwrap_or(Duration::ZERO),
            per_cpu,
            run: Mutex::new(None),
        }
    }

    /// Begin a sampling run in a background task.
    ///
    /// # Errors
    ///
    /// Returns `CollectorError::AlreadyRunning` when a run is already active.
    pub async fn start(&self) -> Result<(), CollectorError> {
        let mut run = self.run.lock().await;
        if run.is_some() {
            return Err(CollectorError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        let source = Arc::clone(&self.source);
        let run_interval = self.run_interval;
        let cpu_interval = self.cpu_interval;
        let per_cpu = self.per_cpu;
        tokio::spawn(async move {
            let outcome = sampling_loop(&*source, run_interval, cpu_interval, per_cpu, stop_rx).await;
            drop(done_tx.send(outcome));
        });

        *run = Some(RunHandle { stop_tx, done_rx });
        Ok(())
    }

    /// End the active run and hand back its readings.
    ///
    /// Blocks until the loop acknowledges the stop signal; a tick already in
    /// flight completes first, and nothing started afterwards is included.
    ///
    /// # Errors
    ///
    /// Returns `CollectorError::NotStarted` when no run is active, or the
    /// retained source failure when the loop aborted mid-run.
    pub async fn stop(&self) -> Result<Vec<Reading>, CollectorError> {
        let mut run = self.run.lock().await;
        let handle = run.take().ok_or(CollectorError::NotStarted)?;

        // Send may fail when the loop already exited on a source failure;
        // the outcome channel still carries the retained error.
        drop(handle.stop_tx.send(()));
        handle
            .done_rx
            .await
            .map_or_else(|_| Err(CollectorError::RunInterrupted), |outcome| outcome)
    }
}

async fn sampling_loop<S: CpuSource>(
    source: &S,
    run_interval: Duration,
    cpu_interval: Duration,
    per_cpu: bool,
    mut stop_rx: oneshot::Receiver<()>,
) -> Result<Vec<Reading>, CollectorError> {
    let mut ticker = tokio::time::interval(run_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick of a tokio interval completes immediately; consume it
    // so the first reading lands one full interval after start.
    ticker.tick().await;

    let mut readings: Vec<Reading> = Vec::new();
    loop {
        tokio::select! {
            _ = &mut stop_rx => return Ok(readings),
            _ = ticker.tick() => {
                match source.sample(cpu_interval, per_cpu).await {
                    Ok(percentage) => readings.push(Reading {
                        percentage,
                        timestamp: Utc::now(),
                    }),
                    Err(err) => {
                        tracing::warn!("CPU sampling failed, ending run: {}", err);
                        return Err(err);
                    }
                }
            }
        }
    }
}
