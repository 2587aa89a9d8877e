use super::*;
use super::handler::handle_connection;
use crate::error::{AppError, AppResult, CollectorError};
use async_trait::async_trait;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const TICK_INTERVAL: Duration = Duration::from_millis(10);
const NEVER_TICKS: Duration = Duration::from_secs(3600);
const SETTLE: Duration = Duration::from_millis(80);

struct FakeSource {
    calls: AtomicUsize,
}

impl FakeSource {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CpuSource for FakeSource {
    async fn sample(&self, _interval: Duration, _per_cpu: bool) -> Result<Vec<f64>, CollectorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![call as f64, 42.0])
    }
}

struct FailingSource;

#[async_trait]
impl CpuSource for FailingSource {
    async fn sample(&self, _interval: Duration, _per_cpu: bool) -> Result<Vec<f64>, CollectorError> {
        Err(CollectorError::SourceFailure {
            reason: "probe exploded".to_owned(),
        })
    }
}

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::monitor(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

fn fake_collector(run_interval: Duration) -> (Arc<FakeSource>, CpuCollector<FakeSource>) {
    let source = Arc::new(FakeSource::new());
    let collector = CpuCollector::new(Arc::clone(&source), run_interval, None, false);
    (source, collector)
}

#[test]
fn stop_before_any_tick_returns_empty() -> AppResult<()> {
    run_async_test(async {
        let (_, collector) = fake_collector(NEVER_TICKS);
        collector.start().await?;
        let readings = collector.stop().await?;
        if !readings.is_empty() {
            return Err(AppError::monitor(format!(
                "Expected no readings, got {}",
                readings.len()
            )));
        }
        Ok(())
    })
}

#[test]
fn hands_back_exactly_the_completed_ticks() -> AppResult<()> {
    run_async_test(async {
        let (source, collector) = fake_collector(TICK_INTERVAL);
        collector.start().await?;
        tokio::time::sleep(SETTLE).await;
        let readings = collector.stop().await?;

        if readings.is_empty() {
            return Err(AppError::monitor("Expected at least one reading"));
        }
        if readings.len() != source.calls() {
            return Err(AppError::monitor(format!(
                "Expected one reading per completed tick, got {} readings for {} ticks",
                readings.len(),
                source.calls()
            )));
        }
        for (earlier, later) in readings.iter().zip(readings.iter().skip(1)) {
            if later.timestamp < earlier.timestamp {
                return Err(AppError::monitor("Timestamps went backwards"));
            }
        }
        for (index, reading) in readings.iter().enumerate() {
            if reading.percentage.first().copied() != Some(index as f64) {
                return Err(AppError::monitor(format!(
                    "Reading {} out of order: {:?}",
                    index, reading.percentage
                )));
            }
        }
        Ok(())
    })
}

#[test]
fn second_start_is_rejected_while_running() -> AppResult<()> {
    run_async_test(async {
        let (_, collector) = fake_collector(NEVER_TICKS);
        collector.start().await?;
        match collector.start().await {
            Err(CollectorError::AlreadyRunning) => {}
            Err(err) => return Err(AppError::monitor(format!("Unexpected error: {}", err))),
            Ok(()) => return Err(AppError::monitor("Expected second start to be rejected")),
        }
        collector.stop().await?;
        Ok(())
    })
}

#[test]
fn stop_while_idle_is_rejected() -> AppResult<()> {
    run_async_test(async {
        let (_, collector) = fake_collector(NEVER_TICKS);
        match collector.stop().await {
            Err(CollectorError::NotStarted) => Ok(()),
            Err(err) => Err(AppError::monitor(format!("Unexpected error: {}", err))),
            Ok(_) => Err(AppError::monitor("Expected stop while idle to be rejected")),
        }
    })
}

#[test]
fn concurrent_starts_yield_exactly_one_success() -> AppResult<()> {
    run_async_test(async {
        let (_, collector) = fake_collector(NEVER_TICKS);
        let (first, second) = tokio::join!(collector.start(), collector.start());

        let successes = usize::from(first.is_ok()) + usize::from(second.is_ok());
        if successes != 1 {
            return Err(AppError::monitor(format!(
                "Expected exactly one successful start, got {}",
                successes
            )));
        }
        let rejected = [first, second]
            .into_iter()
            .filter(|outcome| matches!(outcome, Err(CollectorError::AlreadyRunning)))
            .count();
        if rejected != 1 {
            return Err(AppError::monitor(format!(
                "Expected exactly one AlreadyRunning rejection, got {}",
                rejected
            )));
        }
        collector.stop().await?;
        Ok(())
    })
}

#[test]
fn source_failure_surfaces_on_stop_and_frees_the_collector() -> AppResult<()> {
    run_async_test(async {
        let collector = CpuCollector::new(Arc::new(FailingSource), TICK_INTERVAL, None, false);
        collector.start().await?;
        tokio::time::sleep(SETTLE).await;

        match collector.stop().await {
            Err(CollectorError::SourceFailure { reason }) => {
                if !reason.contains("probe exploded") {
                    return Err(AppError::monitor(format!(
                        "Unexpected failure reason: {}",
                        reason
                    )));
                }
            }
            Err(err) => return Err(AppError::monitor(format!("Unexpected error: {}", err))),
            Ok(readings) => {
                return Err(AppError::monitor(format!(
                    "Expected retained failure, got {} readings",
                    readings.len()
                )));
            }
        }

        // The failed run is harvested; the collector is idle again.
        collector.start().await?;
        tokio::time::sleep(SETTLE).await;
        match collector.stop().await {
            Err(CollectorError::SourceFailure { .. }) => Ok(()),
            Err(err) => Err(AppError::monitor(format!("Unexpected error: {}", err))),
            Ok(readings) => Err(AppError::monitor(format!(
                "Expected retained failure, got {} readings",
                readings.len()
            ))),
        }
    })
}

#[test]
fn restarts_cleanly_after_stop() -> AppResult<()> {
    run_async_test(async {
        let (_, collector) = fake_collector(TICK_INTERVAL);
        collector.start().await?;
        tokio::time::sleep(SETTLE).await;
        let first_run = collector.stop().await?;

        collector.start().await?;
        tokio::time::sleep(SETTLE).await;
        let second_run = collector.stop().await?;

        if first_run.is_empty() || second_run.is_empty() {
            return Err(AppError::monitor("Expected readings from both runs"));
        }
        Ok(())
    })
}

async fn spawn_test_server<S: CpuSource>(collector: Arc<CpuCollector<S>>) -> AppResult<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| AppError::monitor(format!("Failed to bind test listener: {}", err)))?;
    let addr = listener
        .local_addr()
        .map_err(|err| AppError::monitor(format!("Failed to read local addr: {}", err)))?;
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let collector = Arc::clone(&collector);
            tokio::spawn(async move {
                handle_connection(socket, collector).await;
            });
        }
    });
    Ok(addr)
}

async fn send_request(addr: SocketAddr, request: &str) -> AppResult<String> {
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|err| AppError::monitor(format!("Failed to connect: {}", err)))?;
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|err| AppError::monitor(format!("Failed to write request: {}", err)))?;
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .map_err(|err| AppError::monitor(format!("Failed to read response: {}", err)))?;
    Ok(response)
}

const START_REQUEST: &str = "POST /start HTTP/1.1\r\nHost: localhost\r\n\r\n";
const STOP_REQUEST: &str = "POST /stop HTTP/1.1\r\nHost: localhost\r\n\r\n";

#[test]
fn duplicate_start_over_http_reports_already_running() -> AppResult<()> {
    run_async_test(async {
        let (_, collector) = fake_collector(NEVER_TICKS);
        let addr = spawn_test_server(Arc::new(collector)).await?;

        let first = send_request(addr, START_REQUEST).await?;
        if !first.contains("200 OK") || !first.contains("Collecting CPU stats") {
            return Err(AppError::monitor(format!(
                "Unexpected first start response: {}",
                first
            )));
        }

        let second = send_request(addr, START_REQUEST).await?;
        if !second.contains("400 Bad Request") || !second.contains("CPU collector already running")
        {
            return Err(AppError::monitor(format!(
                "Unexpected second start response: {}",
                second
            )));
        }
        Ok(())
    })
}

#[test]
fn stop_before_start_over_http_reports_not_started() -> AppResult<()> {
    run_async_test(async {
        let (_, collector) = fake_collector(NEVER_TICKS);
        let addr = spawn_test_server(Arc::new(collector)).await?;

        let response = send_request(addr, STOP_REQUEST).await?;
        if !response.contains("400 Bad Request")
            || !response.contains("CPU collector is not started")
        {
            return Err(AppError::monitor(format!(
                "Unexpected stop response: {}",
                response
            )));
        }
        Ok(())
    })
}

#[test]
fn stop_over_http_returns_readings_as_json() -> AppResult<()> {
    run_async_test(async {
        let (_, collector) = fake_collector(TICK_INTERVAL);
        let addr = spawn_test_server(Arc::new(collector)).await?;

        let start = send_request(addr, START_REQUEST).await?;
        if !start.contains("200 OK") {
            return Err(AppError::monitor(format!(
                "Unexpected start response: {}",
                start
            )));
        }
        tokio::time::sleep(SETTLE).await;

        let stop = send_request(addr, STOP_REQUEST).await?;
        if !stop.contains("200 OK") || !stop.contains("Content-Type: application/json") {
            return Err(AppError::monitor(format!(
                "Unexpected stop response head: {}",
                stop
            )));
        }
        let body = stop
            .split("\r\n\r\n")
            .nth(1)
            .ok_or_else(|| AppError::monitor("Missing response body"))?;
        let readings: Vec<Reading> = serde_json::from_str(body)?;
        if readings.is_empty() {
            return Err(AppError::monitor("Expected readings in stop body"));
        }
        for reading in &readings {
            if reading.percentage.len() != 2 {
                return Err(AppError::monitor(format!(
                    "Unexpected percentage width: {:?}",
                    reading.percentage
                )));
            }
        }
        Ok(())
    })
}

#[test]
fn unknown_routes_return_not_found() -> AppResult<()> {
    run_async_test(async {
        let (_, collector) = fake_collector(NEVER_TICKS);
        let addr = spawn_test_server(Arc::new(collector)).await?;

        let response =
            send_request(addr, "GET /metrics HTTP/1.1\r\nHost: localhost\r\n\r\n").await?;
        if !response.contains("404 Not Found") {
            return Err(AppError::monitor(format!(
                "Unexpected response: {}",
                response
            )));
        }
        Ok(())
    })
}
