//! HTTP-controlled CPU sampling collector.
//!
//! A load-test driver POSTs `/start` before a run and `/stop` after it; the
//! stop response carries every reading taken in between as JSON.
mod collector;
mod handler;
mod http;
mod source;

#[cfg(test)]
mod tests;

pub use collector::{CpuCollector, Reading};
pub use source::{CpuSource, SystemCpuSource};

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::MonitorSettings;
use crate::error::{AppError, AppResult, MonitorError};
use crate::shutdown::{ShutdownReceiver, setup_signal_shutdown_handler, shutdown_channel};

/// Serve `/start` and `/stop` until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if the listen address cannot be bound.
pub async fn serve(settings: &MonitorSettings) -> AppResult<()> {
    let listener = TcpListener::bind(&settings.listen).await.map_err(|err| {
        AppError::monitor(MonitorError::Bind {
            addr: settings.listen.clone(),
            source: err,
        })
    })?;
    let collector = Arc::new(CpuCollector::new(
        Arc::new(SystemCpuSource::new()),
        settings.run_interval,
        settings.cpu_interval,
        settings.per_cpu,
    ));

    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    tracing::info!("CPU monitor listening on {}", settings.listen);
    run_accept_loop(&listener, &collector, &mut shutdown_rx).await;
    tracing::info!("CPU monitor shutting down");

    signal_handle.await?;
    Ok(())
}

async fn run_accept_loop<S: CpuSource>(
    listener: &TcpListener,
    collector: &Arc<CpuCollector<S>>,
    shutdown_rx: &mut ShutdownReceiver,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => match accepted {
                Ok((socket, _)) => {
                    let collector = Arc::clone(collector);
                    tokio::spawn(async move {
                        handler::handle_connection(socket, collector).await;
                    });
                }
                Err(err) => {
                    tracing::warn!("Failed to accept connection: {}", err);
                }
            },
        }
    }
}
