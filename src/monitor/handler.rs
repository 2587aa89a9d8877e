use std::sync::Arc;

use chrono::Utc;
use tokio::net::TcpStream;

use crate::error::CollectorError;

use super::collector::CpuCollector;
use super::http::{read_request, write_json_response, write_plain_response};
use super::source::CpuSource;

pub(super) async fn handle_connection<S: CpuSource>(
    mut socket: TcpStream,
    collector: Arc<CpuCollector<S>>,
) {
    let request = match read_request(&mut socket).await {
        Ok(request) => request,
        Err(err) => {
            if write_plain_response(&mut socket, err.status, &err.message)
                .await
                .is_err()
            {
                // Socket closed while writing error response.
            }
            return;
        }
    };

    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/start") => handle_start(&mut socket, collector.as_ref()).await,
        ("POST", "/stop") => handle_stop(&mut socket, collector.as_ref()).await,
        _ => {
            if write_plain_response(&mut socket, 404, "Not found")
                .await
                .is_err()
            {
                // Socket closed while writing error response.
            }
        }
    }
}

async fn handle_start<S: CpuSource>(socket: &mut TcpStream, collector: &CpuCollector<S>) {
    match collector.start().await {
        Ok(()) => {
            tracing::info!("started cpu collector at {}", Utc::now().to_rfc3339());
            if write_plain_response(socket, 200, "Collecting CPU stats")
                .await
                .is_err()
            {
                // Socket closed while writing response.
            }
        }
        Err(err) => {
            if write_plain_response(socket, error_status(&err), &err.to_string())
                .await
                .is_err()
            {
                // Socket closed while writing error response.
            }
        }
    }
}

async fn handle_stop<S: CpuSource>(socket: &mut TcpStream, collector: &CpuCollector<S>) {
    let readings = match collector.stop().await {
        Ok(readings) => readings,
        Err(err) => {
            if write_plain_response(socket, error_status(&err), &err.to_string())
                .await
                .is_err()
            {
                // Socket closed while writing error response.
            }
            return;
        }
    };

    tracing::info!(
        "stopped cpu collector at {} with {} readings",
        Utc::now().to_rfc3339(),
        readings.len()
    );
    match serde_json::to_vec(&readings) {
        Ok(body) => {
            if write_json_response(socket, 200, &body).await.is_err() {
                // Socket closed while writing response.
            }
        }
        Err(err) => {
            if write_plain_response(socket, 500, &format!("Failed to marshal readings: {}", err))
                .await
                .is_err()
            {
                // Socket closed while writing error response.
            }
        }
    }
}

/// Lifecycle misuse is the client's mistake; everything else is ours.
const fn error_status(err: &CollectorError) -> u16 {
    match err {
        CollectorError::AlreadyRunning | CollectorError::NotStarted => 400,
        CollectorError::SourceFailure { .. }
        | CollectorError::NoCpusDetected
        | CollectorError::RunInterrupted => 500,
    }
}
