use thiserror::Error;

/// Lifecycle and sampling failures of the CPU collector.
///
/// The display text of the two lifecycle variants is part of the HTTP
/// contract; clients match on it.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("CPU collector already running")]
    AlreadyRunning,
    #[error("CPU collector is not started")]
    NotStarted,
    #[error("CPU sampling source failed: {reason}")]
    SourceFailure { reason: String },
    #[error("No CPU units visible to the sampling source")]
    NoCpusDetected,
    #[error("Sampling loop ended without handing back its readings")]
    RunInterrupted,
}
