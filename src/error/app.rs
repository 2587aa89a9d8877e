use thiserror::Error;

use super::{CollectorError, DataError, MonitorError, SinkError, ValidationError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("CLI error: {source}")]
    Clap {
        #[from]
        source: clap::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("TOML error: {source}")]
    Toml {
        #[from]
        source: toml::de::Error,
    },
    #[error("Join error: {source}")]
    Join {
        #[from]
        source: tokio::task::JoinError,
    },
    #[error("UTF-8 error: {source}")]
    Utf8 {
        #[from]
        source: std::str::Utf8Error,
    },
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Collector error: {0}")]
    Collector(#[from] CollectorError),
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation<E>(error: E) -> Self
    where
        E: Into<ValidationError>,
    {
        error.into().into()
    }

    pub fn collector<E>(error: E) -> Self
    where
        E: Into<CollectorError>,
    {
        error.into().into()
    }

    pub fn data<E>(error: E) -> Self
    where
        E: Into<DataError>,
    {
        error.into().into()
    }

    pub fn monitor<E>(error: E) -> Self
    where
        E: Into<MonitorError>,
    {
        error.into().into()
    }

    pub fn sink<E>(error: E) -> Self
    where
        E: Into<SinkError>,
    {
        error.into().into()
    }
}
