use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Input is empty")]
    EmptyInput,
    #[error("start-time,response-time header not found")]
    MissingHeaders,
    #[error("Row {row}: expected 2 fields, found {found}")]
    FieldCount { row: usize, found: usize },
    #[error("Row {row}: invalid start time '{value}': {source}")]
    InvalidStartTime {
        row: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("Row {row}: invalid response time '{value}': {source}")]
    InvalidResponseTime {
        row: usize,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },
    #[error("Row {row}: response time '{value}' is out of range: {source}")]
    ResponseTimeOutOfRange {
        row: usize,
        value: String,
        #[source]
        source: std::time::TryFromFloatSecsError,
    },
    #[error("Readings payload is empty")]
    EmptyReadings,
    #[error("Failed to decode readings JSON: {source}")]
    ReadingsJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to format readings CSV: {source}")]
    FormatCsv {
        #[source]
        source: std::fmt::Error,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
