use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::DataError;
use crate::monitor::Reading;

/// One request latency measurement from a load-generator run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub start_time: DateTime<Utc>,
    pub response_time: Duration,
}

/// Parse load-generator CSV output into samples.
///
/// The first line must carry the `start-time,response-time` header; rows
/// hold an RFC 3339 start time and a response time in seconds. Blank lines
/// are skipped.
///
/// # Errors
///
/// Returns a `DataError` describing the first malformed row, a missing
/// header, or empty input.
pub fn parse_samples(input: &str) -> Result<Vec<Sample>, DataError> {
    if input.trim().is_empty() {
        return Err(DataError::EmptyInput);
    }
    let mut lines = input.lines();
    let header = lines.next().ok_or(DataError::EmptyInput)?;
    if !header_matches(header) {
        return Err(DataError::MissingHeaders);
    }

    let mut samples = Vec::new();
    for (index, line) in lines.enumerate() {
        // 1-based row number, counting the header as row 1.
        let row = index.saturating_add(2);
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split(',');
        let (Some(start_field), Some(response_field), None) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(DataError::FieldCount {
                row,
                found: line.split(',').count(),
            });
        };

        let start_time = DateTime::parse_from_rfc3339(start_field.trim())
            .map_err(|err| DataError::InvalidStartTime {
                row,
                value: start_field.trim().to_owned(),
                source: err,
            })?
            .with_timezone(&Utc);
        let seconds: f64 = response_field
            .trim()
            .parse()
            .map_err(|err| DataError::InvalidResponseTime {
                row,
                value: response_field.trim().to_owned(),
                source: err,
            })?;
        let response_time = Duration::try_from_secs_f64(seconds).map_err(|err| {
            DataError::ResponseTimeOutOfRange {
                row,
                value: response_field.trim().to_owned(),
                source: err,
            }
        })?;

        samples.push(Sample {
            start_time,
            response_time,
        });
    }
    Ok(samples)
}

fn header_matches(header: &str) -> bool {
    let mut fields = header.split(',').map(str::trim);
    fields.next() == Some("start-time") && fields.next() == Some("response-time")
}

/// Render the JSON readings payload returned by the collector's stop
/// endpoint as a CSV suitable for plotting. The header repeats one
/// `percentage` column per monitored unit of the first reading.
///
/// # Errors
///
/// Returns a `DataError` when the payload is empty or not a readings array.
pub fn readings_csv(body: &[u8]) -> Result<String, DataError> {
    if body.is_empty() {
        return Err(DataError::EmptyReadings);
    }
    let readings: Vec<Reading> =
        serde_json::from_slice(body).map_err(|err| DataError::ReadingsJson { source: err })?;
    let Some(first) = readings.first() else {
        return Err(DataError::EmptyReadings);
    };

    let mut output = String::from("timeStamp");
    for _ in &first.percentage {
        output.push_str(",percentage");
    }
    for reading in &readings {
        write!(output, "\n{}", reading.timestamp.to_rfc3339())
            .map_err(|err| DataError::FormatCsv { source: err })?;
        for value in &reading.percentage {
            write!(output, ",{:.6}", value).map_err(|err| DataError::FormatCsv { source: err })?;
        }
    }
    Ok(output)
}
