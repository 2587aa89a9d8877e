//! Optional TOML configuration merged under CLI flags.
//!
//! Flags win over the config file, and the config file wins over built-in
//! defaults. Durations in the file use the same `ms`/`s`/`m`/`h` syntax as
//! the flags and go through the same parser, so zero-width intervals are
//! rejected here too.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::args::{AggregateArgs, MonitorArgs, ReportFormat};
use crate::args::parsers::parse_duration_arg;
use crate::error::AppResult;

/// Default config filename checked when `--config` is not provided.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "rampstat.toml";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_RUN_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_WINDOW_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub monitor: Option<MonitorSection>,
    pub aggregate: Option<AggregateSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    pub listen: Option<String>,
    pub run_interval: Option<String>,
    pub cpu_interval: Option<String>,
    pub per_cpu: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregateSection {
    pub interval: Option<String>,
    pub format: Option<ReportFormat>,
}

/// Resolved settings for the monitor server.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub listen: String,
    pub run_interval: Duration,
    pub cpu_interval: Option<Duration>,
    pub per_cpu: bool,
}

/// Resolved settings for aggregation.
#[derive(Debug, Clone, Copy)]
pub struct AggregateSettings {
    pub interval: Duration,
    pub format: ReportFormat,
}

/// Load the config file named by `path`, or `rampstat.toml` when present.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load(path: Option<&str>) -> AppResult<Option<ConfigFile>> {
    let path = match path {
        Some(path) => path.to_owned(),
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                DEFAULT_CONFIG_FILE.to_owned()
            } else {
                return Ok(None);
            }
        }
    };
    let raw = std::fs::read_to_string(&path)?;
    let parsed = toml::from_str::<ConfigFile>(&raw)?;
    tracing::debug!("loaded config from {}", path);
    Ok(Some(parsed))
}

/// Merge monitor flags with the config file and defaults.
///
/// # Errors
///
/// Returns an error if a duration string in the config file fails to parse.
pub fn resolve_monitor(
    args: &MonitorArgs,
    file: Option<&ConfigFile>,
) -> AppResult<MonitorSettings> {
    let section = file.and_then(|file| file.monitor.as_ref());
    let listen = args
        .listen
        .clone()
        .or_else(|| section.and_then(|section| section.listen.clone()))
        .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned());
    let run_interval = match (
        args.run_interval,
        section.and_then(|section| section.run_interval.as_deref()),
    ) {
        (Some(value), _) => value,
        (None, Some(raw)) => parse_duration_arg(raw)?,
        (None, None) => DEFAULT_RUN_INTERVAL,
    };
    let cpu_interval = match (
        args.cpu_interval,
        section.and_then(|section| section.cpu_interval.as_deref()),
    ) {
        (Some(value), _) => Some(value),
        (None, Some(raw)) => Some(parse_duration_arg(raw)?),
        (None, None) => None,
    };
    let per_cpu = args.per_cpu || section.and_then(|section| section.per_cpu).unwrap_or(false);
    Ok(MonitorSettings {
        listen,
        run_interval,
        cpu_interval,
        per_cpu,
    })
}

/// Merge aggregate flags with the config file and defaults.
///
/// # Errors
///
/// Returns an error if a duration string in the config file fails to parse.
pub fn resolve_aggregate(
    args: &AggregateArgs,
    file: Option<&ConfigFile>,
) -> AppResult<AggregateSettings> {
    let section = file.and_then(|file| file.aggregate.as_ref());
    let interval = match (
        args.interval,
        section.and_then(|section| section.interval.as_deref()),
    ) {
        (Some(value), _) => value,
        (None, Some(raw)) => parse_duration_arg(raw)?,
        (None, None) => DEFAULT_WINDOW_INTERVAL,
    };
    let format = args
        .format
        .or_else(|| section.and_then(|section| section.format))
        .unwrap_or(ReportFormat::Csv);
    Ok(AggregateSettings { interval, format })
}
