use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::parsers::parse_duration_arg;

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Benchmarking-support toolkit - HTTP-controlled CPU sampling and time-bucketed throughput/latency reports for load-test runs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML config file (rampstat.toml is picked up automatically)
    #[arg(long, global = true, env = "RAMPSTAT_CONFIG")]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the CPU sampling collector over HTTP start/stop endpoints
    Monitor(MonitorArgs),
    /// Bucket load-generator samples into fixed windows and report throughput/latency
    Aggregate(AggregateArgs),
    /// Convert collector readings JSON into a plotting-friendly CSV
    CpuCsv(CpuCsvArgs),
}

#[derive(Debug, Args, Clone)]
pub struct MonitorArgs {
    /// Address to listen on for /start and /stop requests (default 0.0.0.0:8080)
    #[arg(long)]
    pub listen: Option<String>,

    /// Interval between readings, supports ms/s/m/h (default 1s)
    #[arg(long = "run-interval", value_parser = parse_duration_arg)]
    pub run_interval: Option<Duration>,

    /// Window each reading averages CPU use over; omit to compare against the previous reading
    #[arg(long = "cpu-interval", value_parser = parse_duration_arg)]
    pub cpu_interval: Option<Duration>,

    /// Report one percentage per core instead of a combined value
    #[arg(long = "per-cpu")]
    pub per_cpu: bool,
}

#[derive(Debug, Args, Clone)]
pub struct AggregateArgs {
    /// Load-generator CSV with a start-time,response-time header
    #[arg(long, short)]
    pub input: String,

    /// Width of each throughput window, supports ms/s/m/h (default 1s)
    #[arg(long, value_parser = parse_duration_arg)]
    pub interval: Option<Duration>,

    /// Report format (default csv)
    #[arg(long, ignore_case = true)]
    pub format: Option<ReportFormat>,

    /// Write the report here instead of stdout
    #[arg(long, short)]
    pub output: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct CpuCsvArgs {
    /// JSON readings file as returned by POST /stop
    #[arg(long, short)]
    pub input: String,

    /// Write the CSV here instead of stdout
    #[arg(long, short)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Csv,
    Json,
}
