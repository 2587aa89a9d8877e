use clap::Parser;

use crate::aggregate::{Aggregator, parse_samples, readings_csv};
use crate::args::{AggregateArgs, Cli, Command, CpuCsvArgs, ReportFormat};
use crate::config;
use crate::error::AppResult;
use crate::logger::init_logging;
use crate::monitor;
use crate::sinks;

pub(crate) fn run() -> AppResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(cli))
}

async fn run_async(cli: Cli) -> AppResult<()> {
    let file = config::load(cli.config.as_deref())?;
    match cli.command {
        Command::Monitor(args) => {
            let settings = config::resolve_monitor(&args, file.as_ref())?;
            monitor::serve(&settings).await
        }
        Command::Aggregate(args) => run_aggregate(&args, file.as_ref()).await,
        Command::CpuCsv(args) => run_cpu_csv(&args).await,
    }
}

async fn run_aggregate(args: &AggregateArgs, file: Option<&config::ConfigFile>) -> AppResult<()> {
    let settings = config::resolve_aggregate(args, file)?;
    let raw = sinks::read_input(&args.input).await?;
    let text = std::str::from_utf8(&raw)?;
    let samples = parse_samples(text)?;
    let sample_count = samples.len();

    let report = Aggregator::new(samples, settings.interval).report();
    let bytes = match settings.format {
        ReportFormat::Csv => report.to_csv()?.into_bytes(),
        ReportFormat::Json => report.to_json()?,
    };
    sinks::write_output(args.output.as_deref(), &bytes).await?;
    tracing::info!(
        "aggregated {} samples into {} points",
        sample_count,
        report.points().len()
    );
    Ok(())
}

async fn run_cpu_csv(args: &CpuCsvArgs) -> AppResult<()> {
    let raw = sinks::read_input(&args.input).await?;
    let csv = readings_csv(&raw)?;
    sinks::write_output(args.output.as_deref(), csv.as_bytes()).await?;
    Ok(())
}
