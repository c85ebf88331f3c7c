use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use seu_detector::{DetectorConfig, ScanScheduler, ShutdownSignal, StatisticsLedger};
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "seu-detector", about = "Detect single-event upsets in RAM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Monitor a zeroed arena until interrupted.
    Run(RunArgs),
    /// Print the persisted statistics and observed upset rate.
    Report {
        /// Statistics document to read.
        #[arg(long, default_value = "stat.json")]
        statistics_path: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Fraction of free memory to monitor.
    #[arg(long, default_value_t = 0.75)]
    usage_rate: f64,
    /// Seconds between free-memory samples.
    #[arg(long, default_value_t = 1.0)]
    memory_period: f64,
    /// Seconds between arena scans.
    #[arg(long, default_value_t = 10.0)]
    data_period: f64,
    /// Relative size change that triggers reallocation.
    #[arg(long, default_value_t = 0.2)]
    relative_change: f64,
    /// Statistics document, overwritten on every checkpoint.
    #[arg(long, default_value = "stat.json")]
    statistics_path: PathBuf,
    /// Debug log file (appended).
    #[arg(long, default_value = "detector.log")]
    log_file: PathBuf,
    /// Disable the debug log file.
    #[arg(long)]
    no_log_file: bool,
    /// Flip a random bit before each scan with this probability (diagnostics).
    #[arg(long)]
    simulate_upsets: Option<f64>,
}

impl RunArgs {
    fn into_config(self) -> Result<DetectorConfig> {
        let memory = Duration::try_from_secs_f64(self.memory_period)
            .context("invalid memory period")?;
        let data =
            Duration::try_from_secs_f64(self.data_period).context("invalid data period")?;
        let log_file = (!self.no_log_file).then_some(self.log_file);
        Ok(DetectorConfig::default()
            .with_usage_rate(self.usage_rate)
            .with_periods(memory, data)
            .with_relative_change_threshold(self.relative_change)
            .with_statistics_path(self.statistics_path)
            .with_log_file(log_file)
            .with_simulated_upsets(self.simulate_upsets))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let config = match args.into_config() {
                Ok(config) => config,
                Err(err) => {
                    eprintln!("error: {err:#}");
                    return ExitCode::FAILURE;
                }
            };
            if let Err(err) = init_logging(config.log_file.as_ref()) {
                eprintln!("error: {err:#}");
                return ExitCode::FAILURE;
            }

            info!("START");
            let code = match run_detector(config) {
                Ok(()) => {
                    info!("GRACEFUL EXITING");
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    error!(error = ?err, "unhandled error");
                    ExitCode::FAILURE
                }
            };
            info!("FINISH");
            code
        }
        Commands::Report { statistics_path } => match run_report(statistics_path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("error: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

/// Console at INFO (or `RUST_LOG`), file at DEBUG.
fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let console = tracing_subscriber::fmt::layer().with_filter(
        EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy(),
    );

    let file = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(Arc::new(file))
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(())
}

fn run_detector(config: DetectorConfig) -> Result<()> {
    let shutdown = ShutdownSignal::new();
    let handle = shutdown.clone();
    ctrlc::set_handler(move || handle.raise()).context("failed to set Ctrl-C handler")?;

    let mut scheduler =
        ScanScheduler::with_host(config, shutdown).context("failed to start detector")?;
    scheduler.run().context("detector loop failed")?;
    Ok(())
}

fn run_report(statistics_path: PathBuf) -> Result<()> {
    let ledger = StatisticsLedger::load(&statistics_path).with_context(|| {
        format!(
            "failed to read statistics from {}",
            statistics_path.display()
        )
    })?;
    let stats = ledger.statistics();

    println!("bitSeconds\t{}", stats.bit_seconds);
    println!("GbitHours\t{:.6}", stats.gbit_hours);
    println!("SEUCases\t{}", stats.seu_cases);
    println!("runSeconds\t{:.3}", stats.run_seconds);
    println!("runHours\t{:.3}", stats.run_hours);
    match stats.upset_rate_per_gbit_hour() {
        Some(rate) => println!("SEU/Gbit-hour\t{:.6e}", rate),
        None => println!("SEU/Gbit-hour\tn/a (no exposure recorded)"),
    }

    Ok(())
}
