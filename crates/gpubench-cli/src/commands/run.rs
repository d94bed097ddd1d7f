//! `gpubench run`

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::sync::Arc;
use tracing::{info, warn};

use crate::notify::ConsoleNotifier;
use gpubench_common::{BenchConfig, BenchError, BenchmarkKind};
use gpubench_kernels::{DeviceRegistry, HOST_DEVICE_NAME, TrigFunction};
use gpubench_recorder::{
    BenchResult, ConsoleLogger, CsvLogger, OperatorNotifier, ResultSink, WRITE_WARNING_TITLE,
};
use gpubench_suite::{BenchmarkParams, BenchmarkRunner, RunOptions, RunReport, RunRequest};

#[derive(Args, Debug)]
pub struct RunCommand {
    /// Device to run on
    #[arg(short, long, value_name = "DEVICE", default_value = HOST_DEVICE_NAME)]
    pub device: String,

    /// Benchmark to run (standard, transfer, trig, matmul, fractals)
    #[arg(short, long, value_name = "KIND", default_value = "standard")]
    pub benchmark: BenchmarkKind,

    /// Problem-size overrides: r1,k,c2 for matmul, elements for trig,
    /// bytes for transfer, width,height for fractals
    #[arg(long, value_delimiter = ',', value_name = "N,...")]
    pub dims: Vec<usize>,

    /// Trigonometric function (sin, cos, tan, combined)
    #[arg(long, value_name = "FUNCTION", group = "variant")]
    pub trig: Option<TrigFunction>,

    /// Fractal zoom level
    #[arg(long, value_name = "ZOOM", group = "variant")]
    pub zoom: Option<f64>,

    /// Host/device round trips for the transfer benchmark
    #[arg(long, value_name = "N", group = "variant")]
    pub round_trips: Option<usize>,

    /// Repeat the matrix multiplication N times
    #[arg(long, value_name = "N", group = "variant")]
    pub repetitions: Option<usize>,

    /// Parts of the standard suite to run
    #[arg(long, value_delimiter = ',', value_name = "KIND,...", group = "variant")]
    pub include: Vec<BenchmarkKind>,

    /// Skip the warm-up pass
    #[arg(long)]
    pub no_warm_up: bool,

    /// Print the result without appending it to the log
    #[arg(long)]
    pub no_record: bool,
}

impl RunCommand {
    pub fn options(&self) -> RunOptions {
        if let Some(function) = self.trig {
            RunOptions::Trig { function }
        } else if let Some(zoom) = self.zoom {
            RunOptions::Fractal { zoom }
        } else if let Some(round_trips) = self.round_trips {
            RunOptions::Transfer { round_trips }
        } else if let Some(repetitions) = self.repetitions {
            RunOptions::Matrix { repetitions }
        } else if !self.include.is_empty() {
            RunOptions::Suite { include: self.include.clone() }
        } else {
            RunOptions::Default
        }
    }

    pub fn request(&self) -> RunRequest {
        let params = BenchmarkParams::new(self.device.clone()).with_dims(self.dims.clone());
        RunRequest::new(self.benchmark, params).with_options(self.options())
    }

    pub fn execute(self, config: &BenchConfig) -> Result<()> {
        let mut config = config.clone();
        if self.no_warm_up {
            config.runner.warm_up = false;
        }
        let registry = DeviceRegistry::detect(&config).context("Failed to enumerate devices")?;
        let runner = BenchmarkRunner::new(registry, config.clone());
        let request = self.request();
        info!(
            benchmark = %request.kind,
            device = %request.params.device,
            options = ?request.options,
            "starting benchmark"
        );

        let handle = runner.spawn(request).context("Failed to start benchmark")?;
        let token = handle.cancel_token();
        if let Err(e) = ctrlc::set_handler(move || token.cancel()) {
            warn!(error = %e, "Ctrl-C handler not installed, the run cannot be interrupted");
        }

        let report = match handle.wait() {
            Ok(report) => report,
            Err(BenchError::Cancelled) => {
                println!("{}", style("Benchmark cancelled").yellow());
                return Ok(());
            }
            Err(e) => {
                let category = e.category();
                return Err(e)
                    .with_context(|| format!("{} failed ({category} error)", self.benchmark));
            }
        };

        print_report(&report);
        if !self.no_record {
            record(&config, &report.result);
        }
        Ok(())
    }
}

fn print_report(report: &RunReport) {
    let RunReport { result, measurement } = report;
    println!("{}", style(&result.benchmark).bold().cyan());
    println!("  {:<10} {}", style("Device:").bold(), result.device);
    println!(
        "  {:<10} {:.2} ({})",
        style("Score:").bold(),
        measurement.score,
        measurement.unit
    );
    println!("  {:<10} {:.1} ms", style("Elapsed:").bold(), measurement.elapsed_ms());
}

/// Append `result` to the configured log, falling back to the console when
/// the log cannot be opened.
fn record(config: &BenchConfig, result: &BenchResult) {
    let notifier = Arc::new(ConsoleNotifier);
    let mut sink: Box<dyn ResultSink> = match CsvLogger::open(&config.log_file) {
        Ok(log) => Box::new(log.with_notifier(notifier)),
        Err(e) => {
            let err = BenchError::from(e);
            tracing::error!(
                path = %config.log_path().display(),
                category = %err.category(),
                error = %err,
                "result log unavailable"
            );
            notifier.warn(
                WRITE_WARNING_TITLE,
                &format!(
                    "Can not write to the {} file. Will write to the console instead.",
                    config.log_path().display()
                ),
            );
            Box::new(ConsoleLogger::stdout())
        }
    };
    sink.write(result);
    sink.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        run: RunCommand,
    }

    fn parse(args: &[&str]) -> Result<RunCommand, clap::Error> {
        Harness::try_parse_from(std::iter::once("gpubench").chain(args.iter().copied()))
            .map(|h| h.run)
    }

    #[test]
    fn defaults_run_standard_on_host() {
        let cmd = parse(&[]).unwrap();
        assert_eq!(cmd.device, HOST_DEVICE_NAME);
        assert_eq!(cmd.benchmark, BenchmarkKind::Standard);
        assert_eq!(cmd.options(), RunOptions::Default);
    }

    #[test]
    fn dims_are_comma_separated() {
        let cmd = parse(&["--benchmark", "matmul", "--dims", "4,3,2"]).unwrap();
        let request = cmd.request();
        assert_eq!(request.kind, BenchmarkKind::MatrixMultiplication);
        assert_eq!(request.params.dims, vec![4, 3, 2]);
    }

    #[test]
    fn variant_flags_become_options() {
        let cmd = parse(&["-b", "trig", "--trig", "cos"]).unwrap();
        assert_eq!(cmd.options(), RunOptions::Trig { function: TrigFunction::Cos });
        let cmd = parse(&["-b", "std", "--include", "trig,fractals"]).unwrap();
        assert_eq!(
            cmd.options(),
            RunOptions::Suite { include: vec![BenchmarkKind::Trigonometry, BenchmarkKind::Fractals] }
        );
    }

    #[test]
    fn variant_flags_are_exclusive() {
        assert!(parse(&["--zoom", "2", "--repetitions", "3"]).is_err());
    }

    fn config_logging_to(base: std::path::PathBuf) -> BenchConfig {
        BenchConfig { log_file: base, ..BenchConfig::default() }
    }

    #[test]
    fn record_appends_to_the_configured_log() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_logging_to(dir.path().join("results"));
        record(&config, &BenchResult::new("ada", "Host CPU", "Fractals Benchmark", 12.5));
        record(&config, &BenchResult::new("ada", "Host CPU", "Trigonometry Benchmark", 3.0));

        let history = gpubench_recorder::read_history(&config.log_path()).unwrap();
        assert_eq!(config.log_path(), dir.path().join("results.csv"));
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].benchmark, "Fractals Benchmark");
        assert_eq!(history[1].score, 3.0);
    }

    #[test]
    fn record_survives_an_unopenable_log() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_logging_to(dir.path().join("missing").join("results"));
        record(&config, &BenchResult::new("ada", "Host CPU", "Fractals Benchmark", 1.0));
        assert!(!config.log_path().exists());
    }

    #[test]
    fn unknown_benchmark_is_rejected() {
        assert!(parse(&["--benchmark", "raytracing"]).is_err());
    }
}
