//! gpubench CLI
//!
//! Runs compute benchmarks on a selected device and appends each score to a
//! CSV result log.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing::error;

mod commands;
mod notify;

use commands::{ConfigAction, HistoryCommand, RunCommand};
use gpubench_common::{BenchConfig, DEFAULT_CONFIG_FILE, LogFormat};

/// gpubench - compute benchmark harness
#[derive(Parser)]
#[command(name = "gpubench")]
#[command(about = "Benchmark compute devices and record the scores")]
#[command(long_about = r#"
gpubench runs data-parallel benchmarks (matrix multiplication, trigonometry,
data transfer, fractals, or the composite standard suite) on a selected
device and appends the score to a CSV log.

Examples:
  # List devices
  gpubench devices

  # Matrix multiplication with custom dimensions
  gpubench run --benchmark matmul --dims 2048,2048,2048

  # Fractals at 50x zoom on a configured device
  gpubench run --device "Sim 64" --benchmark fractals --zoom 50

  # Show the last ten recorded results
  gpubench history --limit 10
"#)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    /// Log format (pretty, compact, json)
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<LogFormat>,

    /// Generate shell completions
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the devices benchmarks can run on
    Devices,

    /// Run a benchmark and record its score
    #[command(alias = "bench")]
    Run(RunCommand),

    /// Show recorded results
    History(HistoryCommand),

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
        return;
    }

    let result = load_configuration(&cli).and_then(|config| {
        setup_logging(&config, cli.log_level.as_deref(), cli.log_format)?;
        dispatch(cli.command, &config, cli.config.as_deref())
    });

    if let Err(e) = result {
        error!("Command failed: {e}");
        for cause in e.chain().skip(1) {
            error!("  Caused by: {cause}");
        }
        eprintln!("{} {e:#}", console::style("error:").red().bold());
        std::process::exit(1);
    }
}

fn dispatch(
    command: Option<Commands>,
    config: &BenchConfig,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    match command {
        Some(Commands::Devices) => commands::devices::execute(config),
        Some(Commands::Run(cmd)) => cmd.execute(config),
        Some(Commands::History(cmd)) => cmd.execute(config),
        Some(Commands::Config { action }) => action.execute(config, &config_path_or_default(config_path)),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

fn config_path_or_default(path: Option<&std::path::Path>) -> PathBuf {
    path.map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load the configuration file (or defaults) with `GPUBENCH_*` overrides.
fn load_configuration(cli: &Cli) -> Result<BenchConfig> {
    match &cli.config {
        Some(path) => BenchConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => BenchConfig::load_or_default(&config_path_or_default(None))
            .context("Failed to load configuration"),
    }
}

fn setup_logging(
    config: &BenchConfig,
    level_override: Option<&str>,
    format_override: Option<LogFormat>,
) -> Result<()> {
    let level = level_override.unwrap_or(&config.logging.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level: {level}"))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);

    match format_override.unwrap_or(config.logging.format) {
        LogFormat::Json => {
            subscriber.json().with_timer(tracing_subscriber::fmt::time::uptime()).init();
        }
        LogFormat::Compact => subscriber.compact().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
    }
    Ok(())
}
