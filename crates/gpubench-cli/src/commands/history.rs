//! `gpubench history`

use anyhow::{Context, Result};
use clap::Args;
use console::style;

use gpubench_common::BenchConfig;
use gpubench_recorder::{BenchResult, TIMESTAMP_FORMAT, read_history};

#[derive(Args, Debug)]
pub struct HistoryCommand {
    /// Show only the most recent N results
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,
}

impl HistoryCommand {
    pub fn execute(self, config: &BenchConfig) -> Result<()> {
        let path = config.log_path();
        if !path.exists() {
            println!("No results recorded yet ({} does not exist)", path.display());
            return Ok(());
        }
        let results = read_history(&path)
            .with_context(|| format!("Failed to read result log {}", path.display()))?;
        let shown = self.select(&results);
        println!(
            "{} {}",
            style("Results").bold().cyan(),
            style(format!("({} of {})", shown.len(), results.len())).dim()
        );
        for result in shown {
            println!("  {}", format_row(result));
        }
        Ok(())
    }

    fn select<'a>(&self, results: &'a [BenchResult]) -> &'a [BenchResult] {
        let keep = self.limit.unwrap_or(results.len()).min(results.len());
        &results[results.len() - keep..]
    }
}

fn format_row(result: &BenchResult) -> String {
    format!(
        "{}  {:<32} {:<16} {:>12.2}  {}",
        result.timestamp.format(TIMESTAMP_FORMAT),
        result.benchmark,
        result.device,
        result.score,
        result.user
    )
}
