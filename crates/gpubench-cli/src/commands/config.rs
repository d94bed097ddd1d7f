//! `gpubench config`

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::Path;

use gpubench_common::BenchConfig;

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Show the configuration file path
    Path,
    /// Print the default configuration
    Default,
}

impl ConfigAction {
    pub fn execute(self, config: &BenchConfig, path: &Path) -> Result<()> {
        match self {
            Self::Show => {
                let text =
                    toml::to_string_pretty(config).context("Failed to serialize configuration")?;
                println!("{text}");
            }
            Self::Path => {
                let marker = if path.exists() { "" } else { " (not found, using defaults)" };
                println!("{}{marker}", path.display());
            }
            Self::Default => {
                let text =
                    BenchConfig::default_toml().context("Failed to render default configuration")?;
                println!("{text}");
            }
        }
        Ok(())
    }
}
