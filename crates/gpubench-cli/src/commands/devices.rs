//! `gpubench devices`

use anyhow::{Context, Result};
use console::style;
use gpubench_common::BenchConfig;
use gpubench_kernels::DeviceRegistry;

pub fn execute(config: &BenchConfig) -> Result<()> {
    let registry = DeviceRegistry::detect(config).context("Failed to enumerate devices")?;
    println!("{}", style("Devices").bold().cyan());
    for device in registry.devices() {
        let info = device.info();
        println!(
            "  {}  max work-group size {}, {} compute units",
            style(&info.name).bold(),
            info.max_work_group_size,
            info.compute_units
        );
    }
    Ok(())
}
