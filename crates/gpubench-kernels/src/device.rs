//! Device handles and device enumeration.
//!
//! A [`Device`] is an opaque, cheaply cloneable handle to an accelerator. The
//! execution backend is a host work-group executor: every work-group of a
//! dispatch is scheduled as one task on the device's own `rayon` pool, and
//! the work-items of a group run in local-id order. From the caller's point
//! of view [`Device::dispatch`] is a single blocking call.

use gpubench_common::{BenchConfig, BenchError, CancelToken, Result};
use rayon::prelude::*;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use crate::kernel::{ComputeKernel, WorkItem};
use crate::work_size::ExecutionGrid;

/// Name under which the built-in host device is registered.
pub const HOST_DEVICE_NAME: &str = "Host CPU";

/// Number of logical cores available to the process (always ≥ 1).
pub fn host_parallelism() -> usize {
    std::thread::available_parallelism().map(std::num::NonZero::get).unwrap_or(1)
}

/// Identity and capability limits of a device. Immutable once queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    /// Maximum number of work-items in one work-group.
    pub max_work_group_size: usize,
    /// Work-groups that can execute concurrently.
    pub compute_units: usize,
}

struct DeviceInner {
    info: DeviceInfo,
    pool: rayon::ThreadPool,
}

/// Opaque handle to a selected device.
#[derive(Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device").field("info", &self.inner.info).finish_non_exhaustive()
    }
}

impl Device {
    /// Create a device backed by a dedicated host thread pool.
    ///
    /// `threads` defaults to the host parallelism. A `max_work_group_size`
    /// of zero is accepted here and reported by [`Device::max_work_group_size`].
    pub fn host(
        name: impl Into<String>,
        max_work_group_size: usize,
        threads: Option<usize>,
    ) -> Result<Self> {
        let name = name.into();
        let threads = threads.unwrap_or_else(host_parallelism).max(1);
        let thread_prefix = name.to_lowercase().replace(' ', "-");
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |i| format!("{thread_prefix}-{i}"))
            .build()
            .map_err(|e| BenchError::InvalidDeviceLimits {
                device: name.clone(),
                reason: format!("failed to start {threads} execution threads: {e}"),
            })?;
        let info = DeviceInfo { name, max_work_group_size, compute_units: threads };
        Ok(Self { inner: Arc::new(DeviceInner { info, pool }) })
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.inner.info
    }

    pub fn name(&self) -> &str {
        &self.inner.info.name
    }

    /// Query the maximum supported work-group size.
    pub fn max_work_group_size(&self) -> Result<usize> {
        match self.inner.info.max_work_group_size {
            0 => Err(BenchError::InvalidDeviceLimits {
                device: self.inner.info.name.clone(),
                reason: "maximum work-group size is 0".into(),
            }),
            n => Ok(n),
        }
    }

    /// Execute `kernel` over `grid`, writing into `output`.
    ///
    /// The grid is used verbatim: it must have a non-zero group size no larger
    /// than the device maximum, a total that is a multiple of the group size,
    /// and must cover the kernel's domain. The cancel token is polled before
    /// each work-group; once set, remaining groups are skipped and
    /// [`BenchError::Cancelled`] is returned.
    pub fn dispatch<K: ComputeKernel>(
        &self,
        grid: ExecutionGrid,
        kernel: &K,
        output: &mut [K::Elem],
        cancel: &CancelToken,
    ) -> Result<()> {
        let max = self.max_work_group_size()?;
        grid.check_shape()?;
        if grid.group_size > max {
            return Err(BenchError::InvalidGrid(format!(
                "group size {} exceeds the maximum of {max} on `{}`",
                grid.group_size,
                self.name()
            )));
        }
        let domain = kernel.domain_size();
        if grid.total_work_items < domain {
            return Err(BenchError::InvalidGrid(format!(
                "grid of {} work-items does not cover the {domain}-item domain of `{}`",
                grid.total_work_items,
                kernel.name()
            )));
        }
        if output.len() < domain {
            return Err(BenchError::Dispatch(format!(
                "output buffer holds {} cells but `{}` writes {domain}",
                output.len(),
                kernel.name()
            )));
        }

        let group_size = grid.group_size;
        let groups = grid.work_groups();
        let output = &mut output[..domain];
        let backed_groups = domain.div_ceil(group_size);

        let run_group = |group_id: usize, group_out: &mut [K::Elem]| -> Result<()> {
            cancel.check()?;
            let base = group_id * group_size;
            for local_id in 0..group_size {
                kernel.execute(WorkItem { global_id: base + local_id, local_id, group_id }, group_out);
            }
            Ok(())
        };

        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.inner.pool.install(|| {
                output
                    .par_chunks_mut(group_size)
                    .enumerate()
                    .try_for_each(|(group_id, group_out)| run_group(group_id, group_out))?;
                // Padding groups own no output cells.
                (backed_groups..groups)
                    .into_par_iter()
                    .try_for_each(|group_id| run_group(group_id, &mut []))
            })
        }));

        match outcome {
            Ok(result) => {
                result?;
                tracing::debug!(
                    device = %self.name(),
                    kernel = kernel.name(),
                    grid = %grid,
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "dispatch complete"
                );
                Ok(())
            }
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<String>()
                    .map(String::as_str)
                    .or_else(|| payload.downcast_ref::<&str>().copied())
                    .unwrap_or("unknown panic");
                Err(BenchError::Dispatch(format!("kernel `{}` aborted: {reason}", kernel.name())))
            }
        }
    }
}

/// The set of devices a benchmark can target.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    /// Enumerate the host device plus every simulated device in `config`.
    pub fn detect(config: &BenchConfig) -> Result<Self> {
        let mut devices =
            vec![Device::host(HOST_DEVICE_NAME, config.host.max_work_group_size, config.host.threads)?];
        for sim in &config.devices {
            devices.push(Device::host(sim.name.clone(), sim.max_work_group_size, sim.threads)?);
        }
        for device in &devices {
            tracing::debug!(
                device = %device.name(),
                max_work_group_size = device.info().max_work_group_size,
                compute_units = device.info().compute_units,
                "device registered"
            );
        }
        Ok(Self { devices })
    }

    pub fn from_devices(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn names(&self) -> Vec<&str> {
        self.devices.iter().map(Device::name).collect()
    }

    /// Resolve a device by name (case-insensitive) and check its limits.
    pub fn resolve(&self, name: &str) -> Result<Device> {
        let wanted = name.trim();
        let device = self
            .devices
            .iter()
            .find(|d| d.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BenchError::DeviceNotFound(wanted.to_string()))?;
        device.max_work_group_size()?;
        Ok(device.clone())
    }
}
