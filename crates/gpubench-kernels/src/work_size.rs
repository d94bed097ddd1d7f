//! Execution grid planning for device dispatch.
//!
//! The group size is always the device's reported maximum and is passed to
//! the dispatch explicitly: some drivers ignore an implicit group size once a
//! specific (non-default) device is targeted. The total work-item count is
//! the problem domain rounded up to the next multiple of the group size,
//! because drivers reject grids whose total is not such a multiple.

use gpubench_common::{BenchError, Result};
use std::fmt;

use crate::device::Device;

/// Launch configuration of a one-dimensional dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionGrid {
    pub total_work_items: usize,
    pub group_size: usize,
}

impl ExecutionGrid {
    /// Build a grid, rejecting shapes a driver would refuse.
    pub fn new(total_work_items: usize, group_size: usize) -> Result<Self> {
        let grid = Self { total_work_items, group_size };
        grid.check_shape()?;
        Ok(grid)
    }

    /// Number of work-groups in the grid.
    pub fn work_groups(&self) -> usize {
        self.total_work_items.checked_div(self.group_size).unwrap_or(0)
    }

    /// Ratio of useful work-items to dispatched work-items, in `(0.0, 1.0]`.
    pub fn efficiency(&self, domain_size: usize) -> f64 {
        if self.total_work_items == 0 {
            return 1.0;
        }
        domain_size.min(self.total_work_items) as f64 / self.total_work_items as f64
    }

    pub(crate) fn check_shape(&self) -> Result<()> {
        if self.group_size == 0 {
            return Err(BenchError::InvalidGrid("group size must be > 0".into()));
        }
        if self.total_work_items % self.group_size != 0 {
            return Err(BenchError::InvalidGrid(format!(
                "total work-items {} is not a multiple of group size {}",
                self.total_work_items, self.group_size
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ExecutionGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} items / {} per group", self.total_work_items, self.group_size)
    }
}

/// Round `value` up to the next multiple of `multiple`.
#[inline]
fn round_up(value: usize, multiple: usize) -> Option<usize> {
    value.div_ceil(multiple).checked_mul(multiple)
}

/// Plan a grid covering `domain_size` independent outputs on a device whose
/// maximum work-group size is `max_group_size`.
pub fn plan_grid(domain_size: usize, max_group_size: usize) -> Result<ExecutionGrid> {
    if max_group_size == 0 {
        return Err(BenchError::InvalidGrid("device maximum group size is 0".into()));
    }
    let total = round_up(domain_size, max_group_size).ok_or_else(|| {
        BenchError::InvalidGrid(format!(
            "domain of {domain_size} work-items overflows when rounded to groups of {max_group_size}"
        ))
    })?;
    Ok(ExecutionGrid { total_work_items: total, group_size: max_group_size })
}

/// Query `device` for its maximum group size and plan a grid for it.
pub fn plan_for_device(device: &Device, domain_size: usize) -> Result<ExecutionGrid> {
    let grid = plan_grid(domain_size, device.max_work_group_size()?)?;
    tracing::trace!(
        device = %device.name(),
        domain_size,
        total_work_items = grid.total_work_items,
        group_size = grid.group_size,
        "planned execution grid"
    );
    Ok(grid)
}
