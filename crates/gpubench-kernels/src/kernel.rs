//! The per-work-item kernel contract.

/// Identity of one work-item within a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    /// Index across the whole grid, `0..total_work_items`.
    pub global_id: usize,
    /// Index within the work-group, `0..group_size`.
    pub local_id: usize,
    pub group_id: usize,
}

/// A unit of data-parallel work: a function of the global work-item index.
///
/// The device hands each work-group the slice of the output buffer it owns
/// (`group_out[local_id]` is the cell of `global_id`). The final group's
/// slice may be shorter than the group size and padding groups receive an
/// empty slice, so implementations must not touch `group_out` for
/// `global_id >= domain_size()`.
pub trait ComputeKernel: Sync {
    type Elem: Send;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Number of output cells the kernel produces.
    fn domain_size(&self) -> usize;

    fn execute(&self, item: WorkItem, group_out: &mut [Self::Elem]);
}
