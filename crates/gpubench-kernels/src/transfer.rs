//! Device-side half of the data-transfer benchmark.

use crate::kernel::{ComputeKernel, WorkItem};

/// Copies every source word into the output buffer.
#[derive(Debug, Clone, Copy)]
pub struct CopyKernel<'a> {
    pub src: &'a [u32],
}

impl ComputeKernel for CopyKernel<'_> {
    type Elem = u32;

    fn name(&self) -> &'static str {
        "copy_u32"
    }

    fn domain_size(&self) -> usize {
        self.src.len()
    }

    fn execute(&self, item: WorkItem, group_out: &mut [u32]) {
        if let Some(&word) = self.src.get(item.global_id) {
            group_out[item.local_id] = word;
        }
    }
}
