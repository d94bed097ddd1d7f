//! Compute kernels and device dispatch for gpubench
//!
//! A [`Device`] executes a [`ComputeKernel`] over an [`ExecutionGrid`]
//! produced by the grid planner in [`work_size`]. Kernels are explicit
//! descriptors: every buffer and dimension they touch is a field, so
//! ownership and aliasing stay visible at the call site.

pub mod device;
pub mod fractal;
pub mod kernel;
pub mod matmul;
pub mod transfer;
pub mod trig;
pub mod work_size;

pub use device::{Device, DeviceInfo, DeviceRegistry, HOST_DEVICE_NAME, host_parallelism};
pub use fractal::MandelbrotKernel;
pub use kernel::{ComputeKernel, WorkItem};
pub use matmul::{MatMulDims, MatMulKernel, fill_matrices, reference_matmul};
pub use transfer::CopyKernel;
pub use trig::{TrigFunction, TrigKernel};
pub use work_size::{ExecutionGrid, plan_grid};
