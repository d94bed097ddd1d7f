//! Benchmark variants and orchestration for gpubench
//!
//! [`Benchmark`] is a tagged variant over the five benchmark kinds. Every
//! variant follows the same lifecycle:
//!
//! 1. [`Benchmark::initialize`] resolves the device and allocates and seeds
//!    the buffers for the configured problem size (exactly once),
//! 2. [`Benchmark::warm_up`] runs a small fixed-size instance on scratch
//!    buffers,
//! 3. [`Benchmark::run`] / [`Benchmark::run_with`] execute and time the
//!    configured problem (repeatable),
//! 4. [`Benchmark::cancel`] requests cooperative early termination and may
//!    be called from another thread through a [`CancelToken`] clone.
//!
//! [`BenchmarkRunner`] drives that lifecycle on a worker thread and produces
//! a [`BenchResult`](gpubench_recorder::BenchResult).
//!
//! [`CancelToken`]: gpubench_common::CancelToken

pub mod benchmark;
pub mod measurement;
pub mod params;
pub mod runner;

pub use benchmark::{
    Benchmark, DataTransferBenchmark, FractalBenchmark, MatrixMultBenchmark, StandardBenchmark,
    TrigonometryBenchmark,
};
pub use measurement::Measurement;
pub use params::{BenchmarkParams, RunOptions};
pub use runner::{BenchmarkRunner, RunHandle, RunReport, RunRequest};
