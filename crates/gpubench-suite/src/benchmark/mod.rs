//! The benchmark variants and their shared lifecycle.

mod fractals;
mod matrix;
mod standard;
mod transfer;
mod trig;

pub use fractals::FractalBenchmark;
pub use matrix::MatrixMultBenchmark;
pub use standard::StandardBenchmark;
pub use transfer::DataTransferBenchmark;
pub use trig::TrigonometryBenchmark;

use std::time::{Duration, Instant};

use gpubench_common::{BenchConfig, BenchError, BenchmarkKind, CancelToken, Result};
use gpubench_kernels::{ComputeKernel, Device, DeviceRegistry, work_size::plan_for_device};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::measurement::Measurement;
use crate::params::{BenchmarkParams, RunOptions};

/// A benchmark of one of the five kinds.
#[derive(Debug)]
pub enum Benchmark {
    Standard(StandardBenchmark),
    DataTransfer(DataTransferBenchmark),
    Trigonometry(TrigonometryBenchmark),
    MatrixMultiplication(MatrixMultBenchmark),
    Fractals(FractalBenchmark),
}

macro_rules! each_variant {
    ($self:expr, $b:ident => $body:expr) => {
        match $self {
            Benchmark::Standard($b) => $body,
            Benchmark::DataTransfer($b) => $body,
            Benchmark::Trigonometry($b) => $body,
            Benchmark::MatrixMultiplication($b) => $body,
            Benchmark::Fractals($b) => $body,
        }
    };
}

impl Benchmark {
    /// Create an uninitialized benchmark of `kind` with its own cancel token.
    pub fn new(kind: BenchmarkKind, config: &BenchConfig) -> Self {
        Self::with_cancel(kind, config, CancelToken::new())
    }

    /// Create an uninitialized benchmark that observes `cancel`.
    pub fn with_cancel(kind: BenchmarkKind, config: &BenchConfig, cancel: CancelToken) -> Self {
        let seed = config.runner.seed;
        match kind {
            BenchmarkKind::Standard => Self::Standard(StandardBenchmark::new(config.clone(), cancel)),
            BenchmarkKind::DataTransfer => {
                Self::DataTransfer(DataTransferBenchmark::new(config.transfer.clone(), seed, cancel))
            }
            BenchmarkKind::Trigonometry => Self::Trigonometry(TrigonometryBenchmark::new(
                config.trigonometry.clone(),
                seed,
                cancel,
            )),
            BenchmarkKind::MatrixMultiplication => Self::MatrixMultiplication(
                MatrixMultBenchmark::new(config.matrix.clone(), seed, cancel),
            ),
            BenchmarkKind::Fractals => {
                Self::Fractals(FractalBenchmark::new(config.fractals.clone(), cancel))
            }
        }
    }

    pub fn kind(&self) -> BenchmarkKind {
        match self {
            Self::Standard(_) => BenchmarkKind::Standard,
            Self::DataTransfer(_) => BenchmarkKind::DataTransfer,
            Self::Trigonometry(_) => BenchmarkKind::Trigonometry,
            Self::MatrixMultiplication(_) => BenchmarkKind::MatrixMultiplication,
            Self::Fractals(_) => BenchmarkKind::Fractals,
        }
    }

    /// Resolve the device, allocate and seed the working buffers.
    ///
    /// Must be called exactly once, before any other lifecycle operation.
    pub fn initialize(&mut self, params: &BenchmarkParams, registry: &DeviceRegistry) -> Result<()> {
        each_variant!(self, b => b.initialize(params, registry))
    }

    /// Run a small fixed-size instance on scratch buffers.
    pub fn warm_up(&mut self) -> Result<()> {
        each_variant!(self, b => b.warm_up())
    }

    /// Execute and time the configured problem.
    pub fn run(&mut self) -> Result<Measurement> {
        each_variant!(self, b => b.run())
    }

    /// Execute with alternate options; options for another kind are a
    /// configuration error.
    pub fn run_with(&mut self, options: &RunOptions) -> Result<Measurement> {
        each_variant!(self, b => b.run_with(options))
    }

    /// Request cooperative termination of any in-flight or future run.
    pub fn cancel(&self) {
        self.cancel_token().cancel();
    }

    /// A clone of the token observed by this benchmark.
    pub fn cancel_token(&self) -> CancelToken {
        each_variant!(self, b => b.cancel_token())
    }

    /// The device chosen by `initialize`.
    pub fn device(&self) -> Option<&Device> {
        each_variant!(self, b => b.device())
    }

    pub fn is_initialized(&self) -> bool {
        self.device().is_some()
    }
}

/// Per-variant RNG: reproducible when `seed` is set, otherwise fresh entropy.
pub(crate) fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}

/// Plan a grid for `kernel` on `device`, dispatch it and time the dispatch.
pub(crate) fn timed_dispatch<K: ComputeKernel>(
    device: &Device,
    kernel: &K,
    output: &mut [K::Elem],
    cancel: &CancelToken,
) -> Result<Duration> {
    let grid = plan_for_device(device, kernel.domain_size())?;
    let start = Instant::now();
    device.dispatch(grid, kernel, output, cancel)?;
    Ok(start.elapsed())
}

/// `a * b` as a buffer length, rejecting sizes that overflow.
pub(crate) fn buffer_len(kind: BenchmarkKind, a: usize, b: usize) -> Result<usize> {
    a.checked_mul(b).ok_or_else(|| {
        BenchError::Config(format!("{kind} problem size {a} × {b} is too large to allocate"))
    })
}

/// A zeroed buffer of `len` elements; sizes the host cannot allocate are a
/// configuration error.
pub(crate) fn zeroed_buffer<T: Clone + Default>(kind: BenchmarkKind, len: usize) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|e| {
        BenchError::Config(format!("{kind} buffer of {len} elements cannot be allocated: {e}"))
    })?;
    buffer.resize(len, T::default());
    Ok(buffer)
}

/// FNV-1a over a byte stream.
pub(crate) fn fnv1a(bytes: impl IntoIterator<Item = u8>) -> u64 {
    bytes.into_iter().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

pub(crate) fn already_initialized(kind: BenchmarkKind) -> BenchError {
    BenchError::Config(format!("{kind} is already initialized"))
}
