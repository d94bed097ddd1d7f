//! Matrix multiplication benchmark over `i8` matrices.

use std::time::Duration;

use gpubench_common::{BenchError, BenchmarkKind, CancelToken, MatrixConfig, Result};
use gpubench_kernels::{Device, DeviceRegistry, MatMulDims, MatMulKernel, fill_matrices};

use super::{already_initialized, buffer_len, fnv1a, seeded_rng, timed_dispatch, zeroed_buffer};
use crate::measurement::Measurement;
use crate::params::{BenchmarkParams, RunOptions};

const KIND: BenchmarkKind = BenchmarkKind::MatrixMultiplication;

/// Problem size of the warm-up pass.
pub const WARM_UP_DIMS: MatMulDims = MatMulDims { r1: 100, k: 100, c2: 100 };

#[derive(Debug)]
struct MatrixState {
    device: Device,
    dims: MatMulDims,
    a: Vec<i8>,
    b: Vec<i8>,
    res: Vec<i8>,
}

/// Multiplies `A (r1 × k)` by `B (k × c2)` with one work-item per output cell.
#[derive(Debug)]
pub struct MatrixMultBenchmark {
    standard: MatrixConfig,
    seed: Option<u64>,
    cancel: CancelToken,
    state: Option<MatrixState>,
}

impl MatrixMultBenchmark {
    pub fn new(standard: MatrixConfig, seed: Option<u64>, cancel: CancelToken) -> Self {
        Self { standard, seed, cancel, state: None }
    }

    pub fn initialize(&mut self, params: &BenchmarkParams, registry: &DeviceRegistry) -> Result<()> {
        if self.state.is_some() {
            return Err(already_initialized(KIND));
        }
        let device = registry.resolve(&params.device)?;
        let standard = [self.standard.r1, self.standard.k, self.standard.c2];
        let [r1, k, c2] = params.resolve_dims(KIND, standard);
        let dims = MatMulDims::new(r1, k, c2);
        let mut a = zeroed_buffer::<i8>(KIND, buffer_len(KIND, r1, k)?)?;
        let mut b = zeroed_buffer::<i8>(KIND, buffer_len(KIND, k, c2)?)?;
        let res = zeroed_buffer::<i8>(KIND, buffer_len(KIND, r1, c2)?)?;
        fill_matrices(&mut seeded_rng(self.seed), &mut a, &mut b);

        tracing::info!(device = %device.name(), r1, k, c2, "matrix benchmark initialized");
        self.state = Some(MatrixState { device, dims, a, b, res });
        Ok(())
    }

    pub fn warm_up(&mut self) -> Result<()> {
        let state = self.state.as_ref().ok_or(BenchError::NotInitialized(KIND.display_name()))?;
        let dims = WARM_UP_DIMS;
        let mut a = vec![0i8; dims.a_len()];
        let mut b = vec![0i8; dims.b_len()];
        let mut res = vec![0i8; dims.result_len()];
        fill_matrices(&mut seeded_rng(self.seed), &mut a, &mut b);
        let elapsed = timed_dispatch(
            &state.device,
            &MatMulKernel::new(&a, &b, dims),
            &mut res,
            &self.cancel,
        )?;
        tracing::debug!(elapsed_us = elapsed.as_micros() as u64, "matrix warm-up complete");
        Ok(())
    }

    pub fn run(&mut self) -> Result<Measurement> {
        self.run_repeated(1)
    }

    pub fn run_with(&mut self, options: &RunOptions) -> Result<Measurement> {
        options.validate_for(KIND)?;
        match options {
            RunOptions::Matrix { repetitions } => self.run_repeated(*repetitions),
            _ => self.run(),
        }
    }

    fn run_repeated(&mut self, repetitions: usize) -> Result<Measurement> {
        let MatrixState { device, dims, a, b, res } =
            self.state.as_mut().ok_or(BenchError::NotInitialized(KIND.display_name()))?;
        self.cancel.check()?;
        let kernel = MatMulKernel::new(a.as_slice(), b.as_slice(), *dims);
        let mut elapsed = Duration::ZERO;
        for _ in 0..repetitions {
            // The kernel accumulates into the output cell.
            res.fill(0);
            elapsed += timed_dispatch(device, &kernel, res.as_mut_slice(), &self.cancel)?;
        }
        Ok(Measurement::throughput(elapsed, dims.mac_ops() * repetitions as u64, "MMAC/s"))
    }

    /// Replace the seeded inputs with caller-supplied matrices of the
    /// initialized dimensions.
    pub fn load_inputs(&mut self, a: &[i8], b: &[i8]) -> Result<()> {
        let state = self.state.as_mut().ok_or(BenchError::NotInitialized(KIND.display_name()))?;
        if a.len() != state.a.len() || b.len() != state.b.len() {
            return Err(BenchError::Config(format!(
                "inputs of {} and {} elements do not match {}×{} · {}×{}",
                a.len(),
                b.len(),
                state.dims.r1,
                state.dims.k,
                state.dims.k,
                state.dims.c2
            )));
        }
        state.a.copy_from_slice(a);
        state.b.copy_from_slice(b);
        Ok(())
    }

    pub fn dims(&self) -> Option<MatMulDims> {
        self.state.as_ref().map(|s| s.dims)
    }

    /// Output of the most recent run, row-major `r1 × c2`.
    pub fn result(&self) -> Option<&[i8]> {
        self.state.as_ref().map(|s| s.res.as_slice())
    }

    /// Hash of both input matrices.
    pub fn input_checksum(&self) -> Option<u64> {
        self.state
            .as_ref()
            .map(|s| fnv1a(s.a.iter().chain(&s.b).map(|&v| v as u8)))
    }

    pub fn device(&self) -> Option<&Device> {
        self.state.as_ref().map(|s| &s.device)
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpubench_common::ErrorCategory;
    use gpubench_kernels::reference_matmul;

    fn registry() -> DeviceRegistry {
        DeviceRegistry::from_devices(vec![Device::host("Mock GPU", 4, Some(2)).unwrap()])
    }

    fn bench() -> MatrixMultBenchmark {
        MatrixMultBenchmark::new(MatrixConfig { r1: 6, k: 5, c2: 7 }, Some(11), CancelToken::new())
    }

    #[test]
    fn run_before_initialize_is_a_configuration_error() {
        let err = bench().run().unwrap_err();
        assert!(matches!(err, BenchError::NotInitialized(_)));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn second_initialize_is_rejected() {
        let mut b = bench();
        b.initialize(&BenchmarkParams::new("Mock GPU"), &registry()).unwrap();
        assert!(b.initialize(&BenchmarkParams::new("Mock GPU"), &registry()).is_err());
    }

    #[test]
    fn known_small_product() {
        let mut b = bench();
        let params = BenchmarkParams::new("Mock GPU").with_dims(vec![4, 3, 2]);
        b.initialize(&params, &registry()).unwrap();
        b.load_inputs(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 1, 0, -1], &[1, 2, 3, 4, 5, 6]).unwrap();
        let m = b.run().unwrap();
        assert_eq!(b.result().unwrap(), &[22, 28, 49, 64, 76, 100, -4, -4]);
        assert_eq!(m.work_units, 24);
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let mut b = bench();
        b.initialize(&BenchmarkParams::new("Mock GPU"), &registry()).unwrap();
        b.run().unwrap();
        let first = b.result().unwrap().to_vec();
        b.run_with(&RunOptions::Matrix { repetitions: 3 }).unwrap();
        assert_eq!(b.result().unwrap(), first.as_slice());
    }

    #[test]
    fn result_matches_reference() {
        let mut b = bench();
        b.initialize(&BenchmarkParams::new("Mock GPU"), &registry()).unwrap();
        let dims = b.dims().unwrap();
        let state = b.state.as_ref().unwrap();
        let expected = reference_matmul(&state.a, &state.b, dims);
        b.run().unwrap();
        assert_eq!(b.result().unwrap(), expected.as_slice());
    }

    #[test]
    fn warm_up_leaves_inputs_untouched() {
        let mut b = bench();
        b.initialize(&BenchmarkParams::new("Mock GPU"), &registry()).unwrap();
        let before = b.input_checksum();
        b.warm_up().unwrap();
        assert_eq!(b.input_checksum(), before);
        assert!(b.result().unwrap().iter().all(|&v| v == 0));
    }

    #[test]
    fn load_inputs_checks_lengths() {
        let mut b = bench();
        b.initialize(&BenchmarkParams::new("Mock GPU"), &registry()).unwrap();
        assert!(b.load_inputs(&[1, 2], &[3]).is_err());
    }

    #[test]
    fn cancelled_run_reports_cancellation() {
        let mut b = bench();
        b.initialize(&BenchmarkParams::new("Mock GPU"), &registry()).unwrap();
        b.cancel_token().cancel();
        assert!(matches!(b.run(), Err(BenchError::Cancelled)));
    }
}
