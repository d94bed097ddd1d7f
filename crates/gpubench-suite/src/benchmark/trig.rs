//! Trigonometric throughput benchmark.

use std::f32::consts::PI;

use gpubench_common::{BenchError, BenchmarkKind, CancelToken, Result, TrigonometryConfig};
use gpubench_kernels::{Device, DeviceRegistry, TrigFunction, TrigKernel};
use rand::Rng;

use super::{already_initialized, fnv1a, seeded_rng, timed_dispatch, zeroed_buffer};
use crate::measurement::Measurement;
use crate::params::{BenchmarkParams, RunOptions};

const KIND: BenchmarkKind = BenchmarkKind::Trigonometry;

/// Elements evaluated by the warm-up pass.
pub const WARM_UP_ELEMENTS: usize = 4096;

fn random_angles(seed: Option<u64>, elements: usize) -> Result<Vec<f32>> {
    let mut angles = zeroed_buffer::<f32>(KIND, elements)?;
    let mut rng = seeded_rng(seed);
    angles.iter_mut().for_each(|x| *x = rng.random_range(-PI..PI));
    Ok(angles)
}

#[derive(Debug)]
struct TrigState {
    device: Device,
    input: Vec<f32>,
    output: Vec<f32>,
}

/// Applies a trigonometric function repeatedly to every element.
#[derive(Debug)]
pub struct TrigonometryBenchmark {
    standard: TrigonometryConfig,
    seed: Option<u64>,
    cancel: CancelToken,
    state: Option<TrigState>,
}

impl TrigonometryBenchmark {
    pub fn new(standard: TrigonometryConfig, seed: Option<u64>, cancel: CancelToken) -> Self {
        Self { standard, seed, cancel, state: None }
    }

    pub fn initialize(&mut self, params: &BenchmarkParams, registry: &DeviceRegistry) -> Result<()> {
        if self.state.is_some() {
            return Err(already_initialized(KIND));
        }
        let device = registry.resolve(&params.device)?;
        let [elements] = params.resolve_dims(KIND, [self.standard.elements]);
        let input = random_angles(self.seed, elements)?;
        let output = zeroed_buffer::<f32>(KIND, elements)?;
        tracing::info!(
            device = %device.name(),
            elements,
            iterations = self.standard.iterations,
            "trigonometry benchmark initialized"
        );
        self.state = Some(TrigState { device, input, output });
        Ok(())
    }

    pub fn warm_up(&mut self) -> Result<()> {
        let state = self.state.as_ref().ok_or(BenchError::NotInitialized(KIND.display_name()))?;
        let input = random_angles(self.seed, WARM_UP_ELEMENTS)?;
        let mut output = vec![0.0f32; WARM_UP_ELEMENTS];
        let kernel = TrigKernel {
            input: &input,
            function: TrigFunction::default(),
            iterations: self.standard.iterations,
        };
        let elapsed = timed_dispatch(&state.device, &kernel, output.as_mut_slice(), &self.cancel)?;
        tracing::debug!(elapsed_us = elapsed.as_micros() as u64, "trigonometry warm-up complete");
        Ok(())
    }

    pub fn run(&mut self) -> Result<Measurement> {
        self.run_function(TrigFunction::default())
    }

    pub fn run_with(&mut self, options: &RunOptions) -> Result<Measurement> {
        options.validate_for(KIND)?;
        match options {
            RunOptions::Trig { function } => self.run_function(*function),
            _ => self.run(),
        }
    }

    fn run_function(&mut self, function: TrigFunction) -> Result<Measurement> {
        let TrigState { device, input, output } =
            self.state.as_mut().ok_or(BenchError::NotInitialized(KIND.display_name()))?;
        self.cancel.check()?;
        let iterations = self.standard.iterations;
        let kernel = TrigKernel { input: input.as_slice(), function, iterations };
        let elapsed = timed_dispatch(device, &kernel, output.as_mut_slice(), &self.cancel)?;
        tracing::debug!(function = %function, "trigonometry run complete");
        let ops = input.len() as u64 * iterations as u64;
        Ok(Measurement::throughput(elapsed, ops, "Mop/s"))
    }

    /// Output of the most recent run.
    pub fn output(&self) -> Option<&[f32]> {
        self.state.as_ref().map(|s| s.output.as_slice())
    }

    /// Hash of the input angles.
    pub fn input_checksum(&self) -> Option<u64> {
        self.state
            .as_ref()
            .map(|s| fnv1a(s.input.iter().flat_map(|x| x.to_bits().to_le_bytes())))
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

    fn registry() -> DeviceRegistry {
        DeviceRegistry::from_devices(vec![Device::host("Mock GPU", 32, Some(2)).unwrap()])
    }

    fn bench() -> TrigonometryBenchmark {
        TrigonometryBenchmark::new(
            TrigonometryConfig { elements: 100, iterations: 1 },
            Some(5),
            CancelToken::new(),
        )
    }

    #[test]
    fn inputs_are_within_one_period() {
        let mut b = bench();
        b.initialize(&BenchmarkParams::new("Mock GPU"), &registry()).unwrap();
        let state = b.state.as_ref().unwrap();
        assert!(state.input.iter().all(|x| (-PI..PI).contains(x)));
    }

    #[test]
    fn output_applies_selected_function() {
        let mut b = bench();
        b.initialize(&BenchmarkParams::new("Mock GPU"), &registry()).unwrap();
        b.run_with(&RunOptions::Trig { function: TrigFunction::Cos }).unwrap();
        let state = b.state.as_ref().unwrap();
        for (x, y) in state.input.iter().zip(b.output().unwrap()) {
            assert!((x.cos() - y).abs() < 1e-6);
        }
    }

    #[test]
    fn element_override_resizes_buffers() {
        let mut b = bench();
        let params = BenchmarkParams::new("Mock GPU").with_dims(vec![33]);
        b.initialize(&params, &registry()).unwrap();
        let m = b.run().unwrap();
        assert_eq!(m.work_units, 33);
        assert_eq!(b.output().unwrap().len(), 33);
    }

    #[test]
    fn unallocatable_override_is_a_configuration_error() {
        let mut b = bench();
        let params = BenchmarkParams::new("Mock GPU").with_dims(vec![usize::MAX]);
        let err = b.initialize(&params, &registry()).unwrap_err();
        assert!(matches!(err, BenchError::Config(_)), "{err}");
        assert!(b.device().is_none());
    }

    #[test]
    fn warm_up_keeps_inputs() {
        let mut b = bench();
        b.initialize(&BenchmarkParams::new("Mock GPU"), &registry()).unwrap();
        let before = b.input_checksum();
        b.warm_up().unwrap();
        assert_eq!(b.input_checksum(), before);
        assert!(b.output().unwrap().iter().all(|&y| y == 0.0));
    }
}
