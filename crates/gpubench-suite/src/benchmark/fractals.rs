//! Mandelbrot rendering benchmark.

use gpubench_common::{BenchError, BenchmarkKind, CancelToken, FractalConfig, Result};
use gpubench_kernels::{Device, DeviceRegistry, MandelbrotKernel};

use super::{already_initialized, buffer_len, timed_dispatch, zeroed_buffer};
use crate::measurement::Measurement;
use crate::params::{BenchmarkParams, RunOptions};

const KIND: BenchmarkKind = BenchmarkKind::Fractals;

/// Image size of the warm-up pass.
pub const WARM_UP_SIZE: (usize, usize) = (64, 64);

#[derive(Debug)]
struct FractalState {
    device: Device,
    width: usize,
    height: usize,
    image: Vec<u32>,
}

/// Renders an escape-time Mandelbrot image; scored on iterations per second.
#[derive(Debug)]
pub struct FractalBenchmark {
    standard: FractalConfig,
    cancel: CancelToken,
    state: Option<FractalState>,
}

impl FractalBenchmark {
    pub fn new(standard: FractalConfig, cancel: CancelToken) -> Self {
        Self { standard, cancel, state: None }
    }

    pub fn initialize(&mut self, params: &BenchmarkParams, registry: &DeviceRegistry) -> Result<()> {
        if self.state.is_some() {
            return Err(already_initialized(KIND));
        }
        let device = registry.resolve(&params.device)?;
        let [width, height] =
            params.resolve_dims(KIND, [self.standard.width, self.standard.height]);
        let image = zeroed_buffer::<u32>(KIND, buffer_len(KIND, width, height)?)?;
        tracing::info!(
            device = %device.name(),
            width,
            height,
            max_iterations = self.standard.max_iterations,
            "fractal benchmark initialized"
        );
        self.state = Some(FractalState { device, width, height, image });
        Ok(())
    }

    pub fn warm_up(&mut self) -> Result<()> {
        let state = self.state.as_ref().ok_or(BenchError::NotInitialized(KIND.display_name()))?;
        let (width, height) = WARM_UP_SIZE;
        let kernel =
            MandelbrotKernel::new(width, height, self.standard.zoom, self.standard.max_iterations);
        let mut image = vec![0u32; width * height];
        let elapsed = timed_dispatch(&state.device, &kernel, image.as_mut_slice(), &self.cancel)?;
        tracing::debug!(elapsed_us = elapsed.as_micros() as u64, "fractal warm-up complete");
        Ok(())
    }

    pub fn run(&mut self) -> Result<Measurement> {
        self.render(self.standard.zoom)
    }

    pub fn run_with(&mut self, options: &RunOptions) -> Result<Measurement> {
        options.validate_for(KIND)?;
        match options {
            RunOptions::Fractal { zoom } => self.render(*zoom),
            _ => self.run(),
        }
    }

    fn render(&mut self, zoom: f64) -> Result<Measurement> {
        let FractalState { device, width, height, image } =
            self.state.as_mut().ok_or(BenchError::NotInitialized(KIND.display_name()))?;
        self.cancel.check()?;
        let kernel = MandelbrotKernel::new(*width, *height, zoom, self.standard.max_iterations);
        let elapsed = timed_dispatch(device, &kernel, image.as_mut_slice(), &self.cancel)?;
        let iterations: u64 = image.iter().map(|&n| u64::from(n)).sum();
        tracing::debug!(zoom, iterations, "fractal render complete");
        Ok(Measurement::throughput(elapsed, iterations, "Miter/s"))
    }

    /// Escape counts of the most recent render, row-major.
    pub fn image(&self) -> Option<&[u32]> {
        self.state.as_ref().map(|s| s.image.as_slice())
    }

    pub fn device(&self) -> Option<&Device> {
        self.state.as_ref().map(|s| &s.device)
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}
