//! Composite benchmark over the other four kinds.

use gpubench_common::{BenchConfig, BenchError, BenchmarkKind, CancelToken, Result};
use gpubench_kernels::{Device, DeviceRegistry};

use super::{Benchmark, already_initialized};
use crate::measurement::Measurement;
use crate::params::{BenchmarkParams, RunOptions};

const KIND: BenchmarkKind = BenchmarkKind::Standard;

/// Parts of the suite, in run order.
pub const PARTS: [BenchmarkKind; 4] = [
    BenchmarkKind::MatrixMultiplication,
    BenchmarkKind::Trigonometry,
    BenchmarkKind::DataTransfer,
    BenchmarkKind::Fractals,
];

#[derive(Debug)]
struct Suite {
    device: Device,
    parts: Vec<Benchmark>,
}

/// Runs each part at the `standard` sizes and scores the geometric mean of
/// their scores.
#[derive(Debug)]
pub struct StandardBenchmark {
    config: BenchConfig,
    cancel: CancelToken,
    suite: Option<Suite>,
}

impl StandardBenchmark {
    pub fn new(config: BenchConfig, cancel: CancelToken) -> Self {
        Self { config, cancel, suite: None }
    }

    fn part_dims(&self, kind: BenchmarkKind) -> Vec<usize> {
        let sizes = &self.config.standard;
        match kind {
            BenchmarkKind::MatrixMultiplication => vec![sizes.matrix_dim; 3],
            BenchmarkKind::Trigonometry => vec![sizes.elements],
            BenchmarkKind::DataTransfer => vec![sizes.bytes],
            BenchmarkKind::Fractals => vec![sizes.fractal_dim; 2],
            BenchmarkKind::Standard => Vec::new(),
        }
    }

    pub fn initialize(&mut self, params: &BenchmarkParams, registry: &DeviceRegistry) -> Result<()> {
        if self.suite.is_some() {
            return Err(already_initialized(KIND));
        }
        let device = registry.resolve(&params.device)?;
        if !params.dims.is_empty() {
            tracing::warn!(dims = ?params.dims, "standard benchmark takes no size overrides, ignoring");
        }
        let mut parts = Vec::with_capacity(PARTS.len());
        for kind in PARTS {
            let mut part = Benchmark::with_cancel(kind, &self.config, self.cancel.clone());
            let part_params = BenchmarkParams::new(device.name()).with_dims(self.part_dims(kind));
            part.initialize(&part_params, registry)?;
            parts.push(part);
        }
        tracing::info!(device = %device.name(), parts = parts.len(), "standard benchmark initialized");
        self.suite = Some(Suite { device, parts });
        Ok(())
    }

    pub fn warm_up(&mut self) -> Result<()> {
        let suite = self.suite.as_mut().ok_or(BenchError::NotInitialized(KIND.display_name()))?;
        suite.parts.iter_mut().try_for_each(Benchmark::warm_up)
    }

    pub fn run(&mut self) -> Result<Measurement> {
        self.run_parts(&PARTS)
    }

    pub fn run_with(&mut self, options: &RunOptions) -> Result<Measurement> {
        options.validate_for(KIND)?;
        match options {
            RunOptions::Suite { include } => self.run_parts(include),
            _ => self.run(),
        }
    }

    fn run_parts(&mut self, include: &[BenchmarkKind]) -> Result<Measurement> {
        let suite = self.suite.as_mut().ok_or(BenchError::NotInitialized(KIND.display_name()))?;
        let mut measurements = Vec::with_capacity(include.len());
        for part in suite.parts.iter_mut().filter(|p| include.contains(&p.kind())) {
            let m = part.run()?;
            tracing::info!(
                part = %part.kind(),
                score = m.score,
                unit = m.unit,
                elapsed_ms = m.elapsed_ms(),
                "standard part complete"
            );
            measurements.push(m);
        }
        Ok(Measurement::composite(&measurements))
    }

    pub fn device(&self) -> Option<&Device> {
        self.suite.as_ref().map(|s| &s.device)
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}
