//! Drives the benchmark lifecycle off the caller's thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use gpubench_common::{BenchConfig, BenchError, BenchmarkKind, CancelToken, Result};
use gpubench_kernels::DeviceRegistry;
use gpubench_recorder::{BenchResult, current_user};

use crate::benchmark::Benchmark;
use crate::measurement::Measurement;
use crate::params::{BenchmarkParams, RunOptions};

/// Name given to the worker thread started by [`BenchmarkRunner::spawn`].
pub const RUNNER_THREAD_NAME: &str = "gpubench-runner";

/// What to run, where, and how.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub kind: BenchmarkKind,
    pub params: BenchmarkParams,
    pub options: RunOptions,
}

impl RunRequest {
    pub fn new(kind: BenchmarkKind, params: BenchmarkParams) -> Self {
        Self { kind, params, options: RunOptions::Default }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub result: BenchResult,
    pub measurement: Measurement,
}

/// Runs benchmarks against a fixed device registry and configuration.
#[derive(Debug, Clone)]
pub struct BenchmarkRunner {
    registry: Arc<DeviceRegistry>,
    config: Arc<BenchConfig>,
}

impl BenchmarkRunner {
    pub fn new(registry: DeviceRegistry, config: BenchConfig) -> Self {
        Self { registry: Arc::new(registry), config: Arc::new(config) }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Run `request` to completion on the calling thread.
    pub fn execute(&self, request: &RunRequest) -> Result<RunReport> {
        self.execute_with(request, &CancelToken::new())
    }

    /// Run `request` on the calling thread, observing `cancel` between and
    /// during lifecycle stages.
    pub fn execute_with(&self, request: &RunRequest, cancel: &CancelToken) -> Result<RunReport> {
        let span = tracing::info_span!(
            "benchmark",
            kind = %request.kind,
            device = %request.params.device
        );
        let _enter = span.enter();

        request.options.validate_for(request.kind)?;
        let mut bench = Benchmark::with_cancel(request.kind, &self.config, cancel.clone());
        bench.initialize(&request.params, &self.registry)?;

        if self.config.runner.warm_up {
            cancel.check()?;
            bench.warm_up()?;
        }
        cancel.check()?;
        let measurement = bench.run_with(&request.options)?;

        let device = bench
            .device()
            .map(|d| d.name().to_owned())
            .unwrap_or_else(|| request.params.device.clone());
        let result =
            BenchResult::new(current_user(), device, request.kind.display_name(), measurement.score);
        tracing::info!(
            score = measurement.score,
            unit = measurement.unit,
            elapsed_ms = measurement.elapsed_ms(),
            "benchmark complete"
        );
        Ok(RunReport { result, measurement })
    }

    /// Run `request` on a dedicated worker thread.
    pub fn spawn(&self, request: RunRequest) -> Result<RunHandle> {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let runner = self.clone();
        let handle = thread::Builder::new()
            .name(RUNNER_THREAD_NAME.into())
            .spawn(move || runner.execute_with(&request, &token))
            .map_err(|e| BenchError::Dispatch(format!("failed to start runner thread: {e}")))?;
        Ok(RunHandle { cancel, handle })
    }
}

/// A run in progress on a worker thread.
#[derive(Debug)]
pub struct RunHandle {
    cancel: CancelToken,
    handle: JoinHandle<Result<RunReport>>,
}

impl RunHandle {
    /// Request cooperative termination; the run ends with
    /// [`BenchError::Cancelled`] at the next check point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the run ends.
    pub fn wait(self) -> Result<RunReport> {
        self.handle
            .join()
            .map_err(|_| BenchError::Dispatch("runner thread panicked".into()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpubench_kernels::Device;

    fn runner() -> BenchmarkRunner {
        let mut config = BenchConfig::default();
        config.runner.seed = Some(9);
        config.matrix.r1 = 16;
        config.matrix.k = 16;
        config.matrix.c2 = 16;
        let registry =
            DeviceRegistry::from_devices(vec![Device::host("Mock GPU", 8, Some(2)).unwrap()]);
        BenchmarkRunner::new(registry, config)
    }

    #[test]
    fn execute_builds_a_result() {
        let request = RunRequest::new(
            BenchmarkKind::MatrixMultiplication,
            BenchmarkParams::new("mock gpu"),
        );
        let report = runner().execute(&request).unwrap();
        assert_eq!(report.result.device, "Mock GPU");
        assert_eq!(report.result.benchmark, "Matrix Multiplication Benchmark");
        assert_eq!(report.result.score, report.measurement.score);
        assert_eq!(report.measurement.work_units, 16 * 16 * 16);
    }

    #[test]
    fn unknown_device_fails_before_running() {
        let request =
            RunRequest::new(BenchmarkKind::Fractals, BenchmarkParams::new("Nonexistent"));
        assert!(matches!(runner().execute(&request), Err(BenchError::DeviceNotFound(_))));
    }

    #[test]
    fn mismatched_options_are_rejected_up_front() {
        let request = RunRequest::new(BenchmarkKind::Trigonometry, BenchmarkParams::new("Mock GPU"))
            .with_options(RunOptions::Matrix { repetitions: 2 });
        assert!(matches!(runner().execute(&request), Err(BenchError::Config(_))));
    }

    #[test]
    fn pre_cancelled_run_stops() {
        let request =
            RunRequest::new(BenchmarkKind::MatrixMultiplication, BenchmarkParams::new("Mock GPU"));
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(runner().execute_with(&request, &cancel), Err(BenchError::Cancelled)));
    }

    #[test]
    fn spawned_run_completes() {
        let request =
            RunRequest::new(BenchmarkKind::MatrixMultiplication, BenchmarkParams::new("Mock GPU"));
        let handle = runner().spawn(request).unwrap();
        let report = handle.wait().unwrap();
        assert!(report.measurement.score >= 0.0);
    }
}
