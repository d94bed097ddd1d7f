//! Host/device data transfer benchmark.
//!
//! Each round trip uploads the host buffer into device memory, copies it on
//! the device with [`CopyKernel`] and reads the copy back.

use std::time::{Duration, Instant};

use gpubench_common::{BenchError, BenchmarkKind, CancelToken, Result, TransferConfig};
use gpubench_kernels::{CopyKernel, Device, DeviceRegistry};
use rand::Rng;

use super::{already_initialized, fnv1a, seeded_rng, timed_dispatch, zeroed_buffer};
use crate::measurement::Measurement;
use crate::params::{BenchmarkParams, RunOptions};

const KIND: BenchmarkKind = BenchmarkKind::DataTransfer;
const WORD: usize = size_of::<u32>();

/// Payload of the warm-up pass.
pub const WARM_UP_BYTES: usize = 64 * 1024;

#[derive(Debug)]
struct TransferState {
    device: Device,
    host: Vec<u32>,
    device_in: Vec<u32>,
    device_out: Vec<u32>,
    readback: Vec<u32>,
}

impl TransferState {
    fn new(device: Device, host: Vec<u32>) -> Result<Self> {
        let words = host.len();
        Ok(Self {
            device,
            host,
            device_in: zeroed_buffer(KIND, words)?,
            device_out: zeroed_buffer(KIND, words)?,
            readback: zeroed_buffer(KIND, words)?,
        })
    }

    fn bytes(&self) -> u64 {
        (self.host.len() * WORD) as u64
    }

    fn round_trips(&mut self, count: usize, cancel: &CancelToken) -> Result<Duration> {
        let mut elapsed = Duration::ZERO;
        for _ in 0..count {
            cancel.check()?;
            let start = Instant::now();
            self.device_in.copy_from_slice(&self.host);
            timed_dispatch(
                &self.device,
                &CopyKernel { src: &self.device_in },
                self.device_out.as_mut_slice(),
                cancel,
            )?;
            self.readback.copy_from_slice(&self.device_out);
            elapsed += start.elapsed();
        }
        if count > 0 && self.readback != self.host {
            return Err(BenchError::Dispatch(
                "read-back buffer does not match the uploaded data".into(),
            ));
        }
        Ok(elapsed)
    }
}

fn random_words(seed: Option<u64>, bytes: usize) -> Result<Vec<u32>> {
    let mut words = zeroed_buffer::<u32>(KIND, bytes.div_ceil(WORD))?;
    seeded_rng(seed).fill(words.as_mut_slice());
    Ok(words)
}

/// Measures host-to-device and device-to-host bandwidth.
#[derive(Debug)]
pub struct DataTransferBenchmark {
    standard: TransferConfig,
    seed: Option<u64>,
    cancel: CancelToken,
    state: Option<TransferState>,
}

impl DataTransferBenchmark {
    pub fn new(standard: TransferConfig, seed: Option<u64>, cancel: CancelToken) -> Self {
        Self { standard, seed, cancel, state: None }
    }

    pub fn initialize(&mut self, params: &BenchmarkParams, registry: &DeviceRegistry) -> Result<()> {
        if self.state.is_some() {
            return Err(already_initialized(KIND));
        }
        let device = registry.resolve(&params.device)?;
        let [bytes] = params.resolve_dims(KIND, [self.standard.bytes]);
        let state = TransferState::new(device, random_words(self.seed, bytes)?)?;
        tracing::info!(
            device = %state.device.name(),
            bytes = state.bytes(),
            round_trips = self.standard.round_trips,
            "transfer benchmark initialized"
        );
        self.state = Some(state);
        Ok(())
    }

    pub fn warm_up(&mut self) -> Result<()> {
        let state = self.state.as_ref().ok_or(BenchError::NotInitialized(KIND.display_name()))?;
        let mut scratch =
            TransferState::new(state.device.clone(), random_words(self.seed, WARM_UP_BYTES)?)?;
        let elapsed = scratch.round_trips(1, &self.cancel)?;
        tracing::debug!(elapsed_us = elapsed.as_micros() as u64, "transfer warm-up complete");
        Ok(())
    }

    pub fn run(&mut self) -> Result<Measurement> {
        self.run_round_trips(self.standard.round_trips)
    }

    pub fn run_with(&mut self, options: &RunOptions) -> Result<Measurement> {
        options.validate_for(KIND)?;
        match options {
            RunOptions::Transfer { round_trips } => self.run_round_trips(*round_trips),
            _ => self.run(),
        }
    }

    fn run_round_trips(&mut self, count: usize) -> Result<Measurement> {
        let state = self.state.as_mut().ok_or(BenchError::NotInitialized(KIND.display_name()))?;
        let elapsed = state.round_trips(count, &self.cancel)?;
        // Upload and read-back both move the full payload.
        let moved = state.bytes() * 2 * count as u64;
        Ok(Measurement::throughput(elapsed, moved, "MB/s"))
    }

    /// Hash of the host-side payload.
    pub fn input_checksum(&self) -> Option<u64> {
        self.state
            .as_ref()
            .map(|s| fnv1a(s.host.iter().flat_map(|w| w.to_le_bytes())))
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
        DeviceRegistry::from_devices(vec![Device::host("Mock GPU", 64, Some(2)).unwrap()])
    }

    fn bench() -> DataTransferBenchmark {
        DataTransferBenchmark::new(TransferConfig { bytes: 4096, round_trips: 2 }, Some(3), CancelToken::new())
    }

    #[test]
    fn payload_round_trips_intact() {
        let mut b = bench();
        b.initialize(&BenchmarkParams::new("Mock GPU"), &registry()).unwrap();
        let m = b.run().unwrap();
        assert_eq!(m.work_units, 4096 * 2 * 2);
        let state = b.state.as_ref().unwrap();
        assert_eq!(state.readback, state.host);
    }

    #[test]
    fn byte_override_rounds_up_to_words() {
        let mut b = bench();
        let params = BenchmarkParams::new("Mock GPU").with_dims(vec![10]);
        b.initialize(&params, &registry()).unwrap();
        let m = b.run_with(&RunOptions::Transfer { round_trips: 1 }).unwrap();
        assert_eq!(m.work_units, 12 * 2);
    }

    #[test]
    fn unallocatable_override_is_a_configuration_error() {
        let mut b = bench();
        let params = BenchmarkParams::new("Mock GPU").with_dims(vec![usize::MAX]);
        let err = b.initialize(&params, &registry()).unwrap_err();
        assert!(matches!(err, BenchError::Config(_)), "{err}");
    }

    #[test]
    fn warm_up_keeps_payload() {
        let mut b = bench();
        b.initialize(&BenchmarkParams::new("Mock GPU"), &registry()).unwrap();
        let before = b.input_checksum();
        b.warm_up().unwrap();
        assert_eq!(b.input_checksum(), before);
    }

    #[test]
    fn matrix_options_are_rejected() {
        let mut b = bench();
        b.initialize(&BenchmarkParams::new("Mock GPU"), &registry()).unwrap();
        assert!(matches!(
            b.run_with(&RunOptions::Matrix { repetitions: 2 }),
            Err(BenchError::Config(_))
        ));
    }
}
