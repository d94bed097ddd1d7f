//! Run parameters and per-run options.

use gpubench_common::{BenchError, BenchmarkKind, Result};
use gpubench_kernels::TrigFunction;

/// Parameters supplied to `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchmarkParams {
    /// Name of the device to run on.
    pub device: String,
    /// Positional problem-size overrides; their meaning depends on the
    /// benchmark kind (see [`BenchmarkKind::override_arity`]).
    pub dims: Vec<usize>,
}

impl BenchmarkParams {
    pub fn new(device: impl Into<String>) -> Self {
        Self { device: device.into(), dims: Vec::new() }
    }

    pub fn with_dims(mut self, dims: impl Into<Vec<usize>>) -> Self {
        self.dims = dims.into();
        self
    }

    /// The overrides for `kind` if they have the right arity and are all
    /// non-zero, otherwise `standard`.
    ///
    /// A mismatch is not an error: the standard size is used and a warning
    /// is logged.
    pub fn resolve_dims<const N: usize>(
        &self,
        kind: BenchmarkKind,
        standard: [usize; N],
    ) -> [usize; N] {
        debug_assert_eq!(N, kind.override_arity(), "{kind} takes {} overrides", kind.override_arity());
        if self.dims.is_empty() {
            return standard;
        }
        match <[usize; N]>::try_from(self.dims.as_slice()) {
            Ok(dims) if dims.iter().all(|&d| d > 0) => dims,
            Ok(_) => {
                tracing::warn!(
                    benchmark = %kind,
                    dims = ?self.dims,
                    standard = ?standard,
                    "zero-sized override ignored, using standard size"
                );
                standard
            }
            Err(_) => {
                tracing::warn!(
                    benchmark = %kind,
                    expected = kind.override_arity(),
                    got = self.dims.len(),
                    standard = ?standard,
                    "override has the wrong number of dimensions, using standard size"
                );
                standard
            }
        }
    }
}

/// Alternate run configuration for `run_with`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RunOptions {
    /// Same as a plain `run`.
    #[default]
    Default,
    /// Repeat the matrix multiplication `repetitions` times.
    Matrix { repetitions: usize },
    /// Evaluate another trigonometric function.
    Trig { function: TrigFunction },
    /// Use another number of host/device round trips.
    Transfer { round_trips: usize },
    /// Render at another zoom level.
    Fractal { zoom: f64 },
    /// Run only the listed parts of the standard suite.
    Suite { include: Vec<BenchmarkKind> },
}

impl RunOptions {
    /// The benchmark kind these options apply to; `None` for [`RunOptions::Default`].
    pub fn target(&self) -> Option<BenchmarkKind> {
        match self {
            Self::Default => None,
            Self::Matrix { .. } => Some(BenchmarkKind::MatrixMultiplication),
            Self::Trig { .. } => Some(BenchmarkKind::Trigonometry),
            Self::Transfer { .. } => Some(BenchmarkKind::DataTransfer),
            Self::Fractal { .. } => Some(BenchmarkKind::Fractals),
            Self::Suite { .. } => Some(BenchmarkKind::Standard),
        }
    }

    /// Reject options meant for another kind or with unusable values.
    pub fn validate_for(&self, kind: BenchmarkKind) -> Result<()> {
        if let Some(target) = self.target().filter(|&target| target != kind) {
            return Err(BenchError::Config(format!(
                "{target} options cannot be applied to the {kind}"
            )));
        }
        match self {
            Self::Matrix { repetitions: 0 } => {
                Err(BenchError::Config("repetitions must be at least 1".into()))
            }
            Self::Transfer { round_trips: 0 } => {
                Err(BenchError::Config("round trips must be at least 1".into()))
            }
            Self::Fractal { zoom } if !(zoom.is_finite() && *zoom > 0.0) => {
                Err(BenchError::Config(format!("zoom must be a positive number, got {zoom}")))
            }
            Self::Suite { include } if include.is_empty() => {
                Err(BenchError::Config("suite must include at least one benchmark".into()))
            }
            Self::Suite { include } if include.contains(&BenchmarkKind::Standard) => {
                Err(BenchError::Config("the standard suite cannot include itself".into()))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpubench_common::ErrorCategory;

    #[test]
    fn matching_arity_is_used() {
        let params = BenchmarkParams::new("Host CPU").with_dims(vec![4, 3, 2]);
        assert_eq!(params.resolve_dims(BenchmarkKind::MatrixMultiplication, [10, 10, 10]), [4, 3, 2]);
    }

    #[test]
    fn wrong_arity_falls_back() {
        let params = BenchmarkParams::new("Host CPU").with_dims(vec![4, 3]);
        assert_eq!(params.resolve_dims(BenchmarkKind::MatrixMultiplication, [10, 10, 10]), [10, 10, 10]);
    }

    #[test]
    fn zero_dimension_falls_back() {
        let params = BenchmarkParams::new("Host CPU").with_dims(vec![0, 64]);
        assert_eq!(params.resolve_dims(BenchmarkKind::Fractals, [320, 200]), [320, 200]);
    }

    #[test]
    fn override_arity_matches_each_kind() {
        let params = BenchmarkParams::new("Host CPU").with_dims(vec![7; 3]);
        assert_eq!(BenchmarkKind::MatrixMultiplication.override_arity(), 3);
        assert_eq!(params.resolve_dims(BenchmarkKind::MatrixMultiplication, [1, 1, 1]), [7, 7, 7]);
        let params = BenchmarkParams::new("Host CPU").with_dims(vec![7; 2]);
        assert_eq!(BenchmarkKind::Fractals.override_arity(), 2);
        assert_eq!(params.resolve_dims(BenchmarkKind::Fractals, [1, 1]), [7, 7]);
        assert_eq!(params.resolve_dims(BenchmarkKind::DataTransfer, [1]), [1]);
    }

    #[test]
    fn empty_overrides_use_standard() {
        let params = BenchmarkParams::new("Host CPU");
        assert_eq!(params.resolve_dims(BenchmarkKind::Trigonometry, [1024]), [1024]);
    }

    #[test]
    fn options_for_another_kind_are_rejected() {
        let err = RunOptions::Fractal { zoom: 2.0 }
            .validate_for(BenchmarkKind::Trigonometry)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn default_options_fit_every_kind() {
        for kind in BenchmarkKind::ALL {
            RunOptions::Default.validate_for(kind).unwrap();
        }
    }

    #[test]
    fn unusable_values_are_rejected() {
        let kind = BenchmarkKind::MatrixMultiplication;
        assert!(RunOptions::Matrix { repetitions: 0 }.validate_for(kind).is_err());
        assert!(RunOptions::Matrix { repetitions: 2 }.validate_for(kind).is_ok());
        let kind = BenchmarkKind::Fractals;
        assert!(RunOptions::Fractal { zoom: 0.0 }.validate_for(kind).is_err());
        assert!(RunOptions::Fractal { zoom: f64::NAN }.validate_for(kind).is_err());
        let kind = BenchmarkKind::Standard;
        assert!(RunOptions::Suite { include: vec![] }.validate_for(kind).is_err());
        assert!(RunOptions::Suite { include: vec![kind] }.validate_for(kind).is_err());
    }
}
