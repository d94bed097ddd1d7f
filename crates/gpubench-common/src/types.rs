//! Benchmark selection surface.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of benchmark variants exposed to front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BenchmarkKind {
    Standard,
    DataTransfer,
    Trigonometry,
    MatrixMultiplication,
    Fractals,
}

impl BenchmarkKind {
    /// Every variant, in presentation order.
    pub const ALL: [BenchmarkKind; 5] = [
        Self::Standard,
        Self::DataTransfer,
        Self::Trigonometry,
        Self::MatrixMultiplication,
        Self::Fractals,
    ];

    /// Human-readable name, as written to the result log.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Standard => "Standard Benchmark",
            Self::DataTransfer => "Data Transfer Benchmark",
            Self::Trigonometry => "Trigonometry Benchmark",
            Self::MatrixMultiplication => "Matrix Multiplication Benchmark",
            Self::Fractals => "Fractals Benchmark",
        }
    }

    /// Number of positional dimension overrides the variant accepts.
    pub fn override_arity(self) -> usize {
        match self {
            Self::Standard => 0,
            Self::DataTransfer | Self::Trigonometry => 1,
            Self::Fractals => 2,
            Self::MatrixMultiplication => 3,
        }
    }
}

impl fmt::Display for BenchmarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for BenchmarkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String =
            s.chars().filter(|c| !matches!(c, ' ' | '-' | '_')).collect::<String>().to_lowercase();
        let normalized = normalized.strip_suffix("benchmark").unwrap_or(&normalized);
        match normalized {
            "standard" | "std" => Ok(Self::Standard),
            "datatransfer" | "transfer" => Ok(Self::DataTransfer),
            "trigonometry" | "trig" => Ok(Self::Trigonometry),
            "matrixmultiplication" | "matmul" | "matrix" => Ok(Self::MatrixMultiplication),
            "fractals" | "fractal" | "mandelbrot" => Ok(Self::Fractals),
            _ => Err(format!("unknown benchmark: {s}")),
        }
    }
}
