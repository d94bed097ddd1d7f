//! Trigonometric throughput kernel.

use std::fmt;
use std::str::FromStr;

use crate::kernel::{ComputeKernel, WorkItem};

/// Function applied by [`TrigKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrigFunction {
    #[default]
    Sin,
    Cos,
    Tan,
    /// `sin²(x) + cos²(x) · tan(x)`
    Combined,
}

impl TrigFunction {
    pub const ALL: [TrigFunction; 4] = [Self::Sin, Self::Cos, Self::Tan, Self::Combined];

    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Combined => {
                let (s, c) = x.sin_cos();
                s * s + c * c * x.tan()
            }
        }
    }
}

impl fmt::Display for TrigFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sin => write!(f, "sin"),
            Self::Cos => write!(f, "cos"),
            Self::Tan => write!(f, "tan"),
            Self::Combined => write!(f, "combined"),
        }
    }
}

impl FromStr for TrigFunction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sin" | "sine" => Ok(Self::Sin),
            "cos" | "cosine" => Ok(Self::Cos),
            "tan" | "tangent" => Ok(Self::Tan),
            "combined" | "all" => Ok(Self::Combined),
            other => Err(format!("unknown trigonometric function: {other}")),
        }
    }
}

/// Applies `function` to each input element `iterations` times.
#[derive(Debug, Clone, Copy)]
pub struct TrigKernel<'a> {
    pub input: &'a [f32],
    pub function: TrigFunction,
    pub iterations: usize,
}

impl ComputeKernel for TrigKernel<'_> {
    type Elem = f32;

    fn name(&self) -> &'static str {
        "trig_f32"
    }

    fn domain_size(&self) -> usize {
        self.input.len()
    }

    fn execute(&self, item: WorkItem, group_out: &mut [f32]) {
        let Some(&x) = self.input.get(item.global_id) else {
            return;
        };
        let mut value = x;
        for _ in 0..self.iterations {
            value = self.function.apply(value);
        }
        group_out[item.local_id] = value;
    }
}
