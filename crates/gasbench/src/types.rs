use std::fmt;

use serde::{Deserialize, Serialize};

/// Which implementation of an operation a scenario exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Baseline,
    Optimized,
}

impl Variant {
    /// Execution order within a size: baseline first.
    pub const ALL: [Variant; 2] = [Variant::Baseline, Variant::Optimized];

    pub const OPTIMIZED_SUFFIX: &'static str = "_optimized";

    pub fn operation_name(self, base: &str) -> String {
        match self {
            Self::Baseline => base.to_string(),
            Self::Optimized => format!("{base}{}", Self::OPTIMIZED_SUFFIX),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => write!(f, "baseline"),
            Self::Optimized => write!(f, "optimized"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputKind {
    ZeroFilled,
    FreshAddress,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroFilled => write!(f, "zero-filled"),
            Self::FreshAddress => write!(f, "fresh-address"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputShape {
    pub kind: InputKind,
    pub len: usize,
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.len, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostObservation {
    pub workload: String,
    pub variant: Variant,
    pub operation: String,
    pub size: usize,
    pub unit: String,
    pub input_shape: InputShape,
    pub estimated_gas: u64,
    pub budget: u64,
    pub gas_used: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchRun {
    pub timestamp: String,
    pub workloads: Vec<String>,
    pub observations: Vec<CostObservation>,
}

/// Baseline against optimized cost for one workload and size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub workload: String,
    pub size: usize,
    pub unit: String,
    pub baseline_gas: u64,
    pub optimized_gas: u64,
    /// `optimized_gas - baseline_gas`; negative when the optimized variant is cheaper.
    pub delta: i128,
    pub change_percent: f64,
}
