//! Execution targets (ONNX Runtime execution providers)
//!
//! A caller hands the session an ordered preference list, accelerator first.
//! The list is passed through to ONNX Runtime untouched; providers that fail
//! to register are skipped by the engine and CPU remains the floor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionTarget {
    /// Generic CPU execution, always available
    Cpu,
    /// NVIDIA CUDA (`cuda` feature)
    Cuda,
    /// Apple CoreML (`coreml` feature)
    #[serde(rename = "coreml")]
    CoreMl,
    /// DirectML on Windows (`directml` feature)
    #[serde(rename = "directml")]
    DirectMl,
}

impl ExecutionTarget {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Cuda => "cuda",
            Self::CoreMl => "coreml",
            Self::DirectMl => "directml",
        }
    }

    /// Whether this build of the crate can register the provider at all.
    pub fn compiled_in(&self) -> bool {
        match self {
            Self::Cpu => true,
            Self::Cuda => cfg!(feature = "cuda"),
            Self::CoreMl => cfg!(feature = "coreml"),
            Self::DirectMl => cfg!(feature = "directml"),
        }
    }

    /// Parse a comma separated preference list such as `"cuda,cpu"`.
    ///
    /// Duplicates keep their first position. An empty list means CPU.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, ParseTargetError> {
        let mut targets = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let target: Self = part.parse()?;
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        if targets.is_empty() {
            targets.push(Self::Cpu);
        }
        Ok(targets)
    }
}

impl Default for ExecutionTarget {
    fn default() -> Self {
        Self::Cpu
    }
}

impl fmt::Display for ExecutionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown execution target '{0}' (expected cpu, cuda, coreml or directml)")]
pub struct ParseTargetError(pub String);

impl FromStr for ExecutionTarget {
    type Err = ParseTargetError;

    /// Accepts the short names as well as ONNX Runtime provider names
    /// (`CUDAExecutionProvider`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let short = lower.strip_suffix("executionprovider").unwrap_or(&lower);
        match short {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            "coreml" => Ok(Self::CoreMl),
            "directml" | "dml" => Ok(Self::DirectMl),
            _ => Err(ParseTargetError(s.to_string())),
        }
    }
}
