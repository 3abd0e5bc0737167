//! Runtime configuration
//!
//! A [`DenoiseConfig`] names the model, the execution targets to try, and the
//! [`ModelProfile`] (sample rate and encoder topology) the model was trained
//! with. Profiles live in a JSON sidecar next to the model:
//!
//! ```json
//! { "sample_rate": 16000, "topology": { "depth": 5, "kernel": 8, "stride": 4, "resample": 4 } }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use quietwave_core::{Topology, MODEL_SAMPLE_RATE};
use quietwave_neural::target::{ExecutionTarget, ParseTargetError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_MODEL_PATH: &str = "QUIETWAVE_MODEL_PATH";
pub const ENV_MODEL_PATH_FALLBACK: &str = "MODEL_PATH";
pub const ENV_TARGETS: &str = "QUIETWAVE_TARGETS";
pub const ENV_PROFILE: &str = "QUIETWAVE_PROFILE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No model path configured (set {ENV_MODEL_PATH} or {ENV_MODEL_PATH_FALLBACK})")]
    MissingModelPath,

    #[error("Failed to read profile {}: {source}", .path.display())]
    ReadProfile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid profile {}: {source}", .path.display())]
    ParseProfile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Profile sample rate must be non-zero")]
    ZeroSampleRate,

    #[error(transparent)]
    Targets(#[from] ParseTargetError),
}

/// What a particular exported network expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelProfile {
    pub sample_rate: u32,
    pub topology: Topology,
}

impl Default for ModelProfile {
    fn default() -> Self {
        Self {
            sample_rate: MODEL_SAMPLE_RATE,
            topology: Topology::DEMUCS,
        }
    }
}

impl ModelProfile {
    /// Read a JSON profile. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadProfile {
            path: path.to_path_buf(),
            source,
        })?;
        let profile: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::ParseProfile {
            path: path.to_path_buf(),
            source,
        })?;
        if profile.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        Ok(profile)
    }

    /// Load `<model>.json` if it exists, else the default profile.
    pub fn for_model(model_path: &Path) -> Result<Self, ConfigError> {
        let sidecar = model_path.with_extension("json");
        if sidecar.is_file() {
            tracing::debug!("Using model profile {}", sidecar.display());
            Self::load(&sidecar)
        } else {
            Ok(Self::default())
        }
    }
}

/// Values given explicitly (command-line flags). Each one set here wins over
/// its environment variable.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model_path: Option<PathBuf>,
    /// Comma separated target list, as accepted by [`ExecutionTarget::parse_list`].
    pub targets: Option<String>,
    pub profile: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenoiseConfig {
    pub model_path: PathBuf,
    pub targets: Vec<ExecutionTarget>,
    #[serde(default)]
    pub profile: ModelProfile,
}

impl DenoiseConfig {
    /// CPU only, profile taken from the model sidecar if present.
    pub fn new(model_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let model_path = model_path.into();
        let profile = ModelProfile::for_model(&model_path)?;
        Ok(Self {
            model_path,
            targets: vec![ExecutionTarget::Cpu],
            profile,
        })
    }

    /// Build from `QUIETWAVE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(ConfigOverrides::default())
    }

    /// Build from `overrides`, filling whatever they leave unset from the
    /// environment.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    fn resolve_with(
        overrides: ConfigOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let model_path = overrides
            .model_path
            .or_else(|| var(ENV_MODEL_PATH).map(PathBuf::from))
            .or_else(|| var(ENV_MODEL_PATH_FALLBACK).map(PathBuf::from))
            .ok_or(ConfigError::MissingModelPath)?;

        let targets = match overrides.targets.or_else(|| var(ENV_TARGETS)) {
            Some(list) => ExecutionTarget::parse_list(&list)?,
            None => vec![ExecutionTarget::Cpu],
        };

        let profile = match overrides.profile.or_else(|| var(ENV_PROFILE).map(PathBuf::from)) {
            Some(path) => ModelProfile::load(&path)?,
            None => ModelProfile::for_model(&model_path)?,
        };

        tracing::debug!(
            "Resolved config: model {}, targets {:?}",
            model_path.display(),
            targets
        );

        Ok(Self {
            model_path,
            targets,
            profile,
        })
    }
}
