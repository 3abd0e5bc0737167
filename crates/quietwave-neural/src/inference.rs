//! ONNX inference backend using ORT (ONNX Runtime)

use std::path::Path;

use ndarray::{Array3, ArrayD, IxDyn};
use ort::ep::{self, ExecutionProvider};
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::value::Tensor;

use crate::backend::{GraphMetadata, InferenceBackend, SlotInfo};
use crate::binding::TensorBinding;
use crate::target::ExecutionTarget;
use crate::DenoiseError;

/// ONNX Runtime session plus the slot metadata read at load time.
pub struct OrtBackend {
    session: Session,
    inputs: Vec<SlotInfo>,
    outputs: Vec<SlotInfo>,
    metadata: GraphMetadata,
    active_target: ExecutionTarget,
}

impl OrtBackend {
    /// Load a model, registering `targets` as execution providers in order.
    ///
    /// Each provider is registered on its own so a failure (missing driver,
    /// no device) is observed rather than skipped inside ORT. The active
    /// target is the first one that registered; CPU otherwise.
    pub fn load(model_path: &Path, targets: &[ExecutionTarget]) -> Result<Self, DenoiseError> {
        // The environment is process-wide; only the first commit takes effect.
        let committed = ort::init().with_name("quietwave").commit();
        tracing::debug!("ONNX Runtime environment commit: {:?}", committed);

        let mut builder = Session::builder()
            .map_err(|e| engine_load(model_path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| engine_load(model_path, e))?;

        let mut outcomes = Vec::with_capacity(targets.len());
        for &target in targets {
            let outcome = match register(target, &mut builder) {
                None => Registration::NotCompiled,
                Some(Ok(())) => Registration::Registered,
                Some(Err(reason)) => Registration::Failed(reason),
            };
            match &outcome {
                Registration::NotCompiled => {
                    tracing::warn!("Execution target {} is not compiled in; skipping", target)
                }
                Registration::Failed(reason) => {
                    tracing::warn!("Execution target {} failed to register: {}", target, reason)
                }
                Registration::Registered => tracing::debug!("Registered execution target {}", target),
            }
            outcomes.push((target, outcome));
        }
        let active_target = select_target(&outcomes);

        let session = builder
            .commit_from_file(model_path)
            .map_err(|e| engine_load(model_path, e))?;

        let inputs = session
            .inputs()
            .iter()
            .map(|i| SlotInfo::new(i.name(), format!("{:?}", i.dtype())))
            .collect();
        let outputs = session
            .outputs()
            .iter()
            .map(|o| SlotInfo::new(o.name(), format!("{:?}", o.dtype())))
            .collect();
        let metadata = read_metadata(&session);

        tracing::info!(
            "Loaded ONNX model {} on {} execution target",
            model_path.display(),
            active_target
        );

        Ok(Self {
            session,
            inputs,
            outputs,
            metadata,
            active_target,
        })
    }
}

/// What happened when one requested target was offered to the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Registration {
    NotCompiled,
    Failed(String),
    Registered,
}

/// First target that registered, in request order, else CPU.
fn select_target(outcomes: &[(ExecutionTarget, Registration)]) -> ExecutionTarget {
    outcomes
        .iter()
        .find(|(_, outcome)| *outcome == Registration::Registered)
        .map_or(ExecutionTarget::Cpu, |(target, _)| *target)
}

/// `None` when the provider is not compiled into this build.
fn register(target: ExecutionTarget, builder: &mut SessionBuilder) -> Option<Result<(), String>> {
    let result = match target {
        ExecutionTarget::Cpu => ep::CPU::default().register(builder),
        #[cfg(feature = "cuda")]
        ExecutionTarget::Cuda => ep::CUDA::default().register(builder),
        #[cfg(feature = "coreml")]
        ExecutionTarget::CoreMl => ep::CoreML::default().register(builder),
        #[cfg(feature = "directml")]
        ExecutionTarget::DirectMl => ep::DirectML::default().register(builder),
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    Some(result.map_err(|e| e.to_string()))
}

fn read_metadata(session: &Session) -> GraphMetadata {
    let meta = match session.metadata() {
        Ok(meta) => meta,
        Err(e) => {
            tracing::debug!("Model metadata unavailable: {}", e);
            return GraphMetadata::default();
        }
    };
    let text = |value: Option<String>| value.filter(|s| !s.trim().is_empty());

    let custom = meta
        .custom_keys()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|key| {
            let value = meta.custom(&key)?;
            Some((key, value))
        })
        .collect();

    GraphMetadata {
        name: text(meta.name()),
        producer: text(meta.producer()),
        description: text(meta.description()),
        domain: text(meta.domain()),
        version: meta.version(),
        custom,
    }
}

fn engine_load(path: &Path, err: impl std::fmt::Display) -> DenoiseError {
    DenoiseError::EngineLoad {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

fn inference(err: impl std::fmt::Display) -> DenoiseError {
    DenoiseError::Inference(err.to_string())
}

impl InferenceBackend for OrtBackend {
    fn inputs(&self) -> &[SlotInfo] {
        &self.inputs
    }

    fn outputs(&self) -> &[SlotInfo] {
        &self.outputs
    }

    fn active_target(&self) -> ExecutionTarget {
        self.active_target
    }

    fn metadata(&self) -> GraphMetadata {
        self.metadata.clone()
    }

    fn run(&mut self, binding: &TensorBinding, input: Array3<f32>) -> Result<ArrayD<f32>, DenoiseError> {
        let (batch, channels, time) = input.dim();
        let (data, _) = input.into_raw_vec_and_offset();
        let tensor = Tensor::from_array(([batch, channels, time], data)).map_err(inference)?;

        let outputs = self
            .session
            .run(ort::inputs![binding.input() => tensor])
            .map_err(inference)?;
        let (shape, samples) = outputs[binding.output()]
            .try_extract_tensor::<f32>()
            .map_err(inference)?;

        let dims = shape
            .iter()
            .map(|&d| usize::try_from(d))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| inference(format!("Engine returned unresolved output shape {:?}", &shape[..])))?;

        ArrayD::from_shape_vec(IxDyn(&dims), samples.to_vec()).map_err(inference)
    }
}
