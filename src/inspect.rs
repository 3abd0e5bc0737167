//! Model introspection
//!
//! Summarizes what ONNX Runtime reports about a loaded denoiser: exporter
//! metadata, declared slots, the slots the session bound, and the execution
//! target in use.

use std::fmt;
use std::path::PathBuf;

use quietwave_neural::{DenoiseSession, ExecutionTarget, GraphMetadata, InferenceBackend, SlotInfo, TensorBinding};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub model_path: Option<PathBuf>,
    /// `None` when the session was already closed.
    pub active_target: Option<ExecutionTarget>,
    pub metadata: GraphMetadata,
    pub inputs: Vec<SlotInfo>,
    pub outputs: Vec<SlotInfo>,
    pub binding: TensorBinding,
}

impl ModelReport {
    pub fn from_session<B: InferenceBackend>(session: &DenoiseSession<B>) -> Self {
        Self {
            model_path: session.model_path().map(|p| p.to_path_buf()),
            active_target: session.active_target(),
            metadata: session.metadata(),
            inputs: session.inputs().to_vec(),
            outputs: session.outputs().to_vec(),
            binding: session.binding().clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.model_path {
            Some(path) => writeln!(f, "Model: {}", path.display())?,
            None => writeln!(f, "Model: <in-memory>")?,
        }
        match self.active_target {
            Some(target) => writeln!(f, "  Execution target: {}", target)?,
            None => writeln!(f, "  Execution target: <closed>")?,
        }
        write_metadata(f, &self.metadata)?;
        writeln!(f, "  Inputs:")?;
        for slot in &self.inputs {
            let marker = if slot.name == self.binding.input() { " (bound)" } else { "" };
            writeln!(f, "    {}: {}{}", slot.name, slot.dtype, marker)?;
        }
        writeln!(f, "  Outputs:")?;
        for slot in &self.outputs {
            let marker = if slot.name == self.binding.output() { " (bound)" } else { "" };
            writeln!(f, "    {}: {}{}", slot.name, slot.dtype, marker)?;
        }
        write!(
            f,
            "  Binding: {} -> {}",
            self.binding.input(),
            self.binding.output()
        )
    }
}

fn write_metadata(f: &mut fmt::Formatter<'_>, meta: &GraphMetadata) -> fmt::Result {
    if meta.is_empty() {
        return Ok(());
    }
    if let Some(name) = &meta.name {
        writeln!(f, "  Graph: {}", name)?;
    }
    match (&meta.producer, meta.version) {
        (Some(producer), Some(version)) => writeln!(f, "  Producer: {} (model version {})", producer, version)?,
        (Some(producer), None) => writeln!(f, "  Producer: {}", producer)?,
        (None, Some(version)) => writeln!(f, "  Model version: {}", version)?,
        (None, None) => {}
    }
    if let Some(domain) = &meta.domain {
        writeln!(f, "  Domain: {}", domain)?;
    }
    if let Some(description) = &meta.description {
        writeln!(f, "  Description: {}", description)?;
    }
    if !meta.custom.is_empty() {
        writeln!(f, "  Metadata:")?;
        for (key, value) in &meta.custom {
            writeln!(f, "    {} = {}", key, value)?;
        }
    }
    Ok(())
}
