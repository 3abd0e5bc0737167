//! Inference backend seam
//!
//! [`DenoiseSession`](crate::DenoiseSession) talks to the engine only through
//! [`InferenceBackend`]. [`OrtBackend`](crate::OrtBackend) is the production
//! implementation; tests plug in scripted backends.

use std::collections::BTreeMap;

use ndarray::{Array3, ArrayD};
use serde::Serialize;

use crate::binding::TensorBinding;
use crate::target::ExecutionTarget;
use crate::DenoiseError;

/// A declared input or output slot of the loaded network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotInfo {
    pub name: String,
    /// Element type and shape as reported by the engine, e.g. `Tensor<f32>(1, 1, T)`.
    pub dtype: String,
}

impl SlotInfo {
    pub fn new(name: impl Into<String>, dtype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dtype: dtype.into(),
        }
    }
}

impl AsRef<str> for SlotInfo {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// Graph-level metadata recorded by the exporter.
///
/// Fields the model leaves blank are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphMetadata {
    pub name: Option<String>,
    pub producer: Option<String>,
    pub description: Option<String>,
    pub domain: Option<String>,
    pub version: Option<i64>,
    /// `metadata_props` key/value pairs
    pub custom: BTreeMap<String, String>,
}

impl GraphMetadata {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A loaded network that can run one `(1, 1, T)` tensor at a time.
///
/// Implementations are not expected to be `Sync`; a session runs one call at
/// a time through `&mut self`.
pub trait InferenceBackend {
    /// Declared input slots, in declaration order.
    fn inputs(&self) -> &[SlotInfo];

    /// Declared output slots, in declaration order.
    fn outputs(&self) -> &[SlotInfo];

    /// Target the engine actually runs on.
    fn active_target(&self) -> ExecutionTarget {
        ExecutionTarget::Cpu
    }

    /// Exporter metadata, empty when the engine exposes none.
    fn metadata(&self) -> GraphMetadata {
        GraphMetadata::default()
    }

    /// Bind `input` to `binding.input()`, run, and read back `binding.output()`.
    ///
    /// Engine failures map to [`DenoiseError::Inference`].
    fn run(&mut self, binding: &TensorBinding, input: Array3<f32>) -> Result<ArrayD<f32>, DenoiseError>;
}
