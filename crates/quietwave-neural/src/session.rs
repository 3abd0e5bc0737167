//! Inference session facade
//!
//! Owns the loaded network and its [`TensorBinding`]. Acquired with
//! [`DenoiseSession::open`], released with [`DenoiseSession::close`] or on
//! drop. Not synchronized: run one call at a time, or open one session per
//! worker thread.

use std::any::Any;
use std::fs::File;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use ndarray::ArrayD;
use quietwave_core::AlignedFrame;

use crate::backend::{GraphMetadata, InferenceBackend, SlotInfo};
use crate::binding::{resolve_bindings, TensorBinding};
use crate::inference::OrtBackend;
use crate::target::ExecutionTarget;
use crate::DenoiseError;

pub struct DenoiseSession<B: InferenceBackend = OrtBackend> {
    backend: Option<B>,
    binding: TensorBinding,
    model_path: Option<PathBuf>,
}

impl DenoiseSession<OrtBackend> {
    /// Load an ONNX model and bind its slots.
    ///
    /// # Errors
    ///
    /// - [`DenoiseError::ModelNotFound`] if `model_path` is not a readable file
    /// - [`DenoiseError::EngineLoad`] if ONNX Runtime rejects the model
    /// - [`DenoiseError::IoTopology`] if the model declares no inputs or outputs
    pub fn open(model_path: impl AsRef<Path>, targets: &[ExecutionTarget]) -> Result<Self, DenoiseError> {
        let path = model_path.as_ref();
        ensure_readable(path)?;

        let backend = OrtBackend::load(path, targets)?;
        let mut session = Self::with_backend(backend)?;
        session.model_path = Some(path.to_path_buf());
        Ok(session)
    }
}

impl<B: InferenceBackend> DenoiseSession<B> {
    /// Wrap an already-loaded backend, resolving its binding once.
    pub fn with_backend(backend: B) -> Result<Self, DenoiseError> {
        let binding = resolve_bindings(backend.inputs(), backend.outputs())?;
        tracing::info!(
            "Bound input '{}' -> output '{}' on {}",
            binding.input(),
            binding.output(),
            backend.active_target()
        );
        Ok(Self {
            backend: Some(backend),
            binding,
            model_path: None,
        })
    }

    pub fn binding(&self) -> &TensorBinding {
        &self.binding
    }

    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.backend.is_none()
    }

    /// Target the engine selected, or `None` once closed.
    pub fn active_target(&self) -> Option<ExecutionTarget> {
        self.backend.as_ref().map(|b| b.active_target())
    }

    /// Declared input slots, empty once closed.
    pub fn inputs(&self) -> &[SlotInfo] {
        match &self.backend {
            Some(backend) => backend.inputs(),
            None => &[],
        }
    }

    /// Declared output slots, empty once closed.
    pub fn outputs(&self) -> &[SlotInfo] {
        match &self.backend {
            Some(backend) => backend.outputs(),
            None => &[],
        }
    }

    /// Exporter metadata, empty once closed.
    pub fn metadata(&self) -> GraphMetadata {
        self.backend.as_ref().map(|b| b.metadata()).unwrap_or_default()
    }

    /// Run one aligned frame through the network.
    ///
    /// Blocks until the engine returns. No retries: the input is
    /// deterministic, so a failed call would fail again.
    ///
    /// # Errors
    ///
    /// - [`DenoiseError::SessionClosed`] after [`close`](Self::close)
    /// - [`DenoiseError::Inference`] if the engine fails or panics
    pub fn infer(&mut self, frame: AlignedFrame) -> Result<ArrayD<f32>, DenoiseError> {
        let backend = self.backend.as_mut().ok_or(DenoiseError::SessionClosed)?;
        let binding = &self.binding;

        // A panicking engine (e.g. on a malformed graph) must not unwind
        // through the caller.
        catch_unwind(AssertUnwindSafe(|| backend.run(binding, frame.into_tensor())))
            .map_err(|payload| DenoiseError::Inference(format!("Inference panicked: {}", panic_message(&*payload))))?
    }

    /// Release engine resources. Safe to call any number of times.
    ///
    /// Release is best-effort: a panic while dropping the engine handle is
    /// logged and swallowed.
    pub fn close(&mut self) {
        let Some(backend) = self.backend.take() else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(move || drop(backend))).is_err() {
            tracing::warn!("Inference engine panicked while releasing session resources");
        }
        tracing::info!("Closed inference session");
    }
}

impl<B: InferenceBackend> Drop for DenoiseSession<B> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<B: InferenceBackend> std::fmt::Debug for DenoiseSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DenoiseSession")
            .field("binding", &self.binding)
            .field("model_path", &self.model_path)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "non-string panic payload"
    }
}

fn ensure_readable(path: &Path) -> Result<(), DenoiseError> {
    let not_found = || DenoiseError::ModelNotFound {
        path: path.to_path_buf(),
    };
    if !path.is_file() {
        return Err(not_found());
    }
    File::open(path).map(drop).map_err(|_| not_found())
}
