//! Quietwave Neural – ONNX Runtime session facade and audio collaborators
//!
//! # Architecture
//!
//! ```text
//! Audio File (.mp3/.wav/.flac)
//!     │
//!     ▼
//! ┌──────────┐    ┌───────────┐    ┌──────────────┐    ┌────────────┐    ┌─────────┐
//! │ Decoder  │───▶│ Resampler │───▶│ FrameAdapter │───▶│ Session    │───▶│ Encoder │
//! │Symphonia │    │  Rubato   │    │ pad / trim   │    │  ORT/ONNX  │    │  hound  │
//! └──────────┘    └───────────┘    └──────────────┘    └────────────┘    └─────────┘
//! ```
//!
//! [`DenoiseSession`] is the only long-lived resource. It is opened
//! explicitly, binds its input/output slots once, and is released by an
//! idempotent [`DenoiseSession::close`] (or on drop).

pub mod backend;
pub mod binding;
pub mod decoder;
pub mod denoiser;
pub mod encoder;
pub mod inference;
pub mod resampler;
pub mod session;
pub mod target;

use std::path::PathBuf;

use quietwave_core::ShapeError;
use thiserror::Error;

pub use backend::{GraphMetadata, InferenceBackend, SlotInfo};
pub use binding::{resolve_bindings, TensorBinding};
pub use denoiser::{DenoiseReport, Denoiser};
pub use inference::OrtBackend;
pub use session::DenoiseSession;
pub use target::ExecutionTarget;

#[derive(Error, Debug)]
pub enum DenoiseError {
    #[error("ONNX model not found at {}", .path.display())]
    ModelNotFound { path: PathBuf },

    #[error("Inference engine rejected model {}: {reason}", .path.display())]
    EngineLoad { path: PathBuf, reason: String },

    #[error("Model must have at least one input and one output (inputs: {inputs:?}, outputs: {outputs:?})")]
    IoTopology {
        inputs: Vec<String>,
        outputs: Vec<String>,
    },

    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Session is closed")]
    SessionClosed,

    #[error("Decoder error: {0}")]
    Decoder(String),

    #[error("Resampler error: {0}")]
    Resampler(String),

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DenoiseError>;
