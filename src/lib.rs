//! Quietwave: length-aligned ONNX inference for Demucs-style denoisers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  CLI / DenoiseConfig                        │
//! │          denoise, inspect, valid-length                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              quietwave-neural (DenoiseSession)              │
//! │       ONNX Runtime session, slot binding, audio I/O         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              quietwave-core (FrameAdapter)                  │
//! │          valid_length, pad to (1, 1, T), trim back          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod inspect;

pub use config::{ConfigError, ConfigOverrides, DenoiseConfig, ModelProfile};
pub use inspect::ModelReport;
pub use quietwave_core::{valid_length, AlignedFrame, FrameAdapter, ShapeError, Topology, MODEL_SAMPLE_RATE};
pub use quietwave_neural::{
    DenoiseError, DenoiseReport, DenoiseSession, Denoiser, ExecutionTarget, GraphMetadata, InferenceBackend,
    OrtBackend, TensorBinding,
};
