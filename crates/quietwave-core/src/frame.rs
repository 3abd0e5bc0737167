//! Frame alignment around a single network call
//!
//! [`FrameAdapter::prepare`] pads a caller waveform into a `(1, 1, T)` tensor
//! of valid length; [`FrameAdapter::restore`] validates the network output and
//! cuts it back to the caller's length.

use ndarray::{s, Array3, ArrayView1, ArrayViewD, Ix1, Ix3};
use thiserror::Error;

use crate::length::{valid_length, Topology};

/// Expected rank pattern of both network tensors.
pub const EXPECTED_PATTERN: &str = "(1, 1, T)";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("Expected mono 1-D waveform, got shape {shape:?}")]
    NotMono { shape: Vec<usize> },

    #[error("Unexpected output shape {shape:?}; expected {EXPECTED_PATTERN}")]
    UnexpectedOutput { shape: Vec<usize> },

    #[error("Output time axis too short: {available} samples available, {required} required")]
    OutputTooShort { available: usize, required: usize },
}

/// Zero-padded waveform of valid length, shaped `(1, 1, T)`.
///
/// Owned by the call that built it. The tensor never aliases the caller's
/// buffer, so the engine cannot write through to it.
#[derive(Debug, Clone)]
pub struct AlignedFrame {
    tensor: Array3<f32>,
    original_len: usize,
}

impl AlignedFrame {
    #[inline]
    pub fn original_len(&self) -> usize {
        self.original_len
    }

    #[inline]
    pub fn target_len(&self) -> usize {
        self.tensor.dim().2
    }

    /// Number of zero samples appended past the original waveform.
    #[inline]
    pub fn padding(&self) -> usize {
        self.target_len() - self.original_len
    }

    pub fn tensor(&self) -> &Array3<f32> {
        &self.tensor
    }

    pub fn into_tensor(self) -> Array3<f32> {
        self.tensor
    }
}

/// Pads and trims waveforms for one fixed network topology.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameAdapter {
    topology: Topology,
}

impl FrameAdapter {
    pub fn new(topology: Topology) -> Self {
        Self { topology }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Build the aligned input for an arbitrary-rank waveform.
    ///
    /// Returns `Ok(None)` for an empty waveform: there is nothing to denoise
    /// and the length resolver is not consulted.
    pub fn prepare(&self, waveform: ArrayViewD<'_, f32>) -> Result<Option<AlignedFrame>, ShapeError> {
        if waveform.is_empty() {
            return Ok(None);
        }

        let shape = waveform.shape().to_vec();
        let mono = waveform
            .into_dimensionality::<Ix1>()
            .map_err(|_| ShapeError::NotMono { shape })?;

        Ok(Some(self.align(mono)))
    }

    /// Same as [`prepare`](Self::prepare) for a plain sample slice, which is
    /// mono by construction.
    pub fn prepare_samples(&self, samples: &[f32]) -> Option<AlignedFrame> {
        if samples.is_empty() {
            return None;
        }
        Some(self.align(ArrayView1::from(samples)))
    }

    fn align(&self, mono: ArrayView1<'_, f32>) -> AlignedFrame {
        let original_len = mono.len();
        let target_len = valid_length(original_len, &self.topology);

        let mut tensor = Array3::<f32>::zeros((1, 1, target_len));
        tensor.slice_mut(s![0, 0, ..original_len]).assign(&mono);

        tracing::debug!(
            "Aligned {} samples to {} (+{} padding)",
            original_len,
            target_len,
            target_len - original_len
        );

        AlignedFrame {
            tensor,
            original_len,
        }
    }

    /// Validate a `(1, 1, T)` network output and return its first
    /// `original_len` samples as an independent contiguous buffer.
    pub fn restore(output: ArrayViewD<'_, f32>, original_len: usize) -> Result<Vec<f32>, ShapeError> {
        let shape = output.shape().to_vec();
        let output = output
            .into_dimensionality::<Ix3>()
            .map_err(|_| ShapeError::UnexpectedOutput { shape: shape.clone() })?;

        let (batch, channels, time) = output.dim();
        if batch != 1 || channels != 1 {
            return Err(ShapeError::UnexpectedOutput { shape });
        }
        if time < original_len {
            return Err(ShapeError::OutputTooShort {
                available: time,
                required: original_len,
            });
        }

        Ok(output.slice(s![0, 0, ..original_len]).to_vec())
    }
}
