//! End-to-end denoising: align, infer, trim

use std::path::Path;
use std::time::{Duration, Instant};

use ndarray::ArrayViewD;
use quietwave_core::{AlignedFrame, FrameAdapter, Topology, MODEL_SAMPLE_RATE};

use crate::backend::InferenceBackend;
use crate::inference::OrtBackend;
use crate::session::DenoiseSession;
use crate::target::ExecutionTarget;
use crate::{decoder, encoder, resampler, DenoiseError};

/// Outcome of [`Denoiser::denoise_file`]
#[derive(Debug, Clone)]
pub struct DenoiseReport {
    /// Sample rate of the source file
    pub source_rate: u32,
    /// Channel count of the source file
    pub source_channels: u16,
    /// Mono samples written, at the model rate
    pub samples: usize,
    /// Time spent in alignment, inference and trimming
    pub elapsed: Duration,
}

/// A session paired with the frame adapter for its topology.
pub struct Denoiser<B: InferenceBackend = OrtBackend> {
    session: DenoiseSession<B>,
    adapter: FrameAdapter,
    sample_rate: u32,
}

impl Denoiser<OrtBackend> {
    /// Open `model_path` and pair it with `topology`.
    pub fn open(
        model_path: impl AsRef<Path>,
        targets: &[ExecutionTarget],
        topology: Topology,
    ) -> Result<Self, DenoiseError> {
        let session = DenoiseSession::open(model_path, targets)?;
        Ok(Self::new(session, topology))
    }
}

impl<B: InferenceBackend> Denoiser<B> {
    pub fn new(session: DenoiseSession<B>, topology: Topology) -> Self {
        Self {
            session,
            adapter: FrameAdapter::new(topology),
            sample_rate: MODEL_SAMPLE_RATE,
        }
    }

    /// Override the rate the network expects (16 kHz unless the model profile says otherwise).
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn session(&self) -> &DenoiseSession<B> {
        &self.session
    }

    pub fn topology(&self) -> &Topology {
        self.adapter.topology()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Denoise a mono waveform of any rank-1 array type.
    ///
    /// Empty input returns an empty waveform without touching the engine.
    /// Anything that is not 1-D fails with a shape error.
    pub fn denoise(&mut self, waveform: ArrayViewD<'_, f32>) -> Result<Vec<f32>, DenoiseError> {
        match self.adapter.prepare(waveform)? {
            Some(frame) => self.run_frame(frame),
            None => Ok(Vec::new()),
        }
    }

    /// Denoise a mono sample slice.
    pub fn denoise_samples(&mut self, samples: &[f32]) -> Result<Vec<f32>, DenoiseError> {
        match self.adapter.prepare_samples(samples) {
            Some(frame) => self.run_frame(frame),
            None => Ok(Vec::new()),
        }
    }

    fn run_frame(&mut self, frame: AlignedFrame) -> Result<Vec<f32>, DenoiseError> {
        let original_len = frame.original_len();
        let output = self.session.infer(frame)?;
        Ok(FrameAdapter::restore(output.view(), original_len)?)
    }

    /// Decode `input`, resample to the model rate, denoise, and write a
    /// mono float WAV to `output`.
    pub fn denoise_file(&mut self, input: &Path, output: &Path) -> Result<DenoiseReport, DenoiseError> {
        let decoded = decoder::decode_file(input)?;
        tracing::info!(
            "Loaded {} ({:.2}s, {} Hz, {} ch)",
            input.display(),
            decoded.duration_secs(),
            decoded.sample_rate,
            decoded.channels
        );

        let samples = resampler::resample(&decoded.samples, decoded.sample_rate, self.sample_rate)?;

        let start = Instant::now();
        let cleaned = self.denoise_samples(&samples)?;
        let elapsed = start.elapsed();

        encoder::write_wav(output, &cleaned, self.sample_rate)?;

        Ok(DenoiseReport {
            source_rate: decoded.sample_rate,
            source_channels: decoded.channels,
            samples: cleaned.len(),
            elapsed,
        })
    }

    /// Release the underlying session. Idempotent.
    pub fn close(&mut self) {
        self.session.close();
    }
}
