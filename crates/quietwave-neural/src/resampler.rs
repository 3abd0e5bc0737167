//! Audio resampler using Rubato
//!
//! Brings decoded audio to the model rate (16 kHz) before alignment.

use quietwave_core::MODEL_SAMPLE_RATE;
use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};

use crate::DenoiseError;

/// Default target sample rate
pub const DEFAULT_TARGET_SR: u32 = MODEL_SAMPLE_RATE;

const CHUNK_SIZE: usize = 1024;

/// Resample mono audio from `source_rate` to `target_rate`.
///
/// Uses Rubato's SincFixedIn. The filter delay is discarded so output sample
/// `i` lines up with input time `i / target_rate`, and the result is exactly
/// `round(len * target / source)` samples long.
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>, DenoiseError> {
    if source_rate == 0 || target_rate == 0 {
        return Err(DenoiseError::Resampler(format!(
            "Invalid sample rates: {} -> {}",
            source_rate, target_rate
        )));
    }
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = target_rate as f64 / source_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_SIZE, 1)
        .map_err(|e| DenoiseError::Resampler(format!("Failed to create resampler: {}", e)))?;

    let delay = resampler.output_delay();
    let expected_len = (samples.len() as f64 * ratio).round() as usize;
    let mut output = Vec::with_capacity(delay + expected_len + CHUNK_SIZE);

    // Feed input, then zeros until the delayed tail has been flushed out.
    let mut pos = 0;
    let mut chunk = vec![0.0f32; CHUNK_SIZE];
    while output.len() < delay + expected_len {
        chunk.fill(0.0);
        if pos < samples.len() {
            let end = (pos + CHUNK_SIZE).min(samples.len());
            chunk[..end - pos].copy_from_slice(&samples[pos..end]);
        }
        pos += CHUNK_SIZE;

        let resampled = resampler
            .process(&[&chunk[..]], None)
            .map_err(|e| DenoiseError::Resampler(format!("Resample failed: {}", e)))?;
        output.extend_from_slice(&resampled[0]);
    }

    output.drain(..delay);
    output.truncate(expected_len);
    Ok(output)
}
