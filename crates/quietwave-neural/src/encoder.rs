//! WAV writer using hound

use std::path::Path;

use crate::DenoiseError;

/// Write mono samples as a 32-bit float WAV file.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), DenoiseError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let encode = |e: hound::Error| DenoiseError::Encoder(format!("{}: {}", path.display(), e));

    let mut writer = hound::WavWriter::create(path, spec).map_err(encode)?;
    for &s in samples {
        writer.write_sample(s).map_err(encode)?;
    }
    writer.finalize().map_err(encode)?;

    tracing::debug!("Wrote {} samples at {} Hz to {}", samples.len(), sample_rate, path.display());
    Ok(())
}
