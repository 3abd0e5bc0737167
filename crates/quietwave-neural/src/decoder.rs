//! Symphonia front end
//!
//! Any container and codec Symphonia's `all` feature knows (WAV, FLAC, MP3,
//! OGG/Vorbis, AAC/M4A) is read from its default track and averaged down to
//! the single channel the denoiser takes.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::DenoiseError;

/// Decoded mono audio
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Mono samples at `sample_rate`
    pub samples: Vec<f32>,
    /// Source sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels in the source file
    pub channels: u16,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file to mono f32 samples at its native rate.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, DenoiseError> {
    let mut source = open_source(path)?;
    let interleaved = drain_packets(&mut source)?;
    let (sample_rate, channels) = (source.sample_rate, source.channels);

    let samples = match channels {
        0 | 1 => interleaved,
        n => downmix_to_mono(&interleaved, n as usize),
    };

    tracing::debug!(
        "Decoded {}: {} mono samples at {} Hz from {} channel(s)",
        path.display(),
        samples.len(),
        sample_rate,
        channels
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

/// Demuxer and codec for the default track of one file.
struct TrackSource {
    reader: Box<dyn FormatReader>,
    codec: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: u16,
    frames_hint: Option<u64>,
}

fn decode_err(context: &str, err: impl std::fmt::Display) -> DenoiseError {
    DenoiseError::Decoder(format!("{}: {}", context, err))
}

fn open_source(path: &Path) -> Result<TrackSource, DenoiseError> {
    let file = File::open(path).map_err(|e| decode_err(&format!("cannot open {}", path.display()), e))?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let reader = symphonia::default::get_probe()
        .format(&hint, stream, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_err("unrecognized container", e))?
        .format;

    let track = reader
        .default_track()
        .ok_or_else(|| DenoiseError::Decoder("container has no default track".into()))?;
    let params = &track.codec_params;

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| DenoiseError::Decoder("track does not declare a sample rate".into()))?;
    let channels = params.channels.map_or(1, |c| c.count() as u16);

    let codec = symphonia::default::get_codecs()
        .make(params, &DecoderOptions::default())
        .map_err(|e| decode_err("unsupported codec", e))?;

    Ok(TrackSource {
        track_id: track.id,
        frames_hint: params.n_frames,
        reader,
        codec,
        sample_rate,
        channels,
    })
}

/// Pull every packet of the selected track and return interleaved samples.
///
/// Corrupt packets are skipped with a warning; anything else ends the decode
/// with an error. End of stream is reported by Symphonia as an
/// `UnexpectedEof` I/O error.
fn drain_packets(source: &mut TrackSource) -> Result<Vec<f32>, DenoiseError> {
    let capacity = source
        .frames_hint
        .map_or(source.sample_rate as usize * 60, |n| n as usize)
        * source.channels.max(1) as usize;
    let mut interleaved = Vec::with_capacity(capacity);
    let mut scratch: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match source.reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(decode_err("reading packet", e)),
        };
        if packet.track_id() != source.track_id {
            continue;
        }

        let block = match source.codec.decode(&packet) {
            Ok(block) => block,
            Err(SymphoniaError::DecodeError(reason)) => {
                tracing::warn!("Skipping corrupt packet at ts {}: {}", packet.ts(), reason);
                continue;
            }
            Err(e) => return Err(decode_err("decoding packet", e)),
        };

        let needed = block.capacity();
        if scratch.as_ref().map_or(true, |buf| buf.capacity() < needed) {
            scratch = Some(SampleBuffer::new(needed as u64, *block.spec()));
        }
        if let Some(buf) = scratch.as_mut() {
            buf.copy_interleaved_ref(block);
            interleaved.extend_from_slice(buf.samples());
        }
    }

    Ok(interleaved)
}

/// Average each interleaved frame of `channels` samples into one.
///
/// A trailing partial frame is dropped.
pub fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    let scale = 1.0 / channels as f32;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}
