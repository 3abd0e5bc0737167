//! Valid-length resolution for strided encoder/decoder networks
//!
//! A Demucs-style network resamples its input, runs `depth` strided
//! convolutions down, then `depth` transposed convolutions back up. Any input
//! length the stride arithmetic cannot tile exactly loses samples at the tail.
//! [`valid_length`] returns the smallest length at or above the request that
//! survives the round trip.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Topology parameter `{name}` must be >= 1, got 0")]
    ZeroParameter { name: &'static str },
}

/// Encoder/decoder shape of the loaded network.
///
/// These values are baked into the trained weights. A mismatch with the
/// actual model yields tensors of the wrong length, which output validation
/// then rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTopology", into = "RawTopology")]
pub struct Topology {
    depth: u32,
    kernel: u32,
    stride: u32,
    resample: u32,
}

impl Topology {
    /// Topology of the reference Demucs denoiser (`depth=5, kernel=8, stride=4, resample=4`).
    pub const DEMUCS: Topology = Topology {
        depth: 5,
        kernel: 8,
        stride: 4,
        resample: 4,
    };

    pub fn new(depth: u32, kernel: u32, stride: u32, resample: u32) -> Result<Self, TopologyError> {
        for (name, value) in [
            ("depth", depth),
            ("kernel", kernel),
            ("stride", stride),
            ("resample", resample),
        ] {
            if value == 0 {
                return Err(TopologyError::ZeroParameter { name });
            }
        }
        Ok(Self {
            depth,
            kernel,
            stride,
            resample,
        })
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn kernel(&self) -> u32 {
        self.kernel
    }

    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    #[inline]
    pub fn resample(&self) -> u32 {
        self.resample
    }

    /// Shorthand for [`valid_length`] with this topology.
    #[inline]
    pub fn valid_length(&self, length: usize) -> usize {
        valid_length(length, self)
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::DEMUCS
    }
}

#[derive(Serialize, Deserialize)]
struct RawTopology {
    depth: u32,
    kernel: u32,
    stride: u32,
    resample: u32,
}

impl TryFrom<RawTopology> for Topology {
    type Error = TopologyError;

    fn try_from(raw: RawTopology) -> Result<Self, Self::Error> {
        Topology::new(raw.depth, raw.kernel, raw.stride, raw.resample)
    }
}

impl From<Topology> for RawTopology {
    fn from(t: Topology) -> Self {
        Self {
            depth: t.depth,
            kernel: t.kernel,
            stride: t.stride,
            resample: t.resample,
        }
    }
}

/// Ceiling division for a positive divisor, correct for negative numerators.
#[inline]
fn ceil_div(numerator: i128, divisor: i128) -> i128 {
    numerator.div_euclid(divisor) + i128::from(numerator.rem_euclid(divisor) != 0)
}

/// Smallest sample count >= `length` the network processes without truncation.
///
/// Intermediate lengths are carried as saturating `i128`, so no realistic
/// (or unrealistic) input can wrap around and under-allocate the buffer.
pub fn valid_length(length: usize, topology: &Topology) -> usize {
    let kernel = i128::from(topology.kernel);
    let stride = i128::from(topology.stride);
    let resample = i128::from(topology.resample);

    let mut l = (length as i128).saturating_mul(resample);

    for _ in 0..topology.depth {
        l = ceil_div(l - kernel, stride) + 1;
        l = l.max(1);
    }

    for _ in 0..topology.depth {
        l = (l - 1).saturating_mul(stride).saturating_add(kernel);
    }

    let resolved = ceil_div(l, resample);
    usize::try_from(resolved).unwrap_or(usize::MAX)
}
