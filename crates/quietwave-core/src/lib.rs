//! Quietwave Core – Length resolution and frame alignment
//!
//! # Architecture
//!
//! ```text
//! waveform [N]
//!     │
//!     ▼
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │ valid_length    │───▶│ FrameAdapter    │───▶│ network         │
//! │ (Topology)      │    │ prepare (1,1,T) │    │ (opaque)        │
//! └─────────────────┘    └─────────────────┘    └────────┬────────┘
//!                                                        │ (1,1,T')
//!                        ┌─────────────────┐             │
//!        waveform [N] ◀──│ FrameAdapter    │◀────────────┘
//!                        │ restore         │
//!                        └─────────────────┘
//! ```
//!
//! Nothing here touches an inference engine; see `quietwave-neural` for the
//! ONNX Runtime side.

pub mod frame;
pub mod length;

pub use frame::{AlignedFrame, FrameAdapter, ShapeError, EXPECTED_PATTERN};
pub use length::{valid_length, Topology, TopologyError};

/// Sample rate every bundled network is trained at.
pub const MODEL_SAMPLE_RATE: u32 = 16_000;
