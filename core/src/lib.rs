//! RMS power metering for packed 16-bit PCM audio.
//!
//! [`compute_rms_power`] is the leaf computation. The remaining modules
//! cut a PCM stream into fixed blocks, buffer them the way an audio-out
//! queue does, and meter each block as it plays.

pub mod ffi;
pub mod math;
pub mod pcm;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use math::compute_rms_power;
pub use prelude::{ProcessingStage, StageError, StageInput, StageOutput, StageResult, StreamConfig};
