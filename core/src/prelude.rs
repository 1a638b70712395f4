use crate::pcm::BlockPower;
use serde::{Deserialize, Serialize};

/// Shared configuration for a metered PCM stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub sample_rate: u32,
    pub bytes_per_sample: usize,
    pub blocks_per_second: usize,
}

impl StreamConfig {
    pub fn mono16(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            bytes_per_sample: 2,
            blocks_per_second: 8,
        }
    }

    /// Bytes of audio that make up one second of playback.
    pub fn bytes_per_second(&self) -> usize {
        self.sample_rate as usize * self.bytes_per_sample
    }

    /// Size of one metered block. Must hold a whole number of samples.
    pub fn bytes_per_block(&self) -> StageResult<usize> {
        if self.bytes_per_sample == 0 || self.blocks_per_second == 0 {
            return Err(StageError::InvalidArgument(
                "bytes_per_sample and blocks_per_second must be non-zero".into(),
            ));
        }
        let block = self.bytes_per_second() / self.blocks_per_second;
        if block == 0 || block % self.bytes_per_sample != 0 {
            return Err(StageError::InvalidArgument(format!(
                "invalid bytesPerBlock {} for {} bytes per sample",
                block, self.bytes_per_sample
            )));
        }
        Ok(block)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::mono16(11_025)
    }
}

/// Input payload for a processing stage: one block of raw PCM bytes.
#[derive(Debug, Clone)]
pub struct StageInput {
    pub bytes: Vec<u8>,
    pub index: usize,
    pub byte_offset: usize,
}

/// Output produced by each stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub bytes: Vec<u8>,
    pub metadata: StageMetadata,
}

/// Metadata attached to a processed block.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    pub reading: Option<BlockPower>,
    pub notes: Vec<String>,
}

/// Common error type for stage execution.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("buffer exhaustion: {0}")]
    BufferExhaustion(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type StageResult<T> = Result<T, StageError>;

/// Trait describing stateful block-processing stages.
pub trait ProcessingStage {
    fn initialize(&mut self, config: &StreamConfig) -> StageResult<()>;
    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput>;
    fn cleanup(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_block_is_an_eighth_of_a_second() {
        let config = StreamConfig::default();
        assert_eq!(config.bytes_per_second(), 22_050);
        // 22050 / 8 = 2756, an even byte count
        assert_eq!(config.bytes_per_block().unwrap(), 2756);
    }

    #[test]
    fn odd_block_size_is_rejected() {
        let config = StreamConfig {
            sample_rate: 11,
            bytes_per_sample: 2,
            blocks_per_second: 2,
        };
        // 22 / 2 = 11 bytes, not a whole number of samples
        assert!(matches!(
            config.bytes_per_block(),
            Err(StageError::InvalidArgument(_))
        ));
    }

    #[test]
    fn zero_blocks_per_second_is_rejected() {
        let config = StreamConfig {
            blocks_per_second: 0,
            ..StreamConfig::default()
        };
        assert!(config.bytes_per_block().is_err());
    }
}
