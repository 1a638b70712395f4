use crate::math::stats::compute_rms_power;
use crate::pcm::{BlockPower, SampleView};
use crate::prelude::{
    ProcessingStage, StageError, StageInput, StageMetadata, StageOutput, StageResult, StreamConfig,
};
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::Arc;

/// Stage that turns each played block into a [`BlockPower`] reading.
pub struct PowerStage {
    config: Option<StreamConfig>,
    logger: LogManager,
    metrics: Arc<MetricsRecorder>,
}

impl PowerStage {
    pub fn new(metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            config: None,
            logger: LogManager::new("PowerStage"),
            metrics,
        }
    }
}

impl ProcessingStage for PowerStage {
    fn initialize(&mut self, config: &StreamConfig) -> StageResult<()> {
        config.bytes_per_block()?;
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        let rms = match compute_rms_power(&input.bytes) {
            Ok(rms) => rms,
            Err(err) => {
                self.metrics.record_error();
                self.logger
                    .warn(&format!("block {} skipped: {}", input.index, err));
                return Err(err);
            }
        };

        let view = SampleView::new(&input.bytes);
        let reading = BlockPower::new(
            input.index,
            input.byte_offset,
            view.len(),
            rms,
            config.bytes_per_second(),
        );
        self.metrics.record_processed(input.bytes.len());
        self.logger
            .record(&format!("block {} power {:.3}", input.index, rms));

        let mut notes = Vec::new();
        if view.has_trailing_byte() {
            notes.push("trailing byte ignored".to_string());
        }

        Ok(StageOutput {
            bytes: input.bytes,
            metadata: StageMetadata {
                reading: Some(reading),
                notes,
            },
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
