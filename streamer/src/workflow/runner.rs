use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::{debug, warn};
use pcmpower::compute_rms_power;
use pcmpower::pcm::{BlockPower, ContainerKind, PcmPayload};
use pcmpower::prelude::{ProcessingStage, StageError, StageInput};
use pcmpower::processing::{BlockAssembler, PlaybackQueue, PowerStage};
use pcmpower::telemetry::{MetricsRecorder, MetricsSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamReport {
    pub container: Option<ContainerKind>,
    pub sample_rate: u32,
    pub readings: Vec<BlockPower>,
    /// RMS over the whole payload, when it holds at least one sample.
    pub overall_rms: Option<f64>,
    pub skipped: usize,
    pub duration_secs: f64,
    pub metrics: MetricsSnapshot,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

struct Playback {
    queue: PlaybackQueue,
    stage: PowerStage,
    readings: Vec<BlockPower>,
    played_bytes: usize,
    skipped: usize,
}

impl Playback {
    fn play_next(&mut self, assembler: &mut BlockAssembler) -> anyhow::Result<bool> {
        let Some((block, _)) = self.queue.play_next() else {
            return Ok(false);
        };

        let len = block.len();
        let input = StageInput {
            bytes: block,
            index: self.readings.len() + self.skipped,
            byte_offset: self.played_bytes,
        };
        self.played_bytes += len;

        match self.stage.execute(input) {
            Ok(output) => {
                if let Some(reading) = output.metadata.reading {
                    self.readings.push(reading);
                }
                assembler.recycle(output.bytes);
            }
            Err(StageError::InvalidArgument(reason)) => {
                warn!("skipping block of {} byte(s): {}", len, reason);
                self.skipped += 1;
                // the stage consumed the block; hand its slot back to the pool
                assembler.recycle(Vec::new());
            }
            Err(err) => return Err(err).context("metering played block"),
        }
        Ok(true)
    }
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Streams `data` through the block queue and meters every played block.
    ///
    /// `kind` forces a container; otherwise it is detected from magic bytes.
    pub fn execute(&self, data: &[u8], kind: Option<ContainerKind>) -> anyhow::Result<StreamReport> {
        let stream_config = self.config.to_stream_config();
        let kind = kind.unwrap_or_else(|| ContainerKind::detect(data));

        let header_region = match kind {
            ContainerKind::Wav => &data[..data.len().min(self.config.wave_header_bytes)],
            _ => data,
        };
        let payload = PcmPayload::parse_as(kind, header_region, stream_config.sample_rate)
            .with_context(|| format!("parsing {:?} header", kind))?;
        let body = &data[payload.header_bytes.min(data.len())..];
        let declared = payload.declared_bytes.min(body.len());

        let read_chunk_bytes = self.config.read_chunk_bytes.max(1);
        let block_bytes = stream_config
            .bytes_per_block()
            .context("configuring block size")?;
        // one second queued, the block being filled, and whatever a single read can complete
        let pool_size = stream_config.bytes_per_second().div_ceil(block_bytes)
            + read_chunk_bytes / block_bytes
            + 2;

        let metrics = Arc::new(MetricsRecorder::new());
        let mut assembler = BlockAssembler::new(&stream_config, pool_size)
            .context("configuring block assembler")?
            .with_expected_bytes(declared);
        let mut stage = PowerStage::new(metrics.clone());
        stage
            .initialize(&stream_config)
            .context("initializing power stage")?;
        let mut playback = Playback {
            queue: PlaybackQueue::new(&stream_config).context("configuring playback queue")?,
            stage,
            readings: Vec::new(),
            played_bytes: 0,
            skipped: 0,
        };

        for chunk in body.chunks(read_chunk_bytes) {
            for block in assembler.push(chunk).context("assembling blocks")? {
                playback.queue.enqueue(block);
            }
            // keep about one second queued, as the audio callback would
            while playback.queue.is_ready() && !playback.queue.needs_data() {
                playback.play_next(&mut assembler)?;
            }
            if assembler.is_complete() {
                break;
            }
        }

        if let Some(tail) = assembler.finish() {
            playback.queue.enqueue(tail);
        }
        let released = playback.queue.drain();
        if released > 0 {
            debug!("released {} pending block(s) at end of stream", released);
        }
        while playback.play_next(&mut assembler)? {}
        playback.stage.cleanup();
        anyhow::ensure!(
            assembler.in_flight() == 0,
            "{} block(s) never returned to the block pool",
            assembler.in_flight()
        );

        let overall_rms = compute_rms_power(&body[..declared]).ok();
        let duration_secs = playback.played_bytes as f64 / stream_config.bytes_per_second() as f64;

        Ok(StreamReport {
            container: Some(payload.kind),
            sample_rate: payload.sample_rate,
            readings: playback.readings,
            overall_rms,
            skipped: playback.skipped,
            duration_secs,
            metrics: metrics.snapshot(),
        })
    }
}

/// Formats a reading the way the trace output prints it.
pub fn format_power(rms: f64, round: bool) -> String {
    if round {
        format!("power {}", rms.round())
    } else {
        format!("power {}", rms)
    }
}
