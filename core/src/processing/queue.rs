use crate::prelude::{StageResult, StreamConfig};
use log::{debug, info};
use std::collections::VecDeque;

/// State change reported by the playback queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueEvent {
    /// Enough audio is buffered to start (or resume) playback.
    Ready,
    /// Every queued byte has been played; buffering starts again.
    Starved,
}

/// Simulated audio-out queue that buffers about one second before playing.
///
/// Blocks enqueued while the queue is not ready are held back as pending.
/// Once the queued byte count reaches the target they all move to the
/// playing list in order.
pub struct PlaybackQueue {
    target_bytes: usize,
    queued_bytes: usize,
    ready: bool,
    pending: VecDeque<Vec<u8>>,
    playing: VecDeque<Vec<u8>>,
}

impl PlaybackQueue {
    pub fn new(config: &StreamConfig) -> StageResult<Self> {
        // validates the block layout alongside the queue target
        config.bytes_per_block()?;
        Ok(Self::with_target(config.bytes_per_second()))
    }

    pub fn with_target(target_bytes: usize) -> Self {
        Self {
            target_bytes,
            queued_bytes: 0,
            ready: false,
            pending: VecDeque::new(),
            playing: VecDeque::new(),
        }
    }

    pub fn enqueue(&mut self, block: Vec<u8>) -> Option<QueueEvent> {
        self.queued_bytes += block.len();
        if self.ready {
            self.playing.push_back(block);
            return None;
        }

        self.pending.push_back(block);
        if self.queued_bytes >= self.target_bytes {
            self.promote_pending();
            info!("playback ready with {} bytes queued", self.queued_bytes);
            return Some(QueueEvent::Ready);
        }
        None
    }

    /// Pops the oldest playing block, as the audio callback would.
    pub fn play_next(&mut self) -> Option<(Vec<u8>, Option<QueueEvent>)> {
        let block = self.playing.pop_front()?;
        self.queued_bytes = self.queued_bytes.saturating_sub(block.len());

        let event = if self.queued_bytes == 0 {
            self.ready = false;
            debug!("playback queue starved");
            Some(QueueEvent::Starved)
        } else {
            None
        };
        Some((block, event))
    }

    /// Releases pending blocks for playback at end of stream, whatever the target.
    pub fn drain(&mut self) -> usize {
        let released = self.pending.len();
        if released > 0 {
            self.promote_pending();
        }
        released
    }

    pub fn needs_data(&self) -> bool {
        self.queued_bytes < self.target_bytes
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn queued_bytes(&self) -> usize {
        self.queued_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.playing.is_empty()
    }

    fn promote_pending(&mut self) {
        self.ready = true;
        self.playing.extend(self.pending.drain(..));
    }
}
