use crate::prelude::{StageResult, StreamConfig};
use crate::processing::buffer_pool::BufferPool;
use log::debug;

/// Collects reads of any size into fixed-size PCM blocks.
///
/// A block is emitted once it is full, or early when the declared stream
/// length has been reached. Emitted blocks come from an internal
/// [`BufferPool`] and should be handed back through [`recycle`](Self::recycle).
pub struct BlockAssembler {
    block_bytes: usize,
    next: Option<Vec<u8>>,
    position: usize,
    remaining: Option<usize>,
    pool: BufferPool,
}

impl BlockAssembler {
    pub fn new(config: &StreamConfig, pool_size: usize) -> StageResult<Self> {
        Ok(Self {
            block_bytes: config.bytes_per_block()?,
            next: None,
            position: 0,
            remaining: None,
            pool: BufferPool::with_capacity(pool_size.max(1)),
        })
    }

    /// Stops reading after `bytes` more bytes; later input is dropped.
    pub fn with_expected_bytes(mut self, bytes: usize) -> Self {
        self.remaining = Some(bytes);
        self
    }

    /// Blocks handed out and not yet recycled.
    pub fn in_flight(&self) -> usize {
        self.pool.outstanding()
    }

    /// True once the declared stream length has been consumed.
    pub fn is_complete(&self) -> bool {
        self.remaining == Some(0)
    }

    pub fn push(&mut self, mut chunk: &[u8]) -> StageResult<Vec<Vec<u8>>> {
        if let Some(remaining) = self.remaining {
            chunk = &chunk[..chunk.len().min(remaining)];
        }

        let mut blocks = Vec::new();
        while !chunk.is_empty() {
            let mut next = match self.next.take() {
                Some(block) => block,
                None => {
                    self.position = 0;
                    self.pool.checkout(self.block_bytes)?
                }
            };

            let take = (self.block_bytes - self.position).min(chunk.len());
            next[self.position..self.position + take].copy_from_slice(&chunk[..take]);
            self.position += take;
            chunk = &chunk[take..];
            if let Some(remaining) = self.remaining.as_mut() {
                *remaining -= take;
            }

            if self.position == self.block_bytes || self.is_complete() {
                next.truncate(self.position);
                blocks.push(next);
            } else {
                self.next = Some(next);
            }
        }

        if !blocks.is_empty() {
            debug!("assembled {} block(s) of up to {} bytes", blocks.len(), self.block_bytes);
        }
        Ok(blocks)
    }

    /// Flushes a partially filled block at end of stream.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let mut next = self.next.take()?;
        next.truncate(self.position);
        Some(next)
    }

    pub fn recycle(&mut self, block: Vec<u8>) {
        self.pool.release(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StreamConfig {
        // 8 bytes per second, 2 blocks per second -> 4 byte blocks
        StreamConfig {
            sample_rate: 4,
            bytes_per_sample: 2,
            blocks_per_second: 2,
        }
    }

    #[test]
    fn small_reads_are_joined_into_blocks() {
        let mut assembler = BlockAssembler::new(&config(), 8).unwrap();
        assert!(assembler.push(&[1, 2, 3]).unwrap().is_empty());
        let blocks = assembler.push(&[4, 5]).unwrap();
        assert_eq!(blocks, vec![vec![1, 2, 3, 4]]);
        assert_eq!(assembler.finish(), Some(vec![5]));
        assert_eq!(assembler.finish(), None);
    }

    #[test]
    fn large_reads_are_split() {
        let mut assembler = BlockAssembler::new(&config(), 8).unwrap();
        let blocks = assembler.push(&[0u8; 10]).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(assembler.finish().unwrap().len(), 2);
    }

    #[test]
    fn declared_length_ends_the_stream_early() {
        let mut assembler = BlockAssembler::new(&config(), 8)
            .unwrap()
            .with_expected_bytes(6);
        let blocks = assembler.push(&[7u8; 9]).unwrap();
        assert_eq!(blocks, vec![vec![7; 4], vec![7; 2]]);
        assert!(assembler.is_complete());
        assert!(assembler.push(&[1, 1]).unwrap().is_empty());
        assert_eq!(assembler.finish(), None);
    }

    #[test]
    fn unreleased_blocks_exhaust_the_pool() {
        let mut assembler = BlockAssembler::new(&config(), 1).unwrap();
        let first = assembler.push(&[0u8; 4]).unwrap();
        assert!(assembler.push(&[0u8; 4]).is_err());
        for block in first {
            assembler.recycle(block);
        }
        assert_eq!(assembler.in_flight(), 0);
        assert_eq!(assembler.push(&[0u8; 4]).unwrap().len(), 1);
        assert_eq!(assembler.in_flight(), 1);
    }

    #[test]
    fn invalid_block_size_is_rejected() {
        let bad = StreamConfig {
            sample_rate: 3,
            bytes_per_sample: 2,
            blocks_per_second: 2,
        };
        assert!(BlockAssembler::new(&bad, 4).is_err());
    }
}
