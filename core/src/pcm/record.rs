use serde::{Deserialize, Serialize};

/// Power reading for one played block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockPower {
    pub index: usize,
    pub byte_offset: usize,
    pub sample_count: usize,
    pub rms: f64,
    /// Seconds from the start of the PCM payload.
    pub timestamp: f64,
}

impl BlockPower {
    pub fn new(
        index: usize,
        byte_offset: usize,
        sample_count: usize,
        rms: f64,
        bytes_per_second: usize,
    ) -> Self {
        let timestamp = if bytes_per_second > 0 {
            byte_offset as f64 / bytes_per_second as f64
        } else {
            0.0
        };
        Self {
            index,
            byte_offset,
            sample_count,
            rms,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_follows_byte_offset() {
        let reading = BlockPower::new(4, 11_025, 1378, 12.5, 22_050);
        assert_eq!(reading.timestamp, 0.5);
    }

    #[test]
    fn reading_serializes_to_json() {
        let reading = BlockPower::new(0, 0, 2, 100.0, 22_050);
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["rms"], 100.0);
        assert_eq!(json["sample_count"], 2);
    }
}
