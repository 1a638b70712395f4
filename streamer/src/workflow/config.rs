use anyhow::Context;
use pcmpower::prelude::StreamConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub sample_rate: u32,
    pub blocks_per_second: usize,
    /// Size of each simulated network read.
    pub read_chunk_bytes: usize,
    /// Bytes read up front before the WAV header is inspected.
    pub wave_header_bytes: usize,
    pub round_power: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            sample_rate: 11_025,
            blocks_per_second: 8,
            read_chunk_bytes: 1460,
            wave_header_bytes: 512,
            round_power: false,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(sample_rate: u32, blocks_per_second: usize, read_chunk_bytes: usize) -> Self {
        Self {
            sample_rate,
            blocks_per_second,
            read_chunk_bytes,
            ..Default::default()
        }
    }

    pub fn to_stream_config(&self) -> StreamConfig {
        StreamConfig {
            sample_rate: self.sample_rate,
            bytes_per_sample: 2,
            blocks_per_second: self.blocks_per_second,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_produces_stream_config() {
        let cfg = WorkflowConfig::from_args(16_000, 4, 512);
        let stream = cfg.to_stream_config();
        assert_eq!(stream.sample_rate, 16_000);
        assert_eq!(stream.bytes_per_block().unwrap(), 8000);
        assert_eq!(cfg.wave_header_bytes, 512);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"sample_rate: 8000\nblocks_per_second: 10\nround_power: true\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.sample_rate, 8000);
        assert_eq!(cfg.blocks_per_second, 10);
        assert!(cfg.round_power);
        assert_eq!(cfg.read_chunk_bytes, 1460);
    }

    #[test]
    fn config_load_reports_missing_file() {
        let err = WorkflowConfig::load("/nonexistent/streamer.yaml").unwrap_err();
        assert!(err.to_string().contains("reading workflow config"));
    }
}
