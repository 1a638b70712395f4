use crate::workflow::runner::StreamReport;
use pcmpower::pcm::BlockPower;
use serde::{Deserialize, Serialize};

/// Latest readings exposed over the HTTP bridge.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReadingsModel {
    pub readings: Vec<BlockPower>,
    pub overall_rms: Option<f64>,
    pub skipped: usize,
    pub notes: Vec<String>,
}

impl From<&StreamReport> for ReadingsModel {
    fn from(report: &StreamReport) -> Self {
        let mut notes = Vec::new();
        if let Some(kind) = report.container {
            notes.push(format!("{:?} at {} Hz", kind, report.sample_rate));
        }
        Self {
            readings: report.readings.clone(),
            overall_rms: report.overall_rms,
            skipped: report.skipped,
            notes,
        }
    }
}
