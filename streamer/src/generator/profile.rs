use crate::generator::template::sine_wave;
use anyhow::Context;
use pcmpower::pcm::container::{maud_header, wav_header};
use pcmpower::pcm::{encode_samples, ContainerKind};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for generating a synthetic PCM stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub sample_rate: u32,
    pub duration_secs: f32,
    pub frequency: f32,
    /// Peak level as a fraction of full scale.
    pub amplitude: f32,
    pub noise: f32,
    pub seed: u64,
    pub container: ContainerKind,
    pub description: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sample_rate: 11_025,
            duration_secs: 2.0,
            frequency: 440.0,
            amplitude: 0.5,
            noise: 0.01,
            seed: 0,
            container: ContainerKind::Raw,
            description: None,
        }
    }
}

impl GeneratorConfig {
    fn sample_count(&self) -> anyhow::Result<usize> {
        anyhow::ensure!(
            self.duration_secs.is_finite() && self.duration_secs >= 0.0,
            "duration must be a non-negative number of seconds"
        );
        Ok((self.sample_rate as f32 * self.duration_secs).round() as usize)
    }
}

fn build_samples(config: &GeneratorConfig) -> anyhow::Result<Vec<i16>> {
    let count = config.sample_count()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let amplitude = config.amplitude.clamp(0.0, 1.0);
    let noise = config.noise.abs();

    let samples = sine_wave(count, config.frequency, config.sample_rate)
        .into_iter()
        .map(|value| {
            let jitter = if noise > 0.0 {
                rng.gen_range(-noise..noise)
            } else {
                0.0
            };
            let level = (value * amplitude + jitter).clamp(-1.0, 1.0);
            (level * i16::MAX as f32).round() as i16
        })
        .collect();
    Ok(samples)
}

/// Builds a PCM stream, wrapped in the configured container.
pub fn build_pcm_stream(config: &GeneratorConfig) -> anyhow::Result<Vec<u8>> {
    let body = encode_samples(&build_samples(config)?);
    let stream = match config.container {
        ContainerKind::Raw => body,
        ContainerKind::Maud => {
            let rate = u16::try_from(config.sample_rate)
                .context("MAUD sample rate must fit in 16 bits")?;
            let count = u32::try_from(body.len() / 2).context("too many samples for MAUD")?;
            let mut stream = maud_header(rate, count).to_vec();
            stream.extend_from_slice(&body);
            stream
        }
        ContainerKind::Wav => {
            let size = u32::try_from(body.len()).context("too many samples for WAV")?;
            let mut stream = wav_header(config.sample_rate, size);
            stream.extend_from_slice(&body);
            stream
        }
    };
    Ok(stream)
}
