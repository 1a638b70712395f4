use crate::prelude::{StageError, StageResult};
use log::debug;
use serde::{Deserialize, Serialize};

/// Fixed size of a MAUD header.
pub const MAUD_HEADER_BYTES: usize = 12;
const RIFF_HEADER_BYTES: usize = 12;
const CHUNK_HEADER_BYTES: usize = 8;
const WAVE_FORMAT_PCM: u16 = 1;

/// Container wrapping a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Raw,
    Maud,
    Wav,
}

impl ContainerKind {
    /// Guesses the container from its magic bytes; anything unrecognised is raw.
    pub fn detect(data: &[u8]) -> Self {
        if data.len() >= RIFF_HEADER_BYTES && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE" {
            ContainerKind::Wav
        } else if looks_like_maud(data) {
            ContainerKind::Maud
        } else {
            ContainerKind::Raw
        }
    }
}

/// PCM samples located inside a container, borrowed from the source bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmPayload<'a> {
    pub kind: ContainerKind,
    pub sample_rate: u32,
    pub channels: u16,
    /// Offset of the first sample byte within the source.
    pub header_bytes: usize,
    /// Byte count the header declares for the sample data.
    pub declared_bytes: usize,
    pub data: &'a [u8],
}

impl<'a> PcmPayload<'a> {
    /// Detects the container and strips its header.
    pub fn parse(data: &'a [u8], expected_rate: u32) -> StageResult<Self> {
        Self::parse_as(ContainerKind::detect(data), data, expected_rate)
    }

    pub fn parse_as(kind: ContainerKind, data: &'a [u8], expected_rate: u32) -> StageResult<Self> {
        let payload = match kind {
            ContainerKind::Raw => Self {
                kind,
                sample_rate: expected_rate,
                channels: 1,
                header_bytes: 0,
                declared_bytes: data.len(),
                data,
            },
            ContainerKind::Maud => parse_maud(data, expected_rate)?,
            ContainerKind::Wav => parse_wav(data, expected_rate)?,
        };
        debug!(
            "{:?} payload: {} Hz, {} channel(s), {} of {} declared bytes",
            payload.kind,
            payload.sample_rate,
            payload.channels,
            payload.data.len(),
            payload.declared_bytes
        );
        Ok(payload)
    }
}

fn read_u16(data: &[u8], at: usize) -> StageResult<u16> {
    data.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| StageError::InvalidInput(format!("header truncated at byte {}", at)))
}

fn read_u32(data: &[u8], at: usize) -> StageResult<u32> {
    data.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| StageError::InvalidInput(format!("header truncated at byte {}", at)))
}

fn check_format(bits_per_sample: u16, sample_rate: u32, expected_rate: u32) -> StageResult<()> {
    if bits_per_sample != 16 {
        return Err(StageError::UnsupportedFormat(format!(
            "incompatible bitsPerSample {}",
            bits_per_sample
        )));
    }
    if sample_rate != expected_rate {
        return Err(StageError::UnsupportedFormat(format!(
            "incompatible sampleRate {} (expected {})",
            sample_rate, expected_rate
        )));
    }
    Ok(())
}

// "ma", version, bits per sample, rate (u16), channels, sample format, sample count (u32)
fn maud_declared_bytes(header: &[u8]) -> Option<usize> {
    let channels = usize::from(header[6].max(1));
    let sample_count = usize::try_from(read_u32(header, 8).ok()?).ok()?;
    sample_bytes(sample_count, channels)
}

fn sample_bytes(sample_count: usize, channels: usize) -> Option<usize> {
    sample_count.checked_mul(2)?.checked_mul(channels)
}

// Raw PCM whose first sample is 0x616d also starts with "ma"; a real MAUD
// header carries version 1, 16-bit samples and a size that fits the body.
fn looks_like_maud(data: &[u8]) -> bool {
    if data.len() < MAUD_HEADER_BYTES || &data[0..2] != b"ma" || data[2] != 1 || data[3] != 16 {
        return false;
    }
    maud_declared_bytes(data).map_or(false, |declared| declared <= data.len() - MAUD_HEADER_BYTES)
}

fn parse_maud(data: &[u8], expected_rate: u32) -> StageResult<PcmPayload<'_>> {
    if data.len() < MAUD_HEADER_BYTES {
        return Err(StageError::InvalidInput(format!(
            "MAUD header needs {} bytes, got {}",
            MAUD_HEADER_BYTES,
            data.len()
        )));
    }
    if &data[0..2] != b"ma" {
        return Err(StageError::UnsupportedFormat("missing MAUD signature".into()));
    }

    let bits_per_sample = u16::from(data[3]);
    let sample_rate = u32::from(read_u16(data, 4)?);
    let channels = u16::from(data[6]).max(1);
    check_format(bits_per_sample, sample_rate, expected_rate)?;

    let declared_bytes = maud_declared_bytes(data).ok_or_else(|| {
        StageError::InvalidInput("MAUD sample count does not fit in memory".into())
    })?;
    let body = &data[MAUD_HEADER_BYTES..];
    Ok(PcmPayload {
        kind: ContainerKind::Maud,
        sample_rate,
        channels,
        header_bytes: MAUD_HEADER_BYTES,
        declared_bytes,
        data: &body[..body.len().min(declared_bytes)],
    })
}

fn parse_wav(data: &[u8], expected_rate: u32) -> StageResult<PcmPayload<'_>> {
    if ContainerKind::detect(data) != ContainerKind::Wav {
        return Err(StageError::UnsupportedFormat(
            "invalid RIFF/WAVE header".into(),
        ));
    }

    let mut pos = RIFF_HEADER_BYTES;
    let mut format: Option<(u32, u16)> = None;

    while pos + CHUNK_HEADER_BYTES <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = read_u32(data, pos + 4)? as usize;
        pos += CHUNK_HEADER_BYTES;

        match chunk_id {
            b"fmt " => {
                if chunk_size < 16 {
                    return Err(StageError::InvalidInput("fmt chunk too small".into()));
                }
                let audio_format = read_u16(data, pos)?;
                if audio_format != WAVE_FORMAT_PCM {
                    return Err(StageError::UnsupportedFormat(format!(
                        "unsupported format {}",
                        audio_format
                    )));
                }
                let channels = read_u16(data, pos + 2)?.max(1);
                let sample_rate = read_u32(data, pos + 4)?;
                let bits_per_sample = read_u16(data, pos + 14)?;
                check_format(bits_per_sample, sample_rate, expected_rate)?;
                format = Some((sample_rate, channels));
            }
            b"data" => {
                let (sample_rate, channels) = format.ok_or_else(|| {
                    StageError::InvalidInput("data chunk precedes fmt chunk".into())
                })?;
                let end = data.len().min(pos + chunk_size);
                return Ok(PcmPayload {
                    kind: ContainerKind::Wav,
                    sample_rate,
                    channels,
                    header_bytes: pos,
                    declared_bytes: chunk_size,
                    data: &data[pos..end],
                });
            }
            _ => {}
        }

        // chunks are padded to even sizes
        pos = pos.saturating_add(chunk_size + (chunk_size & 1));
    }

    Err(StageError::InvalidInput("data chunk not found".into()))
}

/// Builds a 12-byte MAUD header for mono 16-bit samples.
pub fn maud_header(sample_rate: u16, sample_count: u32) -> [u8; MAUD_HEADER_BYTES] {
    let mut header = [0u8; MAUD_HEADER_BYTES];
    header[0..2].copy_from_slice(b"ma");
    header[2] = 1;
    header[3] = 16;
    header[4..6].copy_from_slice(&sample_rate.to_le_bytes());
    header[6] = 1;
    header[8..12].copy_from_slice(&sample_count.to_le_bytes());
    header
}

/// Builds a canonical 44-byte WAV header for mono 16-bit PCM.
pub fn wav_header(sample_rate: u32, data_bytes: u32) -> Vec<u8> {
    let mut header = Vec::with_capacity(44);
    header.extend_from_slice(b"RIFF");
    header.extend_from_slice(&(36 + data_bytes).to_le_bytes());
    header.extend_from_slice(b"WAVE");
    header.extend_from_slice(b"fmt ");
    header.extend_from_slice(&16u32.to_le_bytes());
    header.extend_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
    header.extend_from_slice(&1u16.to_le_bytes());
    header.extend_from_slice(&sample_rate.to_le_bytes());
    header.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    header.extend_from_slice(&2u16.to_le_bytes());
    header.extend_from_slice(&16u16.to_le_bytes());
    header.extend_from_slice(b"data");
    header.extend_from_slice(&data_bytes.to_le_bytes());
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcm::encode_samples;

    fn wav_bytes(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let body = encode_samples(samples);
        let mut bytes = wav_header(sample_rate, body.len() as u32);
        bytes.extend_from_slice(&body);
        bytes
    }

    #[test]
    fn detects_containers_by_magic() {
        assert_eq!(ContainerKind::detect(&wav_bytes(8000, &[0])), ContainerKind::Wav);
        assert_eq!(ContainerKind::detect(&maud_header(8000, 0)), ContainerKind::Maud);
        assert_eq!(ContainerKind::detect(&[1, 2, 3, 4]), ContainerKind::Raw);
    }

    #[test]
    fn wav_payload_points_at_data_chunk() {
        let bytes = wav_bytes(11_025, &[1, -2, 3]);
        let payload = PcmPayload::parse(&bytes, 11_025).unwrap();
        assert_eq!(payload.kind, ContainerKind::Wav);
        assert_eq!(payload.channels, 1);
        assert_eq!(payload.data, &encode_samples(&[1, -2, 3])[..]);
        assert_eq!(payload.declared_bytes, 6);
    }

    #[test]
    fn wav_with_mismatched_rate_is_rejected() {
        let bytes = wav_bytes(44_100, &[0, 0]);
        let err = PcmPayload::parse(&bytes, 11_025).unwrap_err();
        assert!(matches!(err, StageError::UnsupportedFormat(ref m) if m.contains("sampleRate")));
    }

    #[test]
    fn wav_with_non_pcm_format_is_rejected() {
        let mut bytes = wav_bytes(11_025, &[0, 0]);
        // audio format lives right after the fmt chunk header
        bytes[20] = 3;
        assert!(matches!(
            PcmPayload::parse(&bytes, 11_025),
            Err(StageError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn wav_with_8_bit_samples_is_rejected() {
        let mut bytes = wav_bytes(11_025, &[0, 0]);
        bytes[34] = 8;
        let err = PcmPayload::parse(&bytes, 11_025).unwrap_err();
        assert!(matches!(err, StageError::UnsupportedFormat(ref m) if m.contains("bitsPerSample")));
    }

    #[test]
    fn wav_skips_unknown_chunks() {
        let body = encode_samples(&[7, 7]);
        let mut bytes = wav_header(8000, body.len() as u32);
        // splice a LIST chunk with odd size (padded) before "data"
        let data_chunk = bytes.split_off(36);
        bytes.extend_from_slice(b"LIST");
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(&data_chunk);
        bytes.extend_from_slice(&body);
        let payload = PcmPayload::parse(&bytes, 8000).unwrap();
        assert_eq!(payload.data, &body[..]);
    }

    #[test]
    fn truncated_wav_data_is_clamped() {
        let mut bytes = wav_bytes(8000, &[1, 2, 3, 4]);
        bytes.truncate(bytes.len() - 3);
        let payload = PcmPayload::parse(&bytes, 8000).unwrap();
        assert_eq!(payload.declared_bytes, 8);
        assert_eq!(payload.data.len(), 5);
    }

    #[test]
    fn header_prefix_is_enough_to_locate_samples() {
        let bytes = wav_bytes(8000, &[1; 300]);
        let payload = PcmPayload::parse(&bytes[..64], 8000).unwrap();
        assert_eq!(payload.header_bytes, 44);
        assert_eq!(payload.declared_bytes, 600);
        assert_eq!(payload.data.len(), 20);
    }

    #[test]
    fn wav_without_data_chunk_is_invalid() {
        let bytes = wav_header(8000, 0);
        let without_data = &bytes[..36];
        assert!(matches!(
            PcmPayload::parse(without_data, 8000),
            Err(StageError::InvalidInput(_))
        ));
    }

    #[test]
    fn maud_payload_skips_twelve_bytes() {
        let body = encode_samples(&[5, 6]);
        let mut bytes = maud_header(11_025, 2).to_vec();
        bytes.extend_from_slice(&body);
        let payload = PcmPayload::parse(&bytes, 11_025).unwrap();
        assert_eq!(payload.kind, ContainerKind::Maud);
        assert_eq!(payload.data, &body[..]);
    }

    #[test]
    fn raw_audio_starting_with_ma_stays_raw() {
        // 0x616d reads as "ma"; the next sample is not a version/bits pair
        let mut samples = vec![0x616d];
        samples.extend(std::iter::repeat(1000).take(4000));
        let bytes = encode_samples(&samples);
        assert_eq!(ContainerKind::detect(&bytes), ContainerKind::Raw);
        let payload = PcmPayload::parse(&bytes, 11_025).unwrap();
        assert_eq!(payload.kind, ContainerKind::Raw);
        assert_eq!(payload.data.len(), bytes.len());
    }

    #[test]
    fn maud_lookalike_with_oversized_count_stays_raw() {
        // "ma", version 1, 16 bits, 11025 Hz, then a sample count far past the body
        let bytes = encode_samples(&[0x616d, 0x1001, 11_025, 1, 0x7fff, 0x7fff, 0, 0]);
        assert_eq!(&bytes[..4], b"ma\x01\x10");
        assert_eq!(ContainerKind::detect(&bytes), ContainerKind::Raw);
    }

    #[test]
    fn sample_byte_count_overflow_is_caught() {
        assert_eq!(sample_bytes(10, 2), Some(40));
        assert_eq!(sample_bytes(usize::MAX / 2 + 1, 1), None);
        assert_eq!(sample_bytes(usize::MAX / 4, 3), None);
    }

    #[test]
    fn forced_maud_with_huge_count_keeps_only_the_body() {
        let mut bytes = maud_header(11_025, u32::MAX).to_vec();
        bytes[6] = u8::MAX;
        bytes.extend_from_slice(&encode_samples(&[7, 7]));
        match PcmPayload::parse_as(ContainerKind::Maud, &bytes, 11_025) {
            Ok(payload) => assert_eq!(payload.data.len(), 4),
            Err(err) => assert!(matches!(err, StageError::InvalidInput(_))),
        }
    }

    #[test]
    fn short_maud_header_is_invalid() {
        assert!(matches!(
            PcmPayload::parse_as(ContainerKind::Maud, b"ma\x01\x10", 11_025),
            Err(StageError::InvalidInput(_))
        ));
    }

    #[test]
    fn raw_payload_is_the_whole_buffer() {
        let bytes = [1u8, 2, 3];
        let payload = PcmPayload::parse(&bytes, 16_000).unwrap();
        assert_eq!(payload.kind, ContainerKind::Raw);
        assert_eq!(payload.sample_rate, 16_000);
        assert_eq!(payload.data.len(), 3);
    }
}
