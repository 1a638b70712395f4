/// Bytes per packed 16-bit sample.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Read-only view of packed little-endian 16-bit samples.
///
/// The view borrows the caller's bytes for as long as it lives and never
/// copies them. A trailing odd byte is not part of any sample.
#[derive(Debug, Clone, Copy)]
pub struct SampleView<'a> {
    bytes: &'a [u8],
}

impl<'a> SampleView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Number of complete samples.
    pub fn len(&self) -> usize {
        self.bytes.len() / BYTES_PER_SAMPLE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_trailing_byte(&self) -> bool {
        self.bytes.len() % BYTES_PER_SAMPLE != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = i16> + 'a {
        self.bytes
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
    }
}

/// Packs samples into little-endian bytes.
pub fn encode_samples(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_counts_whole_samples_only() {
        let view = SampleView::new(&[1, 0, 2, 0, 9]);
        assert_eq!(view.len(), 2);
        assert!(view.has_trailing_byte());
        assert_eq!(view.iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn empty_and_single_byte_views_are_empty() {
        assert!(SampleView::new(&[]).is_empty());
        assert!(SampleView::new(&[0xff]).is_empty());
    }

    #[test]
    fn negative_samples_decode_with_sign() {
        let bytes = encode_samples(&[-1, i16::MIN, i16::MAX]);
        assert_eq!(&bytes[..2], &[0xff, 0xff]);
        assert_eq!(
            SampleView::new(&bytes).iter().collect::<Vec<_>>(),
            vec![-1, i16::MIN, i16::MAX]
        );
    }
}
