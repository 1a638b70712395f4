use crate::pcm::SampleView;
use crate::prelude::{StageError, StageResult};

pub struct StatsHelper;

impl StatsHelper {
    /// Sum of squared samples. Each square is at most 2^30, so a `u64`
    /// holds 2^34 samples before it could wrap.
    pub fn sum_of_squares(samples: impl IntoIterator<Item = i16>) -> u64 {
        samples
            .into_iter()
            .map(|s| {
                let s = i64::from(s);
                (s * s) as u64
            })
            .sum()
    }
}

/// Root-mean-square power of a buffer of packed 16-bit signed samples.
///
/// The buffer is read as `len / 2` little-endian `i16` values; an odd
/// trailing byte is ignored. Buffers holding no complete sample are
/// rejected with [`StageError::InvalidArgument`] instead of dividing by
/// zero.
pub fn compute_rms_power(buffer: &[u8]) -> StageResult<f64> {
    let view = SampleView::new(buffer);
    if view.is_empty() {
        return Err(StageError::InvalidArgument(format!(
            "buffer of {} byte(s) holds no 16-bit sample",
            buffer.len()
        )));
    }

    let sum_sq = StatsHelper::sum_of_squares(view.iter());
    Ok((sum_sq as f64 / view.len() as f64).sqrt())
}
