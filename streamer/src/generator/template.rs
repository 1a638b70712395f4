use std::f32::consts::PI;

/// Generates `length` samples of a unit sine at `frequency` Hz.
pub fn sine_wave(length: usize, frequency: f32, sample_rate: u32) -> Vec<f32> {
    let step = 2.0 * PI * frequency / sample_rate.max(1) as f32;
    (0..length).map(|i| (i as f32 * step).sin()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_wave_starts_at_zero_and_peaks_at_quarter_period() {
        let wave = sine_wave(8, 1.0, 4);
        assert_eq!(wave.len(), 8);
        assert!(wave[0].abs() < 1e-6);
        assert!((wave[1] - 1.0).abs() < 1e-6);
    }
}
