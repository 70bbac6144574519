/// RMS energy of the magnitude spectrum restricted to `low_hz..high_hz`.
///
/// Bin indices are floored from the band edges and clamped to the spectrum;
/// a band lying entirely above Nyquist collapses to a single-bin average at
/// the top of the spectrum rather than an empty range. An empty spectrum has
/// no energy.
pub fn band_energy(magnitudes: &[f32], sample_rate: f32, low_hz: f32, high_hz: f32) -> f32 {
    if magnitudes.is_empty() {
        return 0.0;
    }
    let freq_resolution = sample_rate / (2.0 * magnitudes.len() as f32);
    let top = magnitudes.len() - 1;
    let high = ((high_hz / freq_resolution) as usize).min(top);
    let low = ((low_hz / freq_resolution) as usize).min(top).min(high);

    let count = high - low + 1;
    let sum_squares: f32 = magnitudes[low..=high].iter().map(|&m| m * m).sum();
    (sum_squares / count as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44_100.0;

    #[test]
    fn scaling_in_band_magnitudes_increases_energy() {
        let magnitudes: Vec<f32> = (0..1024).map(|i| (i % 7) as f32 * 0.1 + 0.1).collect();
        let base = band_energy(&magnitudes, SAMPLE_RATE, 400.0, 500.0);

        let resolution = SAMPLE_RATE / 2048.0;
        let low = (400.0 / resolution) as usize;
        let high = (500.0 / resolution) as usize;
        let mut boosted = magnitudes.clone();
        for m in &mut boosted[low..=high] {
            *m *= 3.0;
        }
        let scaled = band_energy(&boosted, SAMPLE_RATE, 400.0, 500.0);
        assert!(scaled > base);
    }

    #[test]
    fn out_of_band_energy_is_ignored() {
        let mut magnitudes = vec![0.0f32; 1024];
        // energy far above the queried band only
        magnitudes[800] = 5.0;
        assert_eq!(band_energy(&magnitudes, SAMPLE_RATE, 100.0, 200.0), 0.0);
    }

    #[test]
    fn band_above_nyquist_uses_top_bin() {
        let mut magnitudes = vec![1.0f32; 512];
        magnitudes[511] = 4.0;
        // both edges clamp to the last bin
        let energy = band_energy(&magnitudes, 8000.0, 100_000.0, 200_000.0);
        assert_eq!(energy, 4.0);
    }

    #[test]
    fn empty_spectrum_has_no_energy() {
        assert_eq!(band_energy(&[], SAMPLE_RATE, 20.0, 50.0), 0.0);
    }

    #[test]
    fn uniform_spectrum_rms_is_the_magnitude() {
        let magnitudes = vec![0.5f32; 1024];
        let energy = band_energy(&magnitudes, SAMPLE_RATE, 1000.0, 2000.0);
        assert!((energy - 0.5).abs() < 1e-6);
    }
}
