use rustfft::{num_complex::Complex, FftPlanner};

/// Forward FFT front-end producing single-sided magnitude spectra.
///
/// Input frames are zero-padded to the next power of two; the planner caches
/// plans so repeated frames of the same length reuse the same FFT.
pub struct SpectralAnalyzer {
    planner: FftPlanner<f32>,
}

impl SpectralAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Magnitudes of the first N/2 bins of the zero-padded transform, where
    /// N is the padded power-of-two size. Phase is discarded.
    pub fn magnitudes(&mut self, samples: &[f32]) -> Vec<f32> {
        if samples.is_empty() {
            return Vec::new();
        }
        let size = samples.len().next_power_of_two();
        let mut buffer: Vec<Complex<f32>> = Vec::with_capacity(size);
        buffer.extend(samples.iter().map(|&s| Complex::new(s, 0.0)));
        buffer.resize(size, Complex::new(0.0, 0.0));

        let fft = self.planner.plan_fft_forward(size);
        fft.process(&mut buffer);

        buffer[..size / 2].iter().map(|c| c.norm()).collect()
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn sinusoid_energy_concentrates_at_expected_bin() {
        let sample_rate = 8000.0;
        let freq = 1000.0;
        let n = 256;
        let samples: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect();

        let magnitudes = SpectralAnalyzer::new().magnitudes(&samples);
        assert_eq!(magnitudes.len(), n / 2);

        let expected = (freq * n as f32 / sample_rate).round() as usize;
        let peak = magnitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert!(
            peak.abs_diff(expected) <= 1,
            "peak at bin {peak}, expected near {expected}"
        );
    }

    #[test]
    fn zero_pads_to_next_power_of_two() {
        let samples = vec![1.0; 300];
        let magnitudes = SpectralAnalyzer::new().magnitudes(&samples);
        // padded to 512, single-sided half
        assert_eq!(magnitudes.len(), 256);
    }

    #[test]
    fn degenerate_inputs() {
        let mut analyzer = SpectralAnalyzer::new();
        assert!(analyzer.magnitudes(&[]).is_empty());
        // one sample pads to a size-1 transform: no single-sided bins
        assert!(analyzer.magnitudes(&[0.7]).is_empty());
    }

    #[test]
    fn silence_has_no_energy() {
        let magnitudes = SpectralAnalyzer::new().magnitudes(&[0.0; 1024]);
        assert!(magnitudes.iter().all(|&m| m == 0.0));
    }
}
