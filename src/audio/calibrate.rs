use indicatif::{ProgressBar, ProgressStyle};

use super::bands::BandConfig;
use super::decode;
use super::energy::band_energy;
use super::level;
use super::pipeline::FRAME_BYTES;
use super::spectrum::SpectralAnalyzer;
use crate::error::PipelineError;
use crate::io::AudioSource;

/// Per-band volume state, one cell per band for the lifetime of a pipeline
/// instance. Each cell is handed to exactly one band task per frame as an
/// exclusive borrow, so no field needs a runtime lock.
#[derive(Debug)]
pub struct BandState {
    pub smoothed: f32,
    pub min_volume: f32,
    pub max_volume: f32,
}

impl BandState {
    /// Adaptive starting point: the range is widened by the first observation.
    fn adaptive() -> Self {
        Self {
            smoothed: 0.0,
            min_volume: f32::INFINITY,
            max_volume: f32::NEG_INFINITY,
        }
    }

    fn calibrated(min_volume: f32, max_volume: f32) -> Self {
        Self {
            smoothed: 0.0,
            min_volume,
            max_volume,
        }
    }

    /// Fold a live frame's raw energy into the running range. Applied before
    /// the smoothing update.
    pub fn observe(&mut self, energy: f32) {
        self.min_volume = self.min_volume.min(energy);
        self.max_volume = self.max_volume.max(energy);
    }

    /// Advance the exponential moving average and return the new level.
    pub fn smooth(&mut self, energy: f32) -> f32 {
        self.smoothed = level::smooth(self.smoothed, energy);
        self.smoothed
    }
}

pub fn adaptive_states(num_bands: usize) -> Vec<BandState> {
    (0..num_bands).map(|_| BandState::adaptive()).collect()
}

/// Calibrated range of an energy sequence: the maximum, and the value at the
/// 30th percentile by rank (not interpolated) as the minimum. Empty input
/// has no range.
pub fn calibrate_range(energies: &[f32]) -> Option<(f32, f32)> {
    if energies.is_empty() {
        return None;
    }
    let max = energies.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sorted = energies.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let index = (sorted.len() as f32 * 0.3) as usize;
    Some((sorted[index], max))
}

/// Static calibration: run the entire source through the analysis front-end,
/// collecting every frame's per-band energy, and derive each band's range.
///
/// The pass owns its read of the source and fully consumes it; streaming
/// reopens the source afterwards.
pub fn static_pass<S: AudioSource>(
    bands: &BandConfig,
    mut source: S,
) -> Result<Vec<BandState>, PipelineError> {
    let format = source.format();
    let mut analyzer = SpectralAnalyzer::new();
    let mut buf = vec![0u8; FRAME_BYTES];
    let mut energies: Vec<Vec<f32>> = vec![Vec::new(); bands.len()];

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} calibrating: {pos} frames")
            .unwrap(),
    );

    loop {
        let bytes_read = source.read(&mut buf)?;
        if bytes_read == 0 {
            break;
        }
        let samples = decode::decode_frame(&buf[..bytes_read], &format)?;
        let magnitudes = analyzer.magnitudes(&samples);
        for (band, collected) in bands.iter().zip(energies.iter_mut()) {
            collected.push(band_energy(
                &magnitudes,
                format.sample_rate as f32,
                band.low_hz,
                band.high_hz,
            ));
        }
        spinner.inc(1);
    }
    spinner.finish_and_clear();

    let frames = energies.first().map_or(0, |collected| collected.len());
    log::info!("calibration: {} frames across {} bands", frames, bands.len());

    energies
        .iter()
        .map(|sequence| {
            calibrate_range(sequence)
                .map(|(min, max)| BandState::calibrated(min, max))
                .ok_or_else(|| {
                    PipelineError::Format("source produced no frames to calibrate".into())
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_max_and_30th_percentile() {
        let energies: Vec<f32> = (1..=10).map(|v| v as f32).collect();
        assert_eq!(calibrate_range(&energies), Some((4.0, 10.0)));
    }

    #[test]
    fn percentile_is_rank_based_on_unsorted_input() {
        let energies = vec![10.0, 1.0, 5.0, 2.0, 8.0, 3.0, 9.0, 4.0, 7.0, 6.0];
        assert_eq!(calibrate_range(&energies), Some((4.0, 10.0)));
    }

    #[test]
    fn empty_sequence_has_no_range() {
        assert_eq!(calibrate_range(&[]), None);
    }

    #[test]
    fn single_value_collapses_the_range() {
        assert_eq!(calibrate_range(&[3.5]), Some((3.5, 3.5)));
    }

    #[test]
    fn adaptive_observation_widens_range() {
        let mut state = BandState::adaptive();
        state.observe(2.0);
        assert_eq!((state.min_volume, state.max_volume), (2.0, 2.0));
        state.observe(5.0);
        state.observe(1.0);
        assert_eq!((state.min_volume, state.max_volume), (1.0, 5.0));
    }
}
