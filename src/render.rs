use std::io::Write;
use std::sync::Mutex;

use crate::audio::level::MAX_DEPTH;

/// Receives one depth update per band per frame.
///
/// Updates for different bands within the same frame arrive concurrently
/// from different worker threads; updates for one band across frames are
/// strictly ordered.
pub trait RenderSink: Sync {
    fn on_band_update(&self, band_index: usize, depth: u32);
}

/// In-place ANSI terminal meter, one bracketed bar per band.
pub struct TermRenderer {
    depths: Mutex<Vec<u32>>,
}

impl TermRenderer {
    pub fn new(num_bands: usize) -> Self {
        Self {
            depths: Mutex::new(vec![0; num_bands]),
        }
    }
}

impl RenderSink for TermRenderer {
    fn on_band_update(&self, band_index: usize, depth: u32) {
        let mut depths = self.depths.lock().unwrap();
        if let Some(slot) = depths.get_mut(band_index) {
            *slot = depth;
        }

        let mut line = String::with_capacity(1 + depths.len() * (MAX_DEPTH as usize + 3));
        line.push('\r');
        for (i, &d) in depths.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            line.push('[');
            for level in 0..MAX_DEPTH {
                line.push(if level < d { '#' } else { '-' });
            }
            line.push(']');
        }

        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(line.as_bytes());
        let _ = stdout.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_band_is_ignored() {
        let renderer = TermRenderer::new(2);
        renderer.on_band_update(7, 3);
        assert_eq!(*renderer.depths.lock().unwrap(), vec![0, 0]);
    }

    #[test]
    fn tracks_latest_depth_per_band() {
        let renderer = TermRenderer::new(3);
        renderer.on_band_update(1, 4);
        renderer.on_band_update(1, 6);
        renderer.on_band_update(2, 8);
        assert_eq!(*renderer.depths.lock().unwrap(), vec![0, 6, 8]);
    }
}
