use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::bands::BandConfig;
use super::calibrate::{self, BandState};
use super::decode;
use super::energy::band_energy;
use super::level;
use super::spectrum::SpectralAnalyzer;
use crate::error::PipelineError;
use crate::io::{AudioSink, AudioSource};
use crate::render::RenderSink;

/// Byte size of one analysis frame.
pub const FRAME_BYTES: usize = 4096;

/// How a run loop ended. Cancellation is a normal termination, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The source reached end of stream.
    Completed,
    /// A stop request was observed at a poll point.
    Stopped,
}

#[derive(Clone, Copy)]
enum Calibration {
    Static,
    Adaptive,
}

/// Cooperative cancellation for a running pipeline. Idempotent, non-blocking,
/// callable from any thread; the run loop observes it before the next frame
/// read, so worst-case stop latency is one in-flight frame.
#[derive(Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// One analysis run over one source. Owns the band table and the cancellation
/// flag; the band states and the worker pool are constructed per run and
/// never reused across runs.
pub struct Pipeline {
    bands: BandConfig,
    running: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new(bands: BandConfig) -> Self {
        Self {
            bands,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Offline mode: a static calibration pass over its own read of the
    /// source, then a streaming loop over a fresh read. Each frame's bytes
    /// go to the playback sink only after that frame's analysis barrier, so
    /// playback pacing is coupled to analysis throughput. The sink is closed
    /// on every exit path.
    pub fn run_offline<S, F>(
        &self,
        mut open: F,
        sink: &mut dyn AudioSink,
        render: &dyn RenderSink,
    ) -> Result<RunOutcome, PipelineError>
    where
        S: AudioSource,
        F: FnMut() -> Result<S, PipelineError>,
    {
        let result = (|| {
            let mut states = calibrate::static_pass(&self.bands, open()?)?;
            let mut source = open()?;
            let pool = self.build_pool()?;
            self.run_frames(
                &mut source,
                &pool,
                &mut states,
                Calibration::Static,
                render,
                Some(&mut *sink),
            )
        })();
        match result {
            Ok(RunOutcome::Completed) => {
                sink.drain()?;
                sink.close()?;
                Ok(RunOutcome::Completed)
            }
            Ok(RunOutcome::Stopped) => {
                sink.close()?;
                Ok(RunOutcome::Stopped)
            }
            Err(e) => {
                let _ = sink.close();
                Err(e)
            }
        }
    }

    /// Live mode: no pre-pass; per-band ranges adapt as frames arrive.
    pub fn run_live<S: AudioSource>(
        &self,
        mut source: S,
        render: &dyn RenderSink,
    ) -> Result<RunOutcome, PipelineError> {
        let mut states = calibrate::adaptive_states(self.bands.len());
        let pool = self.build_pool()?;
        self.run_frames(
            &mut source,
            &pool,
            &mut states,
            Calibration::Adaptive,
            render,
            None,
        )
    }

    fn build_pool(&self) -> Result<rayon::ThreadPool, PipelineError> {
        Ok(rayon::ThreadPoolBuilder::new()
            .num_threads(self.bands.len())
            .build()?)
    }

    /// The frame loop: read, decode, transform, fan out one task per band,
    /// join, then hand the frame to the sink. The `scope` join is the
    /// per-frame barrier; it bounds memory and guarantees in-order,
    /// exactly-once depth delivery per band per frame.
    fn run_frames(
        &self,
        source: &mut dyn AudioSource,
        pool: &rayon::ThreadPool,
        states: &mut [BandState],
        calibration: Calibration,
        render: &dyn RenderSink,
        mut sink: Option<&mut dyn AudioSink>,
    ) -> Result<RunOutcome, PipelineError> {
        let format = source.format();
        let sample_rate = format.sample_rate as f32;
        let adaptive = matches!(calibration, Calibration::Adaptive);
        let mut analyzer = SpectralAnalyzer::new();
        let mut buf = vec![0u8; FRAME_BYTES];

        loop {
            if !self.running.load(Ordering::SeqCst) {
                return Ok(RunOutcome::Stopped);
            }
            let bytes_read = source.read(&mut buf)?;
            if bytes_read == 0 {
                return Ok(RunOutcome::Completed);
            }

            let samples = decode::decode_frame(&buf[..bytes_read], &format)?;
            let magnitudes = analyzer.magnitudes(&samples);

            let bands = &self.bands;
            pool.scope(|scope| {
                for (index, state) in states.iter_mut().enumerate() {
                    let band = bands.get(index);
                    let magnitudes = &magnitudes;
                    scope.spawn(move |_| {
                        let energy =
                            band_energy(magnitudes, sample_rate, band.low_hz, band.high_hz);
                        if adaptive {
                            state.observe(energy);
                        }
                        let smoothed = state.smooth(energy);
                        let depth = level::map_depth(smoothed, state.min_volume, state.max_volume);
                        render.on_band_update(index, depth);
                    });
                }
            });

            if let Some(sink) = sink.as_deref_mut() {
                sink.write(&buf[..bytes_read])?;
            }
        }
    }
}
