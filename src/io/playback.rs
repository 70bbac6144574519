use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use super::AudioSink;
use crate::audio::decode::SourceFormat;
use crate::error::PipelineError;

/// Buffered samples above which `write` blocks. The bound is what paces the
/// offline analysis loop against real-time playback.
const BUFFER_CAPACITY: usize = 16_384;

#[derive(Default)]
struct PlayRing {
    samples: VecDeque<f32>,
}

/// cpal output stream fed from a bounded sample ring. Accepts the 16-bit
/// signed little-endian byte stream produced by the file source.
pub struct PlaybackSink {
    stream: Option<cpal::Stream>,
    ring: Arc<(Mutex<PlayRing>, Condvar)>,
}

impl PlaybackSink {
    pub fn open(format: SourceFormat) -> Result<Self, PipelineError> {
        if format.bits_per_sample != 16 || format.big_endian || !format.signed {
            return Err(PipelineError::Format(
                "playback expects 16-bit signed little-endian PCM".into(),
            ));
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| PipelineError::DeviceUnsupported("no default output device".into()))?;
        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let ring = Arc::new((Mutex::new(PlayRing::default()), Condvar::new()));
        let ring_out = Arc::clone(&ring);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let (lock, cvar) = &*ring_out;
                    let mut ring = lock.lock().unwrap();
                    for slot in data.iter_mut() {
                        *slot = ring.samples.pop_front().unwrap_or(0.0);
                    }
                    cvar.notify_all();
                },
                |err| log::error!("playback stream error: {err}"),
                None,
            )
            .map_err(|e| PipelineError::DeviceUnsupported(e.to_string()))?;
        stream
            .play()
            .map_err(|e| PipelineError::DeviceUnsupported(e.to_string()))?;

        Ok(Self {
            stream: Some(stream),
            ring,
        })
    }
}

impl AudioSink for PlaybackSink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), PipelineError> {
        let (lock, cvar) = &*self.ring;
        let mut ring = lock.lock().unwrap();
        for pair in bytes.chunks_exact(2) {
            let sample = i16::from_le_bytes([pair[0], pair[1]]);
            ring.samples.push_back(sample as f32 / 32768.0);
        }
        while ring.samples.len() > BUFFER_CAPACITY {
            let (guard, _) = cvar.wait_timeout(ring, Duration::from_millis(200)).unwrap();
            ring = guard;
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), PipelineError> {
        if self.stream.is_none() {
            return Ok(());
        }
        let (lock, cvar) = &*self.ring;
        let mut ring = lock.lock().unwrap();
        while !ring.samples.is_empty() {
            let (guard, _) = cvar.wait_timeout(ring, Duration::from_millis(200)).unwrap();
            ring = guard;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), PipelineError> {
        self.stream.take();
        Ok(())
    }
}
