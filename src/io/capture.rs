use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, StreamConfig};

use super::AudioSource;
use crate::audio::decode::SourceFormat;
use crate::error::PipelineError;

/// Live capture runs at exactly this format; devices that cannot provide it
/// are rejected up front rather than renegotiated.
pub const CAPTURE_SAMPLE_RATE: u32 = 44_100;
pub const CAPTURE_CHANNELS: u16 = 2;

#[derive(Default)]
struct CaptureRing {
    bytes: VecDeque<u8>,
    failed: bool,
}

/// Microphone capture exposed as a raw PCM byte source. The cpal callback
/// feeds a shared ring; `read` drains it, blocking until at least one full
/// stereo sample is available.
pub struct CaptureSource {
    _stream: cpal::Stream,
    ring: Arc<(Mutex<CaptureRing>, Condvar)>,
    format: SourceFormat,
}

impl CaptureSource {
    pub fn open(device_hint: Option<&str>) -> Result<Self, PipelineError> {
        let device = pick_device(device_hint)?;

        let supported = device
            .supported_input_configs()
            .map_err(|e| PipelineError::DeviceUnsupported(e.to_string()))?
            .find(|range| {
                range.sample_format() == SampleFormat::I16
                    && range.channels() == CAPTURE_CHANNELS
                    && range.min_sample_rate().0 <= CAPTURE_SAMPLE_RATE
                    && range.max_sample_rate().0 >= CAPTURE_SAMPLE_RATE
            })
            .ok_or_else(|| {
                PipelineError::DeviceUnsupported(format!(
                    "device does not support {CAPTURE_SAMPLE_RATE} Hz 16-bit {CAPTURE_CHANNELS}-channel capture"
                ))
            })?;
        let config: StreamConfig = supported
            .with_sample_rate(SampleRate(CAPTURE_SAMPLE_RATE))
            .into();

        let ring = Arc::new((Mutex::new(CaptureRing::default()), Condvar::new()));
        let ring_data = Arc::clone(&ring);
        let ring_err = Arc::clone(&ring);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let (lock, cvar) = &*ring_data;
                    let mut ring = lock.lock().unwrap();
                    for &sample in data {
                        ring.bytes.extend(sample.to_le_bytes());
                    }
                    cvar.notify_one();
                },
                move |err| {
                    log::error!("capture stream error: {err}");
                    let (lock, cvar) = &*ring_err;
                    lock.lock().unwrap().failed = true;
                    cvar.notify_one();
                },
                None,
            )
            .map_err(|e| PipelineError::DeviceUnsupported(e.to_string()))?;
        stream
            .play()
            .map_err(|e| PipelineError::DeviceUnsupported(e.to_string()))?;

        log::info!(
            "capturing from '{}' at {} Hz",
            device.name().unwrap_or_else(|_| "input".into()),
            CAPTURE_SAMPLE_RATE
        );

        Ok(Self {
            _stream: stream,
            ring,
            format: SourceFormat {
                sample_rate: CAPTURE_SAMPLE_RATE,
                bits_per_sample: 16,
                channels: CAPTURE_CHANNELS,
                big_endian: false,
                signed: true,
            },
        })
    }
}

impl AudioSource for CaptureSource {
    fn format(&self) -> SourceFormat {
        self.format
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, PipelineError> {
        let stride = self.format.frame_stride();
        let (lock, cvar) = &*self.ring;
        let mut ring = lock.lock().unwrap();
        loop {
            if ring.failed {
                return Err(PipelineError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "capture stream failed",
                )));
            }
            if ring.bytes.len() >= stride {
                break;
            }
            let (guard, _) = cvar.wait_timeout(ring, Duration::from_millis(200)).unwrap();
            ring = guard;
        }
        let n = buf.len().min(ring.bytes.len()) / stride * stride;
        for (slot, byte) in buf[..n].iter_mut().zip(ring.bytes.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

fn pick_device(device_hint: Option<&str>) -> Result<Device, PipelineError> {
    let host = cpal::default_host();
    match device_hint {
        Some(hint) => {
            let needle = hint.to_lowercase();
            host.input_devices()
                .map_err(|e| PipelineError::DeviceUnsupported(e.to_string()))?
                .find(|d| {
                    d.name()
                        .map(|n| n.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
                .ok_or_else(|| {
                    PipelineError::DeviceUnsupported(format!("no input device matching '{hint}'"))
                })
        }
        None => host
            .default_input_device()
            .ok_or_else(|| PipelineError::DeviceUnsupported("no default input device".into())),
    }
}

/// Names of every capture device the default host exposes.
pub fn input_device_names() -> Result<Vec<String>, PipelineError> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| PipelineError::DeviceUnsupported(e.to_string()))?;
    Ok(devices
        .filter_map(|d| d.name().ok())
        .collect())
}
