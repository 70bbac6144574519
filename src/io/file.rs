use std::collections::VecDeque;
use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::AudioSource;
use crate::audio::decode::SourceFormat;
use crate::error::PipelineError;

/// A decoded audio file (WAV, MP3, FLAC, OGG, AAC) exposed as a raw PCM byte
/// stream: 16-bit signed little-endian, interleaved at the file's native
/// sample rate and channel count.
pub struct FileSource {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    format: SourceFormat,
    pending: VecDeque<u8>,
    eof: bool,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(container_error)?;
        let reader = probed.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| PipelineError::Format("no audio tracks found".into()))?;
        let track_id = track.id;
        let channels = track.codec_params.channels.map_or(1, |c| c.count());
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| PipelineError::Format("unknown sample rate".into()))?;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(container_error)?;

        log::info!("opened {}: {} Hz, {} channel(s)", path.display(), sample_rate, channels);

        Ok(Self {
            reader,
            decoder,
            track_id,
            format: SourceFormat {
                sample_rate,
                bits_per_sample: 16,
                channels: channels as u16,
                big_endian: false,
                signed: true,
            },
            pending: VecDeque::new(),
            eof: false,
        })
    }

    fn fill(&mut self, want: usize) -> Result<(), PipelineError> {
        while !self.eof && self.pending.len() < want {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    self.eof = true;
                    break;
                }
                Err(e) => return Err(container_error(e)),
            };
            if packet.track_id() != self.track_id {
                continue;
            }
            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                // skip corrupt packets, keep the stream going
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(e) => return Err(container_error(e)),
            };

            let spec = *decoded.spec();
            let mut sample_buf = SampleBuffer::<i16>::new(decoded.frames() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            for &sample in sample_buf.samples() {
                self.pending.extend(sample.to_le_bytes());
            }
        }
        Ok(())
    }
}

impl AudioSource for FileSource {
    fn format(&self) -> SourceFormat {
        self.format
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, PipelineError> {
        self.fill(buf.len())?;
        let stride = self.format.frame_stride();
        let n = buf.len().min(self.pending.len()) / stride * stride;
        for (slot, byte) in buf[..n].iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

fn container_error(err: SymphoniaError) -> PipelineError {
    match err {
        SymphoniaError::IoError(e) => PipelineError::Io(e),
        other => PipelineError::Format(other.to_string()),
    }
}
