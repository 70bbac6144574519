use crate::error::PipelineError;

/// PCM encoding of an audio source's byte stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceFormat {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
    pub big_endian: bool,
    pub signed: bool,
}

impl SourceFormat {
    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample / 8) as usize
    }

    /// Bytes occupied by one sample across all channels.
    pub fn frame_stride(&self) -> usize {
        self.bytes_per_sample() * self.channels as usize
    }
}

/// All bit depths normalize against the 16-bit full-scale value. 8-bit input
/// therefore lands well inside [-1, 1]; calibration absorbs the scale.
const NORMALIZATION: f32 = 32768.0;

/// Decode a raw PCM byte buffer into a mono sample sequence in [-1.0, 1.0].
///
/// Channels are downmixed by arithmetic mean. Unsigned encodings are
/// rebiased by the signed range midpoint before normalization. Trailing
/// bytes short of a full multi-channel sample are ignored.
pub fn decode_frame(bytes: &[u8], format: &SourceFormat) -> Result<Vec<f32>, PipelineError> {
    let bytes_per_sample = match format.bits_per_sample {
        8 | 16 => format.bytes_per_sample(),
        other => {
            return Err(PipelineError::Format(format!(
                "unsupported sample width: {other} bits"
            )))
        }
    };
    let channels = format.channels as usize;
    let stride = bytes_per_sample * channels;
    let num_samples = bytes.len() / stride;

    let mut samples = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        let start = i * stride;
        let mut acc = 0i32;
        for channel in 0..channels {
            let off = start + channel * bytes_per_sample;
            acc += match bytes_per_sample {
                2 => {
                    let pair = if format.big_endian {
                        [bytes[off], bytes[off + 1]]
                    } else {
                        [bytes[off + 1], bytes[off]]
                    };
                    if format.signed {
                        i16::from_be_bytes(pair) as i32
                    } else {
                        u16::from_be_bytes(pair) as i32 - 32768
                    }
                }
                _ => {
                    if format.signed {
                        bytes[off] as i8 as i32
                    } else {
                        bytes[off] as i32 - 128
                    }
                }
            };
        }
        samples.push((acc as f32 / channels as f32) / NORMALIZATION);
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(bits: u16, channels: u16, big_endian: bool, signed: bool) -> SourceFormat {
        SourceFormat {
            sample_rate: 44_100,
            bits_per_sample: bits,
            channels,
            big_endian,
            signed,
        }
    }

    /// Byte pattern of digital silence for a format: zero for signed
    /// encodings, the range midpoint for unsigned ones.
    fn silent_frame(fmt: &SourceFormat, num_samples: usize) -> Vec<u8> {
        let mut bytes = Vec::new();
        for _ in 0..num_samples * fmt.channels as usize {
            match (fmt.bits_per_sample, fmt.signed, fmt.big_endian) {
                (8, true, _) => bytes.push(0x00),
                (8, false, _) => bytes.push(0x80),
                (16, true, _) => bytes.extend([0x00, 0x00]),
                (16, false, true) => bytes.extend([0x80, 0x00]),
                (16, false, false) => bytes.extend([0x00, 0x80]),
                _ => unreachable!(),
            }
        }
        bytes
    }

    #[test]
    fn silence_decodes_to_zeros_for_all_formats() {
        for bits in [8u16, 16] {
            for channels in [1u16, 2, 4] {
                for big_endian in [false, true] {
                    for signed in [false, true] {
                        let fmt = format(bits, channels, big_endian, signed);
                        let bytes = silent_frame(&fmt, 32);
                        let samples = decode_frame(&bytes, &fmt).unwrap();
                        assert_eq!(samples.len(), 32);
                        assert!(
                            samples.iter().all(|&s| s == 0.0),
                            "nonzero silence for {fmt:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn rejects_unsupported_bit_depth() {
        let fmt = format(24, 1, false, true);
        assert!(matches!(
            decode_frame(&[0; 6], &fmt),
            Err(PipelineError::Format(_))
        ));
    }

    #[test]
    fn decodes_16_bit_little_endian() {
        let fmt = format(16, 1, false, true);
        // 16384 = half of full scale
        let samples = decode_frame(&16384i16.to_le_bytes(), &fmt).unwrap();
        assert_eq!(samples, vec![0.5]);
    }

    #[test]
    fn decodes_16_bit_big_endian_negative() {
        let fmt = format(16, 1, true, true);
        let samples = decode_frame(&(-16384i16).to_be_bytes(), &fmt).unwrap();
        assert_eq!(samples, vec![-0.5]);
    }

    #[test]
    fn downmixes_channels_by_mean() {
        let fmt = format(16, 2, false, true);
        let mut bytes = Vec::new();
        bytes.extend(16384i16.to_le_bytes());
        bytes.extend(0i16.to_le_bytes());
        let samples = decode_frame(&bytes, &fmt).unwrap();
        assert_eq!(samples, vec![0.25]);
    }

    #[test]
    fn unsigned_midpoint_rebias() {
        let fmt = format(8, 1, false, false);
        let samples = decode_frame(&[0xFF, 0x00, 0x80], &fmt).unwrap();
        assert_eq!(samples.len(), 3);
        assert!(samples[0] > 0.0);
        assert!(samples[1] < 0.0);
        assert_eq!(samples[2], 0.0);
    }

    #[test]
    fn ignores_trailing_partial_sample() {
        let fmt = format(16, 2, false, true);
        // one full stereo sample plus two stray bytes
        let samples = decode_frame(&[0, 0, 0, 0, 0x12, 0x34], &fmt).unwrap();
        assert_eq!(samples.len(), 1);
    }
}
