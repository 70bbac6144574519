pub mod capture;
pub mod file;
pub mod playback;

use crate::audio::decode::SourceFormat;
use crate::error::PipelineError;

/// A stream of raw PCM bytes in a fixed format. Offline mode reads a decoded
/// file; live mode reads a capture device ring.
pub trait AudioSource {
    fn format(&self) -> SourceFormat;

    /// Read up to `buf.len()` bytes, always a whole number of multi-channel
    /// samples. `Ok(0)` means end of stream. May block on I/O.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, PipelineError>;
}

/// Playback destination for offline mode. `write` may block to pace the
/// caller against real-time playback.
pub trait AudioSink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), PipelineError>;

    /// Block until everything written has been played out.
    fn drain(&mut self) -> Result<(), PipelineError>;

    fn close(&mut self) -> Result<(), PipelineError>;
}

/// Discards audio; stands in for playback when it is disabled.
pub struct NullSink;

impl AudioSink for NullSink {
    fn write(&mut self, _bytes: &[u8]) -> Result<(), PipelineError> {
        Ok(())
    }

    fn drain(&mut self) -> Result<(), PipelineError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), PipelineError> {
        Ok(())
    }
}
