use thiserror::Error;

/// Failures that abort a pipeline instance. There are no retries anywhere:
/// every error terminates the current run and is reported to the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Unsupported sample encoding or undecodable container.
    #[error("unsupported audio format: {0}")]
    Format(String),

    /// The requested capture or playback stream is unavailable at the fixed
    /// format. Surfaced before any frame is processed.
    #[error("audio device unsupported: {0}")]
    DeviceUnsupported(String),

    /// Read/write failure mid-stream.
    #[error("audio I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration, rejected before pipeline construction.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Band worker pool could not be built.
    #[error("worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
