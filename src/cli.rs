use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "bandviz",
    about = "Per-band spectral intensity analyzer driving audio-reactive visuals"
)]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC); omit with --live
    pub input: Option<PathBuf>,

    /// Capture from a microphone instead of reading a file
    #[arg(long)]
    pub live: bool,

    /// Number of analysis bands (1-20)
    #[arg(short, long, default_value_t = 8)]
    pub bands: usize,

    /// Analyze without playing the file back
    #[arg(long)]
    pub no_playback: bool,

    /// Capture device name (substring match); default input device otherwise
    #[arg(long)]
    pub device: Option<String>,

    /// List capture devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
