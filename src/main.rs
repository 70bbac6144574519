mod audio;
mod cli;
mod config;
mod error;
mod io;
mod render;

use std::thread;

use anyhow::{Context, Result};
use clap::Parser;

use audio::bands::BandConfig;
use audio::pipeline::{Pipeline, RunOutcome};
use cli::Cli;
use io::capture::CaptureSource;
use io::file::FileSource;
use io::playback::PlaybackSink;
use io::{AudioSink, AudioSource, NullSink};
use render::TermRenderer;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect bandviz.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = std::path::PathBuf::from("bandviz.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("bandviz").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("bandviz").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.bands == 8 {
                cli.bands = cfg.analysis.bands;
            }
            if cli.device.is_none() {
                cli.device = cfg.live.device;
            }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    if cli.list_devices {
        for name in io::capture::input_device_names()? {
            println!("{name}");
        }
        return Ok(());
    }

    let bands = BandConfig::new(cli.bands).context("invalid band count")?;
    log::info!("analyzing {} band(s)", bands.len());

    let renderer = TermRenderer::new(bands.len());
    let pipeline = Pipeline::new(bands);

    // Stop on Enter (or closed stdin)
    let handle = pipeline.stop_handle();
    thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        handle.stop();
    });

    let outcome = if cli.live {
        log::info!("live mode: adaptive calibration, press Enter to stop");
        let source = CaptureSource::open(cli.device.as_deref())?;
        pipeline.run_live(source, &renderer)?
    } else {
        let input = cli
            .input
            .as_ref()
            .context("input audio file is required (or pass --live)")?;
        if !input.exists() {
            anyhow::bail!("Input file not found: {}", input.display());
        }

        // probe once for the stream format so the sink can be opened up front
        let format = FileSource::open(input)?.format();
        let mut sink: Box<dyn AudioSink> = if cli.no_playback {
            Box::new(NullSink)
        } else {
            Box::new(PlaybackSink::open(format)?)
        };

        let path = input.clone();
        pipeline.run_offline(move || FileSource::open(&path), sink.as_mut(), &renderer)?
    };

    println!();
    match outcome {
        RunOutcome::Completed => log::info!("stream complete"),
        RunOutcome::Stopped => log::info!("stopped"),
    }
    Ok(())
}
