mod audio;
mod cli;
mod config;
mod encode;
mod error;
mod report;

use anyhow::{Context, Result};
use clap::Parser;

use audio::song::Song;
use audio::spectrum::strongest_bins;
use cli::Cli;
use config::Config;
use encode::ffmpeg::ExcerptWriter;
use report::ChorusReport;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let mut cfg = match config::discover_config(cli.config.clone()) {
        // load_config already logs why a file was rejected
        Some(path) => match config::load_config(&path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => Config::default(),
        },
        None => Config::default(),
    };

    // CLI flags win over the config file
    if let Some(v) = cli.loud_sd { cfg.detection.loud_sd = v; }
    if let Some(v) = cli.quiet_sd { cfg.detection.quiet_sd = v; }
    if let Some(v) = cli.cushion { cfg.detection.incongruity_cushion = v; }
    if let Some(v) = cli.min_run { cfg.detection.min_sustained_frames = v; }
    if let Some(v) = cli.ffmpeg.clone() { cfg.output.ffmpeg = v; }
    let json = cli.json || cfg.output.json;

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }
    log::info!("Input: {}", cli.input.display());

    let audio_data = audio::decode::decode_audio(&cli.input)?;
    log::info!("Duration: {:.1}s", audio_data.duration_secs());

    let song = Song::with_config(&audio_data.samples, audio_data.sample_rate, cfg.detection)
        .with_context(|| format!("Cannot analyse {}", cli.input.display()))?;
    log::debug!("Song is {}", song);

    if let Some(second) = cli.spectrum {
        let frame = song
            .frame(second)
            .with_context(|| format!("No frame at {}s, song has {} frames", second, song.len()))?;
        for bin in strongest_bins(&frame.power_spectrum(), 10) {
            log::info!("  {:>8.3} kHz  {:>7.1} dB", bin.frequency_khz, bin.power_db);
        }
    }

    let chorus = song.find_chorus();
    let report = ChorusReport::new(&cli.input, &song, chorus.as_ref());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    if let Some(ref output) = cli.output {
        match chorus {
            Some(span) => ExcerptWriter::new(&cfg.output.ffmpeg).write(
                &cli.input,
                output,
                span.start_secs(),
                span.end_secs(),
            )?,
            None => log::warn!("No chorus found, nothing written to {}", output.display()),
        }
    }

    Ok(())
}
