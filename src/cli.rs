use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "refrain", about = "Guess where a song's chorus starts and ends from its loudness")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC)
    pub input: PathBuf,

    /// Write the detected chorus to this file (requires ffmpeg)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file (defaults to refrain.toml or ~/.config/refrain/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Log the strongest frequency bins of the frame at this second
    #[arg(long, value_name = "SECOND")]
    pub spectrum: Option<usize>,

    /// Standard deviations above the mean that count as loud
    #[arg(long)]
    pub loud_sd: Option<f64>,

    /// Standard deviations below the mean that count as quiet
    #[arg(long)]
    pub quiet_sd: Option<f64>,

    /// Quiet frames tolerated inside a sustained loud run
    #[arg(long)]
    pub cushion: Option<usize>,

    /// Loud frames needed for a sustained run
    #[arg(long)]
    pub min_run: Option<usize>,

    /// Path to the ffmpeg binary
    #[arg(long)]
    pub ffmpeg: Option<String>,
}
