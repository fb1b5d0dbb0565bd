use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "lyricmotion",
    about = "Cut a song into timed scene blocks for storyboard generation"
)]
pub struct Cli {
    /// Input audio files (MP3, WAV, M4A, FLAC, OGG)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output JSON file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Scene block length in seconds
    #[arg(short, long, default_value_t = 8.0)]
    pub block_length: f32,

    /// Width of one energy frame in milliseconds
    #[arg(long, default_value_t = 100)]
    pub energy_window_ms: u32,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Config file (defaults to lyricmotion.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
